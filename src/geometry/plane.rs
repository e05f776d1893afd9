use crate::error::{Result, ValidationError};
use crate::math::{Point2, Point3, Vector3, TOLERANCE};

/// A sketch plane: an origin with an orthonormal in-plane frame.
///
/// Plane-local coordinates `(u, v)` map to `origin + u * u_dir + v * v_dir`.
/// The normal is `u_dir x v_dir` and defines the positive extrusion side.
#[derive(Debug, Clone, PartialEq)]
pub struct SketchPlane {
    origin: Point3,
    u_dir: Vector3,
    v_dir: Vector3,
    normal: Vector3,
}

impl SketchPlane {
    /// Creates a plane from an origin, a U direction and an approximate V direction.
    ///
    /// `v_hint` is re-orthogonalized against `u_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ZeroVector`] if either direction is
    /// zero-length or the two are parallel.
    pub fn new(origin: Point3, u_dir: Vector3, v_hint: Vector3) -> Result<Self> {
        let u_len = u_dir.norm();
        if u_len < TOLERANCE || v_hint.norm() < TOLERANCE {
            return Err(ValidationError::ZeroVector.into());
        }
        let u_dir = u_dir / u_len;

        let normal = u_dir.cross(&v_hint);
        let normal_len = normal.norm();
        if normal_len < TOLERANCE {
            return Err(ValidationError::ZeroVector.into());
        }
        let normal = normal / normal_len;
        let v_dir = normal.cross(&u_dir);

        Ok(Self {
            origin,
            u_dir,
            v_dir,
            normal,
        })
    }

    /// The model XY plane through the origin.
    #[must_use]
    pub fn xy() -> Self {
        Self::axis_aligned(Vector3::x(), Vector3::y(), Vector3::z())
    }

    /// The model XZ plane through the origin (normal -Y).
    #[must_use]
    pub fn xz() -> Self {
        Self::axis_aligned(Vector3::x(), Vector3::z(), -Vector3::y())
    }

    /// The model YZ plane through the origin.
    #[must_use]
    pub fn yz() -> Self {
        Self::axis_aligned(Vector3::y(), Vector3::z(), Vector3::x())
    }

    fn axis_aligned(u_dir: Vector3, v_dir: Vector3, normal: Vector3) -> Self {
        Self {
            origin: Point3::origin(),
            u_dir,
            v_dir,
            normal,
        }
    }

    /// Returns a copy of this plane moved `distance` along its normal.
    #[must_use]
    pub fn offset(&self, distance: f64) -> Self {
        Self {
            origin: self.origin + self.normal * distance,
            ..self.clone()
        }
    }

    /// Projects a model-space point into plane-local coordinates.
    #[must_use]
    pub fn to_local(&self, point: &Point3) -> Point2 {
        let d = point - self.origin;
        Point2::new(d.dot(&self.u_dir), d.dot(&self.v_dir))
    }

    /// Lifts a plane-local point into model space.
    #[must_use]
    pub fn to_model(&self, point: &Point2) -> Point3 {
        self.origin + self.u_dir * point.x + self.v_dir * point.y
    }

    /// Returns the origin point of the plane.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the unit normal of the plane.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }
}
