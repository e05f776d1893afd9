use nalgebra::Isometry2;
use tracing::debug;

use crate::catalog::PipeSpec;
use crate::error::{Result, ValidationError};
use crate::math::polygon_2d::signed_area_2d;
use crate::math::{Point2, Vector2, Vector3};

/// Where and how a profile is placed on the sketch plane.
///
/// `origin` must already be expressed in the plane's local frame. `offset_z`
/// is carried for the host, which applies it to the plane itself; the profile
/// builder never reads it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementParams {
    pub origin: Option<Point2>,
    pub offset_x: f64,
    pub offset_y: f64,
    pub offset_z: f64,
    /// Radians, counter-clockwise, about the profile's own corner.
    pub rotation: f64,
    /// Signed; a negative length flips the extrusion side.
    pub length: f64,
    pub reverse: bool,
    pub custom_direction: Option<Vector3>,
}

impl Default for PlacementParams {
    fn default() -> Self {
        Self {
            origin: None,
            offset_x: 0.0,
            offset_y: 0.0,
            offset_z: 0.0,
            rotation: 0.0,
            length: 0.0,
            reverse: false,
            custom_direction: None,
        }
    }
}

impl PlacementParams {
    /// Creates placement parameters extruding `length` from the plane origin.
    #[must_use]
    pub fn new(length: f64) -> Self {
        Self {
            length,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_origin(mut self, origin: Point2) -> Self {
        self.origin = Some(origin);
        self
    }

    #[must_use]
    pub fn with_offset(mut self, x: f64, y: f64, z: f64) -> Self {
        self.offset_x = x;
        self.offset_y = y;
        self.offset_z = z;
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, radians: f64) -> Self {
        self.rotation = radians;
        self
    }

    #[must_use]
    pub fn reversed(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    #[must_use]
    pub fn with_custom_direction(mut self, direction: Vector3) -> Self {
        self.custom_direction = Some(direction);
        self
    }

    /// The anchor for the profile's local origin corner, in plane-local coordinates.
    #[must_use]
    pub fn base_point(&self) -> Point2 {
        let offset = Vector2::new(self.offset_x, self.offset_y);
        match self.origin {
            Some(origin) => origin + offset,
            None => Point2::from(offset),
        }
    }

    /// Rejects NaN and infinite values.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NonFinite`] naming the first bad field.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        let origin = self.origin.unwrap_or_else(Point2::origin);
        for (field, value) in [
            ("origin.x", origin.x),
            ("origin.y", origin.y),
            ("offset_x", self.offset_x),
            ("offset_y", self.offset_y),
            ("offset_z", self.offset_z),
            ("rotation", self.rotation),
            ("length", self.length),
        ] {
            if !value.is_finite() {
                return Err(ValidationError::NonFinite { field });
            }
        }
        Ok(())
    }
}

/// The closed point loops of a square pipe cross-section.
///
/// Each loop lists its corners once; the closing edge from the last corner
/// back to the first is implied.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileLoops {
    pub outer: Vec<Point2>,
    pub inner: Option<Vec<Point2>>,
}

impl ProfileLoops {
    /// Returns `true` if the section has a cavity.
    #[must_use]
    pub fn is_hollow(&self) -> bool {
        self.inner.is_some()
    }

    /// Outer loop followed by the inner loop when present.
    pub fn loops(&self) -> impl Iterator<Item = &[Point2]> {
        std::iter::once(self.outer.as_slice()).chain(self.inner.as_deref())
    }

    /// Material area of the section (outer minus cavity).
    #[must_use]
    pub fn cross_section_area(&self) -> f64 {
        let outer = signed_area_2d(&self.outer).abs();
        let inner = self
            .inner
            .as_deref()
            .map_or(0.0, |pts| signed_area_2d(pts).abs());
        outer - inner
    }
}

/// Builds the outer and inner rectangle loops of a pipe section.
///
/// Corners are laid out in a local frame with the outer corner at `(0, 0)`,
/// rotated about that corner, then translated to the base point. The inner
/// loop is omitted when the wall leaves no cavity.
pub struct BuildProfile {
    pipe: PipeSpec,
    placement: PlacementParams,
}

impl BuildProfile {
    /// Creates a new `BuildProfile` operation.
    #[must_use]
    pub fn new(pipe: PipeSpec, placement: PlacementParams) -> Self {
        Self { pipe, placement }
    }

    /// Executes the operation.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if a pipe dimension is non-positive or
    /// any value is not finite.
    pub fn execute(&self) -> Result<ProfileLoops> {
        self.pipe.validate()?;
        self.placement.validate()?;

        let PipeSpec {
            width,
            height,
            thickness,
        } = self.pipe;
        let base = self.placement.base_point();
        let transform = Isometry2::new(base.coords, self.placement.rotation);

        let outer = rectangle(&transform, 0.0, 0.0, width, height);
        let inner = (self.pipe.inner_width() > 0.0 && self.pipe.inner_height() > 0.0).then(|| {
            rectangle(
                &transform,
                thickness,
                thickness,
                width - thickness,
                height - thickness,
            )
        });

        debug!(
            width,
            height,
            thickness,
            base_x = base.x,
            base_y = base.y,
            rotation = self.placement.rotation,
            hollow = inner.is_some(),
            "built pipe profile"
        );

        Ok(ProfileLoops { outer, inner })
    }
}

/// Corners `(x0,y0) -> (x1,y0) -> (x1,y1) -> (x0,y1)` mapped through `transform`.
fn rectangle(transform: &Isometry2<f64>, x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point2> {
    [(x0, y0), (x1, y0), (x1, y1), (x0, y1)]
        .into_iter()
        .map(|(x, y)| transform.transform_point(&Point2::new(x, y)))
        .collect()
}
