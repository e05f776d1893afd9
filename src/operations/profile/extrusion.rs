use tracing::debug;

use crate::error::{Result, ValidationError};
use crate::math::{Vector3, TOLERANCE};

use super::PlacementParams;

/// Side of the sketch plane the profile is pushed toward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExtrudeDirection {
    /// Along the plane normal.
    Positive,
    /// Against the plane normal.
    Negative,
    /// Along a caller-supplied vector, passed through unchanged.
    Custom(Vector3),
}

/// Resolved extrusion distance and direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtrusionPlan {
    /// Non-negative extrusion distance.
    pub distance: f64,
    pub direction: ExtrudeDirection,
}

impl ExtrusionPlan {
    /// Displacement of the far cap for a plane with unit normal `normal`.
    #[must_use]
    pub fn vector(&self, normal: &Vector3) -> Vector3 {
        match self.direction {
            ExtrudeDirection::Positive => normal * self.distance,
            ExtrudeDirection::Negative => -normal * self.distance,
            ExtrudeDirection::Custom(dir) => dir.normalize() * self.distance,
        }
    }
}

/// Decides extrusion distance and direction from a signed length and reverse flag.
///
/// A negative length and the reverse flag each flip the direction; together
/// they cancel. A custom direction bypasses both.
pub struct ResolveExtrusion {
    length: f64,
    reverse: bool,
    custom_direction: Option<Vector3>,
}

impl ResolveExtrusion {
    /// Creates a new `ResolveExtrusion` operation.
    #[must_use]
    pub fn new(length: f64, reverse: bool) -> Self {
        Self {
            length,
            reverse,
            custom_direction: None,
        }
    }

    /// Takes length, reverse flag and custom direction from placement parameters.
    #[must_use]
    pub fn from_placement(placement: &PlacementParams) -> Self {
        Self {
            length: placement.length,
            reverse: placement.reverse,
            custom_direction: placement.custom_direction,
        }
    }

    /// Overrides the sign-derived direction with an explicit vector.
    #[must_use]
    pub fn with_custom_direction(mut self, direction: Vector3) -> Self {
        self.custom_direction = Some(direction);
        self
    }

    /// Executes the operation.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NonFinite`] for a non-finite length or
    /// direction, and [`ValidationError::ZeroVector`] for a zero-length custom
    /// direction.
    pub fn execute(&self) -> Result<ExtrusionPlan> {
        if !self.length.is_finite() {
            return Err(ValidationError::NonFinite { field: "length" }.into());
        }
        let distance = self.length.abs();

        if let Some(dir) = self.custom_direction {
            if !dir.iter().all(|c| c.is_finite()) {
                return Err(ValidationError::NonFinite {
                    field: "custom_direction",
                }
                .into());
            }
            if dir.norm() < TOLERANCE {
                return Err(ValidationError::ZeroVector.into());
            }
            if self.reverse || self.length < 0.0 {
                debug!(
                    reverse = self.reverse,
                    length = self.length,
                    "custom direction overrides reverse flag and length sign"
                );
            }
            return Ok(ExtrusionPlan {
                distance,
                direction: ExtrudeDirection::Custom(dir),
            });
        }

        let negative_request = self.length < 0.0;
        let direction = if self.reverse ^ negative_request {
            ExtrudeDirection::Negative
        } else {
            ExtrudeDirection::Positive
        };
        Ok(ExtrusionPlan {
            distance,
            direction,
        })
    }
}
