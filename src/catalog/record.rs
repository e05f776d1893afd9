use serde::Deserialize;

use crate::error::{CatalogError, ValidationError};

/// Millimeters per internal length unit (centimeter).
pub const MM_PER_CM: f64 = 10.0;

/// Converts a millimeter value from the catalog or dialog into internal units.
#[must_use]
pub fn mm_to_internal(mm: f64) -> f64 {
    mm / MM_PER_CM
}

/// One catalog entry as stored in the data source, in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PipeRecord {
    pub width_mm: f64,
    pub height_mm: f64,
    pub thickness_mm: f64,
}

impl PipeRecord {
    /// Creates a record from millimeter dimensions.
    #[must_use]
    pub fn new(width_mm: f64, height_mm: f64, thickness_mm: f64) -> Self {
        Self {
            width_mm,
            height_mm,
            thickness_mm,
        }
    }

    /// Short picker label, e.g. `20x40 t2`.
    ///
    /// Numbers are printed from their parsed value, so `10.0` in the source
    /// shows as `10`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}x{} t{}", self.width_mm, self.height_mm, self.thickness_mm)
    }

    /// Long picker description, e.g. `20mm x 40mm t2`.
    #[must_use]
    pub fn description(&self) -> String {
        format!(
            "{}mm x {}mm t{}",
            self.width_mm, self.height_mm, self.thickness_mm
        )
    }

    /// Name given to the component holding a pipe of this size and length.
    #[must_use]
    pub fn component_name(&self, length_mm: f64) -> String {
        format!(
            "SquarePipe_{}x{}_t{}_L{:.0}mm",
            self.width_mm,
            self.height_mm,
            self.thickness_mm,
            length_mm.abs()
        )
    }

    /// Converts to internal units.
    #[must_use]
    pub fn to_spec(&self) -> PipeSpec {
        PipeSpec::new(
            mm_to_internal(self.width_mm),
            mm_to_internal(self.height_mm),
            mm_to_internal(self.thickness_mm),
        )
    }

    /// Checks that every dimension is a finite, strictly positive length.
    pub(crate) fn check(&self, index: usize) -> Result<(), CatalogError> {
        for (field, value) in [
            ("width_mm", self.width_mm),
            ("height_mm", self.height_mm),
            ("thickness_mm", self.thickness_mm),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CatalogError::InvalidRecord {
                    index,
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Outer dimensions and wall thickness of a square pipe, in internal units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipeSpec {
    pub width: f64,
    pub height: f64,
    pub thickness: f64,
}

impl PipeSpec {
    /// Creates a pipe spec without validation; see [`PipeSpec::validate`].
    #[must_use]
    pub fn new(width: f64, height: f64, thickness: f64) -> Self {
        Self {
            width,
            height,
            thickness,
        }
    }

    /// Rejects non-finite or non-positive dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NonFinite`] or
    /// [`ValidationError::NonPositiveDimension`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("width", self.width),
            ("height", self.height),
            ("thickness", self.thickness),
        ] {
            if !value.is_finite() {
                return Err(ValidationError::NonFinite { field });
            }
            if value <= 0.0 {
                return Err(ValidationError::NonPositiveDimension { field, value });
            }
        }
        Ok(())
    }

    /// Inner (cavity) width; zero or negative when the wall fills the section.
    #[must_use]
    pub fn inner_width(&self) -> f64 {
        self.width - 2.0 * self.thickness
    }

    /// Inner (cavity) height; zero or negative when the wall fills the section.
    #[must_use]
    pub fn inner_height(&self) -> f64 {
        self.height - 2.0 * self.thickness
    }
}
