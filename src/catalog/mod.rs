//! Catalog of standard square pipe sizes.
//!
//! The catalog is read once per session from a JSON list of
//! `{width_mm, height_mm, thickness_mm}` records. A source that cannot be
//! read or parsed is replaced by a single 10 x 10 t1 pipe.

mod record;

pub use record::{mm_to_internal, PipeRecord, PipeSpec, MM_PER_CM};

use std::path::Path;
use std::sync::OnceLock;

use tracing::{debug, warn};

use crate::error::CatalogError;

static CATALOG: OnceLock<PipeCatalog> = OnceLock::new();

/// Ordered, read-only list of pipe sizes offered to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct PipeCatalog {
    records: Vec<PipeRecord>,
}

impl PipeCatalog {
    /// The single-entry catalog used when the source is unusable.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            records: vec![PipeRecord::new(10.0, 10.0, 1.0)],
        }
    }

    /// Parses a catalog from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] for malformed JSON or records,
    /// [`CatalogError::Empty`] for an empty list, and
    /// [`CatalogError::InvalidRecord`] for a non-positive dimension.
    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        let records: Vec<PipeRecord> = serde_json::from_str(text)?;
        Self::from_records(records)
    }

    /// Builds a catalog from already-decoded records.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Empty`] or [`CatalogError::InvalidRecord`].
    pub fn from_records(records: Vec<PipeRecord>) -> Result<Self, CatalogError> {
        if records.is_empty() {
            return Err(CatalogError::Empty);
        }
        for (index, record) in records.iter().enumerate() {
            record.check(index)?;
        }
        Ok(Self { records })
    }

    /// Reads and parses a catalog file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the file cannot be read, otherwise the
    /// errors of [`PipeCatalog::from_json`].
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Reads a catalog file, substituting [`PipeCatalog::fallback`] on any failure.
    #[must_use]
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(catalog) => {
                debug!(path = %path.display(), entries = catalog.len(), "loaded pipe catalog");
                catalog
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "using fallback pipe catalog");
                Self::fallback()
            }
        }
    }

    /// Number of entries; never zero.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the catalog has no entries. A constructed catalog never does.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the source record at `index`.
    #[must_use]
    pub fn record(&self, index: usize) -> Option<&PipeRecord> {
        self.records.get(index)
    }

    /// Returns the pipe at `index` in internal units.
    #[must_use]
    pub fn spec(&self, index: usize) -> Option<PipeSpec> {
        self.records.get(index).map(PipeRecord::to_spec)
    }

    /// All source records in catalog order.
    #[must_use]
    pub fn records(&self) -> &[PipeRecord] {
        &self.records
    }

    /// All pipes in internal units, in catalog order.
    pub fn specs(&self) -> impl Iterator<Item = PipeSpec> + '_ {
        self.records.iter().map(PipeRecord::to_spec)
    }

    /// Picker entries: label, description and whether the entry is preselected.
    #[must_use]
    pub fn choices(&self) -> Vec<PipeChoice> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, r)| PipeChoice {
                label: r.label(),
                description: r.description(),
                selected: i == 0,
            })
            .collect()
    }
}

/// One row of the pipe picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeChoice {
    pub label: String,
    pub description: String,
    pub selected: bool,
}

/// Loads the session catalog from `path` on first call and returns it.
///
/// Later calls return the already-loaded catalog regardless of `path`.
pub fn init(path: impl AsRef<Path>) -> &'static PipeCatalog {
    CATALOG.get_or_init(|| PipeCatalog::load(path))
}

/// Returns the session catalog, or the fallback catalog if [`init`] was never called.
pub fn get() -> &'static PipeCatalog {
    CATALOG.get_or_init(PipeCatalog::fallback)
}
