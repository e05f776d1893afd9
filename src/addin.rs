//! Add-in session: configuration plus the catalog loaded at startup.

use std::path::Path;

use tracing::info;

use crate::catalog::{self, PipeCatalog, PipeChoice};
use crate::command::{CommandReport, PipeCommand, PipeCommandInputs, RunMode, SketchBackend};
use crate::config::AddinConfig;

/// State shared by every command invocation in one host session.
#[derive(Debug, Clone)]
pub struct Addin {
    config: AddinConfig,
    catalog: &'static PipeCatalog,
}

impl Addin {
    /// Starts the session, loading the process-wide catalog on first use.
    ///
    /// `base_dir` is the add-in's install directory; a relative
    /// `catalog_path` is resolved against it.
    #[must_use]
    pub fn start(config: AddinConfig, base_dir: impl AsRef<Path>) -> Self {
        let path = config.catalog_path_in(base_dir.as_ref());
        let catalog = catalog::init(&path);
        info!(path = %path.display(), pipes = catalog.len(), "square pipe add-in started");
        Self { config, catalog }
    }

    /// Starts a session on an already-built catalog.
    #[must_use]
    pub fn with_catalog(config: AddinConfig, catalog: &'static PipeCatalog) -> Self {
        Self { config, catalog }
    }

    #[must_use]
    pub fn catalog(&self) -> &'static PipeCatalog {
        self.catalog
    }

    /// Rows for the pipe picker.
    #[must_use]
    pub fn choices(&self) -> Vec<PipeChoice> {
        self.catalog.choices()
    }

    /// Dialog values as first shown, before any plane is selected.
    #[must_use]
    pub fn default_inputs<P, Q>(&self) -> PipeCommandInputs<P, Q> {
        PipeCommandInputs {
            offset_mm: self.config.default_offset_mm,
            rotation: self.config.default_rotation_deg.to_radians(),
            reverse: self.config.default_reverse,
            ..PipeCommandInputs::new(None, self.config.default_length_mm)
        }
    }

    /// Runs the pipe command; see [`PipeCommand::run`].
    pub fn run<B: SketchBackend>(
        &self,
        inputs: &PipeCommandInputs<B::Plane, B::Point>,
        backend: &mut B,
        mode: RunMode,
    ) -> CommandReport {
        PipeCommand::new(self.catalog).run(inputs, backend, mode)
    }
}
