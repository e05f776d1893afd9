use thiserror::Error;

/// Top-level error type for square pipe construction.
#[derive(Debug, Error)]
pub enum SquarePipeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

/// Input rejected before any geometry is produced.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be positive, got {value}")]
    NonPositiveDimension { field: &'static str, value: f64 },

    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },

    #[error("zero-length direction vector")]
    ZeroVector,

    #[error("extrusion length must be non-zero")]
    ZeroLength,

    #[error("select a sketch plane")]
    NoPlaneSelected,

    #[error("pipe index {index} is out of range (catalog has {len} entries)")]
    PipeIndexOutOfRange { index: usize, len: usize },
}

/// Errors while reading the pipe catalog source.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("catalog contains no pipes")]
    Empty,

    #[error("catalog entry {index}: {field} = {value} is not a positive length")]
    InvalidRecord {
        index: usize,
        field: &'static str,
        value: f64,
    },
}

/// Errors raised by the sketch/extrude host.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("no active design document")]
    NoActiveDesign,

    #[error("host operation failed: {0}")]
    Backend(String),
}

/// Errors while reading the add-in configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Convenience type alias for results using [`SquarePipeError`].
pub type Result<T> = std::result::Result<T, SquarePipeError>;
