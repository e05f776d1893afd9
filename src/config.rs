use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Add-in settings, read from a TOML file next to the add-in.
///
/// Every key is optional; missing keys take the defaults below.
///
/// ```toml
/// catalog_path = "aluminum_pipes.json"
/// default_length_mm = 10.0
/// default_offset_mm = [0.0, 0.0, 0.0]
/// default_rotation_deg = 0.0
/// default_reverse = false
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AddinConfig {
    /// Pipe catalog file; relative paths resolve against the add-in directory.
    pub catalog_path: PathBuf,
    pub default_length_mm: f64,
    pub default_offset_mm: [f64; 3],
    pub default_rotation_deg: f64,
    pub default_reverse: bool,
}

impl Default for AddinConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("aluminum_pipes.json"),
            default_length_mm: 10.0,
            default_offset_mm: [0.0; 3],
            default_rotation_deg: 0.0,
            default_reverse: false,
        }
    }
}

impl AddinConfig {
    /// Parses settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML, unknown keys or
    /// values of the wrong type.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
    /// errors of [`AddinConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Catalog location, resolved against `base_dir` when relative.
    #[must_use]
    pub fn catalog_path_in(&self, base_dir: &Path) -> PathBuf {
        if self.catalog_path.is_absolute() {
            self.catalog_path.clone()
        } else {
            base_dir.join(&self.catalog_path)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        assert_eq!(AddinConfig::from_toml_str("").unwrap(), AddinConfig::default());
    }

    #[test]
    fn partial_config_overrides_some_keys() {
        let config = AddinConfig::from_toml_str(
            "default_length_mm = 250.0\ndefault_offset_mm = [1.0, 2.0, 3.0]\ndefault_reverse = true\n",
        )
        .unwrap();
        assert!((config.default_length_mm - 250.0).abs() < 1e-12);
        assert_eq!(config.default_offset_mm, [1.0, 2.0, 3.0]);
        assert!(config.default_reverse);
        assert_eq!(config.catalog_path, PathBuf::from("aluminum_pipes.json"));
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(matches!(
            AddinConfig::from_toml_str("lenght = 3").unwrap_err(),
            ConfigError::Parse(_)
        ));
    }

    #[test]
    fn wrong_type_is_rejected() {
        assert!(AddinConfig::from_toml_str("default_length_mm = \"long\"").is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            AddinConfig::load("/nonexistent/squarepipe.toml").unwrap_err(),
            ConfigError::Io(_)
        ));
    }

    #[test]
    fn relative_catalog_resolves_against_base() {
        let config = AddinConfig::default();
        assert_eq!(
            config.catalog_path_in(Path::new("/opt/addins/squarepipe")),
            PathBuf::from("/opt/addins/squarepipe/aluminum_pipes.json")
        );
    }
}
