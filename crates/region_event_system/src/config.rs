//! Keyed configuration access for region modules.
//!
//! The simulator loads one TOML document and hands every module the same
//! [`ModuleConfig`]. Modules look up `Section.Key` pairs (for example
//! `RestartModule.MarkerPath` or `Startup.SkipDelayOnEmptyRegion`); section
//! and key names match case-insensitively.

use serde::de::DeserializeOwned;
use tracing::warn;

/// Errors raised while reading module configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid value for {section}.{key}: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        reason: String,
    },
}

/// Read-only view over the raw configuration document.
#[derive(Debug, Clone, Default)]
pub struct ModuleConfig {
    root: toml::Table,
}

impl ModuleConfig {
    pub fn new(root: toml::Table) -> Self {
        Self { root }
    }

    /// Parses a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(content.parse::<toml::Table>()?))
    }

    /// Returns a section table by name.
    pub fn section(&self, name: &str) -> Option<&toml::Table> {
        self.root
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .and_then(|(_, value)| value.as_table())
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.section(name).is_some()
    }

    /// Reads and converts `section.key`.
    ///
    /// Returns `Ok(None)` when the section or key is absent and an error when
    /// the value exists but has the wrong shape.
    pub fn get<T: DeserializeOwned>(&self, section: &str, key: &str) -> Result<Option<T>, ConfigError> {
        let Some(table) = self.section(section) else {
            return Ok(None);
        };
        let Some(value) = table
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.clone())
        else {
            return Ok(None);
        };

        value
            .try_into::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                section: section.to_string(),
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    /// Reads `section.key`, falling back to `default` when absent or invalid.
    pub fn get_or<T: DeserializeOwned>(&self, section: &str, key: &str, default: T) -> T {
        match self.get(section, key) {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(e) => {
                warn!("⚠️ {}; using default", e);
                default
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[Startup]
SkipDelayOnEmptyRegion = true

[RestartModule]
MarkerPath = "/var/run/sim"

[Cloud]
density = "thick"
"#;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let config = ModuleConfig::from_toml_str(SAMPLE).unwrap();
        assert!(config.get_or("startup", "skipdelayonemptyregion", false));
        assert_eq!(
            config.get::<String>("RestartModule", "MarkerPath").unwrap(),
            Some("/var/run/sim".to_string())
        );
    }

    #[test]
    fn test_missing_values_fall_back() {
        let config = ModuleConfig::from_toml_str(SAMPLE).unwrap();
        assert!(!config.get_or("Startup", "InworldRestartShutsDown", false));
        assert_eq!(config.get::<u32>("Wind", "wind_update_rate").unwrap(), None);
        assert!(!config.has_section("Wind"));
    }

    #[test]
    fn test_wrong_type_is_reported() {
        let config = ModuleConfig::from_toml_str(SAMPLE).unwrap();
        assert!(config.get::<f32>("Cloud", "density").is_err());
        assert_eq!(config.get_or("Cloud", "density", 0.5f32), 0.5);
    }

    #[test]
    fn test_invalid_document_is_rejected() {
        assert!(ModuleConfig::from_toml_str("[Startup\nbroken").is_err());
    }
}
