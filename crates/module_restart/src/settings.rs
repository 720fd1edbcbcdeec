//! Restart scheduler configuration.

use region_event_system::ModuleConfig;
use std::path::PathBuf;

/// Settings read from the `RestartModule` and `Startup` config sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestartSettings {
    /// `RestartModule.MarkerPath`; no path disables marker housekeeping
    pub marker_path: Option<PathBuf>,
    /// `Startup.SkipDelayOnEmptyRegion`: restart at once when nobody is in the region
    pub skip_delay_on_empty_region: bool,
    /// `Startup.InworldRestartShutsDown`: shut the process down instead of restarting the region
    pub inworld_restart_shuts_down: bool,
}

impl RestartSettings {
    pub fn from_config(config: &ModuleConfig) -> Self {
        let marker_path = config
            .get_or::<Option<String>>("RestartModule", "MarkerPath", None)
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Self {
            marker_path,
            skip_delay_on_empty_region: config.get_or("Startup", "SkipDelayOnEmptyRegion", false),
            inworld_restart_shuts_down: config.get_or("Startup", "InworldRestartShutsDown", false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_sections() {
        let settings = RestartSettings::from_config(&ModuleConfig::default());
        assert_eq!(settings, RestartSettings::default());
    }

    #[test]
    fn test_reads_keys() {
        let config = ModuleConfig::from_toml_str(
            r#"
[RestartModule]
MarkerPath = "/tmp/markers"

[Startup]
SkipDelayOnEmptyRegion = true
InworldRestartShutsDown = true
"#,
        )
        .unwrap();

        let settings = RestartSettings::from_config(&config);

        assert_eq!(settings.marker_path, Some(PathBuf::from("/tmp/markers")));
        assert!(settings.skip_delay_on_empty_region);
        assert!(settings.inworld_restart_shuts_down);
    }

    #[test]
    fn test_blank_marker_path_disables_markers() {
        let config = ModuleConfig::from_toml_str("[RestartModule]\nMarkerPath = \"  \"\n").unwrap();
        assert_eq!(RestartSettings::from_config(&config).marker_path, None);
    }
}
