//! Configuration management for the region simulator.
//!
//! This module handles loading, validation and conversion of the simulator
//! configuration from TOML files and command-line arguments. Module sections
//! (`[startup]`, `[RestartModule]`, `[Cloud]`, `[Wind]`) are handed to the
//! region modules as a [`ModuleConfig`].

use region_event_system::{ModuleConfig, RegionId, RegionInfo};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{info, warn};

/// Default frame interval for serde deserialization
fn default_frame_interval() -> u64 {
    89 // roughly 11 frames per second
}

fn default_modules() -> Vec<String> {
    vec![
        module_restart::MODULE_NAME.to_string(),
        module_weather::cloud::MODULE_NAME.to_string(),
        module_weather::wind::MODULE_NAME.to_string(),
    ]
}

fn default_true() -> bool {
    true
}

fn default_density() -> f32 {
    0.5
}
fn default_cloud_update_rate() -> u64 {
    1000
}
fn default_wind_update_rate() -> u64 {
    150
}
fn default_wind_plugin() -> String {
    module_weather::wind::DEFAULT_WIND_MODEL.to_string()
}
fn default_strength() -> f32 {
    1.0
}
fn default_avg_strength() -> f32 {
    5.0
}
fn default_var_strength() -> f32 {
    5.0
}
fn default_var_direction() -> f32 {
    30.0
}
fn default_rate_change() -> f32 {
    1.0
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logging configuration settings
    pub logging: LoggingSettings,
    /// Regions, frame rate and module list
    pub simulator: SimulatorSettings,
    /// Restart behaviour shared with the restart module
    #[serde(default)]
    pub startup: StartupSettings,
    #[serde(rename = "RestartModule", default)]
    pub restart: RestartModuleSettings,
    #[serde(rename = "Cloud", default)]
    pub cloud: CloudConfig,
    #[serde(rename = "Wind", default)]
    pub wind: WindConfig,
}

/// Logging system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    pub json_format: bool,
    /// Optional file path for log output (None means stdout only)
    pub file_path: Option<String>,
}

/// Simulator host configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorSettings {
    /// Interval between two frames of a region's update loop
    #[serde(default = "default_frame_interval")]
    pub frame_interval_ms: u64,
    /// Region modules to load, in order
    #[serde(default = "default_modules")]
    pub modules: Vec<String>,
    /// Regions hosted by this process
    #[serde(default)]
    pub regions: Vec<RegionSettings>,
}

/// One hosted region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSettings {
    pub name: String,
    /// Stable region UUID. Marker files are keyed by it, so a region without
    /// one gets a fresh id on every start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl RegionSettings {
    /// Resolves the configured id, generating one when absent.
    pub fn to_region_info(&self) -> Result<RegionInfo, String> {
        let region_id = match &self.id {
            Some(id) => RegionId::from_str(id)
                .map_err(|e| format!("Region {} has an invalid id '{}': {}", self.name, id, e))?,
            None => {
                warn!(
                    "⚠️ Region {} has no id configured; restart markers will not survive a process restart",
                    self.name
                );
                RegionId::new()
            }
        };
        Ok(RegionInfo::new(region_id, self.name.clone()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartupSettings {
    /// Restart immediately when no avatar is present
    #[serde(rename = "SkipDelayOnEmptyRegion", default)]
    pub skip_delay_on_empty_region: bool,
    /// Shut the whole process down instead of restarting the region
    #[serde(rename = "InworldRestartShutsDown", default)]
    pub inworld_restart_shuts_down: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestartModuleSettings {
    /// Directory of the restart marker files; no markers when unset
    #[serde(rename = "MarkerPath", default, skip_serializing_if = "Option::is_none")]
    pub marker_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_density")]
    pub density: f32,
    /// Frames between two cloud updates
    #[serde(default = "default_cloud_update_rate")]
    pub cloud_update_rate: u64,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            density: default_density(),
            cloud_update_rate: default_cloud_update_rate(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Frames between two wind updates
    #[serde(default = "default_wind_update_rate")]
    pub wind_update_rate: u64,
    /// Name of the wind model
    #[serde(default = "default_wind_plugin")]
    pub wind_plugin: String,
    #[serde(default = "default_strength")]
    pub strength: f32,
    #[serde(default = "default_avg_strength")]
    pub avg_strength: f32,
    #[serde(default)]
    pub avg_direction: f32,
    #[serde(default = "default_var_strength")]
    pub var_strength: f32,
    #[serde(default = "default_var_direction")]
    pub var_direction: f32,
    #[serde(default = "default_rate_change")]
    pub rate_change: f32,
}

impl Default for WindConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            wind_update_rate: default_wind_update_rate(),
            wind_plugin: default_wind_plugin(),
            strength: default_strength(),
            avg_strength: default_avg_strength(),
            avg_direction: 0.0,
            var_strength: default_var_strength(),
            var_direction: default_var_direction(),
            rate_change: default_rate_change(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingSettings {
                level: "info".to_string(),
                json_format: false,
                file_path: None,
            },
            simulator: SimulatorSettings {
                frame_interval_ms: default_frame_interval(),
                modules: default_modules(),
                regions: vec![RegionSettings {
                    name: "Default Region".to_string(),
                    id: Some(RegionId::new().to_string()),
                }],
            },
            startup: StartupSettings::default(),
            restart: RestartModuleSettings::default(),
            cloud: CloudConfig::default(),
            wind: WindConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, creates a default configuration file at the
    /// specified path and returns the default configuration. The generated
    /// region id is written with it, so it stays stable across runs.
    pub async fn load_from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Converts the whole configuration into the keyed view region modules
    /// read their settings from.
    pub fn to_module_config(&self) -> Result<ModuleConfig, Box<dyn std::error::Error>> {
        match toml::Value::try_from(self)? {
            toml::Value::Table(table) => Ok(ModuleConfig::new(table)),
            other => Err(format!("configuration serialized to a {} instead of a table", other.type_str()).into()),
        }
    }

    /// Resolves the regions to start, optionally limited to `only` (by name,
    /// case-insensitive).
    pub fn region_infos(&self, only: &[String]) -> Result<Vec<RegionInfo>, String> {
        if let Some(missing) = only.iter().find(|name| {
            !self
                .simulator
                .regions
                .iter()
                .any(|region| region.name.eq_ignore_ascii_case(name))
        }) {
            return Err(format!("Region {} is not configured", missing));
        }

        self.simulator
            .regions
            .iter()
            .filter(|region| {
                only.is_empty() || only.iter().any(|name| region.name.eq_ignore_ascii_case(name))
            })
            .map(RegionSettings::to_region_info)
            .collect()
    }

    /// Validates the configuration for consistency and correctness.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the configuration is valid, or an error string describing the issue.
    pub fn validate(&self) -> Result<(), String> {
        if self.simulator.frame_interval_ms == 0 {
            return Err("simulator.frame_interval_ms must be greater than 0".to_string());
        }

        if self.simulator.regions.is_empty() {
            return Err("At least one region must be configured".to_string());
        }

        let mut names = HashSet::new();
        let mut ids = HashSet::new();
        for region in &self.simulator.regions {
            if region.name.trim().is_empty() {
                return Err("Region name cannot be empty".to_string());
            }
            if !names.insert(region.name.to_ascii_lowercase()) {
                return Err(format!("Duplicate region name: {}", region.name));
            }
            if let Some(id) = &region.id {
                let region_id = RegionId::from_str(id)
                    .map_err(|e| format!("Invalid id for region {}: {}", region.name, e))?;
                if !ids.insert(region_id) {
                    return Err(format!("Duplicate region id: {}", id));
                }
            }
        }

        if self.cloud.density < 0.0 {
            return Err(format!("Cloud density cannot be negative: {}", self.cloud.density));
        }

        if let Some(marker_path) = &self.restart.marker_path {
            let marker_dir = PathBuf::from(marker_path);
            if !marker_path.trim().is_empty() && marker_dir.is_file() {
                return Err(format!("RestartModule.MarkerPath is a file: {}", marker_path));
            }
        }

        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }
}
