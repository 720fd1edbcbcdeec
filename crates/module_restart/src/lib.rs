//! # Restart Module
//!
//! Staged region restarts: a countdown of notices to everyone in the region,
//! then an immediate restart (or a process shutdown). Console operators and
//! other modules drive it through [`RestartModule`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use module_restart::RestartModule;
//! use region_event_system::{AgentId, RegionId};
//!
//! fn schedule(module: &RestartModule, region_id: RegionId) -> Result<(), module_restart::RestartError> {
//!     module.schedule_restart(
//!         region_id,
//!         AgentId::SYSTEM,
//!         "Region restarting in {0}",
//!         Some(vec![300, 60, 30, 0]),
//!         true,
//!     )
//! }
//! ```
//!
//! Each attached region gets its own [`RestartScheduler`] task. The marker
//! file left behind by a previous restart is removed once the region has
//! finished loading.

pub mod alerts;
pub mod command;
pub mod error;
pub mod marker;
pub mod notice;
pub mod scheduler;
pub mod settings;


pub use alerts::{AlertQueue, AlertStep};
pub use command::{CommandError, RestartCommand};
pub use error::RestartError;
pub use marker::MarkerFile;
pub use notice::{format_countdown, render_notice};
pub use scheduler::{CountdownState, RestartScheduler, RestartStatus};
pub use settings::RestartSettings;

use async_trait::async_trait;
use dashmap::DashMap;
use region_event_system::{AgentId, ModuleConfig, ModuleError, RegionId, RegionModule, SceneContext};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Registry name of the restart module.
pub const MODULE_NAME: &str = "RestartModule";

struct AttachedRegion {
    region_name: String,
    scheduler: RestartScheduler,
    task: JoinHandle<()>,
}

/// Region module owning one restart scheduler per attached region.
///
/// Cloning is cheap and every clone sees the same schedulers.
#[derive(Clone, Default)]
pub struct RestartModule {
    settings: RestartSettings,
    regions: Arc<DashMap<RegionId, AttachedRegion>>,
}

impl RestartModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: RestartSettings) -> Self {
        Self {
            settings,
            regions: Arc::default(),
        }
    }

    pub fn settings(&self) -> &RestartSettings {
        &self.settings
    }

    /// Returns the scheduler handle of an attached region.
    pub fn scheduler(&self, region_id: RegionId) -> Result<RestartScheduler, RestartError> {
        self.regions
            .get(&region_id)
            .map(|region| region.scheduler.clone())
            .ok_or(RestartError::RegionNotFound(region_id))
    }

    /// Attached regions as `(id, name)` pairs, sorted by name.
    pub fn regions(&self) -> Vec<(RegionId, String)> {
        let mut regions: Vec<_> = self
            .regions
            .iter()
            .map(|entry| (*entry.key(), entry.value().region_name.clone()))
            .collect();
        regions.sort_by(|a, b| a.1.cmp(&b.1));
        regions
    }

    pub fn schedule_restart(
        &self,
        region_id: RegionId,
        initiator: AgentId,
        message: impl Into<String>,
        alerts: Option<Vec<u64>>,
        notice: bool,
    ) -> Result<(), RestartError> {
        self.scheduler(region_id)?
            .schedule_restart(initiator, message, alerts, notice)
    }

    pub fn delay_restart(
        &self,
        region_id: RegionId,
        seconds: u64,
        message: impl Into<String>,
    ) -> Result<(), RestartError> {
        self.scheduler(region_id)?.delay_restart(seconds, message)
    }

    pub fn abort_restart(&self, region_id: RegionId, message: impl Into<String>) -> Result<(), RestartError> {
        self.scheduler(region_id)?.abort_restart(message)
    }

    pub async fn time_until_restart(&self, region_id: RegionId) -> Result<Option<Duration>, RestartError> {
        self.scheduler(region_id)?.time_until_restart().await
    }

    pub async fn status(&self, region_id: RegionId) -> Result<RestartStatus, RestartError> {
        self.scheduler(region_id)?.status().await
    }

    /// Runs a parsed console command against one region and returns the
    /// line to print.
    pub async fn execute(
        &self,
        region_id: RegionId,
        initiator: AgentId,
        command: &RestartCommand,
    ) -> Result<String, RestartError> {
        let scheduler = self.scheduler(region_id)?;
        let region_name = self
            .regions
            .get(&region_id)
            .map(|region| region.region_name.clone())
            .unwrap_or_default();

        match command {
            RestartCommand::Schedule {
                message,
                alerts,
                notice,
            } => {
                scheduler.schedule_restart(initiator, message.clone(), Some(alerts.clone()), *notice)?;
                let total = alerts.iter().copied().max().unwrap_or(0);
                Ok(format!("Restart of {} scheduled in {}", region_name, format_countdown(total)))
            }
            RestartCommand::Abort { message } => {
                scheduler.abort_restart(message.clone())?;
                Ok(format!("Restart of {} aborted", region_name))
            }
            RestartCommand::Delay { seconds, message } => {
                scheduler.delay_restart(*seconds, message.clone())?;
                Ok(format!(
                    "Restart of {} delayed by {}",
                    region_name,
                    format_countdown(*seconds)
                ))
            }
            RestartCommand::Status => {
                let status = scheduler.status().await?;
                Ok(match status.time_until_restart {
                    Some(remaining) => format!(
                        "{}: restart in {} (pending notices: {:?})",
                        region_name,
                        format_countdown(remaining.as_secs_f64().ceil() as u64),
                        status.pending_alerts
                    ),
                    None => format!("{}: no restart scheduled", region_name),
                })
            }
        }
    }

    fn marker_for(&self, region_id: RegionId) -> Option<MarkerFile> {
        self.settings
            .marker_path
            .as_deref()
            .map(|directory| MarkerFile::new(directory, region_id))
    }
}

#[async_trait]
impl RegionModule for RestartModule {
    fn name(&self) -> &str {
        MODULE_NAME
    }

    async fn initialise(&mut self, config: &ModuleConfig) -> Result<bool, ModuleError> {
        self.settings = RestartSettings::from_config(config);
        info!(
            "🔧 RestartModule: markers {}, skip delay on empty region: {}, in-world restart shuts down: {}",
            self.settings
                .marker_path
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "disabled".to_string()),
            self.settings.skip_delay_on_empty_region,
            self.settings.inworld_restart_shuts_down
        );
        Ok(true)
    }

    async fn add_region(&self, scene: Arc<dyn SceneContext>) -> Result<(), ModuleError> {
        let info = scene.region_info();
        let (scheduler, task) = RestartScheduler::spawn(scene, self.settings.clone());

        let previous = self.regions.insert(
            info.region_id,
            AttachedRegion {
                region_name: info.region_name.clone(),
                scheduler,
                task,
            },
        );
        if let Some(previous) = previous {
            previous.scheduler.stop();
        }

        debug!("🔗 RestartModule attached to region {}", info.region_name);
        Ok(())
    }

    async fn region_loaded(&self, scene: Arc<dyn SceneContext>) -> Result<(), ModuleError> {
        if let Some(marker) = self.marker_for(scene.region_info().region_id) {
            marker.delete().await;
        }
        Ok(())
    }

    async fn remove_region(&self, scene: Arc<dyn SceneContext>) -> Result<(), ModuleError> {
        let info = scene.region_info();
        let Some((_, region)) = self.regions.remove(&info.region_id) else {
            return Err(ModuleError::RegionNotFound(info.region_id.to_string()));
        };

        region.scheduler.stop();
        debug!("🔌 RestartModule detached from region {}", info.region_name);
        Ok(())
    }

    async fn close(&self) -> Result<(), ModuleError> {
        let region_ids: Vec<RegionId> = self.regions.iter().map(|entry| *entry.key()).collect();
        for region_id in region_ids {
            if let Some((_, region)) = self.regions.remove(&region_id) {
                region.scheduler.stop();
                let _ = region.task.await;
            }
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
