//! Concrete scene hosted by the simulator.
//!
//! A [`Scene`] owns the region's event bus, its root agents and its frame
//! counter. Lifecycle requests coming from modules (restart now, shut the
//! process down) are not carried out by the scene itself; they are sent to
//! the application over a channel, which tears the region down and brings it
//! back.

use crate::dialog::{AgentPresence, AgentTable, BroadcastDialog, DeliveredMessage};
use dashmap::DashMap;
use region_event_system::{
    async_trait, create_region_event_system, current_timestamp, AgentId, DialogModule, EventSystem,
    FrameEvent, RegionId, RegionInfo, RegionStartedEvent, RegionStoppedEvent, SceneContext,
    ServerError,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Lifecycle request sent from a scene to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneRequest {
    Restart(RegionId),
    Shutdown(RegionId),
}

pub type SceneRequestSender = mpsc::UnboundedSender<SceneRequest>;

/// Running scenes by region, shared between the application and the console.
pub type SceneTable = Arc<DashMap<RegionId, Arc<Scene>>>;

#[derive(Debug)]
pub struct Scene {
    info: RegionInfo,
    events: Arc<EventSystem>,
    agents: AgentTable,
    dialog: Arc<BroadcastDialog>,
    frame: AtomicU64,
    requests: SceneRequestSender,
}

impl Scene {
    pub fn new(info: RegionInfo, requests: SceneRequestSender) -> Self {
        let agents: AgentTable = Arc::new(DashMap::new());
        let dialog = Arc::new(BroadcastDialog::new(info.region_name.clone(), agents.clone()));
        Self {
            info,
            events: create_region_event_system(),
            agents,
            dialog,
            frame: AtomicU64::new(0),
            requests,
        }
    }

    pub fn region_id(&self) -> RegionId {
        self.info.region_id
    }

    pub fn name(&self) -> &str {
        &self.info.region_name
    }

    /// Makes a new root agent enter the region.
    pub fn add_agent(&self, name: impl Into<String>) -> AgentId {
        let agent_id = AgentId::new();
        let name = name.into();
        info!("👤 {} entered {}", name, self.info.region_name);
        self.agents.insert(
            agent_id,
            AgentPresence {
                name,
                inbox: Vec::new(),
            },
        );
        agent_id
    }

    pub fn remove_agent(&self, agent_id: AgentId) -> bool {
        match self.agents.remove(&agent_id) {
            Some((_, agent)) => {
                info!("👋 {} left {}", agent.name, self.info.region_name);
                true
            }
            None => false,
        }
    }

    /// Agents sorted by name.
    pub fn agents(&self) -> Vec<(AgentId, String)> {
        let mut agents: Vec<_> = self
            .agents
            .iter()
            .map(|entry| (*entry.key(), entry.value().name.clone()))
            .collect();
        agents.sort_by(|a, b| a.1.cmp(&b.1));
        agents
    }

    pub fn find_agent(&self, name: &str) -> Option<AgentId> {
        self.agents
            .iter()
            .find(|entry| entry.value().name.eq_ignore_ascii_case(name))
            .map(|entry| *entry.key())
    }

    /// Messages delivered to an agent so far.
    pub fn inbox(&self, agent_id: AgentId) -> Option<Vec<DeliveredMessage>> {
        self.agents.get(&agent_id).map(|agent| agent.inbox.clone())
    }

    pub fn frame(&self) -> u64 {
        self.frame.load(Ordering::SeqCst)
    }

    /// Advances the frame counter and publishes `core:frame`.
    pub async fn tick(&self) -> u64 {
        let frame = self.frame.fetch_add(1, Ordering::SeqCst) + 1;
        let event = FrameEvent {
            region_id: self.info.region_id,
            frame,
        };
        if let Err(e) = self.events.emit_core("frame", &event).await {
            warn!("⚠️ Frame {} of {} failed: {}", frame, self.info.region_name, e);
        }
        frame
    }

    pub async fn announce_started(&self) {
        let event = RegionStartedEvent {
            region_id: self.info.region_id,
            region_name: self.info.region_name.clone(),
            timestamp: current_timestamp(),
        };
        if let Err(e) = self.events.emit_core("region_started", &event).await {
            warn!("⚠️ Failed to emit region_started for {}: {}", self.info.region_name, e);
        }
    }

    pub async fn announce_stopped(&self, restarting: bool) {
        let event = RegionStoppedEvent {
            region_id: self.info.region_id,
            restarting,
            timestamp: current_timestamp(),
        };
        if let Err(e) = self.events.emit_core("region_stopped", &event).await {
            warn!("⚠️ Failed to emit region_stopped for {}: {}", self.info.region_name, e);
        }
    }

    fn send(&self, request: SceneRequest) -> Result<(), ServerError> {
        self.requests.send(request).map_err(|_| {
            ServerError::SceneUnavailable(format!(
                "simulator no longer accepts requests for {}",
                self.info.region_name
            ))
        })
    }
}

#[async_trait]
impl SceneContext for Scene {
    fn region_info(&self) -> RegionInfo {
        self.info.clone()
    }

    fn events(&self) -> Arc<EventSystem> {
        self.events.clone()
    }

    fn root_agent_count(&self) -> usize {
        self.agents.len()
    }

    async fn restart_now(&self) -> Result<(), ServerError> {
        info!("🔄 Restart requested for {}", self.info.region_name);
        self.send(SceneRequest::Restart(self.info.region_id))
    }

    async fn request_shutdown(&self) -> Result<(), ServerError> {
        info!("🛑 Shutdown requested by {}", self.info.region_name);
        self.send(SceneRequest::Shutdown(self.info.region_id))
    }

    fn dialog(&self) -> Option<Arc<dyn DialogModule>> {
        Some(self.dialog.clone())
    }
}

/// Drives a scene's update loop until the task is aborted.
pub async fn run_frame_loop(scene: Arc<Scene>, frame_interval: Duration) {
    let mut interval = tokio::time::interval(frame_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    debug!(
        "🎞️ Frame loop for {} running every {:?}",
        scene.name(),
        frame_interval
    );

    loop {
        interval.tick().await;
        scene.tick().await;
    }
}
