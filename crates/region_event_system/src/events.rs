//! # Event Traits and Core Events
//!
//! This module defines the event infrastructure used by the region bus: the
//! [`Event`] trait, handler abstractions and every built-in event emitted by
//! the scene, the module manager and the restart scheduler.
//!
//! ## Event Categories
//!
//! ### Core Events
//! Emitted on `core:<name>` keys by the simulator itself:
//! - Region lifecycle (`region_started`, `region_stopped`, `frame`)
//! - Module lifecycle (`module_loaded`, `module_unloaded`)
//! - Restart countdown (`restart_scheduled`, `restart_notice`, `restart_aborted`, `region_restarting`)
//!
//! ### Module Events
//! Emitted on `module:<module>:<name>` keys for module-to-module traffic.

use crate::types::{AgentId, RegionId};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt::Debug;
use std::marker::PhantomData;

// ============================================================================
// Event Payloads and Handlers
// ============================================================================

/// A payload that can travel over a region bus.
///
/// Payloads are encoded to JSON once per emit and decoded by each handler
/// into the type it subscribed with. Every serde struct that is `Debug` and
/// thread safe is an event through the blanket implementation below.
pub trait Event: Send + Sync + Debug + 'static {
    /// Type name used in default handler names.
    fn type_name() -> &'static str
    where
        Self: Sized;

    fn serialize(&self) -> Result<Vec<u8>, EventError>;

    fn deserialize(data: &[u8]) -> Result<Self, EventError>
    where
        Self: Sized;
}

impl<T> Event for T
where
    T: Serialize + DeserializeOwned + Send + Sync + Debug + 'static,
{
    fn type_name() -> &'static str {
        std::any::type_name::<T>()
    }

    fn serialize(&self) -> Result<Vec<u8>, EventError> {
        serde_json::to_vec(self).map_err(|e| {
            tracing::error!("🔴 Could not encode {} event {:?}: {}", Self::type_name(), self, e);
            EventError::Serialization(e)
        })
    }

    fn deserialize(data: &[u8]) -> Result<Self, EventError> {
        serde_json::from_slice(data).map_err(EventError::Deserialization)
    }
}

/// One subscription in a bus's fan-out table.
#[async_trait]
pub trait EventHandler: Send + Sync + Debug + 'static {
    /// Runs the subscription against an encoded payload.
    async fn handle(&self, data: &[u8]) -> Result<(), EventError>;

    /// Subscriber name shown by `EventSystem::subscriptions`.
    fn handler_name(&self) -> &str;
}

/// Subscription that decodes the payload into `T` and calls a closure.
pub struct TypedEventHandler<T, F> {
    name: String,
    callback: F,
    _event: PhantomData<fn(T)>,
}

impl<T, F> TypedEventHandler<T, F>
where
    T: Event,
    F: Fn(T) -> Result<(), EventError> + Send + Sync,
{
    pub fn new(name: String, callback: F) -> Self {
        Self {
            name,
            callback,
            _event: PhantomData,
        }
    }
}

impl<T, F> Debug for TypedEventHandler<T, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedEventHandler")
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait]
impl<T, F> EventHandler for TypedEventHandler<T, F>
where
    T: Event,
    F: Fn(T) -> Result<(), EventError> + Send + Sync + 'static,
{
    async fn handle(&self, data: &[u8]) -> Result<(), EventError> {
        match T::deserialize(data) {
            Ok(event) => (self.callback)(event),
            Err(e) => {
                // Another payload shape on the same key; skip this subscriber only.
                let preview: String = String::from_utf8_lossy(data).chars().take(100).collect();
                tracing::warn!(
                    "🟡 {} cannot decode payload as {}: {} ({})",
                    self.name,
                    std::any::type_name::<T>(),
                    e,
                    preview
                );
                Ok(())
            }
        }
    }

    fn handler_name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// Region Lifecycle Events
// ============================================================================

/// Emitted once a region has been created and all modules were attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionStartedEvent {
    pub region_id: RegionId,
    pub region_name: String,
    pub timestamp: u64,
}

/// Emitted when a region is torn down, either for a restart or shutdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionStoppedEvent {
    pub region_id: RegionId,
    /// Whether the region is coming back (restart) or going away
    pub restarting: bool,
    pub timestamp: u64,
}

/// One tick of a region's update loop.
///
/// Frame-gated modules (clouds, wind) subscribe to `core:frame` and act on
/// every Nth frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FrameEvent {
    pub region_id: RegionId,
    pub frame: u64,
}

// ============================================================================
// Module Lifecycle Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleLoadedEvent {
    pub module_name: String,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleUnloadedEvent {
    pub module_name: String,
    pub timestamp: u64,
}

// ============================================================================
// Restart Countdown Events
// ============================================================================

/// A restart countdown was (re)started for a region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestartScheduledEvent {
    pub region_id: RegionId,
    pub initiator: AgentId,
    /// Seconds from now until the restart fires
    pub seconds_until_restart: u64,
    pub timestamp: u64,
}

/// One countdown notice was delivered (or would have been, had a dialog
/// collaborator been present).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestartNoticeEvent {
    pub region_id: RegionId,
    /// Remaining seconds announced by this notice
    pub seconds_remaining: u64,
    pub message: String,
    pub delivered: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestartAbortedEvent {
    pub region_id: RegionId,
    pub message: String,
    pub timestamp: u64,
}

/// The countdown is over; the region is about to restart (or the process to
/// shut down when in-world restarts shut the simulator down).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionRestartingEvent {
    pub region_id: RegionId,
    pub shutting_down: bool,
    pub timestamp: u64,
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during event system operations.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// Serialization failed when converting event to bytes
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Deserialization failed when converting bytes to event
    #[error("Deserialization error: {0}")]
    Deserialization(serde_json::Error),
    /// A subscriber reported a failure; logged by the bus, never propagated
    #[error("Handler {0} failed")]
    HandlerExecution(String),
}
