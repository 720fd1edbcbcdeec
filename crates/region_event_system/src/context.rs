//! # Scene Context Interface
//!
//! This module defines the collaborator contracts region modules consume:
//! the [`SceneContext`] that represents one simulated region, and the
//! [`DialogModule`] notification sink used to reach the avatars in it.
//!
//! ## Core Services
//!
//! The [`SceneContext`] provides access to:
//! - **Event System** - The region's own publish/subscribe bus
//! - **Region Information** - Id and name of the region
//! - **Presence** - How many root agents are currently in the region
//! - **Lifecycle** - Immediate restart, or a process shutdown request
//! - **Dialogs** - The optional notification collaborator
//!
//! ## Thread Safety
//!
//! Contexts are shared as `Arc<dyn SceneContext>` between the frame loop, the
//! console and module tasks, so every method takes `&self`.

use crate::system::EventSystem;
use crate::types::{AgentId, RegionInfo};
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

// ============================================================================
// Scene Context
// ============================================================================

/// One simulated region as seen by a region module.
///
/// # Examples
///
/// ```rust,no_run
/// use region_event_system::{SceneContext, ModuleError};
/// use std::sync::Arc;
///
/// async fn announce(scene: Arc<dyn SceneContext>) -> Result<(), ModuleError> {
///     if let Some(dialog) = scene.dialog() {
///         dialog.send_general_alert("Maintenance in five minutes");
///     }
///     tracing::info!("{} agents in {}", scene.root_agent_count(), scene.region_info().region_name);
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SceneContext: Send + Sync + Debug {
    /// Returns the static description of this region.
    fn region_info(&self) -> RegionInfo;

    /// Returns the region's event bus.
    fn events(&self) -> Arc<EventSystem>;

    /// Number of avatars currently present as root agents.
    fn root_agent_count(&self) -> usize;

    /// Restarts the region immediately.
    ///
    /// The scene tears the region down and brings it back; modules see
    /// `remove_region` followed by `add_region`/`region_loaded`.
    async fn restart_now(&self) -> Result<(), ServerError>;

    /// Asks the hosting process to shut down so an external supervisor can
    /// start it again.
    async fn request_shutdown(&self) -> Result<(), ServerError>;

    /// Returns the notification collaborator, if one is attached.
    fn dialog(&self) -> Option<Arc<dyn DialogModule>>;
}

// ============================================================================
// Dialog Collaborator
// ============================================================================

/// Notification sink reaching every connected session of a region.
pub trait DialogModule: Send + Sync + Debug {
    /// Shows a modal alert to every agent in the region.
    fn send_general_alert(&self, message: &str);

    /// Shows a region notification ("blue box") attributed to `source`.
    fn send_notification_to_users_in_region(
        &self,
        initiator: AgentId,
        source: &str,
        message: &str,
    );
}

// ============================================================================
// Supporting Types
// ============================================================================

/// Errors that can occur when a module asks the scene to act.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The scene is gone or no longer accepting lifecycle requests
    #[error("Scene unavailable: {0}")]
    SceneUnavailable(String),
    /// Internal server error (invalid state, closed channel, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}
