//! # Region Event System
//!
//! Shared contracts of the region simulator: identifiers, the per-scene
//! publish/subscribe bus, the collaborator traits a region module consumes
//! and the [`RegionModule`] trait itself.
//!
//! ## Core Features
//!
//! - **Explicit fan-out**: subscriptions are entries in an inspectable table,
//!   not compiler-managed multicast delegates
//! - **Type Safety**: events are plain serde structs with compile-time types
//! - **Async/Await Support**: built on Tokio
//! - **Injected collaborators**: scenes and dialog sinks are passed to modules
//!   as trait objects, never looked up through global state
//!
//! ## Event Keys
//!
//! - **Core Events** (`core:*`): region lifecycle, frames, restart countdown
//! - **Module Events** (`module:module_name:event`): module-to-module traffic
//!
//! ## Quick Start Example
//!
//! ```rust,no_run
//! use region_event_system::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let events = create_region_event_system();
//!
//!     events.on_core("region_restarting", |event: RegionRestartingEvent| {
//!         println!("Region {} is restarting", event.region_id);
//!         Ok(())
//!     }).await?;
//!
//!     events.emit_core("region_restarting", &RegionRestartingEvent {
//!         region_id: RegionId::new(),
//!         shutting_down: false,
//!         timestamp: current_timestamp(),
//!     }).await?;
//!
//!     println!("{:?}", events.subscriptions());
//!     Ok(())
//! }
//! ```

// Core modules
pub mod config;
pub mod context;
pub mod events;
pub mod module;
pub mod shutdown;
pub mod system;
pub mod types;
pub mod utils;

// Re-export commonly used items for convenience
pub use config::{ConfigError, ModuleConfig};
pub use context::{DialogModule, SceneContext, ServerError};
pub use module::{ModuleError, RegionModule};
pub use shutdown::ShutdownState;
pub use types::*;
pub use utils::{create_region_event_system, current_timestamp};

pub use events::{
    Event, EventError, EventHandler, FrameEvent, ModuleLoadedEvent, ModuleUnloadedEvent,
    RegionRestartingEvent, RegionStartedEvent, RegionStoppedEvent, RestartAbortedEvent,
    RestartNoticeEvent, RestartScheduledEvent, TypedEventHandler,
};

pub use system::{EventSystem, EventSystemStats};

// External dependencies that modules commonly need
pub use async_trait::async_trait;
pub use std::sync::Arc;
