//! # Region Module Interface
//!
//! This module defines the [`RegionModule`] trait every pluggable region
//! component implements, and the [`ModuleError`] type for lifecycle failures.
//!
//! ## Module Lifecycle
//!
//! 1. **Creation** - The module registry calls the module's factory
//! 2. **Initialisation** - `initialise()` reads configuration and decides whether the module is enabled
//! 3. **Attachment** - `add_region()` for every scene, then `region_loaded()` once all modules are attached
//! 4. **Operation** - The module reacts to bus events and its own timers
//! 5. **Detachment** - `remove_region()` when a scene restarts or stops
//! 6. **Close** - `close()` during process shutdown
//!
//! A shared module instance serves every region; per-region state is keyed by
//! [`RegionId`](crate::RegionId).

use crate::config::{ConfigError, ModuleConfig};
use crate::context::SceneContext;
use crate::events::EventError;
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

/// A pluggable component attached to simulated regions at load time.
///
/// # Examples
///
/// ```rust,no_run
/// use region_event_system::*;
/// use std::sync::Arc;
///
/// struct HelloModule;
///
/// #[async_trait]
/// impl RegionModule for HelloModule {
///     fn name(&self) -> &str { "HelloModule" }
///
///     async fn initialise(&mut self, _config: &ModuleConfig) -> Result<bool, ModuleError> {
///         Ok(true)
///     }
///
///     async fn add_region(&self, scene: Arc<dyn SceneContext>) -> Result<(), ModuleError> {
///         tracing::info!("hello {}", scene.region_info().region_name);
///         Ok(())
///     }
///
///     async fn remove_region(&self, _scene: Arc<dyn SceneContext>) -> Result<(), ModuleError> {
///         Ok(())
///     }
///
///     fn as_any(&self) -> &dyn std::any::Any { self }
/// }
/// ```
#[async_trait]
pub trait RegionModule: Send + Sync + 'static {
    /// Stable module name, used for registry lookup and logging.
    fn name(&self) -> &str;

    /// Reads configuration. Returns `Ok(false)` when the module is disabled
    /// and should not be attached to any region.
    async fn initialise(&mut self, config: &ModuleConfig) -> Result<bool, ModuleError>;

    /// Attaches the module to a scene.
    async fn add_region(&self, scene: Arc<dyn SceneContext>) -> Result<(), ModuleError>;

    /// Called after every module has been added to the scene.
    async fn region_loaded(&self, _scene: Arc<dyn SceneContext>) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Detaches the module from a scene.
    async fn remove_region(&self, scene: Arc<dyn SceneContext>) -> Result<(), ModuleError>;

    /// Releases module-wide resources.
    async fn close(&self) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Enables typed capability lookup through the module manager.
    fn as_any(&self) -> &dyn Any;
}

/// Errors that can occur during region module lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    /// Module configuration is invalid
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
    /// Module failed to attach to or detach from a region
    #[error("Region attachment failed: {0}")]
    Attachment(String),
    /// Event bus registration or emission failed
    #[error("Event error: {0}")]
    Event(#[from] EventError),
    /// Module was asked about a region it does not serve
    #[error("Region not found: {0}")]
    RegionNotFound(String),
    /// Execution error during module operation
    #[error("Execution error: {0}")]
    ExecutionError(String),
}
