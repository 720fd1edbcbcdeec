//! Module system for registering, loading and attaching region modules.
//!
//! Modules are made available through an explicit [`ModuleRegistry`] that
//! maps a capability name to a factory function. The host populates the
//! registry at startup from a fixed list; nothing is discovered by scanning
//! libraries or attributes. The [`ModuleManager`] then instantiates the
//! configured modules and drives their lifecycle against each scene.

mod error;
mod manager;
mod registry;

pub use error::ModuleSystemError;
pub use manager::ModuleManager;
pub use registry::{ModuleFactory, ModuleRegistry};

/// Re-export commonly used types for module development
pub use region_event_system::{ModuleConfig, ModuleError, RegionModule, SceneContext};
