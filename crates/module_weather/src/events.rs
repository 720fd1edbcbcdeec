//! Module events published by the weather modules.
//!
//! Both are emitted as `module:<ModuleName>:<event>` on the scene's bus after
//! each grid update, so other modules can react without holding a reference
//! to the weather modules.

use region_event_system::RegionId;
use serde::{Deserialize, Serialize};

/// `module:CloudModule:cover_updated`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudCoverUpdatedEvent {
    pub region_id: RegionId,
    pub frame: u64,
    /// Mean cover over the whole grid, in [0, 1)
    pub mean_cover: f32,
}

/// `module:WindModule:wind_updated`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindUpdatedEvent {
    pub region_id: RegionId,
    pub frame: u64,
    pub model: String,
    /// Largest wind speed on the grid, in m/s
    pub max_speed: f32,
}
