//! # Core Type Definitions
//!
//! Identifiers and descriptors shared by the scene, the module system and
//! every region module.
//!
//! ## Key Types
//!
//! - [`RegionId`] - Unique identifier for a simulated region
//! - [`AgentId`] - Unique identifier for an avatar or the system initiator
//! - [`RegionInfo`] - Static description of a region handed to modules

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a simulated region.
///
/// The string form of this id names the region's restart marker file, so it
/// must stay stable across process restarts. Regions configured without an
/// explicit id get a fresh random one.
///
/// # Examples
///
/// ```rust
/// use region_event_system::RegionId;
///
/// let region_id = RegionId::from_str("550e8400-e29b-41d4-a716-446655440000")?;
/// assert_eq!(region_id.to_string(), "550e8400-e29b-41d4-a716-446655440000");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(pub Uuid);

impl RegionId {
    /// Creates a new random region ID using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a region ID from its hyphenated string representation.
    pub fn from_str(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl std::str::FromStr for RegionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str(s)
    }
}

impl Default for RegionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an agent (avatar) in a region.
///
/// [`AgentId::SYSTEM`] (the nil UUID) stands for the simulator itself, e.g.
/// when a restart is initiated from the console rather than by an avatar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub Uuid);

impl AgentId {
    /// The nil agent used for console and system initiated actions.
    pub const SYSTEM: AgentId = AgentId(Uuid::nil());

    /// Creates a new random agent ID using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns true for the system initiator.
    pub fn is_system(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Region Description
// ============================================================================

/// Static information about a region, as seen by region modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionInfo {
    /// Stable region identifier
    pub region_id: RegionId,
    /// Human readable region name
    pub region_name: String,
}

impl RegionInfo {
    pub fn new(region_id: RegionId, region_name: impl Into<String>) -> Self {
        Self {
            region_id,
            region_name: region_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_id_roundtrip_through_string() {
        let id = RegionId::new();
        let parsed: RegionId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_region_id_rejects_garbage() {
        assert!(RegionId::from_str("not-a-uuid").is_err());
    }

    #[test]
    fn test_system_agent_is_nil() {
        assert!(AgentId::SYSTEM.is_system());
        assert!(!AgentId::new().is_system());
        assert_eq!(
            AgentId::SYSTEM.to_string(),
            "00000000-0000-0000-0000-000000000000"
        );
    }
}
