/// Statistics tracking for the event system
use serde::{Deserialize, Serialize};

/// Core event system statistics for monitoring
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct EventSystemStats {
    /// Total number of registered event handlers
    pub total_handlers: usize,
    /// Total number of events emitted since system start
    pub events_emitted: u64,
    /// Events emitted with nobody subscribed to their key
    pub events_unhandled: u64,
}
