//! # Utility Functions
//!
//! - [`current_timestamp()`] - Consistent timestamp generation for events
//! - [`create_region_event_system()`] - Event bus factory function

use crate::system::EventSystem;
use std::sync::Arc;

/// Returns the current Unix timestamp in seconds.
///
/// A clock set before the Unix epoch yields 0 rather than panicking.
pub fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// Creates a new, empty event bus ready to be owned by a scene.
pub fn create_region_event_system() -> Arc<EventSystem> {
    Arc::new(EventSystem::new())
}
