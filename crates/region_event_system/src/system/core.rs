/// Core EventSystem implementation
use crate::events::EventHandler;
use super::stats::EventSystemStats;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Explicit publish/subscribe bus owned by one scene.
///
/// Every subscription is an entry in a key → handler list table, so the
/// complete fan-out of any event can be listed with [`EventSystem::subscriptions`]
/// instead of hiding in multicast delegates. Keys are namespaced:
/// `core:<event>` for simulator events and `module:<module>:<event>` for
/// module-to-module traffic.
///
/// Uses DashMap for lock-free concurrent access to handlers so emission from
/// the frame loop never contends with registration from module setup.
pub struct EventSystem {
    /// Map of event keys to their registered handlers
    pub(super) handlers: DashMap<String, Vec<Arc<dyn EventHandler>>>,
    /// System statistics for monitoring
    pub(super) stats: RwLock<EventSystemStats>,
}

impl std::fmt::Debug for EventSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSystem")
            .field("keys", &self.handlers.len())
            .finish()
    }
}

impl EventSystem {
    /// Creates a new event system with no registered handlers.
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
            stats: RwLock::new(EventSystemStats::default()),
        }
    }

    /// Gets the current event system statistics
    #[inline]
    pub async fn get_stats(&self) -> EventSystemStats {
        self.stats.read().await.clone()
    }

    /// Returns the fan-out table: every event key with the names of the
    /// handlers subscribed to it, sorted by key.
    pub fn subscriptions(&self) -> BTreeMap<String, Vec<String>> {
        self.handlers
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| {
                let names = entry
                    .value()
                    .iter()
                    .map(|handler| handler.handler_name().to_string())
                    .collect();
                (entry.key().clone(), names)
            })
            .collect()
    }

    /// Number of handlers currently subscribed to a key.
    pub fn handler_count(&self, event_key: &str) -> usize {
        self.handlers
            .get(event_key)
            .map(|entry| entry.value().len())
            .unwrap_or(0)
    }
}

impl Default for EventSystem {
    fn default() -> Self {
        Self::new()
    }
}
