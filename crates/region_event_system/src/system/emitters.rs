/// Event emission methods
use crate::events::{Event, EventError};
use super::core::EventSystem;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tracing::{debug, error};

impl EventSystem {
    /// Emits a core simulator event to all registered handlers.
    #[inline]
    pub async fn emit_core<T>(&self, event_name: &str, event: &T) -> Result<(), EventError>
    where
        T: Event,
    {
        let event_key = format!("core:{event_name}");
        self.emit_event(&event_key, event).await
    }

    /// Emits a module event to all registered handlers.
    #[inline]
    pub async fn emit_module<T>(
        &self,
        module_name: &str,
        event_name: &str,
        event: &T,
    ) -> Result<(), EventError>
    where
        T: Event,
    {
        let event_key = format!("module:{module_name}:{event_name}");
        self.emit_event(&event_key, event).await
    }

    /// Serializes once and runs every subscribed handler concurrently.
    ///
    /// A failing handler is logged and does not stop the others.
    async fn emit_event<T>(&self, event_key: &str, event: &T) -> Result<(), EventError>
    where
        T: Event,
    {
        let data: Arc<[u8]> = Arc::from(event.serialize()?);

        // Clone the list out so no map guard is held across await points.
        let event_handlers = self
            .handlers
            .get(event_key)
            .map(|entry| entry.value().clone());

        let mut stats_handled = false;
        if let Some(event_handlers) = event_handlers {
            if !event_handlers.is_empty() {
                stats_handled = true;
                let mut futures = FuturesUnordered::new();

                for handler in event_handlers.iter() {
                    let data = data.clone();
                    let handler = handler.clone();
                    futures.push(async move {
                        if let Err(e) = handler.handle(&data).await {
                            error!("❌ Handler {} failed: {}", handler.handler_name(), e);
                        }
                    });
                }

                while futures.next().await.is_some() {}
            }
        }

        let mut stats = self.stats.write().await;
        stats.events_emitted += 1;
        if !stats_handled {
            stats.events_unhandled += 1;
            if event_key != "core:frame" {
                debug!("📭 No handlers for event: {}", event_key);
            }
        }

        Ok(())
    }
}
