/// Event handler registration methods
use crate::events::{Event, EventError, EventHandler, TypedEventHandler};
use super::core::EventSystem;
use std::sync::Arc;
use tracing::{debug, info};

impl EventSystem {
    /// Registers a handler for core simulator events.
    ///
    /// The handler is named after its key and event type; use
    /// [`EventSystem::on_core_as`] when the subscription must later be
    /// removed with [`EventSystem::unsubscribe`].
    pub async fn on_core<T, F>(&self, event_name: &str, handler: F) -> Result<(), EventError>
    where
        T: Event + 'static,
        F: Fn(T) -> Result<(), EventError> + Send + Sync + Clone + 'static,
    {
        let event_key = format!("core:{event_name}");
        let handler_name = format!("{}::{}", event_key, T::type_name());
        self.register_typed_handler(event_key, handler_name, handler)
            .await
    }

    /// Registers a handler for core events under an explicit subscriber name.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use region_event_system::{EventSystem, FrameEvent};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let events = EventSystem::new();
    /// events.on_core_as("CloudModule", "frame", |event: FrameEvent| {
    ///     println!("frame {}", event.frame);
    ///     Ok(())
    /// }).await?;
    ///
    /// // Later, when the module detaches from the region:
    /// events.unsubscribe("CloudModule").await;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn on_core_as<T, F>(
        &self,
        subscriber: &str,
        event_name: &str,
        handler: F,
    ) -> Result<(), EventError>
    where
        T: Event + 'static,
        F: Fn(T) -> Result<(), EventError> + Send + Sync + Clone + 'static,
    {
        let event_key = format!("core:{event_name}");
        self.register_typed_handler(event_key, subscriber.to_string(), handler)
            .await
    }

    /// Registers a handler for module-to-module events.
    pub async fn on_module<T, F>(
        &self,
        module_name: &str,
        event_name: &str,
        handler: F,
    ) -> Result<(), EventError>
    where
        T: Event + 'static,
        F: Fn(T) -> Result<(), EventError> + Send + Sync + Clone + 'static,
    {
        let event_key = format!("module:{module_name}:{event_name}");
        let handler_name = format!("{}::{}", event_key, T::type_name());
        self.register_typed_handler(event_key, handler_name, handler)
            .await
    }

    /// Removes every handler registered under `subscriber` across all keys.
    ///
    /// Returns the number of handlers removed.
    pub async fn unsubscribe(&self, subscriber: &str) -> usize {
        let mut removed = 0;
        for mut entry in self.handlers.iter_mut() {
            let before = entry.value().len();
            entry
                .value_mut()
                .retain(|handler| handler.handler_name() != subscriber);
            removed += before - entry.value().len();
        }
        self.handlers.retain(|_, handlers| !handlers.is_empty());

        if removed > 0 {
            let mut stats = self.stats.write().await;
            stats.total_handlers = stats.total_handlers.saturating_sub(removed);
            debug!("🧹 Removed {} handler(s) for subscriber {}", removed, subscriber);
        }
        removed
    }

    /// Internal helper shared by every registration method.
    async fn register_typed_handler<T, F>(
        &self,
        event_key: String,
        handler_name: String,
        handler: F,
    ) -> Result<(), EventError>
    where
        T: Event + 'static,
        F: Fn(T) -> Result<(), EventError> + Send + Sync + Clone + 'static,
    {
        let typed_handler = TypedEventHandler::new(handler_name, handler);
        let handler_arc: Arc<dyn EventHandler> = Arc::new(typed_handler);

        self.handlers
            .entry(event_key.clone())
            .or_default()
            .push(handler_arc);

        let mut stats = self.stats.write().await;
        stats.total_handlers += 1;

        info!("📝 Registered handler for {}", event_key);
        Ok(())
    }
}
