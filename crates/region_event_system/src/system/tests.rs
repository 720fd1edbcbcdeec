//! Tests for the region event bus

#[cfg(test)]
mod tests {
    use crate::events::{FrameEvent, ModuleLoadedEvent, RestartAbortedEvent};
    use crate::types::RegionId;
    use crate::EventSystem;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_core_event_reaches_every_subscriber() {
        let events = EventSystem::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        for subscriber in ["clouds", "wind"] {
            let received = received.clone();
            events
                .on_core_as(subscriber, "frame", move |event: FrameEvent| {
                    received.lock().unwrap().push((subscriber, event.frame));
                    Ok(())
                })
                .await
                .unwrap();
        }

        events
            .emit_core("frame", &FrameEvent { region_id: RegionId::new(), frame: 3 })
            .await
            .unwrap();

        let mut received = received.lock().unwrap().clone();
        received.sort();
        assert_eq!(received, vec![("clouds", 3), ("wind", 3)]);

        let stats = events.get_stats().await;
        assert_eq!(stats.total_handlers, 2);
        assert_eq!(stats.events_emitted, 1);
        assert_eq!(stats.events_unhandled, 0);
    }

    #[tokio::test]
    async fn test_subscriptions_table_lists_fan_out() {
        let events = EventSystem::new();
        events
            .on_core_as("CloudModule", "frame", |_: FrameEvent| Ok(()))
            .await
            .unwrap();
        events
            .on_module("RestartModule", "aborted", |_: RestartAbortedEvent| Ok(()))
            .await
            .unwrap();

        let table = events.subscriptions();
        assert_eq!(table.len(), 2);
        assert_eq!(table["core:frame"], vec!["CloudModule".to_string()]);
        assert!(table.contains_key("module:RestartModule:aborted"));
    }

    #[tokio::test]
    async fn test_unsubscribe_removes_only_named_handlers() {
        let events = EventSystem::new();
        events.on_core_as("CloudModule", "frame", |_: FrameEvent| Ok(())).await.unwrap();
        events.on_core_as("WindModule", "frame", |_: FrameEvent| Ok(())).await.unwrap();
        events.on_core_as("CloudModule", "module_loaded", |_: ModuleLoadedEvent| Ok(())).await.unwrap();

        let removed = events.unsubscribe("CloudModule").await;

        assert_eq!(removed, 2);
        assert_eq!(events.handler_count("core:frame"), 1);
        assert_eq!(events.handler_count("core:module_loaded"), 0);
        assert!(!events.subscriptions().contains_key("core:module_loaded"));
        assert_eq!(events.get_stats().await.total_handlers, 1);
    }

    #[tokio::test]
    async fn test_emit_without_handlers_is_counted() {
        let events = EventSystem::new();
        events
            .emit_core("frame", &FrameEvent { region_id: RegionId::new(), frame: 1 })
            .await
            .unwrap();

        let stats = events.get_stats().await;
        assert_eq!(stats.events_emitted, 1);
        assert_eq!(stats.events_unhandled, 1);
    }

    #[tokio::test]
    async fn test_failing_handler_does_not_block_others() {
        let events = EventSystem::new();
        let hits = Arc::new(Mutex::new(0));

        events
            .on_core_as("broken", "frame", |_: FrameEvent| {
                Err(crate::EventError::HandlerExecution("boom".to_string()))
            })
            .await
            .unwrap();
        let hits_clone = hits.clone();
        events
            .on_core_as("healthy", "frame", move |_: FrameEvent| {
                *hits_clone.lock().unwrap() += 1;
                Ok(())
            })
            .await
            .unwrap();

        let result = events
            .emit_core("frame", &FrameEvent { region_id: RegionId::new(), frame: 9 })
            .await;

        assert!(result.is_ok());
        assert_eq!(*hits.lock().unwrap(), 1);
    }
}
