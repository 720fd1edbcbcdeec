use region_event_system::{
    async_trait, create_region_event_system, DialogModule, EventSystem, FrameEvent, RegionId,
    RegionInfo, SceneContext, ServerError,
};
use std::sync::Arc;

#[derive(Debug)]
pub struct TestScene {
    pub info: RegionInfo,
    pub events: Arc<EventSystem>,
}

impl TestScene {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            info: RegionInfo::new(RegionId::new(), "Weather Test"),
            events: create_region_event_system(),
        })
    }

    pub fn region_id(&self) -> RegionId {
        self.info.region_id
    }

    pub async fn frame(&self, frame: u64) {
        self.events
            .emit_core(
                "frame",
                &FrameEvent {
                    region_id: self.info.region_id,
                    frame,
                },
            )
            .await
            .unwrap();
    }
}

#[async_trait]
impl SceneContext for TestScene {
    fn region_info(&self) -> RegionInfo {
        self.info.clone()
    }

    fn events(&self) -> Arc<EventSystem> {
        self.events.clone()
    }

    fn root_agent_count(&self) -> usize {
        0
    }

    async fn restart_now(&self) -> Result<(), ServerError> {
        Ok(())
    }

    async fn request_shutdown(&self) -> Result<(), ServerError> {
        Ok(())
    }

    fn dialog(&self) -> Option<Arc<dyn DialogModule>> {
        None
    }
}

/// Lets spawned update tasks run to completion on the test runtime.
pub async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}
