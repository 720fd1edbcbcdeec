//! # Cloud Module
//!
//! Keeps a 16×16 cloud cover grid per region. Every `cloud_update_rate`
//! frames the grid diffuses: each cell takes the mean of its 3×3 neighbourhood
//! (wrapping at the region edges), adds the configured density and wraps back
//! below 1.
//!
//! Updates run on their own task. A frame that comes due while the previous
//! update is still running is skipped rather than queued.

use crate::events::CloudCoverUpdatedEvent;
use crate::grid::{cell_index, GRID_CELLS, GRID_SIZE};
use async_trait::async_trait;
use dashmap::DashMap;
use rand::Rng;
use region_event_system::{
    EventSystem, FrameEvent, ModuleConfig, ModuleError, RegionId, RegionModule, SceneContext,
};
use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

pub const MODULE_NAME: &str = "CloudModule";

/// Cover value per grid cell, row-major.
pub type CloudCover = [f32; GRID_CELLS];

/// Settings from the `[Cloud]` config section.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudSettings {
    pub enabled: bool,
    pub density: f32,
    /// Frames between two cover updates
    pub update_rate: u64,
}

impl Default for CloudSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            density: 0.5,
            update_rate: 1000,
        }
    }
}

impl CloudSettings {
    pub fn from_config(config: &ModuleConfig) -> Self {
        let defaults = Self::default();
        Self {
            enabled: config.get_or("Cloud", "enabled", defaults.enabled),
            density: config.get_or("Cloud", "density", defaults.density),
            update_rate: config
                .get_or("Cloud", "cloud_update_rate", defaults.update_rate)
                .max(1),
        }
    }
}

/// Random starting cover scaled by density.
pub fn initial_cover<R: Rng>(rng: &mut R, density: f32) -> CloudCover {
    let mut cover = [0.0; GRID_CELLS];
    for cell in cover.iter_mut() {
        *cell = rng.gen::<f32>() * density;
    }
    cover
}

/// One diffusion step over a toroidal grid.
pub fn diffuse(cover: &CloudCover, density: f32) -> CloudCover {
    let mut next = [0.0; GRID_CELLS];

    for y in 0..GRID_SIZE {
        let rows = [(y + GRID_SIZE - 1) % GRID_SIZE, y, (y + 1) % GRID_SIZE];
        for x in 0..GRID_SIZE {
            let columns = [(x + GRID_SIZE - 1) % GRID_SIZE, x, (x + 1) % GRID_SIZE];

            let mut sum = 0.0;
            for row in rows {
                for column in columns {
                    sum += cover[row * GRID_SIZE + column];
                }
            }

            let mut value = sum / 9.0 + density;
            while value >= 1.0 {
                value -= 1.0;
            }
            next[y * GRID_SIZE + x] = value;
        }
    }

    next
}

fn mean(cover: &CloudCover) -> f32 {
    cover.iter().sum::<f32>() / GRID_CELLS as f32
}

#[derive(Clone)]
struct RegionClouds {
    cover: Arc<RwLock<CloudCover>>,
    gate: Arc<Mutex<()>>,
    updates: Arc<AtomicU64>,
}

impl RegionClouds {
    fn new(cover: CloudCover) -> Self {
        Self {
            cover: Arc::new(RwLock::new(cover)),
            gate: Arc::new(Mutex::new(())),
            updates: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Starts an update task unless one is already running.
    fn dispatch_update(
        &self,
        region_id: RegionId,
        frame: u64,
        density: f32,
        events: Weak<EventSystem>,
    ) {
        let Ok(permit) = self.gate.clone().try_lock_owned() else {
            debug!("☁️ Cloud update for region {} still running; frame {} skipped", region_id, frame);
            return;
        };

        let cover = self.cover.clone();
        let updates = self.updates.clone();
        tokio::spawn(async move {
            let _permit = permit;

            let mean_cover = {
                let mut cover = cover.write().await;
                *cover = diffuse(&cover, density);
                mean(&cover)
            };
            updates.fetch_add(1, Ordering::SeqCst);

            let Some(events) = events.upgrade() else {
                return;
            };
            let event = CloudCoverUpdatedEvent {
                region_id,
                frame,
                mean_cover,
            };
            if let Err(e) = events.emit_module(MODULE_NAME, "cover_updated", &event).await {
                warn!("⚠️ Failed to publish cloud cover for region {}: {}", region_id, e);
            }
        });
    }
}

/// Region module simulating cloud cover.
#[derive(Clone, Default)]
pub struct CloudModule {
    settings: CloudSettings,
    regions: Arc<DashMap<RegionId, RegionClouds>>,
}

impl CloudModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: CloudSettings) -> Self {
        Self {
            settings,
            regions: Arc::default(),
        }
    }

    pub fn settings(&self) -> &CloudSettings {
        &self.settings
    }

    /// Cover at a region position in metres; height is ignored.
    pub async fn cloud_cover(&self, region_id: RegionId, x: f32, y: f32, _z: f32) -> Option<f32> {
        let cover = self.regions.get(&region_id)?.cover.clone();
        let cover = cover.read().await;
        Some(cover[cell_index(x, y)])
    }

    pub async fn cover_grid(&self, region_id: RegionId) -> Option<CloudCover> {
        let cover = self.regions.get(&region_id)?.cover.clone();
        let grid = *cover.read().await;
        Some(grid)
    }

    /// Number of completed cover updates for a region.
    pub fn update_count(&self, region_id: RegionId) -> Option<u64> {
        self.regions
            .get(&region_id)
            .map(|region| region.updates.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl RegionModule for CloudModule {
    fn name(&self) -> &str {
        MODULE_NAME
    }

    async fn initialise(&mut self, config: &ModuleConfig) -> Result<bool, ModuleError> {
        self.settings = CloudSettings::from_config(config);
        if self.settings.enabled {
            info!(
                "☁️ CloudModule enabled: density {}, update every {} frames",
                self.settings.density, self.settings.update_rate
            );
        }
        Ok(self.settings.enabled)
    }

    async fn add_region(&self, scene: Arc<dyn SceneContext>) -> Result<(), ModuleError> {
        let region_id = scene.region_info().region_id;
        let density = self.settings.density;
        let cover = {
            let mut rng = rand::thread_rng();
            initial_cover(&mut rng, density)
        };
        let clouds = RegionClouds::new(cover);
        self.regions.insert(region_id, clouds.clone());

        if density == 0.0 {
            debug!("☁️ Cloud density is zero; cover for region {} stays static", region_id);
            return Ok(());
        }

        let events = scene.events();
        let bus = Arc::downgrade(&events);
        let update_rate = self.settings.update_rate;
        events
            .on_core_as(MODULE_NAME, "frame", move |event: FrameEvent| {
                if event.frame % update_rate == 0 {
                    clouds.dispatch_update(event.region_id, event.frame, density, bus.clone());
                }
                Ok(())
            })
            .await?;

        debug!("☁️ CloudModule attached to region {}", region_id);
        Ok(())
    }

    async fn remove_region(&self, scene: Arc<dyn SceneContext>) -> Result<(), ModuleError> {
        let region_id = scene.region_info().region_id;
        scene.events().unsubscribe(MODULE_NAME).await;
        self.regions.remove(&region_id);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{settle, TestScene};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn module(update_rate: u64, density: f32) -> CloudModule {
        CloudModule::with_settings(CloudSettings {
            enabled: true,
            density,
            update_rate,
        })
    }

    #[test]
    fn test_settings_from_config() {
        let config = ModuleConfig::from_toml_str(
            "[Cloud]\nenabled = true\ndensity = 0.25\ncloud_update_rate = 0\n",
        )
        .unwrap();
        let settings = CloudSettings::from_config(&config);
        assert!(settings.enabled);
        assert_eq!(settings.density, 0.25);
        assert_eq!(settings.update_rate, 1);

        assert_eq!(CloudSettings::from_config(&ModuleConfig::default()), CloudSettings::default());
    }

    #[test]
    fn test_initial_cover_scaled_by_density() {
        let mut rng = StdRng::seed_from_u64(7);
        let cover = initial_cover(&mut rng, 0.3);
        assert!(cover.iter().all(|cell| (0.0..0.3).contains(cell)));
        assert!(cover.iter().any(|cell| *cell > 0.0));
    }

    #[test]
    fn test_diffuse_uniform_grid_adds_density_and_wraps() {
        let next = diffuse(&[0.25; GRID_CELLS], 0.5);
        assert!(next.iter().all(|cell| (cell - 0.75).abs() < 1e-6));

        let wrapped = diffuse(&[0.75; GRID_CELLS], 0.5);
        assert!(wrapped.iter().all(|cell| (cell - 0.25).abs() < 1e-6));
    }

    #[test]
    fn test_diffuse_wraps_exact_one_to_zero() {
        let next = diffuse(&[0.5; GRID_CELLS], 0.5);
        assert!(next.iter().all(|cell| *cell == 0.0));
    }

    #[test]
    fn test_diffuse_spreads_across_edges() {
        let mut cover = [0.0; GRID_CELLS];
        cover[0] = 0.9;

        let next = diffuse(&cover, 0.0);

        let corner = GRID_CELLS - 1;
        let right_edge = GRID_SIZE - 1;
        let bottom_edge = (GRID_SIZE - 1) * GRID_SIZE;
        for index in [0, 1, GRID_SIZE, GRID_SIZE + 1, corner, right_edge, bottom_edge] {
            assert!((next[index] - 0.1).abs() < 1e-6, "cell {index}");
        }
        assert_eq!(next[2], 0.0);
        assert!((mean(&next) - mean(&cover)).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_disabled_by_default() {
        let mut module = CloudModule::new();
        assert!(!module.initialise(&ModuleConfig::default()).await.unwrap());
    }

    #[tokio::test]
    async fn test_updates_follow_frame_rate() {
        let module = module(10, 0.1);
        let scene = TestScene::new();
        module.add_region(scene.clone()).await.unwrap();

        for frame in 1..=25 {
            scene.frame(frame).await;
            settle().await;
        }

        assert_eq!(module.update_count(scene.region_id()), Some(2));
    }

    #[tokio::test]
    async fn test_overlapping_update_is_skipped() {
        let module = module(10, 0.1);
        let scene = TestScene::new();
        module.add_region(scene.clone()).await.unwrap();

        scene.frame(10).await;
        scene.frame(20).await;
        settle().await;

        assert_eq!(module.update_count(scene.region_id()), Some(1));
    }

    #[tokio::test]
    async fn test_zero_density_never_subscribes() {
        let module = module(10, 0.0);
        let scene = TestScene::new();
        module.add_region(scene.clone()).await.unwrap();

        assert_eq!(scene.events.handler_count("core:frame"), 0);
        assert!(module
            .cover_grid(scene.region_id())
            .await
            .unwrap()
            .iter()
            .all(|cell| *cell == 0.0));
    }

    #[tokio::test]
    async fn test_cloud_cover_samples_cells() {
        let module = module(10, 0.5);
        let scene = TestScene::new();
        let region_id = scene.region_id();
        module.add_region(scene.clone()).await.unwrap();

        {
            let region = module.regions.get(&region_id).unwrap().clone();
            let mut cover = region.cover.write().await;
            cover[cell_index(40.0, 200.0)] = 0.42;
        }

        assert_eq!(module.cloud_cover(region_id, 40.0, 200.0, 25.0).await, Some(0.42));
        assert_eq!(module.cloud_cover(RegionId::new(), 0.0, 0.0, 0.0).await, None);
    }

    #[tokio::test]
    async fn test_remove_region_unsubscribes() {
        let module = module(10, 0.5);
        let scene = TestScene::new();
        module.add_region(scene.clone()).await.unwrap();
        assert_eq!(scene.events.handler_count("core:frame"), 1);

        module.remove_region(scene.clone()).await.unwrap();

        assert_eq!(scene.events.handler_count("core:frame"), 0);
        assert_eq!(module.update_count(scene.region_id()), None);
    }
}
