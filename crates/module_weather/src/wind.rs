//! # Wind Module
//!
//! Per-region 16×16 wind vector grid, recomputed every `wind_update_rate`
//! frames by a pluggable [`WindModel`].
//!
//! ## Models
//!
//! Models are picked by name (`Wind.wind_plugin`) from an explicit table, see
//! [`wind_models`]. An unknown name falls back to [`SimpleRandomWind`].
//!
//! | Model | Behaviour |
//! |-------|-----------|
//! | `SimpleRandomWind` | every cell random in [-1, 1] × `strength` |
//! | `ConfigurableWind` | uniform prevailing wind around an average strength and direction |

use crate::events::WindUpdatedEvent;
use crate::grid::{cell_index, Vec2, GRID_CELLS};
use async_trait::async_trait;
use dashmap::DashMap;
use rand::Rng;
use region_event_system::{
    EventSystem, FrameEvent, ModuleConfig, ModuleError, RegionId, RegionModule, SceneContext,
};
use std::any::Any;
use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

pub const MODULE_NAME: &str = "WindModule";
pub const DEFAULT_WIND_MODEL: &str = "SimpleRandomWind";

/// Wind vector per grid cell, row-major.
pub type WindGrid = [Vec2; GRID_CELLS];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WindError {
    #[error("Wind model {model} has no parameter '{param}'")]
    UnknownParameter { model: String, param: String },
    #[error("Region {0} is not served by the wind module")]
    RegionNotFound(RegionId),
}

/// A wind generator plugged into the wind module.
pub trait WindModel: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Reads model parameters from the `[Wind]` section.
    fn configure(&mut self, config: &ModuleConfig);

    /// Recomputes the grid.
    fn update(&mut self, grid: &mut WindGrid);

    /// Tunable parameters with their descriptions.
    fn params(&self) -> BTreeMap<&'static str, &'static str>;

    fn get_param(&self, param: &str) -> Option<f32>;

    fn set_param(&mut self, param: &str, value: f32) -> Result<(), WindError>;
}

fn unknown_parameter(model: &dyn WindModel, param: &str) -> WindError {
    WindError::UnknownParameter {
        model: model.name().to_string(),
        param: param.to_string(),
    }
}

// ============================================================================
// Simple random wind
// ============================================================================

/// Independent random vector per cell.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleRandomWind {
    strength: f32,
}

impl Default for SimpleRandomWind {
    fn default() -> Self {
        Self { strength: 1.0 }
    }
}

impl WindModel for SimpleRandomWind {
    fn name(&self) -> &'static str {
        "SimpleRandomWind"
    }

    fn description(&self) -> &'static str {
        "Random wind vector per cell, scaled by strength"
    }

    fn configure(&mut self, config: &ModuleConfig) {
        self.strength = config.get_or("Wind", "strength", self.strength);
    }

    fn update(&mut self, grid: &mut WindGrid) {
        let mut rng = rand::thread_rng();
        for cell in grid.iter_mut() {
            cell.x = rng.gen_range(-1.0f32..=1.0) * self.strength;
            cell.y = rng.gen_range(-1.0f32..=1.0) * self.strength;
        }
    }

    fn params(&self) -> BTreeMap<&'static str, &'static str> {
        BTreeMap::from([("strength", "wind strength")])
    }

    fn get_param(&self, param: &str) -> Option<f32> {
        param.eq_ignore_ascii_case("strength").then_some(self.strength)
    }

    fn set_param(&mut self, param: &str, value: f32) -> Result<(), WindError> {
        if !param.eq_ignore_ascii_case("strength") {
            return Err(unknown_parameter(self, param));
        }
        self.strength = value;
        Ok(())
    }
}

// ============================================================================
// Configurable prevailing wind
// ============================================================================

/// Region-wide prevailing wind swinging around an average over the day.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurableWind {
    avg_strength: f32,
    /// Degrees
    avg_direction: f32,
    var_strength: f32,
    /// Degrees
    var_direction: f32,
    rate_change: f32,
}

impl Default for ConfigurableWind {
    fn default() -> Self {
        Self {
            avg_strength: 5.0,
            avg_direction: 0.0,
            var_strength: 5.0,
            var_direction: 30.0,
            rate_change: 1.0,
        }
    }
}

impl ConfigurableWind {
    /// Wind for a moment of the day, `day_fraction` in [0, 1).
    pub fn prevailing_wind(&self, day_fraction: f64) -> Vec2 {
        let avg_angle = f64::from(self.avg_direction).to_radians();
        let var_angle = f64::from(self.var_direction).to_radians();

        let theta = day_fraction * 2.0 * PI * f64::from(self.rate_change);
        let swing = theta.sin() * (theta * 2.0).sin() * (theta * 9.0).sin() * (theta * 4.0).cos();
        let direction = avg_angle + var_angle * swing;

        let gust = theta.sin() * (theta * 4.0).sin() + (theta * 13.0).sin() / 3.0;
        let speed = (f64::from(self.avg_strength) + f64::from(self.var_strength) * gust).abs();

        Vec2::new((direction.cos() * speed) as f32, (direction.sin() * speed) as f32)
    }

    fn param_mut(&mut self, param: &str) -> Option<&mut f32> {
        match param.to_ascii_lowercase().as_str() {
            "avgstrength" | "avg_strength" => Some(&mut self.avg_strength),
            "avgdirection" | "avg_direction" => Some(&mut self.avg_direction),
            "varstrength" | "var_strength" => Some(&mut self.var_strength),
            "vardirection" | "var_direction" => Some(&mut self.var_direction),
            "ratechange" | "rate_change" => Some(&mut self.rate_change),
            _ => None,
        }
    }
}

fn day_fraction_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| (elapsed.as_secs() % 86_400) as f64 / 86_400.0)
        .unwrap_or(0.0)
}

impl WindModel for ConfigurableWind {
    fn name(&self) -> &'static str {
        "ConfigurableWind"
    }

    fn description(&self) -> &'static str {
        "Prevailing wind with configurable average and variation"
    }

    fn configure(&mut self, config: &ModuleConfig) {
        self.avg_strength = config.get_or("Wind", "avg_strength", self.avg_strength);
        self.avg_direction = config.get_or("Wind", "avg_direction", self.avg_direction);
        self.var_strength = config.get_or("Wind", "var_strength", self.var_strength);
        self.var_direction = config.get_or("Wind", "var_direction", self.var_direction);
        self.rate_change = config.get_or("Wind", "rate_change", self.rate_change);
    }

    fn update(&mut self, grid: &mut WindGrid) {
        grid.fill(self.prevailing_wind(day_fraction_now()));
    }

    fn params(&self) -> BTreeMap<&'static str, &'static str> {
        BTreeMap::from([
            ("avgStrength", "average wind strength"),
            ("avgDirection", "average wind direction in degrees"),
            ("varStrength", "allowable variance in wind strength"),
            ("varDirection", "allowable variance in wind direction in +/- degrees"),
            ("rateChange", "rate of change"),
        ])
    }

    fn get_param(&self, param: &str) -> Option<f32> {
        let value = match param.to_ascii_lowercase().as_str() {
            "avgstrength" | "avg_strength" => self.avg_strength,
            "avgdirection" | "avg_direction" => self.avg_direction,
            "varstrength" | "var_strength" => self.var_strength,
            "vardirection" | "var_direction" => self.var_direction,
            "ratechange" | "rate_change" => self.rate_change,
            _ => return None,
        };
        Some(value)
    }

    fn set_param(&mut self, param: &str, value: f32) -> Result<(), WindError> {
        if self.get_param(param).is_none() {
            return Err(unknown_parameter(self, param));
        }
        if let Some(slot) = self.param_mut(param) {
            *slot = value;
        }
        Ok(())
    }
}

// ============================================================================
// Model registry
// ============================================================================

pub type WindModelFactory = fn() -> Box<dyn WindModel>;

/// Every wind model the module can run, by name.
pub fn wind_models() -> BTreeMap<&'static str, WindModelFactory> {
    let mut models: BTreeMap<&'static str, WindModelFactory> = BTreeMap::new();
    models.insert("SimpleRandomWind", || Box::new(SimpleRandomWind::default()) as Box<dyn WindModel>);
    models.insert("ConfigurableWind", || Box::new(ConfigurableWind::default()) as Box<dyn WindModel>);
    models
}

/// Creates a model by case-insensitive name, falling back to the default.
pub fn create_wind_model(name: &str) -> Box<dyn WindModel> {
    let models = wind_models();
    if let Some(factory) = models
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
        .map(|(_, factory)| *factory)
    {
        return factory();
    }

    warn!(
        "⚠️ Unknown wind model '{}', using {} (available: {:?})",
        name,
        DEFAULT_WIND_MODEL,
        models.keys().collect::<Vec<_>>()
    );
    Box::new(SimpleRandomWind::default())
}

// ============================================================================
// Module
// ============================================================================

/// Settings from the `[Wind]` config section.
#[derive(Debug, Clone, PartialEq)]
pub struct WindSettings {
    pub enabled: bool,
    /// Frames between two wind updates
    pub update_rate: u64,
    pub model: String,
}

impl Default for WindSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            update_rate: 150,
            model: DEFAULT_WIND_MODEL.to_string(),
        }
    }
}

impl WindSettings {
    pub fn from_config(config: &ModuleConfig) -> Self {
        let defaults = Self::default();
        Self {
            enabled: config.get_or("Wind", "enabled", defaults.enabled),
            update_rate: config
                .get_or("Wind", "wind_update_rate", defaults.update_rate)
                .max(1),
            model: config.get_or("Wind", "wind_plugin", defaults.model),
        }
    }
}

#[derive(Clone)]
struct RegionWind {
    model: Arc<Mutex<Box<dyn WindModel>>>,
    grid: Arc<RwLock<WindGrid>>,
    updates: Arc<AtomicU64>,
}

impl RegionWind {
    async fn update(&self, region_id: RegionId, frame: u64, events: Weak<EventSystem>) {
        let (model, max_speed) = {
            let mut model = self.model.lock().await;
            let mut grid = self.grid.write().await;
            model.update(&mut grid);
            let max_speed = grid.iter().map(Vec2::length).fold(0.0f32, f32::max);
            (model.name().to_string(), max_speed)
        };
        self.updates.fetch_add(1, Ordering::SeqCst);

        let Some(events) = events.upgrade() else {
            return;
        };
        let event = WindUpdatedEvent {
            region_id,
            frame,
            model,
            max_speed,
        };
        if let Err(e) = events.emit_module(MODULE_NAME, "wind_updated", &event).await {
            warn!("⚠️ Failed to publish wind for region {}: {}", region_id, e);
        }
    }
}

/// Region module simulating wind.
#[derive(Clone, Default)]
pub struct WindModule {
    settings: WindSettings,
    config: ModuleConfig,
    regions: Arc<DashMap<RegionId, RegionWind>>,
}

impl WindModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: WindSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &WindSettings {
        &self.settings
    }

    fn region(&self, region_id: RegionId) -> Result<RegionWind, WindError> {
        self.regions
            .get(&region_id)
            .map(|region| region.clone())
            .ok_or(WindError::RegionNotFound(region_id))
    }

    /// Wind at a region position in metres; height is ignored.
    pub async fn wind_speed(&self, region_id: RegionId, x: f32, y: f32, _z: f32) -> Option<Vec2> {
        let region = self.region(region_id).ok()?;
        let grid = region.grid.read().await;
        Some(grid[cell_index(x, y)])
    }

    pub async fn model_name(&self, region_id: RegionId) -> Option<&'static str> {
        let region = self.region(region_id).ok()?;
        let model = region.model.lock().await;
        Some(model.name())
    }

    pub async fn params(&self, region_id: RegionId) -> Result<BTreeMap<String, f32>, WindError> {
        let region = self.region(region_id)?;
        let model = region.model.lock().await;
        Ok(model
            .params()
            .keys()
            .filter_map(|param| model.get_param(param).map(|value| (param.to_string(), value)))
            .collect())
    }

    pub async fn get_param(&self, region_id: RegionId, param: &str) -> Result<f32, WindError> {
        let region = self.region(region_id)?;
        let model = region.model.lock().await;
        model
            .get_param(param)
            .ok_or_else(|| unknown_parameter(&**model, param))
    }

    pub async fn set_param(&self, region_id: RegionId, param: &str, value: f32) -> Result<(), WindError> {
        let region = self.region(region_id)?;
        let mut model = region.model.lock().await;
        model.set_param(param, value)?;
        info!("🌬️ Wind {} set to {} in region {}", param, value, region_id);
        Ok(())
    }

    /// Recomputes a region's wind immediately.
    pub async fn update_now(&self, region_id: RegionId) -> Result<(), WindError> {
        self.region(region_id)?.update(region_id, 0, Weak::new()).await;
        Ok(())
    }

    /// Number of completed wind updates for a region.
    pub fn update_count(&self, region_id: RegionId) -> Option<u64> {
        self.regions
            .get(&region_id)
            .map(|region| region.updates.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl RegionModule for WindModule {
    fn name(&self) -> &str {
        MODULE_NAME
    }

    async fn initialise(&mut self, config: &ModuleConfig) -> Result<bool, ModuleError> {
        self.settings = WindSettings::from_config(config);
        self.config = config.clone();
        if self.settings.enabled {
            info!(
                "🌬️ WindModule enabled: model {}, update every {} frames",
                self.settings.model, self.settings.update_rate
            );
        }
        Ok(self.settings.enabled)
    }

    async fn add_region(&self, scene: Arc<dyn SceneContext>) -> Result<(), ModuleError> {
        let region_id = scene.region_info().region_id;

        let mut model = create_wind_model(&self.settings.model);
        model.configure(&self.config);
        let mut grid = [Vec2::ZERO; GRID_CELLS];
        model.update(&mut grid);

        let wind = RegionWind {
            model: Arc::new(Mutex::new(model)),
            grid: Arc::new(RwLock::new(grid)),
            updates: Arc::new(AtomicU64::new(0)),
        };
        self.regions.insert(region_id, wind.clone());

        let events = scene.events();
        let bus = Arc::downgrade(&events);
        let update_rate = self.settings.update_rate;
        events
            .on_core_as(MODULE_NAME, "frame", move |event: FrameEvent| {
                if event.frame % update_rate == 0 {
                    let wind = wind.clone();
                    let bus = bus.clone();
                    tokio::spawn(async move {
                        wind.update(event.region_id, event.frame, bus).await;
                    });
                }
                Ok(())
            })
            .await?;

        debug!("🌬️ WindModule attached to region {}", region_id);
        Ok(())
    }

    async fn remove_region(&self, scene: Arc<dyn SceneContext>) -> Result<(), ModuleError> {
        scene.events().unsubscribe(MODULE_NAME).await;
        self.regions.remove(&scene.region_info().region_id);
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

    #[test]
    fn test_settings_from_config() {
        let config = ModuleConfig::from_toml_str(
            "[Wind]\nenabled = false\nwind_update_rate = 20\nwind_plugin = \"ConfigurableWind\"\n",
        )
        .unwrap();
        let settings = WindSettings::from_config(&config);
        assert!(!settings.enabled);
        assert_eq!(settings.update_rate, 20);
        assert_eq!(settings.model, "ConfigurableWind");
        assert_eq!(WindSettings::from_config(&ModuleConfig::default()), WindSettings::default());
    }

    #[test]
    fn test_simple_random_wind_stays_within_strength() {
        let mut model = SimpleRandomWind::default();
        model.set_param("strength", 3.0).unwrap();
        let mut grid = [Vec2::ZERO; GRID_CELLS];

        model.update(&mut grid);

        assert!(grid
            .iter()
            .all(|cell| cell.x.abs() <= 3.0 && cell.y.abs() <= 3.0));
        assert!(grid.iter().any(|cell| *cell != Vec2::ZERO));
    }

    #[test]
    fn test_configurable_wind_at_start_of_day() {
        let model = ConfigurableWind::default();
        let wind = model.prevailing_wind(0.0);
        // theta = 0: no swing from the average direction, average strength
        assert!((wind.x - 5.0).abs() < 1e-5);
        assert!(wind.y.abs() < 1e-5);
    }

    #[test]
    fn test_configurable_wind_fills_uniform_grid() {
        let mut model = ConfigurableWind::default();
        let config = ModuleConfig::from_toml_str("[Wind]\navg_strength = 2.0\nvar_strength = 0.0\n").unwrap();
        model.configure(&config);
        let mut grid = [Vec2::ZERO; GRID_CELLS];

        model.update(&mut grid);

        assert!(grid.iter().all(|cell| *cell == grid[0]));
        assert!((grid[0].length() - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_configurable_wind_params() {
        let mut model = ConfigurableWind::default();
        model.set_param("avgDirection", 90.0).unwrap();
        assert_eq!(model.get_param("avg_direction"), Some(90.0));
        assert_eq!(model.params().len(), 5);
        assert!(matches!(
            model.set_param("gustiness", 1.0),
            Err(WindError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn test_model_registry_lookup_and_fallback() {
        assert_eq!(
            wind_models().keys().copied().collect::<Vec<_>>(),
            vec!["ConfigurableWind", "SimpleRandomWind"]
        );
        assert_eq!(create_wind_model("configurablewind").name(), "ConfigurableWind");
        assert_eq!(create_wind_model("Hurricane").name(), DEFAULT_WIND_MODEL);
    }

    #[tokio::test]
    async fn test_region_wind_updates_on_frames() {
        let module = WindModule::with_settings(WindSettings {
            update_rate: 5,
            ..WindSettings::default()
        });
        let scene = TestScene::new();
        let region_id = scene.region_id();
        module.add_region(scene.clone()).await.unwrap();

        for frame in 1..=12 {
            scene.frame(frame).await;
        }
        settle().await;

        assert_eq!(module.update_count(region_id), Some(2));
        assert_eq!(module.model_name(region_id).await, Some("SimpleRandomWind"));
        let wind = module.wind_speed(region_id, 128.0, 128.0, 30.0).await.unwrap();
        assert!(wind.x.abs() <= 1.0 && wind.y.abs() <= 1.0);
    }

    #[tokio::test]
    async fn test_params_through_module() {
        let config = ModuleConfig::from_toml_str(
            "[Wind]\nwind_plugin = \"ConfigurableWind\"\navg_strength = 8.0\n",
        )
        .unwrap();
        let mut module = WindModule::new();
        assert!(module.initialise(&config).await.unwrap());
        let scene = TestScene::new();
        let region_id = scene.region_id();
        module.add_region(scene.clone()).await.unwrap();

        assert_eq!(module.get_param(region_id, "avgStrength").await, Ok(8.0));
        module.set_param(region_id, "avgStrength", 1.5).await.unwrap();
        assert_eq!(module.params(region_id).await.unwrap()["avgStrength"], 1.5);
        module.update_now(region_id).await.unwrap();

        let missing = RegionId::new();
        assert_eq!(
            module.get_param(missing, "avgStrength").await,
            Err(WindError::RegionNotFound(missing))
        );
    }

    #[tokio::test]
    async fn test_remove_region_unsubscribes() {
        let module = WindModule::new();
        let scene = TestScene::new();
        module.add_region(scene.clone()).await.unwrap();
        assert_eq!(scene.events.handler_count("core:frame"), 1);

        module.remove_region(scene.clone()).await.unwrap();

        assert_eq!(scene.events.handler_count("core:frame"), 0);
        assert_eq!(module.wind_speed(scene.region_id(), 0.0, 0.0, 0.0).await, None);
    }
}
