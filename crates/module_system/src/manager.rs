//! Module manager driving the lifecycle of configured region modules.

use crate::error::ModuleSystemError;
use crate::registry::ModuleRegistry;
use dashmap::DashMap;
use region_event_system::{
    current_timestamp, ModuleConfig, ModuleLoadedEvent, ModuleUnloadedEvent, RegionModule,
    SceneContext,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Information about a loaded module
struct LoadedModule {
    /// Position in load order; attachment follows it, detachment reverses it
    order: usize,
    module: Arc<dyn RegionModule>,
}

/// Module manager for instantiating and attaching region modules.
///
/// The `ModuleManager` handles the complete lifecycle of modules:
/// - Instantiation through the explicit [`ModuleRegistry`]
/// - Configuration via `initialise`, skipping modules that report disabled
/// - Attaching every module to each scene, then signalling `region_loaded`
/// - Detaching modules from scenes on restart or stop
/// - Closing modules at process shutdown
///
/// A failure inside one module is logged and isolated; the remaining modules
/// keep going.
pub struct ModuleManager {
    registry: ModuleRegistry,
    loaded_modules: DashMap<String, LoadedModule>,
    next_order: AtomicUsize,
}

impl ModuleManager {
    pub fn new(registry: ModuleRegistry) -> Self {
        Self {
            registry,
            loaded_modules: DashMap::new(),
            next_order: AtomicUsize::new(0),
        }
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Instantiates and initialises the named modules in order.
    ///
    /// Every name is checked against the registry before anything is
    /// created, so a typo in the configuration loads nothing. Returns the
    /// number of modules that ended up enabled.
    pub async fn load_modules(
        &self,
        names: &[String],
        config: &ModuleConfig,
    ) -> Result<usize, ModuleSystemError> {
        if let Some(unknown) = names.iter().find(|name| !self.registry.contains(name)) {
            return Err(ModuleSystemError::ModuleNotFound(unknown.clone()));
        }

        info!("🔌 Loading {} region module(s)", names.len());
        let mut loaded_count = 0;

        for name in names {
            if self.loaded_modules.contains_key(name) {
                warn!("⚠️ Module {} listed twice, ignoring duplicate", name);
                continue;
            }

            let mut module = self.registry.create(name)?;
            match module.initialise(config).await {
                Ok(true) => {
                    let order = self.next_order.fetch_add(1, Ordering::SeqCst);
                    self.loaded_modules.insert(
                        name.clone(),
                        LoadedModule {
                            order,
                            module: Arc::from(module),
                        },
                    );
                    info!("✅ Module enabled: {}", name);
                    loaded_count += 1;
                }
                Ok(false) => {
                    info!("⏸️ Module disabled by configuration: {}", name);
                }
                Err(e) => {
                    // Continue loading other modules even if one fails
                    error!("❌ Module initialization failed for {}: {}", name, e);
                }
            }
        }

        info!("🎉 Module loading complete: {}/{} enabled", loaded_count, names.len());
        Ok(loaded_count)
    }

    /// Attaches every loaded module to `scene`, then calls `region_loaded`.
    ///
    /// Returns the number of modules attached without error.
    pub async fn add_region(&self, scene: Arc<dyn SceneContext>) -> usize {
        let region = scene.region_info();
        let modules = self.ordered_modules();
        let mut attached = Vec::with_capacity(modules.len());

        for (name, module) in &modules {
            match module.add_region(scene.clone()).await {
                Ok(()) => attached.push((name.clone(), module.clone())),
                Err(e) => error!(
                    "❌ Module {} failed to attach to region {}: {}",
                    name, region.region_name, e
                ),
            }
        }

        for (name, module) in &attached {
            if let Err(e) = module.region_loaded(scene.clone()).await {
                error!("❌ Module {} failed region_loaded for {}: {}", name, region.region_name, e);
            }

            let event = ModuleLoadedEvent {
                module_name: name.clone(),
                timestamp: current_timestamp(),
            };
            if let Err(e) = scene.events().emit_core("module_loaded", &event).await {
                warn!("⚠️ Failed to emit module_loaded for {}: {}", name, e);
            }
        }

        info!(
            "🧩 Region {} attached to {}/{} module(s)",
            region.region_name,
            attached.len(),
            modules.len()
        );
        attached.len()
    }

    /// Detaches every loaded module from `scene` in reverse load order.
    pub async fn remove_region(&self, scene: Arc<dyn SceneContext>) {
        let region = scene.region_info();
        let mut modules = self.ordered_modules();
        modules.reverse();

        for (name, module) in modules {
            if let Err(e) = module.remove_region(scene.clone()).await {
                error!("❌ Module {} failed to detach from {}: {}", name, region.region_name, e);
            }

            let event = ModuleUnloadedEvent {
                module_name: name.clone(),
                timestamp: current_timestamp(),
            };
            if let Err(e) = scene.events().emit_core("module_unloaded", &event).await {
                warn!("⚠️ Failed to emit module_unloaded for {}: {}", name, e);
            }
        }
    }

    /// Closes all modules in reverse load order and forgets them.
    pub async fn shutdown(&self) {
        let mut modules = self.ordered_modules();
        modules.reverse();
        info!("🛑 Shutting down {} module(s)", modules.len());

        for (name, module) in modules {
            match module.close().await {
                Ok(()) => info!("✅ Module closed: {}", name),
                Err(e) => error!("❌ Module close failed for {}: {}", name, e),
            }
            self.loaded_modules.remove(&name);
        }
    }

    pub fn module_count(&self) -> usize {
        self.loaded_modules.len()
    }

    /// Loaded module names in load order.
    pub fn module_names(&self) -> Vec<String> {
        self.ordered_modules()
            .into_iter()
            .map(|(name, _)| name)
            .collect()
    }

    pub fn is_module_loaded(&self, name: &str) -> bool {
        self.loaded_modules.contains_key(name)
    }

    /// Looks a loaded module up by name.
    pub fn find(&self, name: &str) -> Option<Arc<dyn RegionModule>> {
        self.loaded_modules
            .get(name)
            .map(|entry| entry.value().module.clone())
    }

    /// Typed capability lookup: returns a handle to the first loaded module
    /// of concrete type `T`.
    pub fn get<T>(&self) -> Option<T>
    where
        T: RegionModule + Clone,
    {
        self.ordered_modules()
            .into_iter()
            .find_map(|(_, module)| module.as_any().downcast_ref::<T>().cloned())
    }

    fn ordered_modules(&self) -> Vec<(String, Arc<dyn RegionModule>)> {
        let mut modules: Vec<(usize, String, Arc<dyn RegionModule>)> = self
            .loaded_modules
            .iter()
            .map(|entry| {
                (
                    entry.value().order,
                    entry.key().clone(),
                    entry.value().module.clone(),
                )
            })
            .collect();
        modules.sort_by_key(|(order, _, _)| *order);
        modules
            .into_iter()
            .map(|(_, name, module)| (name, module))
            .collect()
    }
}
