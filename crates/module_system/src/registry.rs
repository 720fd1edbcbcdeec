//! Explicit capability-name → factory registry.

use crate::error::ModuleSystemError;
use region_event_system::RegionModule;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Builds a fresh, uninitialised module instance.
pub type ModuleFactory = Arc<dyn Fn() -> Box<dyn RegionModule> + Send + Sync>;

/// Mapping from module name to the factory that builds it.
///
/// # Examples
///
/// ```rust,ignore
/// let mut registry = ModuleRegistry::new();
/// registry.register("RestartModule", || Box::new(RestartModule::new()))?;
/// let module = registry.create("RestartModule")?;
/// ```
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    factories: BTreeMap<String, ModuleFactory>,
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.names())
            .finish()
    }
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under `name`. Names are unique.
    pub fn register<F>(&mut self, name: &str, factory: F) -> Result<(), ModuleSystemError>
    where
        F: Fn() -> Box<dyn RegionModule> + Send + Sync + 'static,
    {
        if self.factories.contains_key(name) {
            return Err(ModuleSystemError::AlreadyRegistered(name.to_string()));
        }
        self.factories.insert(name.to_string(), Arc::new(factory));
        Ok(())
    }

    /// Instantiates the module registered under `name`.
    pub fn create(&self, name: &str) -> Result<Box<dyn RegionModule>, ModuleSystemError> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| ModuleSystemError::ModuleNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::tests::RecordingModule;

    #[test]
    fn test_register_and_create() {
        let mut registry = ModuleRegistry::new();
        registry
            .register("Recorder", || Box::new(RecordingModule::new("Recorder", true)))
            .unwrap();

        let module = registry.create("Recorder").unwrap();
        assert_eq!(module.name(), "Recorder");
        assert!(registry.contains("Recorder"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut registry = ModuleRegistry::new();
        registry
            .register("Recorder", || Box::new(RecordingModule::new("Recorder", true)))
            .unwrap();
        let result =
            registry.register("Recorder", || Box::new(RecordingModule::new("Recorder", true)));
        assert!(matches!(result, Err(ModuleSystemError::AlreadyRegistered(name)) if name == "Recorder"));
    }

    #[test]
    fn test_unknown_module() {
        let registry = ModuleRegistry::new();
        assert!(matches!(
            registry.create("Missing"),
            Err(ModuleSystemError::ModuleNotFound(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_names_are_sorted() {
        let mut registry = ModuleRegistry::new();
        registry.register("Wind", || Box::new(RecordingModule::new("Wind", true))).unwrap();
        registry.register("Cloud", || Box::new(RecordingModule::new("Cloud", true))).unwrap();
        assert_eq!(registry.names(), vec!["Cloud".to_string(), "Wind".to_string()]);
    }
}
