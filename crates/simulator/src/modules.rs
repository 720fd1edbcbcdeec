//! The region modules this simulator knows how to build.
//!
//! Every module is listed here by name; `[simulator] modules` in the
//! configuration picks which of them are loaded and in what order.

use module_restart::RestartModule;
use module_system::{ModuleRegistry, ModuleSystemError};
use module_weather::{CloudModule, WindModule};

pub fn default_registry() -> Result<ModuleRegistry, ModuleSystemError> {
    let mut registry = ModuleRegistry::new();
    registry.register(module_restart::MODULE_NAME, || Box::new(RestartModule::new()))?;
    registry.register(module_weather::cloud::MODULE_NAME, || Box::new(CloudModule::new()))?;
    registry.register(module_weather::wind::MODULE_NAME, || Box::new(WindModule::new()))?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use module_system::RegionModule;

    #[test]
    fn test_default_registry_lists_every_module() {
        let registry = default_registry().unwrap();
        assert_eq!(
            registry.names(),
            vec!["CloudModule", "RestartModule", "WindModule"]
        );
    }

    #[test]
    fn test_factories_build_matching_modules() {
        let registry = default_registry().unwrap();
        for name in registry.names() {
            let module = registry.create(&name).unwrap();
            assert_eq!(module.name(), name);
        }
    }
}
