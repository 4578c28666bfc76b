//! The process-wide plugin manager: registry, loader and event bus behind one
//! shared handle.

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::core::errors::Result;
use crate::events::{EventBus, EventListener};
use crate::loader::{PluginLoader, UnitLoader};
use crate::registry::{Exports, Namespace, RegistrySnapshot, RegistryStore, Symbol};

/// Registrations run once when the shared instance is first built.
///
/// Crates add entries with
/// `#[linkme::distributed_slice(stsm::MODULE_REGISTRATIONS)]` so their modules
/// are discoverable without explicit wiring.
#[linkme::distributed_slice]
pub static MODULE_REGISTRATIONS: [fn(&PluginManager) -> Result<()>] = [..];

lazy_static::lazy_static! {
    static ref INSTANCE: Arc<PluginManager> = PluginManager::bootstrap();
}

/// Registry, dynamic loader and event bus.
///
/// Use [`PluginManager::instance`] for the shared process-wide handle, or
/// [`PluginManager::new`] for an isolated one.
#[derive(Default)]
pub struct PluginManager {
    registry: RegistryStore,
    loader: PluginLoader,
    bus: EventBus,
}

impl PluginManager {
    /// Build an isolated manager. No static registrations are applied.
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared instance, constructed on first access from any thread.
    pub fn instance() -> Arc<PluginManager> {
        Arc::clone(&INSTANCE)
    }

    /// Alias of [`PluginManager::instance`].
    pub fn get_instance() -> Arc<PluginManager> {
        Self::instance()
    }

    fn bootstrap() -> Arc<PluginManager> {
        let manager = Arc::new(PluginManager::new());
        for register_fn in MODULE_REGISTRATIONS {
            if let Err(err) = register_fn(&manager) {
                warn!("Static module registration failed: {}", err);
            }
        }
        debug!("PluginManager initialized");
        manager
    }

    pub fn registry(&self) -> &RegistryStore {
        &self.registry
    }

    pub fn loader(&self) -> &PluginLoader {
        &self.loader
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn register_module(&self, module_id: &str, module: &dyn Exports) -> Result<()> {
        self.registry.register_module(module_id, module)
    }

    pub fn register_symbol(&self, qualified_name: &str, value: Symbol) -> Result<()> {
        self.registry.register_symbol(qualified_name, value)
    }

    pub fn get_symbol(&self, qualified_name: &str) -> Result<Symbol> {
        self.registry.get_symbol(qualified_name)
    }

    pub fn export_registry(&self) -> RegistrySnapshot {
        self.registry.export_registry()
    }

    /// Load the unit at `path` and expose its namespace under the file stem.
    pub fn load_plugin(&self, path: impl AsRef<Path>) -> Result<Namespace> {
        self.loader.load_plugin(path.as_ref(), &self.registry)
    }

    pub fn get_loaded_plugins(&self) -> Vec<String> {
        self.loader.get_loaded_plugins()
    }

    /// Add a loader for files with the given extension.
    pub fn register_unit_loader(&self, extension: &str, loader: Arc<dyn UnitLoader>) {
        self.loader.register_unit_loader(extension, loader)
    }

    pub fn register_event_listener(&self, event_name: &str, listener: Arc<dyn EventListener>) {
        self.bus.register_event_listener(event_name, listener)
    }

    pub fn register_listener_symbol(&self, event_name: &str, symbol: &Symbol) -> Result<()> {
        self.bus.register_listener_symbol(event_name, symbol)
    }

    pub fn dispatch_event(&self, event_name: &str, payload: &Value) {
        self.bus.dispatch_event(event_name, payload)
    }
}

#[linkme::distributed_slice(MODULE_REGISTRATIONS)]
static REGISTER_PLUGIN_MANAGER: fn(&PluginManager) -> Result<()> = register_plugin_manager_module;

fn register_plugin_manager_module(manager: &PluginManager) -> Result<()> {
    let namespace = Namespace::for_module("plugin_manager")
        .class::<PluginManager>("PluginManager")
        .class::<RegistryStore>("RegistryStore")
        .class::<PluginLoader>("PluginLoader")
        .function("export_registry", |_| {
            Ok(serde_json::to_value(PluginManager::instance().export_registry())?)
        })
        .function("get_loaded_plugins", |_| {
            Ok(json!(PluginManager::instance().get_loaded_plugins()))
        });
    manager.register_module("plugin_manager", &namespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolated_managers_do_not_share_state() {
        let a = PluginManager::new();
        let b = PluginManager::new();
        a.register_symbol("tests.only_in_a", Symbol::value(json!(true))).unwrap();
        assert!(a.get_symbol("tests.only_in_a").is_ok());
        assert!(b.get_symbol("tests.only_in_a").unwrap_err().is_not_found());
    }

    #[test]
    fn test_instance_applies_static_registrations() {
        let snapshot = PluginManager::instance().export_registry();
        assert!(snapshot["plugin_manager"].contains_key("PluginManager"));
        assert!(snapshot["events"].contains_key("TESTS_COMPLETED"));
    }
}
