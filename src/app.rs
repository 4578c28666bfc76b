//! Application state shared by the front end and the orchestrators:
//! configuration plus the runtime bridge.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::bridge::{BridgeController, BridgeState, RuntimeBackend};
use crate::config::{ConfigStore, RuntimeConfig, DEFAULT_CONFIG_DIR};
use crate::core::errors::Result;
use crate::manager::PluginManager;
use crate::registry::{Namespace, Symbol};

pub const MODULE_ID: &str = "logic";
pub const APPLICATION_SYMBOL: &str = "logic.application";
/// Module holding a snapshot of the current configuration.
pub const CONFIG_MODULE_ID: &str = "runtime_config";

pub struct ApplicationLogic {
    store: ConfigStore,
    bridge: BridgeController,
    manager: Arc<PluginManager>,
}

impl ApplicationLogic {
    /// Open the configuration in the default `config/` directory.
    pub fn new(manager: Arc<PluginManager>) -> Result<Arc<Self>> {
        Self::with_config_dir(manager, DEFAULT_CONFIG_DIR)
    }

    pub fn with_config_dir(manager: Arc<PluginManager>, dir: impl AsRef<Path>) -> Result<Arc<Self>> {
        let logic = Arc::new(Self {
            store: ConfigStore::open(dir)?,
            bridge: BridgeController::new(),
            manager,
        });
        logic.register()?;
        Ok(logic)
    }

    fn register(self: &Arc<Self>) -> Result<()> {
        let namespace = Namespace::for_module(MODULE_ID)
            .class::<ApplicationLogic>("ApplicationLogic")
            .class::<RuntimeConfig>("RuntimeConfig")
            .class::<BridgeController>("BridgeController")
            .class::<BridgeState>("BridgeState");

        let weak = Arc::downgrade(self);
        let namespace = namespace.function("validate_environment", move |_| {
            let logic = weak
                .upgrade()
                .ok_or_else(|| anyhow::anyhow!("application has been dropped"))?;
            Ok(json!(logic.validate_environment()))
        });

        self.manager.register_module(MODULE_ID, &namespace)?;
        self.manager.register_symbol(APPLICATION_SYMBOL, Symbol::shared(self.clone()))?;
        self.manager.register_module(CONFIG_MODULE_ID, &self.store.get())
    }

    pub fn manager(&self) -> &Arc<PluginManager> {
        &self.manager
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        self.store.get()
    }

    pub fn config_store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn bridge_controller(&self) -> &BridgeController {
        &self.bridge
    }

    pub fn attach_backend(&self, backend: Arc<dyn RuntimeBackend>) {
        self.bridge.set_backend(backend);
    }

    /// Apply configuration changes, persist them, and refresh the
    /// `runtime_config` module.
    pub fn update_configuration(&self, updates: &Map<String, Value>) -> Result<()> {
        let updated = self.store.update(updates)?;
        self.manager.register_module(CONFIG_MODULE_ID, &updated)
    }

    pub fn validate_environment(&self) -> IndexMap<String, bool> {
        self.store.get().validate_environment()
    }

    /// Start the bridge with the current configuration.
    pub fn start_bridge(&self) -> Result<()> {
        self.bridge.start(&self.store.get())
    }
}
