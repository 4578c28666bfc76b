// Lets `#[derive(Exports)]` expand to `::stsm::...` paths inside this crate too
extern crate self as stsm;

// Core infrastructure modules
pub mod core;
pub mod any;

// Plugin system
pub mod registry;   // Symbols, namespaces and the qualified-name index
pub mod events;     // Named event bus
pub mod loader;     // Plugin files to namespaces
pub mod manager;    // Process-wide facade

// Collaborators registered through the plugin system
pub mod config;
pub mod bridge;
pub mod app;
pub mod testing;
pub mod generator;

// Re-exports for convenience
pub use core::errors::{Result, StsmError};
pub use core::logging::init_logging;
pub use events::{EventBus, EventListener, MOD_GENERATION_POST, MOD_GENERATION_PRE, TESTS_COMPLETED};
pub use loader::{PluginLoader, UnitLoader};
pub use manager::{PluginManager, MODULE_REGISTRATIONS};
pub use registry::{Callable, Exports, Instance, Namespace, RegistryStore, Symbol, SymbolKind};
pub use stsm_macros::Exports;

pub use app::ApplicationLogic;
pub use bridge::{BridgeController, BridgeState, RuntimeBackend};
pub use config::{ConfigStore, RuntimeConfig};
pub use generator::{CardDefinition, KeywordDefinition, ModDefinition, ModOrchestrator};
pub use testing::{SuiteProvider, TestCase, TestOrchestrator, TestSuite};
