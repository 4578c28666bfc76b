//! Discovery and execution of test suites.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{SuiteReport, TestCase, TestSuite};
use crate::app::ApplicationLogic;
use crate::core::errors::{Result, StsmError};
use crate::events::TESTS_COMPLETED;
use crate::manager::PluginManager;
use crate::registry::{Namespace, Symbol, SEPARATOR};

pub const MODULE_ID: &str = "testing";
pub const ORCHESTRATOR_SYMBOL: &str = "testing.orchestrator";
/// Built-in readiness suite.
pub const BASELINE_SUITE: &str = "baseline_smoke";

pub struct TestOrchestrator {
    app: Arc<ApplicationLogic>,
    manager: Arc<PluginManager>,
    suites: DashMap<String, TestSuite>,
}

impl TestOrchestrator {
    /// Build the orchestrator, collect built-in and plugin-provided suites,
    /// and register it.
    pub fn new(app: Arc<ApplicationLogic>, manager: Arc<PluginManager>) -> Result<Arc<Self>> {
        let orchestrator = Arc::new(Self {
            app,
            manager,
            suites: DashMap::new(),
        });
        orchestrator.register_builtin_suites();
        orchestrator.discover_plugin_suites();

        let namespace = Namespace::for_module(MODULE_ID)
            .class::<TestOrchestrator>("TestOrchestrator")
            .class::<TestSuite>("TestSuite")
            .class::<TestCase>("TestCase")
            .class::<SuiteReport>("SuiteReport");
        orchestrator.manager.register_module(MODULE_ID, &namespace)?;
        orchestrator
            .manager
            .register_symbol(ORCHESTRATOR_SYMBOL, Symbol::shared(orchestrator.clone()))?;
        Ok(orchestrator)
    }

    fn register_builtin_suites(&self) {
        let validate_app = self.app.clone();
        let classpath_app = self.app.clone();
        let smoke = TestSuite::new(
            BASELINE_SUITE,
            "Validates runtime readiness and configuration completeness.",
        )
        .with_case(TestCase::new(
            "validate_environment",
            "Ensures required configuration paths are present before launching the JVM.",
            move |_| Ok(json!(validate_app.validate_environment())),
        ))
        .with_case(TestCase::new(
            "verify_classpath",
            "Confirms the configured classpath resolves to existing artifacts.",
            move |_| {
                let missing = classpath_app.runtime_config().missing_classpath_entries();
                Ok(json!({ "missing": missing, "classpath_ready": missing.is_empty() }))
            },
        ));
        self.add_suite(smoke);
    }

    pub fn add_suite(&self, suite: TestSuite) {
        self.suites.insert(suite.name.clone(), suite);
    }

    /// Ask every suite provider in the registry for its suite. Returns how many
    /// suites were added or replaced.
    ///
    /// Members are looked up as `<module>.<member>`; bucket entries keyed by a
    /// full qualified name do not resolve that way and are skipped.
    pub fn discover_plugin_suites(&self) -> usize {
        let mut discovered = 0;
        for (module_id, members) in self.manager.export_registry() {
            for member in members.keys() {
                let qualified = format!("{}{}{}", module_id, SEPARATOR, member);
                let Ok(symbol) = self.manager.get_symbol(&qualified) else {
                    continue;
                };
                let Some(provider) = symbol.as_suite_provider() else {
                    continue;
                };
                match provider.build_suite(&self.app, &self.manager) {
                    Ok(suite) => {
                        info!("Discovered test suite {} from {}", suite.name, qualified);
                        self.add_suite(suite);
                        discovered += 1;
                    }
                    Err(err) => warn!("Suite provider {} failed: {:#}", qualified, err),
                }
            }
        }
        discovered
    }

    /// Suite names, sorted.
    pub fn get_suites(&self) -> Vec<String> {
        let mut names: Vec<String> = self.suites.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    /// Run a suite, starting the bridge first if needed, and publish
    /// `tests.completed`.
    pub fn execute_suite(&self, name: &str) -> Result<SuiteReport> {
        // Clone out of the map so no shard lock is held while cases run
        let suite = self
            .suites
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StsmError::not_found("test suite", name))?;

        self.app.start_bridge()?;

        info!("Executing test suite {}", name);
        let report = suite.execute(self.app.bridge_controller());
        let payload: Value = json!({ "suite": name, "results": report });
        self.manager.dispatch_event(TESTS_COMPLETED, &payload);
        Ok(report)
    }
}
