//! Integration test suites executed against the runtime bridge.

pub mod orchestrator;

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::any::TypeInfo;
use crate::app::ApplicationLogic;
use crate::bridge::BridgeController;
use crate::manager::PluginManager;
use crate::registry::{Instance, Symbol};

pub use orchestrator::{TestOrchestrator, BASELINE_SUITE};

/// Body of a test case.
pub type CaseExecutor = Arc<dyn Fn(&BridgeController) -> anyhow::Result<Value> + Send + Sync>;

#[derive(Clone)]
pub struct TestCase {
    pub name: String,
    pub description: String,
    executor: CaseExecutor,
}

impl TestCase {
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, executor: F) -> Self
    where
        F: Fn(&BridgeController) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            executor: Arc::new(executor),
        }
    }

    /// Run the case. Failures, panics included, are recorded in the result.
    pub fn run(&self, controller: &BridgeController) -> CaseResult {
        let outcome = catch_unwind(AssertUnwindSafe(|| (self.executor)(controller)))
            .unwrap_or_else(|_| Err(anyhow::anyhow!("test case panicked")));
        let (status, output, error) = match outcome {
            Ok(output) => (CaseStatus::Passed, Some(output), None),
            Err(err) => (CaseStatus::Failed, None, Some(format!("{:#}", err))),
        };
        CaseResult {
            name: self.name.clone(),
            description: self.description.clone(),
            status,
            output,
            error,
        }
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug, Default)]
pub struct TestSuite {
    pub name: String,
    pub description: String,
    cases: Vec<TestCase>,
}

impl TestSuite {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            cases: Vec::new(),
        }
    }

    pub fn add_case(&mut self, case: TestCase) {
        self.cases.push(case);
    }

    pub fn with_case(mut self, case: TestCase) -> Self {
        self.add_case(case);
        self
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    /// Run every case in order.
    pub fn execute(&self, controller: &BridgeController) -> SuiteReport {
        let started_at = Utc::now();
        let results = self.cases.iter().map(|case| case.run(controller)).collect();
        SuiteReport {
            run_id: uuid::Uuid::new_v4().to_string(),
            suite: self.name.clone(),
            description: self.description.clone(),
            results,
            started_at,
            finished_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    Passed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResult {
    pub name: String,
    pub description: String,
    pub status: CaseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub run_id: String,
    pub suite: String,
    pub description: String,
    pub results: Vec<CaseResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.status == CaseStatus::Passed).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }
}

/// A registry value that contributes a test suite.
///
/// The orchestrator walks the registry and asks every provider it finds for a
/// suite, handing it the application and the registry itself.
pub trait SuiteProvider: Send + Sync {
    fn build_suite(&self, app: &ApplicationLogic, manager: &PluginManager) -> anyhow::Result<TestSuite>;
}

/// Registry-storable wrapper around a [`SuiteProvider`].
pub struct SuiteProviderHandle(Arc<dyn SuiteProvider>);

impl SuiteProviderHandle {
    pub fn provider(&self) -> Arc<dyn SuiteProvider> {
        self.0.clone()
    }
}

impl Symbol {
    pub fn suite_provider<P: SuiteProvider + 'static>(provider: P) -> Symbol {
        let handle = Arc::new(SuiteProviderHandle(Arc::new(provider)));
        Symbol::Instance(Instance::with_type(handle, TypeInfo::of::<P>()))
    }

    pub fn as_suite_provider(&self) -> Option<Arc<dyn SuiteProvider>> {
        self.downcast_arc::<SuiteProviderHandle>().map(|handle| handle.provider())
    }
}
