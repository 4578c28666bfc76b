//! Declarative plugin documents (YAML or JSON).
//!
//! ```yaml
//! exports:
//!   greeting: hello
//! suites:
//!   - name: plugin_smoke
//!     cases:
//!       - name: version
//!         class: com.example.Version
//!         method: get
//!       - name: prepare
//!         symbol: main.environment_preparer
//!         args: {}
//! ```
//!
//! Every export becomes a plain value; every suite becomes a test-suite
//! provider picked up by the test orchestrator.

use std::path::Path;

use anyhow::anyhow;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::UnitLoader;
use crate::app::ApplicationLogic;
use crate::core::errors::{Result, StsmError};
use crate::manager::PluginManager;
use crate::registry::{Namespace, Symbol};
use crate::testing::{SuiteProvider, TestCase, TestSuite};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginDocument {
    #[serde(default)]
    pub exports: IndexMap<String, Value>,
    #[serde(default)]
    pub suites: Vec<SuiteSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cases: Vec<CaseSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub action: CaseAction,
}

/// What a declared test case does when run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CaseAction {
    /// Call a static method through the runtime bridge.
    Static {
        class: String,
        method: String,
        #[serde(default)]
        args: Vec<Value>,
    },
    /// Call a function registered in the symbol registry.
    Symbol {
        symbol: String,
        #[serde(default)]
        args: Value,
    },
}

impl PluginDocument {
    pub fn parse(text: &str, format: &str) -> Result<Self> {
        match format {
            "json" => Ok(serde_json::from_str(text)?),
            _ => Ok(serde_yaml::from_str(text)?),
        }
    }

    /// The namespace a loaded document exposes.
    pub fn into_namespace(self, plugin_id: &str) -> Result<Namespace> {
        let mut namespace = Namespace::for_module(plugin_id);
        for (name, value) in self.exports {
            namespace.insert(name, Symbol::value(value));
        }
        for suite in self.suites {
            if namespace.contains(&suite.name) {
                return Err(StsmError::load_failure(
                    plugin_id,
                    format!("suite '{}' clashes with an export of the same name", suite.name),
                ));
            }
            namespace.insert(suite.name.clone(), Symbol::suite_provider(DeclaredSuite(suite)));
        }
        Ok(namespace)
    }
}

/// Loads `.yaml`, `.yml` and `.json` plugin documents.
pub struct DocumentLoader;

impl DocumentLoader {
    pub const EXTENSIONS: [&'static str; 3] = ["yaml", "yml", "json"];
}

impl UnitLoader for DocumentLoader {
    fn load(&self, plugin_id: &str, path: &Path) -> Result<Namespace> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            StsmError::load_failure_with_source(plugin_id, format!("cannot read '{}'", path.display()), err)
        })?;
        let format = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        let document = PluginDocument::parse(&text, &format)
            .map_err(|err| StsmError::load_failure_with_source(plugin_id, "invalid plugin document", err))?;
        document.into_namespace(plugin_id)
    }
}

/// A suite declared in a plugin document.
struct DeclaredSuite(SuiteSpec);

impl SuiteProvider for DeclaredSuite {
    fn build_suite(&self, _app: &ApplicationLogic, manager: &PluginManager) -> anyhow::Result<TestSuite> {
        let spec = &self.0;
        let mut suite = TestSuite::new(&spec.name, &spec.description);
        for case in &spec.cases {
            let test_case = match &case.action {
                CaseAction::Static { class, method, args } => {
                    let (class, method, args) = (class.clone(), method.clone(), args.clone());
                    TestCase::new(&case.name, &case.description, move |controller| {
                        Ok(controller.execute_static(&class, &method, &args)?)
                    })
                }
                CaseAction::Symbol { symbol, args } => {
                    // Resolved now so a missing symbol rejects the whole suite
                    let callable = manager
                        .get_symbol(symbol)?
                        .as_callable()
                        .cloned()
                        .ok_or_else(|| anyhow!("symbol '{}' is not callable", symbol))?;
                    let args = args.clone();
                    TestCase::new(&case.name, &case.description, move |_| callable.call(&args))
                }
            };
            suite.add_case(test_case);
        }
        Ok(suite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const YAML: &str = r#"
exports:
  greeting: hello
  limits:
    max_cards: 75
suites:
  - name: plugin_smoke
    description: checks the plugin
    cases:
      - name: version
        class: com.example.Version
        method: get
        args: [1]
      - name: ping
        symbol: hooks.ping
"#;

    #[test]
    fn test_parse_yaml_document() {
        let doc = PluginDocument::parse(YAML, "yaml").unwrap();
        assert_eq!(doc.exports["greeting"], json!("hello"));
        assert_eq!(doc.suites.len(), 1);
        let cases = &doc.suites[0].cases;
        assert!(matches!(&cases[0].action, CaseAction::Static { method, args, .. } if method == "get" && args == &vec![json!(1)]));
        assert!(matches!(&cases[1].action, CaseAction::Symbol { symbol, args } if symbol == "hooks.ping" && args.is_null()));
    }

    #[test]
    fn test_namespace_contains_exports_and_suites() {
        let ns = PluginDocument::parse(YAML, "yaml").unwrap().into_namespace("extras").unwrap();
        let names: Vec<&str> = ns.names().collect();
        assert_eq!(names, vec!["greeting", "limits", "plugin_smoke"]);
        assert!(ns.get("plugin_smoke").unwrap().as_suite_provider().is_some());
    }

    #[test]
    fn test_unknown_top_level_key_rejected() {
        assert!(PluginDocument::parse("{\"exprts\": {}}", "json").is_err());
        assert!(PluginDocument::parse("- just\n- a list\n", "yaml").is_err());
    }

    #[test]
    fn test_suite_name_clash() {
        let doc = PluginDocument::parse(
            "exports:\n  smoke: 1\nsuites:\n  - name: smoke\n",
            "yaml",
        )
        .unwrap();
        let err = doc.into_namespace("clash").unwrap_err();
        assert!(matches!(err, StsmError::LoadFailure { .. }));
    }
}
