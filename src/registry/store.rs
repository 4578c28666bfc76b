//! Qualified-name registry of shared symbols.
//!
//! Two views are kept in step under one lock: a per-module member map used for
//! introspection, and a flat index used for lookups.

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::debug;

use super::namespace::{is_private, Exports};
use super::symbol::Symbol;
use crate::core::errors::{Result, StsmError};

/// Separator between a module id and a member name.
pub const SEPARATOR: char = '.';

/// module id -> member key -> descriptor
pub type RegistrySnapshot = IndexMap<String, IndexMap<String, String>>;

#[derive(Default)]
struct RegistryState {
    module_members: IndexMap<String, IndexMap<String, Symbol>>,
    symbol_index: IndexMap<String, Symbol>,
}

/// Registry of modules and ad hoc symbols.
#[derive(Default)]
pub struct RegistryStore {
    state: RwLock<RegistryState>,
}

impl RegistryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the public surface of `module` under `module_id`.
    ///
    /// The module's bucket is replaced wholesale. Index entries mirrored by an
    /// earlier registration are left in place.
    /// Callables exported without a defining module are attributed to
    /// `module_id`.
    pub fn register_module(&self, module_id: &str, module: &dyn Exports) -> Result<()> {
        if module_id.is_empty() {
            return Err(StsmError::invalid_argument_named("module_id cannot be empty", "module_id"));
        }

        // Collect outside the lock: exports() is caller code
        let namespace = module.exports();
        let public_members: IndexMap<String, Symbol> = namespace
            .iter()
            .filter(|(name, _)| !is_private(name))
            .map(|(name, symbol)| (name.to_string(), symbol.in_module(module_id)))
            .collect();

        let mut state = self.state.write();
        for (name, symbol) in &public_members {
            state
                .symbol_index
                .insert(format!("{}{}{}", module_id, SEPARATOR, name), symbol.clone());
        }
        let count = public_members.len();
        state.module_members.insert(module_id.to_string(), public_members);
        debug!("Registered module {} with {} public members", module_id, count);
        Ok(())
    }

    /// Expose a single value under an arbitrary qualified name.
    ///
    /// The value is also folded into the bucket of the name's first segment,
    /// keyed by the full qualified name.
    pub fn register_symbol(&self, qualified_name: &str, value: Symbol) -> Result<()> {
        if qualified_name.is_empty() {
            return Err(StsmError::invalid_argument_named(
                "qualified_name cannot be empty",
                "qualified_name",
            ));
        }
        let prefix = module_prefix(qualified_name);

        let mut state = self.state.write();
        state.symbol_index.insert(qualified_name.to_string(), value.clone());
        state
            .module_members
            .entry(prefix.to_string())
            .or_default()
            .insert(qualified_name.to_string(), value);
        debug!("Registered dynamic symbol {}", qualified_name);
        Ok(())
    }

    pub fn get_symbol(&self, qualified_name: &str) -> Result<Symbol> {
        self.state
            .read()
            .symbol_index
            .get(qualified_name)
            .cloned()
            .ok_or_else(|| StsmError::not_found("symbol", qualified_name))
    }

    pub fn contains(&self, qualified_name: &str) -> bool {
        self.state.read().symbol_index.contains_key(qualified_name)
    }

    /// Member keys of one module bucket, in registration order.
    pub fn module_members(&self, module_id: &str) -> Option<Vec<String>> {
        self.state
            .read()
            .module_members
            .get(module_id)
            .map(|members| members.keys().cloned().collect())
    }

    pub fn modules(&self) -> Vec<String> {
        self.state.read().module_members.keys().cloned().collect()
    }

    /// Describe every module bucket without exposing the values themselves.
    pub fn export_registry(&self) -> RegistrySnapshot {
        let state = self.state.read();
        state
            .module_members
            .iter()
            .map(|(module_id, members)| {
                let described = members
                    .iter()
                    .map(|(key, symbol)| (key.clone(), symbol.describe()))
                    .collect();
                (module_id.clone(), described)
            })
            .collect()
    }
}

/// Module bucket for an ad hoc symbol: everything before the first separator.
pub fn module_prefix(qualified_name: &str) -> &str {
    qualified_name
        .split_once(SEPARATOR)
        .map(|(prefix, _)| prefix)
        .unwrap_or(qualified_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Namespace;
    use serde_json::json;

    #[test]
    fn test_module_prefix() {
        assert_eq!(module_prefix("tests.custom_symbol"), "tests");
        assert_eq!(module_prefix("a.b.c"), "a");
        assert_eq!(module_prefix("bare"), "bare");
    }

    #[test]
    fn test_private_members_are_skipped() {
        let store = RegistryStore::new();
        let ns = Namespace::new()
            .with("visible", Symbol::value(json!(1)))
            .with("_hidden", Symbol::value(json!(2)));
        store.register_module("m", &ns).unwrap();

        assert!(store.contains("m.visible"));
        assert!(!store.contains("m._hidden"));
        assert_eq!(store.module_members("m").unwrap(), vec!["visible".to_string()]);
    }

    #[test]
    fn test_empty_identifiers_rejected() {
        let store = RegistryStore::new();
        let err = store.register_module("", &Namespace::new()).unwrap_err();
        assert!(matches!(err, StsmError::InvalidArgument { .. }));
        let err = store.register_symbol("", Symbol::value(json!(null))).unwrap_err();
        assert!(matches!(err, StsmError::InvalidArgument { .. }));
    }

    #[test]
    fn test_symbol_bucket_uses_full_name() {
        let store = RegistryStore::new();
        store.register_symbol("main.entry_point", Symbol::value(json!("x"))).unwrap();
        assert_eq!(store.module_members("main").unwrap(), vec!["main.entry_point".to_string()]);
    }

    #[test]
    fn test_last_write_wins() {
        let store = RegistryStore::new();
        let first = Symbol::value(json!(1));
        let second = Symbol::value(json!(2));
        store.register_symbol("cfg.level", first.clone()).unwrap();
        store.register_symbol("cfg.level", second.clone()).unwrap();

        let current = store.get_symbol("cfg.level").unwrap();
        assert_eq!(current, second);
        // Earlier holders keep their own reference
        assert_eq!(*first.downcast_arc::<serde_json::Value>().unwrap(), json!(1));
    }
}
