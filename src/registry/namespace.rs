use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

use super::symbol::Symbol;

/// Marker prefix for members that are never exposed through the registry.
pub const PRIVATE_PREFIX: char = '_';

/// Returns true for names that `register_module` skips.
pub fn is_private(name: &str) -> bool {
    name.starts_with(PRIVATE_PREFIX)
}

/// An insertion-ordered set of named symbols: the public surface of a module,
/// an object, or a loaded plugin.
#[derive(Clone, Default, Debug)]
pub struct Namespace {
    module: String,
    members: IndexMap<String, Symbol>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// A namespace whose functions are reported as defined in `module`.
    pub fn for_module(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            members: IndexMap::new(),
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    /// Insert or replace a member, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, symbol: Symbol) -> Option<Symbol> {
        self.members.insert(name.into(), symbol)
    }

    pub fn with(mut self, name: impl Into<String>, symbol: Symbol) -> Self {
        self.insert(name, symbol);
        self
    }

    /// Expose the type `T` under `name`.
    pub fn class<T: ?Sized + 'static>(self, name: impl Into<String>) -> Self {
        self.with(name, Symbol::class::<T>())
    }

    /// Expose a function defined in this namespace's module.
    pub fn function<F>(self, name: &str, func: F) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let symbol = Symbol::function(self.module.clone(), name, func);
        self.with(name, symbol)
    }

    pub fn shared<T: std::any::Any + Send + Sync>(self, name: impl Into<String>, value: Arc<T>) -> Self {
        self.with(name, Symbol::shared(value))
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.members.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Symbol)> {
        self.members.iter().map(|(name, symbol)| (name.as_str(), symbol))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Explicit public surface of a registrable module or object.
///
/// Derivable for structs with `#[derive(Exports)]`, which exposes every `pub`
/// field not starting with `_` and not marked `#[exports(skip)]`.
pub trait Exports {
    fn exports(&self) -> Namespace;
}

impl Exports for Namespace {
    fn exports(&self) -> Namespace {
        self.clone()
    }
}

impl<T: Exports + ?Sized> Exports for Arc<T> {
    fn exports(&self) -> Namespace {
        (**self).exports()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Card;

    #[test]
    fn test_builder_keeps_insertion_order() {
        let ns = Namespace::for_module("cards")
            .function("upgrade", |v| Ok(v.clone()))
            .class::<Card>("Card")
            .with("DEFAULT_COST", Symbol::value(json!(1)));

        let names: Vec<&str> = ns.names().collect();
        assert_eq!(names, vec!["upgrade", "Card", "DEFAULT_COST"]);
        assert_eq!(ns.get("upgrade").unwrap().describe(), "callable cards::upgrade");
    }

    #[test]
    fn test_private_names() {
        assert!(is_private("_cache"));
        assert!(!is_private("cache"));
    }
}
