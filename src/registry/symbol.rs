//! Values held by the registry.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::any::{downcast_arc, DynAny, TypeInfo};

/// Signature shared by every registered function value.
pub type CallableFn = dyn Fn(&Value) -> anyhow::Result<Value> + Send + Sync;

/// A named function value with an explicit defining module.
#[derive(Clone)]
pub struct Callable {
    module: String,
    name: String,
    func: Arc<CallableFn>,
}

impl Callable {
    pub fn new<M, N, F>(module: M, name: N, func: F) -> Self
    where
        M: Into<String>,
        N: Into<String>,
        F: Fn(&Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            module: module.into(),
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &Value) -> anyhow::Result<Value> {
        (self.func)(args)
    }
}

/// A shared object together with the type it was created from.
#[derive(Clone)]
pub struct Instance {
    value: DynAny,
    type_info: TypeInfo,
}

impl Instance {
    pub(crate) fn with_type(value: DynAny, type_info: TypeInfo) -> Self {
        Self { value, type_info }
    }

    pub fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    pub fn value(&self) -> &DynAny {
        &self.value
    }
}

/// Coarse shape of a [`Symbol`], in descriptor priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Type,
    Callable,
    Instance,
}

/// A registry value.
///
/// Cloning a symbol shares the underlying value; the registry never copies what
/// it stores or hands out.
#[derive(Clone)]
pub enum Symbol {
    /// A class-like value: the type itself rather than one of its instances.
    Type(TypeInfo),
    Callable(Callable),
    Instance(Instance),
}

impl Symbol {
    /// The type `T` as a value.
    pub fn class<T: ?Sized + 'static>() -> Self {
        Symbol::Type(TypeInfo::of::<T>())
    }

    pub fn function<M, N, F>(module: M, name: N, func: F) -> Self
    where
        M: Into<String>,
        N: Into<String>,
        F: Fn(&Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Symbol::Callable(Callable::new(module, name, func))
    }

    /// Move `value` behind a fresh shared handle.
    pub fn instance<T: Any + Send + Sync>(value: T) -> Self {
        Self::shared(Arc::new(value))
    }

    /// Register an already shared object; holders of `value` observe the same
    /// object the registry hands out.
    pub fn shared<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Symbol::Instance(Instance::with_type(value, TypeInfo::of::<T>()))
    }

    /// Plain structured data.
    pub fn value(value: Value) -> Self {
        Self::instance(value)
    }

    pub fn kind(&self) -> SymbolKind {
        match self {
            Symbol::Type(_) => SymbolKind::Type,
            Symbol::Callable(_) => SymbolKind::Callable,
            Symbol::Instance(_) => SymbolKind::Instance,
        }
    }

    /// Human-readable descriptor used by registry snapshots.
    pub fn describe(&self) -> String {
        match self {
            Symbol::Type(info) => format!("class {}", info.qualified()),
            Symbol::Callable(callable) => {
                if callable.module.is_empty() {
                    format!("callable {}", callable.name)
                } else {
                    format!("callable {}::{}", callable.module, callable.name)
                }
            }
            Symbol::Instance(instance) => format!("instance of {}", instance.type_info.qualified()),
        }
    }

    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Symbol::Callable(callable) => Some(callable),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Symbol::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    /// The shared object behind an instance symbol, if it is a `T`.
    pub fn downcast_arc<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.as_instance().and_then(|instance| downcast_arc::<T>(&instance.value))
    }

    /// Attribute a callable with no defining module to `module`. The function
    /// itself stays shared, so identity is unchanged.
    pub(crate) fn in_module(&self, module: &str) -> Symbol {
        match self {
            Symbol::Callable(callable) if callable.module.is_empty() => Symbol::Callable(Callable {
                module: module.to_string(),
                ..callable.clone()
            }),
            other => other.clone(),
        }
    }

    /// Identity comparison: same shared object, same callable, or same type.
    pub fn ptr_eq(&self, other: &Symbol) -> bool {
        match (self, other) {
            (Symbol::Type(a), Symbol::Type(b)) => a == b,
            (Symbol::Callable(a), Symbol::Callable(b)) => Arc::ptr_eq(&a.func, &b.func),
            (Symbol::Instance(a), Symbol::Instance(b)) => Arc::ptr_eq(&a.value, &b.value),
            _ => false,
        }
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Show the data for plain values; everything else by descriptor
        if let Some(value) = self.downcast_arc::<Value>() {
            return write!(f, "Symbol({})", value);
        }
        write!(f, "Symbol({})", self.describe())
    }
}

impl From<Value> for Symbol {
    fn from(value: Value) -> Self {
        Symbol::value(value)
    }
}

impl From<Callable> for Symbol {
    fn from(callable: Callable) -> Self {
        Symbol::Callable(callable)
    }
}
