//! Symbol registry: modules and ad hoc values by qualified name.

pub mod namespace;
pub mod store;
pub mod symbol;

pub use namespace::{is_private, Exports, Namespace, PRIVATE_PREFIX};
pub use store::{module_prefix, RegistrySnapshot, RegistryStore, SEPARATOR};
pub use symbol::{Callable, CallableFn, Instance, Symbol, SymbolKind};
