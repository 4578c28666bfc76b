use std::{
    any::{type_name, Any, TypeId},
    fmt,
    hash::Hash,
    sync::Arc,
};

/// A [`TypeId`] together with the type's path, split into defining module and
/// bare name so registry snapshots can describe values without importing them.
#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    path: &'static str,
    module: &'static str,
    name: &'static str,
}

impl TypeInfo {
    /// Returns the [`TypeInfo`] of the type this generic function has been
    /// instantiated with.
    pub fn of<T: ?Sized + 'static>() -> Self {
        let path = type_name::<T>();
        let (module, name) = split_type_path(path);
        TypeInfo {
            id: TypeId::of::<T>(),
            path,
            module,
            name,
        }
    }

    /// Gets the [`TypeId`].
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Full path as reported by [`type_name`].
    pub fn path(&self) -> &'static str {
        self.path
    }

    /// Module the type is defined in; empty for primitives.
    pub fn module(&self) -> &'static str {
        self.module
    }

    /// Bare type name including any generic arguments.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// `module::Name`, or just `Name` for primitives.
    pub fn qualified(&self) -> String {
        if self.module.is_empty() {
            self.name.to_string()
        } else {
            format!("{}::{}", self.module, self.name)
        }
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path)
    }
}

impl Hash for TypeInfo {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &TypeInfo) -> bool {
        self.id.eq(&other.id)
    }
}

impl Eq for TypeInfo {}

impl PartialOrd for TypeInfo {
    fn partial_cmp(&self, other: &TypeInfo) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeInfo {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

/// Split `a::b::Name<c::D>` into (`a::b`, `Name<c::D>`).
///
/// Only the part before the first `<` is searched for the separator so that
/// paths inside generic arguments stay with the name.
pub fn split_type_path(path: &str) -> (&str, &str) {
    let head_end = path.find('<').unwrap_or(path.len());
    match path[..head_end].rfind("::") {
        Some(idx) => (&path[..idx], &path[idx + 2..]),
        None => ("", path),
    }
}

/// A shared, type-erased value.
pub type DynAny = Arc<dyn Any + Send + Sync>;

/// Recover the concrete `Arc<T>` behind a [`DynAny`] without copying.
pub fn downcast_arc<T: Any + Send + Sync>(value: &DynAny) -> Option<Arc<T>> {
    Arc::clone(value).downcast::<T>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker;

    #[test]
    fn test_split_plain_path() {
        assert_eq!(split_type_path("stsm::generator::ModOrchestrator"), ("stsm::generator", "ModOrchestrator"));
        assert_eq!(split_type_path("u32"), ("", "u32"));
    }

    #[test]
    fn test_split_ignores_generic_arguments() {
        assert_eq!(
            split_type_path("alloc::vec::Vec<alloc::string::String>"),
            ("alloc::vec", "Vec<alloc::string::String>")
        );
    }

    #[test]
    fn test_type_info_of_local_type() {
        let info = TypeInfo::of::<Marker>();
        assert_eq!(info.name(), "Marker");
        assert!(info.module().ends_with("any::tests"));
        assert_eq!(info, TypeInfo::of::<Marker>());
        assert_ne!(info, TypeInfo::of::<u8>());
    }

    #[test]
    fn test_downcast_arc_preserves_identity() {
        let original = Arc::new(String::from("shared"));
        let erased: DynAny = original.clone();
        let back = downcast_arc::<String>(&erased).expect("string");
        assert!(Arc::ptr_eq(&original, &back));
        assert!(downcast_arc::<u64>(&erased).is_none());
    }
}
