//! Dynamic loading of plugin units.
//!
//! A unit is a file on disk that a [`UnitLoader`] turns into a [`Namespace`].
//! The loader is chosen by file extension; the namespace is registered under
//! the file stem. Loaded units are trusted: a loader runs with the full
//! privileges of the host process and nothing here sandboxes it.

pub mod document;

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::core::errors::{Result, StsmError};
use crate::registry::{Namespace, RegistryStore};

pub use document::{CaseAction, CaseSpec, DocumentLoader, PluginDocument, SuiteSpec};

/// Turns a unit on disk into a namespace of named values.
pub trait UnitLoader: Send + Sync {
    /// Load `path` as the plugin `plugin_id`. Errors are reported to the caller
    /// of `load_plugin` as load failures.
    fn load(&self, plugin_id: &str, path: &Path) -> Result<Namespace>;
}

/// A plugin that loaded successfully.
#[derive(Clone, Debug)]
pub struct LoadedPlugin {
    pub id: String,
    pub path: PathBuf,
    pub namespace: Namespace,
    pub loaded_at: DateTime<Utc>,
}

/// Extension-dispatched loader plus the table of loaded plugins.
pub struct PluginLoader {
    loaders: RwLock<HashMap<String, Arc<dyn UnitLoader>>>,
    loaded: RwLock<IndexMap<String, LoadedPlugin>>,
}

impl Default for PluginLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginLoader {
    /// A loader that understands YAML and JSON plugin documents.
    pub fn new() -> Self {
        let document: Arc<dyn UnitLoader> = Arc::new(DocumentLoader);
        let mut loaders: HashMap<String, Arc<dyn UnitLoader>> = HashMap::new();
        for extension in DocumentLoader::EXTENSIONS {
            loaders.insert(extension.to_string(), document.clone());
        }
        Self {
            loaders: RwLock::new(loaders),
            loaded: RwLock::new(IndexMap::new()),
        }
    }

    /// Add or replace the loader for `extension` (without the leading dot).
    pub fn register_unit_loader(&self, extension: &str, loader: Arc<dyn UnitLoader>) {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        debug!("Registered unit loader for .{}", extension);
        self.loaders.write().insert(extension, loader);
    }

    pub fn supported_extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self.loaders.read().keys().cloned().collect();
        extensions.sort();
        extensions
    }

    /// Load the unit at `path`, register its namespace under the file stem,
    /// and record it. Loading the same stem again replaces the namespace.
    pub fn load_plugin(&self, path: &Path, registry: &RegistryStore) -> Result<Namespace> {
        if !path.exists() {
            return Err(StsmError::not_found("plugin path", path.display().to_string()));
        }
        let plugin_id = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| {
                StsmError::invalid_argument_named(
                    format!("cannot derive a plugin id from '{}'", path.display()),
                    "path",
                )
            })?;

        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        let loader = self.loaders.read().get(&extension).cloned().ok_or_else(|| {
            StsmError::load_failure(
                &plugin_id,
                format!("unable to load plugin from '{}': no loader for '.{}'", path.display(), extension),
            )
        })?;

        let namespace = run_loader(loader.as_ref(), &plugin_id, path)?;

        self.loaded.write().insert(
            plugin_id.clone(),
            LoadedPlugin {
                id: plugin_id.clone(),
                path: path.to_path_buf(),
                namespace: namespace.clone(),
                loaded_at: Utc::now(),
            },
        );
        registry.register_module(&plugin_id, &namespace)?;
        info!("Loaded plugin {} ({} members)", plugin_id, namespace.len());
        Ok(namespace)
    }

    /// Plugin ids in first-load order.
    pub fn get_loaded_plugins(&self) -> Vec<String> {
        self.loaded.read().keys().cloned().collect()
    }

    pub fn loaded_plugin(&self, plugin_id: &str) -> Option<LoadedPlugin> {
        self.loaded.read().get(plugin_id).cloned()
    }
}

/// Run a loader, turning every failure, panics included, into a load failure.
fn run_loader(loader: &dyn UnitLoader, plugin_id: &str, path: &Path) -> Result<Namespace> {
    match catch_unwind(AssertUnwindSafe(|| loader.load(plugin_id, path))) {
        Ok(Ok(namespace)) => Ok(namespace),
        Ok(Err(err @ StsmError::LoadFailure { .. })) => Err(err),
        Ok(Err(err)) => Err(StsmError::load_failure_with_source(
            plugin_id,
            "unit failed to initialize",
            err,
        )),
        Err(_) => Err(StsmError::load_failure(plugin_id, "unit panicked while loading")),
    }
}
