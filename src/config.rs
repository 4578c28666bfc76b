//! Persisted runtime configuration.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::bridge::expand_home;
use crate::core::errors::{Result, StsmError};
use crate::Exports;

/// Default directory holding `runtime_config.json`.
pub const DEFAULT_CONFIG_DIR: &str = "config";
pub const CONFIG_FILE_NAME: &str = "runtime_config.json";

/// Locations of the game runtime and modding libraries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Exports)]
#[serde(default)]
pub struct RuntimeConfig {
    pub java_home: String,
    pub modthespire_jar: String,
    pub basemod_path: String,
    pub stslib_path: String,
    pub actlikeit_path: String,
    pub enabled_libraries: Vec<String>,
    pub suppress_dependency_modal: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            java_home: String::new(),
            modthespire_jar: String::new(),
            basemod_path: String::new(),
            stslib_path: String::new(),
            actlikeit_path: String::new(),
            enabled_libraries: vec!["BaseMod".into(), "StSLib".into(), "ActLikeIt".into()],
            suppress_dependency_modal: false,
        }
    }
}

impl RuntimeConfig {
    /// Jar settings in classpath order, keyed by field name.
    pub fn classpath_entries(&self) -> [(&'static str, &str); 4] {
        [
            ("modthespire_jar", self.modthespire_jar.as_str()),
            ("basemod_path", self.basemod_path.as_str()),
            ("stslib_path", self.stslib_path.as_str()),
            ("actlikeit_path", self.actlikeit_path.as_str()),
        ]
    }

    /// Which configured locations exist on disk. Unset paths count as missing.
    pub fn validate_environment(&self) -> IndexMap<String, bool> {
        let mut results = IndexMap::new();
        results.insert("java_home".to_string(), path_exists(&self.java_home));
        for (field, raw) in self.classpath_entries() {
            results.insert(field.to_string(), path_exists(raw));
        }
        results
    }

    /// Jar settings that are unset or point nowhere.
    pub fn missing_classpath_entries(&self) -> Vec<String> {
        self.classpath_entries()
            .into_iter()
            .filter(|(_, raw)| !path_exists(raw))
            .map(|(field, _)| field.to_string())
            .collect()
    }
}

fn path_exists(raw: &str) -> bool {
    !raw.is_empty() && expand_home(raw).exists()
}

/// A [`RuntimeConfig`] backed by a JSON file.
pub struct ConfigStore {
    path: PathBuf,
    config: RwLock<RuntimeConfig>,
}

impl ConfigStore {
    /// Open `<dir>/runtime_config.json`, writing defaults when it is absent.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .map_err(|err| StsmError::io(format!("create config dir {}", dir.display()), err))?;
        let path = dir.join(CONFIG_FILE_NAME);

        let store = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .map_err(|err| StsmError::io(format!("read {}", path.display()), err))?;
            let config: RuntimeConfig = serde_json::from_str(&raw)?;
            debug!("Loaded runtime configuration from {}", path.display());
            Self {
                path,
                config: RwLock::new(config),
            }
        } else {
            let store = Self {
                path,
                config: RwLock::new(RuntimeConfig::default()),
            };
            store.save()?;
            store
        };
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> RuntimeConfig {
        self.config.read().clone()
    }

    /// Apply `updates` by field name and persist. Unknown keys and values of
    /// the wrong shape are rejected without changing anything.
    pub fn update(&self, updates: &Map<String, Value>) -> Result<RuntimeConfig> {
        let mut config = self.config.write();
        let mut fields = match serde_json::to_value(&*config)? {
            Value::Object(fields) => fields,
            _ => return Err(StsmError::internal("runtime configuration is not an object")),
        };
        for (key, value) in updates {
            if !fields.contains_key(key) {
                return Err(StsmError::configuration_field(
                    format!("Unknown configuration key '{}'", key),
                    key,
                ));
            }
            fields.insert(key.clone(), value.clone());
        }
        let updated: RuntimeConfig = serde_json::from_value(Value::Object(fields))
            .map_err(|err| StsmError::configuration(format!("Invalid configuration value: {}", err)))?;

        write_config(&self.path, &updated)?;
        *config = updated.clone();
        info!("Updated runtime configuration ({} keys)", updates.len());
        Ok(updated)
    }

    pub fn save(&self) -> Result<()> {
        write_config(&self.path, &self.config.read())
    }
}

fn write_config(path: &Path, config: &RuntimeConfig) -> Result<()> {
    let serialized = serde_json::to_string_pretty(config)?;
    std::fs::write(path, serialized).map_err(|err| StsmError::io(format!("write {}", path.display()), err))
}
