//! Lifecycle control of the embedded game runtime.
//!
//! The controller owns the state machine and classpath resolution; the runtime
//! itself sits behind [`RuntimeBackend`]. Without a backend the controller can
//! still validate configuration but cannot reach `Running`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::config::RuntimeConfig;
use crate::core::errors::{Result, StsmError};

/// Shared libraries probed under `<java_home>/lib/server`.
const JVM_LIBRARIES: [&str; 3] = ["libjvm.so", "libjvm.dylib", "jvm.dll"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeState {
    Stopped,
    Starting,
    Running,
    ShuttingDown,
}

/// The embedded runtime.
pub trait RuntimeBackend: Send + Sync {
    fn start(&self, jvm_path: Option<&Path>, classpath: &str) -> anyhow::Result<()>;
    fn is_started(&self) -> bool;
    fn shutdown(&self) -> anyhow::Result<()>;
    /// Call `class.method(args...)` and return its result as structured data.
    fn invoke_static(&self, class_name: &str, method_name: &str, args: &[Value]) -> anyhow::Result<Value>;
}

pub struct BridgeController {
    state: Mutex<BridgeState>,
    backend: RwLock<Option<Arc<dyn RuntimeBackend>>>,
}

impl Default for BridgeController {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeController {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BridgeState::Stopped),
            backend: RwLock::new(None),
        }
    }

    pub fn with_backend(backend: Arc<dyn RuntimeBackend>) -> Self {
        let controller = Self::new();
        controller.set_backend(backend);
        controller
    }

    pub fn set_backend(&self, backend: Arc<dyn RuntimeBackend>) {
        *self.backend.write() = Some(backend);
    }

    pub fn state(&self) -> BridgeState {
        *self.state.lock()
    }

    /// Start the runtime with the jars named by `config`. No-op when running.
    pub fn start(&self, config: &RuntimeConfig) -> Result<()> {
        let mut state = self.state.lock();
        if *state == BridgeState::Running {
            return Ok(());
        }
        *state = BridgeState::Starting;
        match self.launch(config) {
            Ok(()) => {
                *state = BridgeState::Running;
                Ok(())
            }
            Err(err) => {
                *state = BridgeState::Stopped;
                Err(err)
            }
        }
    }

    fn launch(&self, config: &RuntimeConfig) -> Result<()> {
        let classpath = compose_classpath(config)?;
        let jvm_path = resolve_jvm_path(config)?;
        let backend = self
            .backend
            .read()
            .clone()
            .ok_or_else(|| StsmError::bridge_unavailable("no runtime backend attached"))?;
        if backend.is_started() {
            return Ok(());
        }
        info!("Starting JVM with classpath: {}", classpath);
        backend
            .start(jvm_path.as_deref(), &classpath)
            .map_err(|err| StsmError::bridge("start", format!("{:#}", err)))
    }

    pub fn shutdown(&self) -> Result<()> {
        let mut state = self.state.lock();
        if *state == BridgeState::Stopped {
            return Ok(());
        }
        *state = BridgeState::ShuttingDown;
        let result = match self.backend.read().clone() {
            Some(backend) if backend.is_started() => {
                info!("Shutting down JVM");
                backend
                    .shutdown()
                    .map_err(|err| StsmError::bridge("shutdown", format!("{:#}", err)))
            }
            _ => Ok(()),
        };
        *state = BridgeState::Stopped;
        result
    }

    pub fn execute_static(&self, class_name: &str, method_name: &str, args: &[Value]) -> Result<Value> {
        if self.state() != BridgeState::Running {
            return Err(StsmError::configuration("JVM is not running"));
        }
        let backend = self
            .backend
            .read()
            .clone()
            .ok_or_else(|| StsmError::configuration("JVM handle not available"))?;
        backend
            .invoke_static(class_name, method_name, args)
            .map_err(|err| StsmError::bridge(format!("{}.{}", class_name, method_name), format!("{:#}", err)))
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(raw: &str) -> PathBuf {
    match raw.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => {
            match dirs::home_dir() {
                Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
                None => PathBuf::from(raw),
            }
        }
        _ => PathBuf::from(raw),
    }
}

/// Join the configured jars in the platform's path-list format.
///
/// Every configured jar must exist; an empty result is an error.
pub fn compose_classpath(config: &RuntimeConfig) -> Result<String> {
    let mut components = Vec::new();
    for (field, raw) in config.classpath_entries() {
        if raw.is_empty() {
            continue;
        }
        let path = expand_home(raw);
        let resolved = path.canonicalize().map_err(|_| {
            StsmError::configuration_field(format!("Configured path '{}' does not exist", path.display()), field)
        })?;
        components.push(resolved);
    }
    if components.is_empty() {
        return Err(StsmError::configuration(
            "Classpath is empty; configure ModTheSpire and library jar locations",
        ));
    }
    let joined = std::env::join_paths(&components)
        .map_err(|err| StsmError::configuration(format!("Cannot build classpath: {}", err)))?;
    joined
        .into_string()
        .map_err(|_| StsmError::configuration("Classpath is not valid UTF-8"))
}

/// Locate the JVM shared library under `java_home`, if one is configured.
pub fn resolve_jvm_path(config: &RuntimeConfig) -> Result<Option<PathBuf>> {
    if config.java_home.is_empty() {
        return Ok(None);
    }
    let server_dir = expand_home(&config.java_home).join("lib").join("server");
    JVM_LIBRARIES
        .iter()
        .map(|library| server_dir.join(library))
        .find(|candidate| candidate.exists())
        .map(Some)
        .ok_or_else(|| {
            StsmError::configuration_field(
                "Unable to locate JVM shared library in configured java_home",
                "java_home",
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as PlMutex;
    use serde_json::json;

    #[derive(Default)]
    struct FakeBackend {
        started: PlMutex<Option<String>>,
    }

    impl RuntimeBackend for FakeBackend {
        fn start(&self, _jvm_path: Option<&Path>, classpath: &str) -> anyhow::Result<()> {
            *self.started.lock() = Some(classpath.to_string());
            Ok(())
        }

        fn is_started(&self) -> bool {
            self.started.lock().is_some()
        }

        fn shutdown(&self) -> anyhow::Result<()> {
            *self.started.lock() = None;
            Ok(())
        }

        fn invoke_static(&self, class_name: &str, method_name: &str, args: &[Value]) -> anyhow::Result<Value> {
            Ok(json!({ "call": format!("{}.{}", class_name, method_name), "argc": args.len() }))
        }
    }

    fn config_with_jar(dir: &Path) -> RuntimeConfig {
        let jar = dir.join("ModTheSpire.jar");
        std::fs::write(&jar, b"").unwrap();
        RuntimeConfig {
            modthespire_jar: jar.to_string_lossy().into_owned(),
            ..RuntimeConfig::default()
        }
    }

    #[test]
    fn test_empty_classpath_is_configuration_error() {
        let controller = BridgeController::with_backend(Arc::new(FakeBackend::default()));
        let err = controller.start(&RuntimeConfig::default()).unwrap_err();
        assert!(matches!(err, StsmError::Configuration { .. }));
        assert_eq!(controller.state(), BridgeState::Stopped);
    }

    #[test]
    fn test_missing_jar_is_configuration_error() {
        let config = RuntimeConfig {
            basemod_path: "/no/such/BaseMod.jar".to_string(),
            ..RuntimeConfig::default()
        };
        let err = compose_classpath(&config).unwrap_err();
        assert!(matches!(err, StsmError::Configuration { field: Some(ref f), .. } if f == "basemod_path"));
    }

    #[test]
    fn test_start_without_backend_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let controller = BridgeController::new();
        let err = controller.start(&config_with_jar(dir.path())).unwrap_err();
        assert!(matches!(err, StsmError::BridgeUnavailable { .. }));
        assert_eq!(controller.state(), BridgeState::Stopped);
    }

    #[test]
    fn test_lifecycle_with_backend() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::default());
        let controller = BridgeController::with_backend(backend.clone());

        assert!(controller.execute_static("A", "b", &[]).is_err());
        controller.start(&config_with_jar(dir.path())).unwrap();
        assert_eq!(controller.state(), BridgeState::Running);
        assert!(backend.started.lock().as_deref().unwrap().ends_with("ModTheSpire.jar"));

        let out = controller.execute_static("com.example.Cards", "count", &[json!(1)]).unwrap();
        assert_eq!(out, json!({"call": "com.example.Cards.count", "argc": 1}));

        controller.shutdown().unwrap();
        assert_eq!(controller.state(), BridgeState::Stopped);
        assert!(!backend.is_started());
    }

    #[test]
    fn test_java_home_without_library() {
        let dir = tempfile::tempdir().unwrap();
        let config = RuntimeConfig {
            java_home: dir.path().to_string_lossy().into_owned(),
            ..RuntimeConfig::default()
        };
        assert!(resolve_jvm_path(&config).is_err());

        let server = dir.path().join("lib").join("server");
        std::fs::create_dir_all(&server).unwrap();
        std::fs::write(server.join("libjvm.so"), b"").unwrap();
        assert_eq!(resolve_jvm_path(&config).unwrap(), Some(server.join("libjvm.so")));
    }
}
