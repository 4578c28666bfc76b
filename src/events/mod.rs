//! Named publish/subscribe bus for lifecycle hooks.
//!
//! Listeners run synchronously on the publishing thread, in registration
//! order, against a snapshot of the subscription list. A listener that returns
//! an error or panics is logged and skipped; the publisher never sees it.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::any::TypeInfo;
use crate::core::errors::{Result, StsmError};
use crate::manager::{PluginManager, MODULE_REGISTRATIONS};
use crate::registry::{Callable, Instance, Namespace, Symbol};

/// Published before a mod project is written.
pub const MOD_GENERATION_PRE: &str = "mod_generation.pre";
/// Published after a mod project was written successfully.
pub const MOD_GENERATION_POST: &str = "mod_generation.post";
/// Published after a test suite ran.
pub const TESTS_COMPLETED: &str = "tests.completed";

/// Something that can observe events.
pub trait EventListener: Send + Sync {
    /// Handle `event_name`; the payload is only borrowed for the call.
    fn handle_event(&self, event_name: &str, payload: &Value) -> anyhow::Result<()>;
}

impl<F> EventListener for F
where
    F: Fn(&str, &Value) -> anyhow::Result<()> + Send + Sync,
{
    fn handle_event(&self, event_name: &str, payload: &Value) -> anyhow::Result<()> {
        self(event_name, payload)
    }
}

/// Registry-storable wrapper so a listener can travel as a [`Symbol`].
pub struct ListenerHandle(Arc<dyn EventListener>);

impl ListenerHandle {
    pub fn listener(&self) -> Arc<dyn EventListener> {
        self.0.clone()
    }
}

impl Symbol {
    /// Wrap a listener so it can be registered and later subscribed by name.
    pub fn listener<L: EventListener + 'static>(listener: L) -> Symbol {
        let handle = Arc::new(ListenerHandle(Arc::new(listener)));
        Symbol::Instance(Instance::with_type(handle, TypeInfo::of::<L>()))
    }

    pub fn as_listener(&self) -> Option<Arc<dyn EventListener>> {
        self.downcast_arc::<ListenerHandle>().map(|handle| handle.listener())
    }
}

/// Adapts a registry function: it receives `{"event": .., "payload": ..}`.
struct CallableListener(Callable);

impl EventListener for CallableListener {
    fn handle_event(&self, event_name: &str, payload: &Value) -> anyhow::Result<()> {
        self.0
            .call(&json!({ "event": event_name, "payload": payload }))
            .map(|_| ())
    }
}

/// Event name -> ordered listeners.
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<HashMap<String, Vec<Arc<dyn EventListener>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener; duplicates are kept and invoked once per entry.
    pub fn register_event_listener(&self, event_name: &str, listener: Arc<dyn EventListener>) {
        self.listeners
            .write()
            .entry(event_name.to_string())
            .or_default()
            .push(listener);
        debug!("Registered listener for event {}", event_name);
    }

    /// Subscribe a registry value. Only listener handles and callables can
    /// handle events; anything else is rejected here, not at dispatch time.
    pub fn register_listener_symbol(&self, event_name: &str, symbol: &Symbol) -> Result<()> {
        let listener: Arc<dyn EventListener> = if let Some(listener) = symbol.as_listener() {
            listener
        } else if let Some(callable) = symbol.as_callable() {
            Arc::new(CallableListener(callable.clone()))
        } else {
            return Err(StsmError::invalid_argument_named(
                format!("{} cannot handle events", symbol.describe()),
                "listener",
            ));
        };
        self.register_event_listener(event_name, listener);
        Ok(())
    }

    /// Invoke every listener registered for `event_name` when dispatch starts.
    pub fn dispatch_event(&self, event_name: &str, payload: &Value) {
        // Snapshot, then release the lock before running listener code
        let snapshot: Vec<Arc<dyn EventListener>> = match self.listeners.read().get(event_name) {
            Some(listeners) => listeners.clone(),
            None => return,
        };

        for (position, listener) in snapshot.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| listener.handle_event(event_name, payload))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    error!("Listener #{} raised {:#} during event {}", position, err, event_name);
                }
                Err(panic) => {
                    error!(
                        "Listener #{} panicked during event {}: {}",
                        position,
                        event_name,
                        panic_message(panic.as_ref())
                    );
                }
            }
        }
    }

    pub fn listener_count(&self, event_name: &str) -> usize {
        self.listeners.read().get(event_name).map_or(0, Vec::len)
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[linkme::distributed_slice(MODULE_REGISTRATIONS)]
static REGISTER_EVENTS_MODULE: fn(&PluginManager) -> Result<()> = register_events_module;

fn register_events_module(manager: &PluginManager) -> Result<()> {
    let namespace = Namespace::for_module("events")
        .class::<EventBus>("EventBus")
        .with("MOD_GENERATION_PRE", Symbol::value(json!(MOD_GENERATION_PRE)))
        .with("MOD_GENERATION_POST", Symbol::value(json!(MOD_GENERATION_POST)))
        .with("TESTS_COMPLETED", Symbol::value(json!(TESTS_COMPLETED)));
    manager.register_module("events", &namespace)
}
