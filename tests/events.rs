//! Event dispatch with misbehaving listeners.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};
use stsm::{EventListener, PluginManager, StsmError, Symbol};

struct Recorder {
    seen: Mutex<Vec<(String, Value)>>,
}

impl EventListener for Recorder {
    fn handle_event(&self, event_name: &str, payload: &Value) -> anyhow::Result<()> {
        self.seen.lock().push((event_name.to_string(), payload.clone()));
        Ok(())
    }
}

#[test]
fn test_every_listener_runs_despite_failures() {
    let manager = PluginManager::new();
    let calls = Arc::new(AtomicUsize::new(0));

    for i in 0..5 {
        let calls = calls.clone();
        manager.register_event_listener(
            "cards.updated",
            Arc::new(move |_: &str, _: &Value| -> anyhow::Result<()> {
                calls.fetch_add(1, Ordering::SeqCst);
                match i {
                    1 => anyhow::bail!("listener {} failed", i),
                    3 => panic!("listener {} panicked", i),
                    _ => Ok(()),
                }
            }),
        );
    }

    manager.dispatch_event("cards.updated", &json!({ "count": 2 }));
    assert_eq!(calls.load(Ordering::SeqCst), 5);

    // The bus stays usable after a panicking listener
    manager.dispatch_event("cards.updated", &json!({ "count": 3 }));
    assert_eq!(calls.load(Ordering::SeqCst), 10);
}

#[test]
fn test_dispatch_without_listeners_is_noop() {
    let manager = PluginManager::new();
    manager.dispatch_event("nobody.listens", &Value::Null);
    assert_eq!(manager.bus().listener_count("nobody.listens"), 0);
}

#[test]
fn test_listener_symbols() {
    let manager = PluginManager::new();
    let recorder = Arc::new(Recorder { seen: Mutex::new(Vec::new()) });
    manager
        .register_listener_symbol("relics.changed", &Symbol::listener(RecorderRef(recorder.clone())))
        .unwrap();

    let forwarded = Arc::new(Mutex::new(Vec::new()));
    let sink = forwarded.clone();
    let callable = Symbol::function("hooks", "on_change", move |args| {
        sink.lock().push(args.clone());
        Ok(Value::Null)
    });
    manager.register_listener_symbol("relics.changed", &callable).unwrap();

    let err = manager
        .register_listener_symbol("relics.changed", &Symbol::value(json!("not a listener")))
        .unwrap_err();
    assert!(matches!(err, StsmError::InvalidArgument { .. }));

    manager.dispatch_event("relics.changed", &json!(["Anchor"]));
    assert_eq!(recorder.seen.lock().len(), 1);
    assert_eq!(recorder.seen.lock()[0].0, "relics.changed");
    assert_eq!(
        forwarded.lock().as_slice(),
        &[json!({ "event": "relics.changed", "payload": ["Anchor"] })]
    );
}

struct RecorderRef(Arc<Recorder>);

impl EventListener for RecorderRef {
    fn handle_event(&self, event_name: &str, payload: &Value) -> anyhow::Result<()> {
        self.0.handle_event(event_name, payload)
    }
}
