use super::event::{EventKind, RealtimeEvent};
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

type Handler = Arc<dyn Fn(&RealtimeEvent) + Send + Sync + 'static>;

/// Handle returned by [`EventBus::on`], used to remove the listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Ordered listener registry.
///
/// Handlers run synchronously on the caller's task, in registration order.
/// A panicking handler is logged and skipped; the rest still run.
pub struct EventBus {
    next_id: AtomicU64,
    bindings: RwLock<HashMap<EventKind, Vec<(ListenerId, Handler)>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            bindings: RwLock::new(HashMap::new()),
        }
    }

    pub fn on<F>(&self, kind: impl Into<EventKind>, handler: F) -> ListenerId
    where
        F: Fn(&RealtimeEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind.into())
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Removes a listener. Returns false if it was not registered for `kind`.
    pub fn off(&self, kind: &EventKind, id: ListenerId) -> bool {
        let mut bindings = self
            .bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(handlers) = bindings.get_mut(kind) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(existing, _)| *existing != id);
        let removed = handlers.len() != before;
        if handlers.is_empty() {
            bindings.remove(kind);
        }
        removed
    }

    /// Invokes every listener for the event's kind. Returns how many ran
    /// without panicking.
    pub fn emit(&self, event: &RealtimeEvent) -> usize {
        let kind = event.kind();
        let handlers: Vec<Handler> = {
            let bindings = self.bindings.read().unwrap_or_else(PoisonError::into_inner);
            match bindings.get(&kind) {
                Some(handlers) => handlers.iter().map(|(_, h)| Arc::clone(h)).collect(),
                None => return 0,
            }
        }; // Lock released here

        let mut delivered = 0;
        for handler in handlers {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(()) => delivered += 1,
                Err(panic) => {
                    tracing::error!(
                        event = %kind,
                        "Error in event handler: {}",
                        panic_message(panic.as_ref())
                    );
                }
            }
        }
        delivered
    }

    pub fn listener_count(&self, kind: &EventKind) -> usize {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(kind)
            .map_or(0, Vec::len)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::payload::StatusPayload;
    use std::sync::Mutex;

    fn status(message: &str) -> RealtimeEvent {
        RealtimeEvent::Status(StatusPayload {
            message: message.to_string(),
        })
    }

    #[test]
    fn test_handlers_run_once_in_registration_order() {
        let bus = EventBus::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            let calls = Arc::clone(&calls);
            bus.on(EventKind::Status, move |_| calls.lock().unwrap().push(i));
        }

        assert_eq!(bus.emit(&status("hello")), 5);
        assert_eq!(*calls.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_panicking_handler_does_not_stop_the_rest() {
        let bus = EventBus::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&calls);
        bus.on(EventKind::Status, move |_| first.lock().unwrap().push("first"));
        bus.on(EventKind::Status, |_| panic!("listener blew up"));
        let last = Arc::clone(&calls);
        bus.on(EventKind::Status, move |_| last.lock().unwrap().push("last"));

        assert_eq!(bus.emit(&status("x")), 2);
        assert_eq!(*calls.lock().unwrap(), vec!["first", "last"]);
    }

    #[test]
    fn test_off_removes_only_that_listener() {
        let bus = EventBus::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        let a = Arc::clone(&calls);
        let id_a = bus.on(EventKind::Status, move |_| a.lock().unwrap().push("a"));
        let b = Arc::clone(&calls);
        bus.on(EventKind::Status, move |_| b.lock().unwrap().push("b"));

        assert!(bus.off(&EventKind::Status, id_a));
        assert!(!bus.off(&EventKind::Status, id_a));
        assert!(!bus.off(&EventKind::Error, id_a));

        bus.emit(&status("x"));
        assert_eq!(*calls.lock().unwrap(), vec!["b"]);
    }

    #[test]
    fn test_duplicate_handlers_are_both_invoked() {
        let bus = EventBus::new();
        let count = Arc::new(Mutex::new(0));
        let handler = {
            let count = Arc::clone(&count);
            move |_: &RealtimeEvent| *count.lock().unwrap() += 1
        };

        bus.on(EventKind::Connected, handler.clone());
        bus.on(EventKind::Connected, handler);

        bus.emit(&RealtimeEvent::Connected);
        assert_eq!(*count.lock().unwrap(), 2);
    }

    #[test]
    fn test_unknown_event_names_register_and_dispatch() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        bus.on("style_transfer_ready", move |event| {
            *sink.lock().unwrap() = Some(event.clone());
        });

        let event = RealtimeEvent::from_wire("style_transfer_ready", serde_json::json!({"x": 1}));
        assert_eq!(bus.emit(&event), 1);
        assert_eq!(seen.lock().unwrap().as_ref(), Some(&event));
    }

    #[test]
    fn test_emit_without_listeners() {
        let bus = EventBus::new();
        assert_eq!(bus.emit(&RealtimeEvent::ConnectionLost), 0);
        assert_eq!(bus.listener_count(&EventKind::ConnectionLost), 0);
    }

    #[test]
    fn test_handler_may_register_another_listener() {
        let bus = Arc::new(EventBus::new());
        let inner = Arc::clone(&bus);
        bus.on(EventKind::Connected, move |_| {
            inner.on(EventKind::Disconnected, |_| {});
        });

        bus.emit(&RealtimeEvent::Connected);
        assert_eq!(bus.listener_count(&EventKind::Disconnected), 1);
    }
}
