//! Named-event handler registry.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use marketplace_shared::SocketEvent;
use parking_lot::RwLock;
use tracing::error;

pub type EventHandler = Arc<dyn Fn(&SocketEvent) + Send + Sync>;

/// Identifies one registration; pass it to [`EventRegistry::off`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Handlers keyed by event name, kept in registration order.
#[derive(Default)]
pub struct EventRegistry {
    handlers: RwLock<HashMap<String, Vec<(HandlerId, EventHandler)>>>,
    next_id: AtomicU64,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, event: &str, handler: EventHandler) -> HandlerId {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .write()
            .entry(event.to_string())
            .or_default()
            .push((id, handler));
        id
    }

    /// Remove one registration. Returns whether it was present.
    pub fn off(&self, event: &str, id: HandlerId) -> bool {
        let mut handlers = self.handlers.write();
        let Some(list) = handlers.get_mut(event) else {
            return false;
        };
        let before = list.len();
        list.retain(|(existing, _)| *existing != id);
        let removed = list.len() != before;
        if list.is_empty() {
            handlers.remove(event);
        }
        removed
    }

    pub fn off_all(&self, event: &str) {
        self.handlers.write().remove(event);
    }

    pub fn handler_count(&self, event: &str) -> usize {
        self.handlers.read().get(event).map_or(0, Vec::len)
    }

    /// Dispatch under the event's own name.
    pub fn emit(&self, event: &SocketEvent) -> usize {
        self.emit_as(event.name(), event)
    }

    /// Run every handler registered for `name`, returning how many ran.
    ///
    /// Handlers are called on a snapshot, outside the lock, so they may
    /// register or remove handlers themselves. A panicking handler is logged
    /// and does not stop the others.
    pub fn emit_as(&self, name: &str, event: &SocketEvent) -> usize {
        let snapshot: Vec<EventHandler> = match self.handlers.read().get(name) {
            Some(list) => list.iter().map(|(_, handler)| handler.clone()).collect(),
            None => return 0,
        };

        for handler in &snapshot {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| handler(event))) {
                error!(event = name, panic = %panic_message(&*panic), "socket event handler panicked");
            }
        }
        snapshot.len()
    }
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.handlers.read();
        let mut names: Vec<&String> = handlers.keys().collect();
        names.sort();
        f.debug_struct("EventRegistry").field("events", &names).finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, tag: &'static str) -> EventHandler {
        let log = log.clone();
        Arc::new(move |_| log.lock().push(tag))
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let registry = EventRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        registry.on("socket:connected", recorder(&log, "first"));
        registry.on("socket:connected", recorder(&log, "second"));

        assert_eq!(registry.emit(&SocketEvent::Connected), 2);
        assert_eq!(*log.lock(), vec!["first", "second"]);
    }

    #[test]
    fn off_removes_only_that_handler() {
        let registry = EventRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = registry.on("socket:connected", recorder(&log, "first"));
        registry.on("socket:connected", recorder(&log, "second"));

        assert!(registry.off("socket:connected", first));
        assert!(!registry.off("socket:connected", first));
        registry.emit(&SocketEvent::Connected);
        assert_eq!(*log.lock(), vec!["second"]);
    }

    #[test]
    fn panicking_handler_does_not_stop_dispatch() {
        let registry = EventRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        registry.on("socket:connected", Arc::new(|_| panic!("boom")));
        registry.on("socket:connected", recorder(&log, "after"));

        registry.emit(&SocketEvent::Connected);
        assert_eq!(*log.lock(), vec!["after"]);
    }

    #[test]
    fn handler_may_unsubscribe_during_dispatch() {
        let registry = Arc::new(EventRegistry::new());
        let calls = Arc::new(AtomicU64::new(0));
        let slot: Arc<Mutex<Option<HandlerId>>> = Arc::new(Mutex::new(None));

        let (r, c, s) = (registry.clone(), calls.clone(), slot.clone());
        let id = registry.on(
            "socket:connected",
            Arc::new(move |_| {
                c.fetch_add(1, Ordering::SeqCst);
                if let Some(id) = *s.lock() {
                    r.off("socket:connected", id);
                }
            }),
        );
        *slot.lock() = Some(id);

        registry.emit(&SocketEvent::Connected);
        registry.emit(&SocketEvent::Connected);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.handler_count("socket:connected"), 0);
    }
}
