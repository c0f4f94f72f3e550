//! Listener registry (§4.8): `on`/`off` keyed by event name, dispatching
//! synchronously on whichever thread reads the corresponding ring.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use supersonic_osc::OscPacket;
use supersonic_region::NodeEntry;

/// A single dispatched occurrence.
#[derive(Debug, Clone)]
pub enum Event {
    Message(OscPacket),
    Debug(OscPacket),
    Error(String),
    Ready,
    Shutdown,
    TreeUpdate(Arc<Vec<NodeEntry>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Message,
    Debug,
    Error,
    Ready,
    Shutdown,
}

impl Event {
    #[must_use]
    pub fn kind(&self) -> Option<EventKind> {
        match self {
            Event::Message(_) => Some(EventKind::Message),
            Event::Debug(_) => Some(EventKind::Debug),
            Event::Error(_) => Some(EventKind::Error),
            Event::Ready => Some(EventKind::Ready),
            Event::Shutdown => Some(EventKind::Shutdown),
            // Tree updates are delivered through `NodeTreeMirror` snapshots
            // directly, not through the five named listener events.
            Event::TreeUpdate(_) => None,
        }
    }
}

type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ListenerId(u64);

/// Registry of per-event-kind handlers. Handlers run synchronously, in
/// registration order, on the thread that calls [`ListenerRegistry::dispatch`].
#[derive(Default)]
pub struct ListenerRegistry {
    handlers: Mutex<HashMap<EventKind, Vec<(ListenerId, Handler)>>>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, kind: EventKind, handler: impl Fn(&Event) + Send + Sync + 'static) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .lock()
            .unwrap()
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    pub fn off(&self, kind: EventKind, id: ListenerId) {
        if let Some(handlers) = self.handlers.lock().unwrap().get_mut(&kind) {
            handlers.retain(|(handler_id, _)| *handler_id != id);
        }
    }

    pub fn dispatch(&self, event: &Event) {
        let Some(kind) = event.kind() else { return };
        let handlers = self.handlers.lock().unwrap();
        if let Some(handlers) = handlers.get(&kind) {
            for (_, handler) in handlers {
                handler(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering as O};

    #[test]
    fn registered_handler_fires_on_matching_event() {
        let registry = ListenerRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);
        registry.on(EventKind::Ready, move |_| {
            count_clone.fetch_add(1, O::Relaxed);
        });
        registry.dispatch(&Event::Ready);
        registry.dispatch(&Event::Shutdown);
        assert_eq!(count.load(O::Relaxed), 1);
    }

    #[test]
    fn off_removes_only_the_targeted_listener() {
        let registry = ListenerRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);
        let id = registry.on(EventKind::Error, move |_| {
            count_clone.fetch_add(1, O::Relaxed);
        });
        registry.dispatch(&Event::Error("x".to_string()));
        registry.off(EventKind::Error, id);
        registry.dispatch(&Event::Error("y".to_string()));
        assert_eq!(count.load(O::Relaxed), 1);
    }
}
