// src/events.rs

use indexmap::IndexMap;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A shared listener. Its identity is the allocation it points to, so the
/// same `Arc` (or a clone of it) must be passed to unsubscribe.
pub type EventHandler = Arc<dyn Fn(&Value) + Send + Sync>;

/// The host editor's publish/subscribe channel, injected into the mapper.
pub trait EventBus: Send + Sync {
    fn subscribe(&self, event: &str, handler: EventHandler);

    /// Removes one subscription of `handler` to `event`, if present.
    fn unsubscribe(&self, event: &str, handler: &EventHandler);
}

/// An in-process bus. Handlers run synchronously on the publishing thread.
#[derive(Default)]
pub struct LocalEventBus {
    subscribers: Mutex<IndexMap<String, Vec<EventHandler>>>,
}

impl LocalEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, IndexMap<String, Vec<EventHandler>>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Calls every handler subscribed to `event` and returns how many ran.
    pub fn publish(&self, event: &str, payload: &Value) -> usize {
        // Snapshot first so handlers may (un)subscribe while running.
        let handlers = self.lock().get(event).cloned().unwrap_or_default();
        for handler in &handlers {
            handler(payload);
        }
        handlers.len()
    }

    pub fn subscriber_count(&self, event: &str) -> usize {
        self.lock().get(event).map_or(0, Vec::len)
    }
}

impl EventBus for LocalEventBus {
    fn subscribe(&self, event: &str, handler: EventHandler) {
        log::debug!("Subscribing listener to '{}'", event);
        self.lock().entry(event.to_string()).or_default().push(handler);
    }

    fn unsubscribe(&self, event: &str, handler: &EventHandler) {
        let mut subscribers = self.lock();
        if let Some(handlers) = subscribers.get_mut(event) {
            if let Some(pos) = handlers.iter().position(|h| Arc::ptr_eq(h, handler)) {
                handlers.remove(pos);
                log::debug!("Unsubscribed listener from '{}'", event);
            }
            if handlers.is_empty() {
                subscribers.shift_remove(event);
            }
        }
    }
}
