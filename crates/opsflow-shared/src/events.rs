//! Event subscription primitive.
//!
//! Push-style delivery decoupled from any particular concurrency primitive:
//! a producer owns an [`EventBus`] and consumers register handlers with
//! `subscribe`, receiving a [`Subscription`] cancel token. Cancellation is
//! synchronous: once `cancel` (or drop) returns, the handler will not be
//! invoked again.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

pub struct EventBus<T> {
    handlers: Arc<Mutex<HashMap<u64, Handler<T>>>>,
    next_id: Arc<AtomicU64>,
}

impl<T> Clone for EventBus<T> {
    fn clone(&self) -> Self {
        Self {
            handlers: Arc::clone(&self.handlers),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

impl<T> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EventBus<T> {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Register a handler. The returned token unregisters it on cancel/drop.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
        T: 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers
            .lock()
            .expect("event bus lock poisoned")
            .insert(id, Arc::new(handler));

        let handlers = Arc::clone(&self.handlers);
        Subscription {
            cancel: Some(Box::new(move || {
                handlers.lock().expect("event bus lock poisoned").remove(&id);
            })),
        }
    }

    /// Deliver an event to all current subscribers.
    ///
    /// Handlers run outside the registry lock so a handler may subscribe or
    /// cancel without deadlocking.
    pub fn emit(&self, event: &T) {
        let snapshot: Vec<Handler<T>> = self
            .handlers
            .lock()
            .expect("event bus lock poisoned")
            .values()
            .cloned()
            .collect();
        for handler in snapshot {
            handler(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.lock().expect("event bus lock poisoned").len()
    }
}

/// Cancel token for a registered handler. Cancels on drop.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}
