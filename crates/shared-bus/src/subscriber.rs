//! # Event Subscriber
//!
//! Handler registration side of the dispatch table.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use thiserror::Error;
use tracing::debug;

use crate::events::{EventTopic, HostEvent};

/// Failure reported by a handler.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// The handler returned an error.
    #[error("{0}")]
    Failed(String),

    /// The handler panicked.
    #[error("handler panicked: {0}")]
    Panicked(String),
}

/// Handler closure signature.
pub type HandlerFn = dyn Fn(&HostEvent) -> Result<(), HandlerError> + Send + Sync;

#[derive(Clone)]
pub(crate) struct RegisteredHandler {
    pub(crate) id: u64,
    pub(crate) name: String,
    pub(crate) handler: Arc<HandlerFn>,
}

/// Topic → ordered handlers.
#[derive(Default)]
pub(crate) struct HandlerTable {
    handlers: RwLock<HashMap<EventTopic, Vec<RegisteredHandler>>>,
    next_id: AtomicU64,
}

impl HandlerTable {
    pub(crate) fn insert(&self, topic: EventTopic, name: String, handler: Arc<HandlerFn>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers
            .write()
            .entry(topic)
            .or_default()
            .push(RegisteredHandler { id, name, handler });
        id
    }

    pub(crate) fn remove(&self, topic: EventTopic, id: u64) {
        let mut handlers = self.handlers.write();
        if let Some(list) = handlers.get_mut(&topic) {
            list.retain(|h| h.id != id);
            if list.is_empty() {
                handlers.remove(&topic);
            }
        }
    }

    /// Copy of the handlers for a topic, so dispatch runs without the lock held.
    pub(crate) fn snapshot(&self, topic: EventTopic) -> Vec<RegisteredHandler> {
        self.handlers
            .read()
            .get(&topic)
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn count(&self, topic: EventTopic) -> usize {
        self.handlers.read().get(&topic).map_or(0, Vec::len)
    }
}

/// A subscription handle.
///
/// When dropped, the handler is removed from the table.
pub struct Subscription {
    id: u64,
    topic: EventTopic,
    table: Weak<HandlerTable>,
}

impl Subscription {
    pub(crate) fn new(id: u64, topic: EventTopic, table: Weak<HandlerTable>) -> Self {
        Self { id, topic, table }
    }

    pub fn topic(&self) -> EventTopic {
        self.topic
    }

    /// Keep the handler registered for the lifetime of the bus.
    pub fn detach(mut self) {
        self.table = Weak::new();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(table) = self.table.upgrade() {
            table.remove(self.topic, self.id);
            debug!(topic = self.topic.as_str(), id = self.id, "Subscription removed");
        }
    }
}
