//! Per-table change notifications.
//!
//! Observers register for an exact table name and are invoked synchronously,
//! in registration order, every time a change for that table is published.
//! Each publish snapshots the observer list first and releases the lock
//! before calling anything, so observers may subscribe or unsubscribe from
//! inside their callback without deadlocking; such changes take effect on the
//! next publish.

use crate::value::Row;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Kind of mutation that produced a change event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
    DropTable,
    CreateTable,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Insert => write!(f, "insert"),
            ChangeKind::Update => write!(f, "update"),
            ChangeKind::Delete => write!(f, "delete"),
            ChangeKind::DropTable => write!(f, "dropTable"),
            ChangeKind::CreateTable => write!(f, "createTable"),
        }
    }
}

/// Notification that the contents of a table may have changed
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub table: String,
    pub kind: ChangeKind,
    /// Row data carried by the mutation, if any (the SET values of an update)
    pub data: Option<Row>,
}

impl ChangeEvent {
    pub fn new(table: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            table: table.into(),
            kind,
            data: None,
        }
    }

    pub fn with_data(mut self, data: Row) -> Self {
        self.data = Some(data);
        self
    }
}

/// Callback type for change observers
pub type Observer = dyn Fn(&ChangeEvent) + Send + Sync;

/// Registration handle returned by [`ChangeBus::subscribe`]
///
/// Not `Clone`: pass it to [`ChangeBus::unsubscribe`] exactly once.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "dropping a Subscription leaves the observer registered"]
pub struct Subscription {
    table: String,
    id: u64,
}

impl Subscription {
    pub fn table(&self) -> &str {
        &self.table
    }
}

/// Publish/subscribe registry keyed by table name
pub struct ChangeBus {
    observers: Mutex<HashMap<String, Vec<(u64, Arc<Observer>)>>>,
    next_id: AtomicU64,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self {
            observers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register `callback` for events on `table`
    pub fn subscribe(
        &self,
        table: impl Into<String>,
        callback: impl Fn(&ChangeEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let table = table.into();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.observers
            .lock()
            .entry(table.clone())
            .or_default()
            .push((id, Arc::new(callback)));
        trace!(table = %table, id, "subscribed");
        Subscription { table, id }
    }

    /// Remove the observer behind `subscription`
    pub fn unsubscribe(&self, subscription: Subscription) {
        let mut observers = self.observers.lock();
        if let Some(list) = observers.get_mut(&subscription.table) {
            list.retain(|(id, _)| *id != subscription.id);
            if list.is_empty() {
                observers.remove(&subscription.table);
            }
        }
        trace!(table = %subscription.table, id = subscription.id, "unsubscribed");
    }

    /// Deliver `event` to every observer currently registered for its table
    pub fn publish(&self, event: &ChangeEvent) {
        let snapshot: Vec<Arc<Observer>> = {
            let observers = self.observers.lock();
            match observers.get(&event.table) {
                Some(list) => list.iter().map(|(_, cb)| Arc::clone(cb)).collect(),
                None => Vec::new(),
            }
        };
        trace!(table = %event.table, kind = %event.kind, observers = snapshot.len(), "publish");
        for cb in snapshot {
            cb(event);
        }
    }

    /// Number of observers registered for `table`
    pub fn subscriber_count(&self, table: &str) -> usize {
        self.observers.lock().get(table).map_or(0, Vec::len)
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ChangeBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let observers = self.observers.lock();
        let counts: HashMap<&str, usize> = observers.iter().map(|(t, l)| (t.as_str(), l.len())).collect();
        f.debug_struct("ChangeBus").field("observers", &counts).finish()
    }
}
