//! Reactive queries: select results that refresh themselves.
//!
//! A [`ReactiveQuery`] registers with the store's [`ChangeBus`](crate::ChangeBus)
//! for one table and re-runs its select after every change event on that
//! table, whatever the event kind. Results replace the cached rows wholesale.
//!
//! # Threading model
//!
//! Re-fetches run synchronously on whichever thread published the change.
//! The bus only holds a weak reference to the query state, so a dropped query
//! is never kept alive by its registration. A fetch result is accepted under
//! the state lock and the lock is released before the callback runs, so
//! callbacks may call back into the query or the store from any thread.
//! Once [`ReactiveQuery::dispose`] returns no further result is accepted,
//! even from a fetch that was already in flight; a callback that had already
//! started is left to finish.
//!
//! [`TableWatch`] is the query-less variant: a listener that runs once on
//! open and again after every change to one table.

use crate::bus::{ChangeBus, Subscription};
use crate::error::Error;
use crate::filter::{Filter, Sort};
use crate::store::TableStore;
use crate::value::Row;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

/// Arguments of the select a reactive query keeps re-running
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub table: String,
    /// Empty means `*`
    pub columns: Vec<String>,
    pub filter: Filter,
    pub sort: Sort,
}

impl QuerySpec {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            filter: Filter::new(),
            sort: Sort::new(),
        }
    }

    pub fn columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }
}

type UpdateFn = dyn Fn(&[Row]) + Send + Sync;
type ErrorFn = dyn Fn(&Error) + Send + Sync;

#[derive(Default)]
struct QueryState {
    rows: Vec<Row>,
    last_error: Option<Arc<Error>>,
    /// Ticket of the most recent fetch whose result was delivered
    delivered: u64,
}

struct Inner {
    store: Arc<TableStore>,
    spec: QuerySpec,
    on_update: Box<UpdateFn>,
    on_error: Box<ErrorFn>,
    active: AtomicBool,
    state: Mutex<QueryState>,
    next_ticket: AtomicU64,
}

impl Inner {
    fn fetch(&self) {
        if !self.active.load(Ordering::Acquire) {
            return;
        }

        let ticket = self.next_ticket.fetch_add(1, Ordering::AcqRel) + 1;
        let columns: Vec<&str> = self.spec.columns.iter().map(String::as_str).collect();
        let result = self
            .store
            .select(&self.spec.table, &columns, &self.spec.filter, &self.spec.sort);

        let accepted = {
            let mut state = self.state.lock();
            if !self.active.load(Ordering::Acquire) {
                debug!(table = %self.spec.table, ticket, "Discarding fetch for disposed query");
                return;
            }
            if ticket < state.delivered {
                debug!(table = %self.spec.table, ticket, "Discarding stale fetch");
                return;
            }
            state.delivered = ticket;
            match result {
                Ok(rows) => {
                    state.rows = rows.clone();
                    state.last_error = None;
                    Ok(rows)
                }
                Err(err) => {
                    let err = Arc::new(err);
                    state.last_error = Some(Arc::clone(&err));
                    Err(err)
                }
            }
        };

        match accepted {
            Ok(rows) => (self.on_update)(&rows),
            Err(err) => {
                warn!(table = %self.spec.table, error = %err, "Reactive query fetch failed");
                (self.on_error)(&err);
            }
        }
    }
}

/// A select that re-runs on every change to its table
///
/// Dropping the query disposes it.
pub struct ReactiveQuery {
    inner: Arc<Inner>,
    subscription: Mutex<Option<Subscription>>,
}

impl ReactiveQuery {
    /// Subscribe to `spec.table`, then fetch and deliver the current result
    ///
    /// Fetch failures go to `on_error`; the query stays subscribed and tries
    /// again on the next change.
    pub fn open(
        store: Arc<TableStore>,
        spec: QuerySpec,
        on_update: impl Fn(&[Row]) + Send + Sync + 'static,
        on_error: impl Fn(&Error) + Send + Sync + 'static,
    ) -> Self {
        let inner = Arc::new(Inner {
            store,
            spec,
            on_update: Box::new(on_update),
            on_error: Box::new(on_error),
            active: AtomicBool::new(true),
            state: Mutex::new(QueryState::default()),
            next_ticket: AtomicU64::new(0),
        });

        let weak: Weak<Inner> = Arc::downgrade(&inner);
        let subscription = inner.store.bus().subscribe(inner.spec.table.clone(), move |event| {
            if let Some(inner) = weak.upgrade() {
                debug!(table = %event.table, kind = %event.kind, "Refreshing reactive query");
                inner.fetch();
            }
        });

        let query = Self {
            inner,
            subscription: Mutex::new(Some(subscription)),
        };
        query.inner.fetch();
        query
    }

    /// Re-run the select now
    pub fn refresh(&self) {
        self.inner.fetch();
    }

    /// Rows from the last successful fetch
    pub fn rows(&self) -> Vec<Row> {
        self.inner.state.lock().rows.clone()
    }

    /// Error from the last fetch, cleared by the next successful one
    pub fn last_error(&self) -> Option<Arc<Error>> {
        self.inner.state.lock().last_error.clone()
    }

    pub fn spec(&self) -> &QuerySpec {
        &self.inner.spec
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::Acquire)
    }

    /// Unsubscribe and stop accepting results; safe to call more than once,
    /// from any thread or from inside a callback
    pub fn dispose(&self) {
        {
            // Results are accepted under the state lock
            let _state = self.inner.state.lock();
            if !self.inner.active.swap(false, Ordering::AcqRel) {
                return;
            }
        }

        if let Some(subscription) = self.subscription.lock().take() {
            self.inner.store.bus().unsubscribe(subscription);
        }
        debug!(table = %self.inner.spec.table, "Disposed reactive query");
    }
}

impl Drop for ReactiveQuery {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Listener called once on open and again after every change to one table
///
/// Dropping the watch disposes it.
pub struct TableWatch {
    bus: Arc<ChangeBus>,
    table: String,
    active: Arc<AtomicBool>,
    subscription: Mutex<Option<Subscription>>,
}

impl TableWatch {
    pub fn open(store: &TableStore, table: impl Into<String>, listener: impl Fn() + Send + Sync + 'static) -> Self {
        let table = table.into();
        let bus = Arc::clone(store.bus());
        let active = Arc::new(AtomicBool::new(true));
        let listener = Arc::new(listener);

        let subscription = {
            let active = Arc::clone(&active);
            let listener = Arc::clone(&listener);
            bus.subscribe(table.clone(), move |event| {
                if active.load(Ordering::Acquire) {
                    debug!(table = %event.table, kind = %event.kind, "Notifying table watch");
                    listener();
                }
            })
        };

        listener();
        Self {
            bus,
            table,
            active,
            subscription: Mutex::new(Some(subscription)),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Unsubscribe the listener; safe to call more than once
    pub fn dispose(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(subscription) = self.subscription.lock().take() {
            self.bus.unsubscribe(subscription);
        }
        debug!(table = %self.table, "Disposed table watch");
    }
}

impl Drop for TableWatch {
    fn drop(&mut self) {
        self.dispose();
    }
}
