//! Change notifications emitted by a [`Query`](super::Query).
//!
//! Each query owns its own [`EventBus`]. Listeners are plain callbacks
//! receiving a [`QueryEvent`]; they observe changes after the model has
//! already been updated.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::model::{ContainerId, ItemId, JoinId};

/// Counter for generating unique listener IDs.
static LISTENER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    fn next() -> Self {
        Self(LISTENER_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// A query-level attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryProperty {
    Filter,
    Grouping,
    RowLimit,
    StreamingRowLimit,
    UserSql,
    Dialect,
    QuoteIdentifiers,
    DataSource,
    ContainerName(ContainerId),
    ContainerAlias(ContainerId),
    ContainerPosition(ContainerId),
}

/// An item attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemProperty {
    Alias,
    Filter,
    Having,
    GroupFunction,
    Selection,
    OrderBy,
    OrderDirection,
    Width,
}

/// A join attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinProperty {
    Comparator,
    LeftOuter,
    RightOuter,
}

/// Everything a query reports to its listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryEvent {
    ContainerAdded { container: ContainerId, index: usize },
    ContainerRemoved { container: ContainerId },
    ItemAdded { container: ContainerId, item: ItemId, index: usize },
    ItemRemoved { container: ContainerId, item: ItemId },
    JoinAdded { join: JoinId },
    JoinRemoved { join: JoinId },
    PropertyChanged { property: QueryProperty },
    ItemPropertyChanged { item: ItemId, property: ItemProperty },
    JoinPropertyChanged { join: JoinId, property: JoinProperty },
    /// The outermost compound edit began.
    CompoundEditStarted { message: String },
    /// The outermost compound edit ended.
    CompoundEditEnded,
}

type Listener = Arc<dyn Fn(&QueryEvent) + Send + Sync>;

/// Listener registry.
///
/// The mutex only guards the listener list, so listeners may subscribe or
/// unsubscribe while an event is being delivered. Delivery happens outside
/// the lock on a snapshot of the list.
#[derive(Default)]
pub struct EventBus {
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&QueryEvent) + Send + Sync + 'static,
    {
        let id = ListenerId::next();
        self.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns false when it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn emit(&self, event: QueryEvent) {
        let snapshot: Vec<Listener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in snapshot {
            listener(&event);
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
