//! Observable Value
//!
//! An `ObservableValue` is a settable cell that notifies listeners when its
//! contents change. It is the simplest subscribable source: a set can hold
//! one as an entry and track it while live.
//!
//! # Sharing
//!
//! Cloning an `ObservableValue` produces another handle to the same cell,
//! the same way the collections in this crate share their state.

use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use smallvec::SmallVec;

use super::listener::{Listener, ListenerId};
use super::observable::Observable;
use super::release::Release;

/// Counter for generating unique value IDs.
static VALUE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique value ID.
fn next_value_id() -> u64 {
    VALUE_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A shared, observable value of type `T`.
///
/// # Example
///
/// ```rust
/// use ripple_core::reactive::ObservableValue;
///
/// let count = ObservableValue::new(0);
/// count.set(5);
/// assert_eq!(count.get(), 5);
/// ```
pub struct ObservableValue<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Unique identifier for this value.
    id: u64,

    /// The current value.
    value: Arc<RwLock<T>>,

    /// Registered listeners, in subscription order.
    listeners: Arc<Mutex<IndexMap<ListenerId, Listener<T>>>>,
}

impl<T> ObservableValue<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a new observable value.
    pub fn new(value: T) -> Self {
        Self {
            id: next_value_id(),
            value: Arc::new(RwLock::new(value)),
            listeners: Arc::new(Mutex::new(IndexMap::new())),
        }
    }

    /// Get the value's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Get the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Set a new value and notify listeners if it differs from the old one.
    pub fn set(&self, value: T) {
        {
            let mut guard = self.value.write();
            if *guard == value {
                return;
            }
            *guard = value.clone();
        }

        let snapshot: SmallVec<[Listener<T>; 4]> =
            self.listeners.lock().values().cloned().collect();
        for listener in snapshot {
            listener(&value);
        }
    }

    /// Update the value using a function of the current one.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let next = {
            let guard = self.value.read();
            f(&guard)
        };
        self.set(next);
    }

    /// Get the number of listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl<T> Observable<T> for ObservableValue<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn read(&self) -> T {
        self.get()
    }

    fn subscribe(&self, listener: Listener<T>) -> Release {
        let id = ListenerId::new();
        self.listeners.lock().insert(id, listener);

        let listeners = Arc::downgrade(&self.listeners);
        Release::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.lock().shift_remove(&id);
            }
        })
    }
}

impl<T> Clone for ObservableValue<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            value: Arc::clone(&self.value),
            listeners: Arc::clone(&self.listeners),
        }
    }
}

impl<T> Debug for ObservableValue<T>
where
    T: Clone + PartialEq + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableValue")
            .field("id", &self.id)
            .field("value", &self.get())
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
