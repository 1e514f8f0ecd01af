//! Observable Array
//!
//! An `ObservableArray` is an indexed list with fixed indexing: a structural
//! edit only moves the entries at or after the edited position, and an index
//! is never reinterpreted otherwise. It backs the mapped array.
//!
//! Reads always see the live storage. Listeners are gated by a binder, so
//! nothing is compared or broadcast while nobody listens.

use std::fmt::{self, Debug};
use std::sync::Arc;

use parking_lot::Mutex;

use super::options::CollectionOptions;
use crate::error::{ListError, Result};
use crate::reactive::{Binder, BinderHooks, Listener, Observable, Release};

struct ArrayInner<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    items: Mutex<Vec<T>>,
    options: CollectionOptions<T>,
    binder: Binder<Vec<T>>,
}

impl<T> BinderHooks<Vec<T>> for ArrayInner<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn recompute(&self, current: &Vec<T>) -> Option<Vec<T>> {
        let items = self.items.lock().clone();
        let unchanged = items.len() == current.len()
            && items
                .iter()
                .zip(current)
                .all(|(a, b)| self.options.items_equal(a, b));
        (!unchanged).then_some(items)
    }
}

/// An observable list with fixed indexing.
pub struct ObservableArray<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    inner: Arc<ArrayInner<T>>,
}

impl<T> ObservableArray<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create an array from default items.
    pub fn new<I>(defaults: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        Self::with_options(defaults, CollectionOptions::default())
    }

    /// Create an array with explicit options.
    pub fn with_options<I>(defaults: I, options: CollectionOptions<T>) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let items: Vec<T> = defaults.into_iter().collect();
        let inner = Arc::new_cyclic(|weak: &std::sync::Weak<ArrayInner<T>>| ArrayInner {
            binder: Binder::new(items.clone(), weak.clone()),
            items: Mutex::new(items),
            options,
        });
        Self { inner }
    }

    /// Get the item at `index`.
    pub fn get(&self, index: usize) -> Option<T> {
        self.inner.items.lock().get(index).cloned()
    }

    /// Get the number of items.
    pub fn len(&self) -> usize {
        self.inner.items.lock().len()
    }

    /// Whether the array is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position of the first item equal to `item` under the configured comparer.
    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.inner
            .items
            .lock()
            .iter()
            .position(|candidate| self.inner.options.items_equal(candidate, item))
    }

    /// Snapshot of all items.
    pub fn to_vec(&self) -> Vec<T> {
        self.inner.items.lock().clone()
    }

    /// Append an item.
    pub fn push(&self, item: T) {
        self.inner.items.lock().push(item);
        self.inner.binder.on_update();
    }

    /// Insert an item so that it ends up at `at`.
    ///
    /// `at` may equal the current length (append). Anything larger is an error.
    pub fn insert(&self, item: T, at: usize) -> Result<()> {
        {
            let mut items = self.inner.items.lock();
            if at > items.len() {
                return Err(ListError::OutOfBounds {
                    index: at,
                    len: items.len(),
                });
            }
            items.insert(at, item);
        }
        self.inner.binder.on_update();
        Ok(())
    }

    /// Remove and return the item at `index`.
    pub fn delete_at(&self, index: usize) -> Result<T> {
        let removed = {
            let mut items = self.inner.items.lock();
            if index >= items.len() {
                return Err(ListError::OutOfBounds {
                    index,
                    len: items.len(),
                });
            }
            items.remove(index)
        };
        self.inner.binder.on_update();
        Ok(removed)
    }

    /// Replace every item.
    pub fn set<I>(&self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        *self.inner.items.lock() = items.into_iter().collect();
        self.inner.binder.on_update();
    }

    /// The options this array was built with.
    pub fn options(&self) -> &CollectionOptions<T> {
        &self.inner.options
    }

    /// Whether anyone is subscribed.
    pub fn is_live(&self) -> bool {
        self.inner.binder.is_live()
    }
}

impl<T> Observable<Vec<T>> for ObservableArray<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn read(&self) -> Vec<T> {
        self.to_vec()
    }

    fn subscribe(&self, listener: Listener<Vec<T>>) -> Release {
        self.inner.binder.add_listener(listener)
    }
}

impl<T> Clone for ObservableArray<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for ObservableArray<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T> Debug for ObservableArray<T>
where
    T: Clone + PartialEq + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableArray")
            .field("items", &self.to_vec())
            .field("live", &self.is_live())
            .finish()
    }
}
