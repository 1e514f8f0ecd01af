//! Mapped View
//!
//! A `MappedView` applies a one-argument function to every item of an
//! [`ObservableArray`] and exposes the results as shared mapped items.
//!
//! Mapped items are identified by pointer, not by position. When the list
//! changes, an item equal (under the list's comparer) to one mapped before
//! gets its previous mapped item back instead of a fresh one, so identity
//! survives moves and the mapping function only runs for genuinely new items.
//! A slot whose raw item is unchanged keeps its own mapped item first; other
//! items take the first unused equal match.
//!
//! Equal raw items are ambiguous to that matching. Edits that must keep a
//! specific mapped item in a specific slot stage the same edit on the cache
//! before touching the list, so the next sync matches every slot in place.
//!
//! While dormant, reads re-synchronize with the list on demand. While live,
//! the view subscribes to the list, keeps its value current on every list
//! change, and reads are served from that value.

use std::fmt::{self, Debug};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use super::array::ObservableArray;
use super::options::CollectionOptions;
use crate::reactive::{Binder, BinderHooks, Listener, Observable, Release};

type MapFn<T, M> = Arc<dyn Fn(&T) -> M + Send + Sync>;

struct MapInner<T, M>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    M: Send + Sync + 'static,
{
    list: ObservableArray<T>,
    lambda: MapFn<T, M>,
    options: CollectionOptions<T>,
    /// Raw item and its mapped item, in list order as of the last sync.
    cache: Mutex<Vec<(T, Arc<M>)>>,
    list_release: Mutex<Option<Release>>,
    binder: Binder<Vec<Arc<M>>>,
}

impl<T, M> MapInner<T, M>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    M: Send + Sync + 'static,
{
    /// Bring the cache in line with the list and return the mapped items.
    fn sync(&self) -> Vec<Arc<M>> {
        let items = self.list.to_vec();
        // The mapping function runs without the cache lock held.
        let mut previous: Vec<Option<(T, Arc<M>)>> =
            std::mem::take(&mut *self.cache.lock()).into_iter().map(Some).collect();

        let matches = |slot: &Option<(T, Arc<M>)>, item: &T| {
            slot.as_ref()
                .is_some_and(|(raw, _)| self.options.items_equal(raw, item))
        };

        let mut mapped_count = 0usize;
        let mut next = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let position = if previous.get(index).is_some_and(|slot| matches(slot, &item)) {
                Some(index)
            } else {
                previous.iter().position(|slot| matches(slot, &item))
            };
            let reused = position.and_then(|index| previous[index].take());

            let mapped = match reused {
                Some((_, mapped)) => mapped,
                None => {
                    mapped_count += 1;
                    Arc::new((self.lambda)(&item))
                }
            };
            next.push((item, mapped));
        }

        if mapped_count > 0 {
            trace!(mapped = mapped_count, "mapped new list items");
        }

        let result = next.iter().map(|(_, mapped)| Arc::clone(mapped)).collect();
        *self.cache.lock() = next;
        result
    }

    /// The mapped items as of now.
    fn current(&self) -> Vec<Arc<M>> {
        if self.binder.is_live() {
            self.binder.get_value()
        } else {
            self.sync()
        }
    }

    /// Make sure the cache mirrors the list before staging an edit on it.
    fn settle(&self) {
        if !self.binder.is_live() {
            self.sync();
        }
    }
}

impl<T, M> BinderHooks<Vec<Arc<M>>> for MapInner<T, M>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    M: Send + Sync + 'static,
{
    fn recompute(&self, current: &Vec<Arc<M>>) -> Option<Vec<Arc<M>>> {
        let next = self.sync();
        let unchanged = next.len() == current.len()
            && next.iter().zip(current).all(|(a, b)| Arc::ptr_eq(a, b));
        (!unchanged).then_some(next)
    }

    fn on_activate(&self) {
        let notify = self.binder.notifier();
        let release = self
            .list
            .subscribe(Arc::new(move |_: &Vec<T>| notify()));
        if let Some(previous) = self.list_release.lock().replace(release) {
            previous.release();
        }
    }

    fn on_deactivate(&self) {
        let release = self.list_release.lock().take();
        if let Some(release) = release {
            release.release();
        }
    }
}

/// An observable element-wise mapping of an [`ObservableArray`].
pub struct MappedView<T, M>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    M: Send + Sync + 'static,
{
    inner: Arc<MapInner<T, M>>,
}

impl<T, M> MappedView<T, M>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    M: Send + Sync + 'static,
{
    /// Map `list` with `lambda`, reusing items per the list's comparer.
    pub fn new<F>(list: ObservableArray<T>, lambda: F) -> Self
    where
        F: Fn(&T) -> M + Send + Sync + 'static,
    {
        let options = list.options().clone();
        Self::with_options(list, lambda, options)
    }

    /// Map `list` with `lambda`, reusing items per `options`.
    pub fn with_options<F>(list: ObservableArray<T>, lambda: F, options: CollectionOptions<T>) -> Self
    where
        F: Fn(&T) -> M + Send + Sync + 'static,
    {
        let inner = Arc::new_cyclic(|weak: &std::sync::Weak<MapInner<T, M>>| MapInner {
            list,
            lambda: Arc::new(lambda),
            options,
            cache: Mutex::new(Vec::new()),
            list_release: Mutex::new(None),
            binder: Binder::new(Vec::new(), weak.clone()),
        });
        Self { inner }
    }

    /// Get the mapped item at `index`.
    pub fn get(&self, index: usize) -> Option<Arc<M>> {
        self.inner.current().get(index).cloned()
    }

    /// Find the current index of a mapped item by identity.
    pub fn index_of(&self, mapped: &Arc<M>) -> Option<usize> {
        self.inner
            .current()
            .iter()
            .position(|candidate| Arc::ptr_eq(candidate, mapped))
    }

    /// Get the number of mapped items.
    pub fn len(&self) -> usize {
        self.inner.list.len()
    }

    /// Whether the view is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all mapped items.
    pub fn to_vec(&self) -> Vec<Arc<M>> {
        self.inner.current()
    }

    /// Run the mapping function on `item`.
    pub(crate) fn map_item(&self, item: &T) -> Arc<M> {
        Arc::new((self.inner.lambda)(item))
    }

    /// Record that `item`, mapped to `mapped`, is about to be inserted into
    /// the list at `at`. Call right before the matching list insert.
    pub(crate) fn stage_insert(&self, at: usize, item: T, mapped: Arc<M>) {
        self.inner.settle();
        let mut cache = self.inner.cache.lock();
        let at = at.min(cache.len());
        cache.insert(at, (item, mapped));
    }

    /// Record that the list item at `index` is about to be deleted. Call
    /// right before the matching list delete.
    pub(crate) fn stage_delete(&self, index: usize) {
        self.inner.settle();
        let mut cache = self.inner.cache.lock();
        if index < cache.len() {
            cache.remove(index);
        }
    }

    /// The list being mapped.
    pub fn list(&self) -> &ObservableArray<T> {
        &self.inner.list
    }

    /// Whether anyone is subscribed.
    pub fn is_live(&self) -> bool {
        self.inner.binder.is_live()
    }
}

impl<T, M> Observable<Vec<Arc<M>>> for MappedView<T, M>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    M: Send + Sync + 'static,
{
    fn read(&self) -> Vec<Arc<M>> {
        self.to_vec()
    }

    fn subscribe(&self, listener: Listener<Vec<Arc<M>>>) -> Release {
        self.inner.binder.add_listener(listener)
    }
}

impl<T, M> Clone for MappedView<T, M>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    M: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, M> Debug for MappedView<T, M>
where
    T: Clone + PartialEq + Send + Sync + Debug + 'static,
    M: Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedView")
            .field("items", &self.to_vec())
            .field("live", &self.is_live())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::listener;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counted_view(items: &[&'static str]) -> (MappedView<&'static str, String>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let view = MappedView::new(ObservableArray::new(items.to_vec()), move |s: &&'static str| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            s.to_uppercase()
        });
        (view, calls)
    }

    #[test]
    fn maps_lazily_and_reuses_items() {
        let (view, calls) = counted_view(&["a", "b"]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let first = view.get(0).unwrap();
        assert_eq!(*first, "A");
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let again = view.get(0).unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn identity_survives_reordering() {
        let (view, calls) = counted_view(&["a", "b", "c"]);
        let a = view.get(0).unwrap();

        view.list().set(["c", "b", "a"]);
        assert_eq!(view.index_of(&a), Some(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn index_of_missing_item_is_none() {
        let (view, _calls) = counted_view(&["a"]);
        let a = view.get(0).unwrap();

        view.list().delete_at(0).unwrap();
        assert_eq!(view.index_of(&a), None);
        assert!(view.is_empty());
    }

    #[test]
    fn unchanged_slots_keep_their_own_item() {
        let (view, _calls) = counted_view(&["a", "a"]);
        let second = view.get(1).unwrap();

        view.list().set(["b", "a"]);
        assert_eq!(view.index_of(&second), Some(1));
    }

    #[test]
    fn staged_delete_keeps_the_right_duplicate() {
        let (view, _calls) = counted_view(&["a", "a"]);
        let first = view.get(0).unwrap();
        let second = view.get(1).unwrap();

        view.stage_delete(0);
        view.list().delete_at(0).unwrap();

        assert_eq!(view.index_of(&first), None);
        assert_eq!(view.index_of(&second), Some(0));
    }

    #[test]
    fn live_reads_do_not_remap() {
        let (view, calls) = counted_view(&["a", "b", "c"]);
        let _release = view.subscribe(listener(|_: &Vec<Arc<String>>| {}));
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let b = view.get(1).unwrap();
        assert_eq!(view.index_of(&b), Some(1));
        assert_eq!(view.to_vec().len(), 3);
        assert!(Arc::ptr_eq(&view.read()[1], &b));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn live_view_forwards_list_changes() {
        let (view, _calls) = counted_view(&["a"]);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = seen.clone();
        let release = view.subscribe(listener(move |v: &Vec<Arc<String>>| {
            seen_clone
                .lock()
                .push(v.iter().map(|s| s.as_str().to_owned()).collect::<Vec<_>>());
        }));
        assert!(view.list().is_live());

        view.list().push("b");
        assert_eq!(*seen.lock(), vec![vec!["A".to_owned(), "B".to_owned()]]);

        release.release();
        assert!(!view.list().is_live());
        view.list().push("c");
        assert_eq!(seen.lock().len(), 1);
    }
}
