//! Observable Set
//!
//! An `ObservableSet` keeps an ordered list of sources (literal values or
//! observables) and exposes the resolved values as an observable `Vec<T>`.
//!
//! # How Sets Synchronize
//!
//! The resolved collection is never rebuilt from scratch. On every live
//! recompute the set diffs what it currently exposes against what the
//! sources resolve to now:
//!
//! 1. Values no longer produced by any source are removed (first match).
//! 2. Values produced but not yet present are appended.
//! 3. Everything else stays exactly where it was.
//!
//! Listeners therefore only see churn for values that really came or went.
//! Both scans are linear, which is fine for the small, UI-sized collections
//! sets are meant for.
//!
//! # Subscriptions
//!
//! While live, every observable source is subscribed with the set's own
//! update signal. Deactivation releases every subscription; the sources keep
//! their own state, so reactivation simply recomputes from scratch.

use std::fmt::{self, Debug};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use super::source::Source;
use crate::reactive::{Binder, BinderHooks, Listener, Observable, Release};

struct SetState<T> {
    /// Raw entries, unique by source identity.
    sources: Vec<Source<T>>,

    /// `releases[i]` ends the subscription to `sources[i]`, if any.
    /// Always the same length as `sources`.
    releases: Vec<Option<Release>>,
}

struct SetInner<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    state: Mutex<SetState<T>>,
    binder: Binder<Vec<T>>,
}

impl<T> SetInner<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn notify(&self) -> Arc<dyn Fn() + Send + Sync> {
        Arc::new(self.binder.notifier())
    }

    /// Subscribe to `entry` and record the handle in its slot.
    fn attach(&self, entry: &Source<T>) {
        let release = entry.bind(self.notify());
        // Literal entries come back already released.
        if !release.is_released() {
            self.store_release(entry, release);
        }
    }

    fn store_release(&self, entry: &Source<T>, release: Release) {
        let rejected = {
            let mut state = self.state.lock();
            let state = &mut *state;
            match state.sources.iter().position(|s| s.same_source(entry)) {
                Some(index) if state.releases[index].is_none() => {
                    state.releases[index] = Some(release);
                    None
                }
                // The entry went away (or was bound twice) while subscribing.
                _ => Some(release),
            }
        };
        if let Some(release) = rejected {
            release.release();
        }
    }
}

impl<T> BinderHooks<Vec<T>> for SetInner<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn recompute(&self, current: &Vec<T>) -> Option<Vec<T>> {
        let sources = self.state.lock().sources.clone();
        let next: Vec<T> = sources.iter().map(Source::resolve).collect();
        sync_resolved(current, &next)
    }

    fn on_activate(&self) {
        let sources = self.state.lock().sources.clone();
        for source in &sources {
            self.attach(source);
        }
    }

    fn on_deactivate(&self) {
        let releases: Vec<Release> = {
            let mut state = self.state.lock();
            state.releases.iter_mut().filter_map(Option::take).collect()
        };
        trace!(count = releases.len(), "releasing set sources");
        for release in releases {
            release.release();
        }
    }
}

/// Diff `current` against `next`, keeping unchanged values in place.
///
/// Returns `None` when nothing was added or removed.
fn sync_resolved<T>(current: &[T], next: &[T]) -> Option<Vec<T>>
where
    T: Clone + PartialEq,
{
    let removed: Vec<&T> = current.iter().filter(|v| !next.contains(*v)).collect();
    let added: Vec<&T> = next.iter().filter(|v| !current.contains(*v)).collect();

    if removed.is_empty() && added.is_empty() {
        return None;
    }

    trace!(
        removed = removed.len(),
        added = added.len(),
        "set resolved values changed"
    );

    let mut result = current.to_vec();
    for value in removed {
        if let Some(index) = result.iter().position(|v| v == value) {
            result.remove(index);
        }
    }
    result.extend(added.into_iter().cloned());
    Some(result)
}

/// Drop later entries that share identity with an earlier one.
fn dedupe<T, I>(entries: I) -> Vec<Source<T>>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    I: IntoIterator<Item = Source<T>>,
{
    let mut unique: Vec<Source<T>> = Vec::new();
    for entry in entries {
        if !unique.iter().any(|s| s.same_source(&entry)) {
            unique.push(entry);
        }
    }
    unique
}

/// An observable set of resolved source values.
///
/// # Example
///
/// ```rust
/// use ripple_core::collections::{ObservableSet, Source};
/// use ripple_core::reactive::Observable;
///
/// let set = ObservableSet::from_values([1, 2]);
/// set.add(Source::Value(3));
/// set.add(Source::Value(3));
///
/// assert_eq!(set.len(), 3);
/// assert_eq!(set.read(), vec![1, 2]); // nothing listens yet
/// ```
pub struct ObservableSet<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    inner: Arc<SetInner<T>>,
}

impl<T> ObservableSet<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a set from default entries.
    ///
    /// Duplicate entries are dropped. If any entries are given, the resolved
    /// values are computed immediately so the set can be read before anyone
    /// subscribes.
    pub fn new<I>(defaults: I) -> Self
    where
        I: IntoIterator<Item = Source<T>>,
    {
        let sources = dedupe(defaults);
        let releases = vec![None; sources.len()];
        let has_defaults = !sources.is_empty();

        let inner = Arc::new_cyclic(|weak: &std::sync::Weak<SetInner<T>>| SetInner {
            state: Mutex::new(SetState { sources, releases }),
            binder: Binder::new(Vec::new(), weak.clone()),
        });

        if has_defaults {
            inner.binder.materialize();
        }

        Self { inner }
    }

    /// Create a set from literal values.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        Self::new(values.into_iter().map(Source::Value))
    }

    /// Append an entry unless an identical one is already present.
    pub fn add(&self, entry: Source<T>) {
        {
            let mut state = self.inner.state.lock();
            if state.sources.iter().any(|s| s.same_source(&entry)) {
                return;
            }
            state.sources.push(entry.clone());
            state.releases.push(None);
        }

        if self.inner.binder.is_live() {
            self.inner.attach(&entry);
        }
        self.inner.binder.on_update();
    }

    /// Remove an entry, releasing its subscription first.
    ///
    /// Returns whether the entry was present.
    pub fn delete(&self, entry: &Source<T>) -> bool {
        let release = {
            let mut state = self.inner.state.lock();
            let Some(index) = state.sources.iter().position(|s| s.same_source(entry)) else {
                return false;
            };
            state.sources.remove(index);
            state.releases.remove(index)
        };

        if let Some(release) = release {
            release.release();
        }
        self.inner.binder.on_update();
        true
    }

    /// Remove every entry, releasing all subscriptions.
    pub fn clear(&self) {
        let releases: Vec<Release> = {
            let mut state = self.inner.state.lock();
            state.sources.clear();
            state.releases.drain(..).flatten().collect()
        };

        for release in releases {
            release.release();
        }
        self.inner.binder.on_update();
    }

    /// Replace every entry.
    ///
    /// While live, subscriptions are reconciled: entries that stay keep their
    /// subscription, entries that left are released, new observable entries
    /// are subscribed. Duplicates collapse as in [`ObservableSet::new`].
    pub fn set<I>(&self, entries: I)
    where
        I: IntoIterator<Item = Source<T>>,
    {
        let entries = dedupe(entries);
        let live = self.inner.binder.is_live();

        let (stale, unbound) = {
            let mut state = self.inner.state.lock();
            let old_sources = std::mem::take(&mut state.sources);
            let mut old_releases = std::mem::take(&mut state.releases);

            let mut releases = Vec::with_capacity(entries.len());
            let mut unbound = Vec::new();
            for entry in &entries {
                let kept = old_sources
                    .iter()
                    .position(|s| s.same_source(entry))
                    .and_then(|index| old_releases[index].take());
                if kept.is_none() && live && entry.is_observable() {
                    unbound.push(entry.clone());
                }
                releases.push(kept);
            }

            state.sources = entries;
            state.releases = releases;
            let stale: Vec<Release> = old_releases.into_iter().flatten().collect();
            (stale, unbound)
        };

        for release in stale {
            release.release();
        }
        for entry in &unbound {
            self.inner.attach(entry);
        }
        self.inner.binder.on_update();
    }

    /// Whether a resolved value is currently exposed by the set.
    pub fn has(&self, value: &T) -> bool {
        self.inner.binder.get_value().contains(value)
    }

    /// Get the raw entry at `index`.
    pub fn get(&self, index: usize) -> Option<Source<T>> {
        self.inner.state.lock().sources.get(index).cloned()
    }

    /// Get the number of raw entries.
    pub fn len(&self) -> usize {
        self.inner.state.lock().sources.len()
    }

    /// Whether the set has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the raw entries.
    pub fn sources(&self) -> Vec<Source<T>> {
        self.inner.state.lock().sources.clone()
    }

    /// Whether anyone is subscribed.
    pub fn is_live(&self) -> bool {
        self.inner.binder.is_live()
    }
}

impl<T> Observable<Vec<T>> for ObservableSet<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn read(&self) -> Vec<T> {
        self.inner.binder.get_value()
    }

    fn subscribe(&self, listener: Listener<Vec<T>>) -> Release {
        self.inner.binder.add_listener(listener)
    }
}

impl<T> Clone for ObservableSet<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for ObservableSet<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(std::iter::empty())
    }
}

impl<T> Debug for ObservableSet<T>
where
    T: Clone + PartialEq + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableSet")
            .field("sources", &self.sources())
            .field("values", &self.read())
            .field("live", &self.is_live())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
