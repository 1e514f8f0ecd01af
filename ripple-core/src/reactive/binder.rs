//! Binder Implementation
//!
//! A Binder is the lazy, listener-gated recomputation primitive that every
//! derived collection in this crate is built on.
//!
//! # How Binders Work
//!
//! 1. A binder starts `Dormant`. Nothing is computed and update signals only
//!    mark it dirty.
//!
//! 2. The first listener moves it to `Live`: the owner's `on_activate` hook
//!    runs (attach to sources), then an initial recompute fills the cached
//!    value. The new listener is not called for this initial value.
//!
//! 3. While live, every `on_update` signal recomputes once. If the owner
//!    reports a change, the cached value is replaced and all listeners are
//!    notified synchronously, in subscription order.
//!
//! 4. Releasing the last listener runs `on_deactivate` (detach from sources)
//!    and returns the binder to `Dormant`. The last value is kept and can
//!    still be read, but it may be stale until the next activation.
//!
//! # Reentrancy
//!
//! No lock is held while a hook or listener runs. Listeners are notified from
//! a snapshot taken after the value is stored, so a listener may subscribe,
//! unsubscribe or mutate the owner without corrupting the iteration.
//!
//! Every stored value bumps a generation counter. If a listener mutates the
//! owner and the nested update stores a newer value, that nested round has
//! already notified every listener, so the outer round stops instead of
//! handing the remaining listeners a stale value.

use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;
use smallvec::SmallVec;
use tracing::{debug, trace};

use super::listener::{Listener, ListenerId};
use super::release::Release;

/// Counter for generating unique binder IDs.
static BINDER_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique binder ID.
fn next_binder_id() -> u64 {
    BINDER_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Activation state of a binder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No listeners. Recomputation is deferred until the next activation.
    ///
    /// `dirty` records that an update signal arrived while dormant.
    Dormant { dirty: bool },

    /// At least one listener. Every update signal recomputes.
    Live,
}

/// Behavior a binder borrows from the collection that owns it.
pub trait BinderHooks<T>: Send + Sync {
    /// Compute the next value from current source state.
    ///
    /// Returns `None` when the result is unchanged from `current`, in which
    /// case listeners are not notified.
    fn recompute(&self, current: &T) -> Option<T>;

    /// Called when the first listener is added, before the initial recompute.
    fn on_activate(&self) {}

    /// Called after the last listener is removed.
    fn on_deactivate(&self) {}
}

struct BinderState<T> {
    value: T,
    /// Bumped every time `value` is replaced.
    generation: u64,
    phase: Phase,
    listeners: IndexMap<ListenerId, Listener<T>>,
}

struct BinderShared<T> {
    id: u64,
    hooks: Weak<dyn BinderHooks<T>>,
    state: Mutex<BinderState<T>>,
}

impl<T> BinderShared<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn add_listener(self: &Arc<Self>, listener: Listener<T>) -> Release {
        let id = ListenerId::new();

        let activate = {
            let mut state = self.state.lock();
            state.listeners.insert(id, listener);
            match state.phase {
                Phase::Dormant { .. } => {
                    state.phase = Phase::Live;
                    true
                }
                Phase::Live => false,
            }
        };

        if activate {
            debug!(binder = self.id, "binder activated");
            if let Some(hooks) = self.hooks.upgrade() {
                hooks.on_activate();
                self.refresh(hooks.as_ref(), false);
            }
        }

        let weak = Arc::downgrade(self);
        Release::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.remove_listener(id);
            }
        })
    }

    fn remove_listener(&self, id: ListenerId) {
        let deactivate = {
            let mut state = self.state.lock();
            if state.listeners.shift_remove(&id).is_none() {
                return;
            }
            if state.listeners.is_empty() && state.phase == Phase::Live {
                state.phase = Phase::Dormant { dirty: false };
                true
            } else {
                false
            }
        };

        if deactivate {
            debug!(binder = self.id, "binder deactivated");
            if let Some(hooks) = self.hooks.upgrade() {
                hooks.on_deactivate();
            }
        }
    }

    fn on_update(&self) {
        {
            let mut state = self.state.lock();
            if let Phase::Dormant { dirty } = &mut state.phase {
                *dirty = true;
                trace!(binder = self.id, "update deferred while dormant");
                return;
            }
        }

        if let Some(hooks) = self.hooks.upgrade() {
            self.refresh(hooks.as_ref(), true);
        }
    }

    /// Recompute, store the result, and optionally notify listeners.
    fn refresh(&self, hooks: &dyn BinderHooks<T>, notify: bool) {
        let current = self.state.lock().value.clone();

        let Some(next) = hooks.recompute(&current) else {
            trace!(binder = self.id, "recompute produced no change");
            return;
        };

        let (generation, snapshot) = {
            let mut state = self.state.lock();
            state.value = next.clone();
            state.generation = state.generation.wrapping_add(1);
            let snapshot: SmallVec<[Listener<T>; 4]> = if notify && state.phase == Phase::Live {
                state.listeners.values().cloned().collect()
            } else {
                SmallVec::new()
            };
            (state.generation, snapshot)
        };

        trace!(binder = self.id, listeners = snapshot.len(), "value changed");
        for listener in snapshot {
            if self.state.lock().generation != generation {
                trace!(binder = self.id, "superseded by a nested update");
                break;
            }
            listener(&next);
        }
    }
}

/// Lazy, listener-gated holder of a derived value.
///
/// The owner passes a weak reference to its own [`BinderHooks`] so the
/// binder never keeps its owner alive.
pub struct Binder<T>
where
    T: Clone + Send + Sync + 'static,
{
    shared: Arc<BinderShared<T>>,
}

impl<T> Binder<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a dormant binder holding `initial`.
    pub fn new<H>(initial: T, hooks: Weak<H>) -> Self
    where
        H: BinderHooks<T> + 'static,
    {
        let hooks: Weak<dyn BinderHooks<T>> = hooks;
        Self {
            shared: Arc::new(BinderShared {
                id: next_binder_id(),
                hooks,
                state: Mutex::new(BinderState {
                    value: initial,
                    generation: 0,
                    phase: Phase::Dormant { dirty: false },
                    listeners: IndexMap::new(),
                }),
            }),
        }
    }

    /// Get the binder's unique ID.
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// Get the cached value without recomputing. May be stale while dormant.
    pub fn get_value(&self) -> T {
        self.shared.state.lock().value.clone()
    }

    /// Register a listener, activating the binder if it is the first one.
    pub fn add_listener(&self, listener: Listener<T>) -> Release {
        self.shared.add_listener(listener)
    }

    /// Signal that the inputs changed.
    pub fn on_update(&self) {
        self.shared.on_update();
    }

    /// A callback that forwards to [`Binder::on_update`].
    ///
    /// The callback holds the binder weakly, so handing it to a source does
    /// not keep the binder alive.
    pub fn notifier(&self) -> impl Fn() + Send + Sync + 'static {
        let weak = Arc::downgrade(&self.shared);
        move || {
            if let Some(shared) = weak.upgrade() {
                shared.on_update();
            }
        }
    }

    /// Compute the value once without activating or notifying.
    ///
    /// Used at construction time so a dormant collection built from default
    /// entries can be read before anything subscribes.
    pub fn materialize(&self) {
        if let Some(hooks) = self.shared.hooks.upgrade() {
            self.shared.refresh(hooks.as_ref(), false);
        }
        let mut state = self.shared.state.lock();
        if let Phase::Dormant { dirty } = &mut state.phase {
            *dirty = false;
        }
    }

    /// Get the current phase.
    pub fn phase(&self) -> Phase {
        self.shared.state.lock().phase
    }

    /// Whether at least one listener is registered.
    pub fn is_live(&self) -> bool {
        self.phase() == Phase::Live
    }

    /// Whether an update arrived while dormant.
    pub fn is_dirty(&self) -> bool {
        matches!(self.phase(), Phase::Dormant { dirty: true })
    }

    /// Get the number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.shared.state.lock().listeners.len()
    }
}

impl<T> Debug for Binder<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("Binder")
            .field("id", &self.shared.id)
            .field("phase", &state.phase)
            .field("value", &state.value)
            .field("listener_count", &state.listeners.len())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::listener;
    use std::sync::atomic::{AtomicI32, AtomicUsize};

    /// Hooks that mirror an external counter and log every call.
    #[derive(Default)]
    struct CounterHooks {
        input: AtomicI32,
        recomputes: AtomicUsize,
        events: Mutex<Vec<&'static str>>,
    }

    impl BinderHooks<i32> for CounterHooks {
        fn recompute(&self, current: &i32) -> Option<i32> {
            self.recomputes.fetch_add(1, Ordering::SeqCst);
            self.events.lock().push("recompute");
            let next = self.input.load(Ordering::SeqCst);
            (next != *current).then_some(next)
        }

        fn on_activate(&self) {
            self.events.lock().push("activate");
        }

        fn on_deactivate(&self) {
            self.events.lock().push("deactivate");
        }
    }

    fn setup() -> (Arc<CounterHooks>, Binder<i32>) {
        let hooks = Arc::new(CounterHooks::default());
        let binder = Binder::new(0, Arc::downgrade(&hooks));
        (hooks, binder)
    }

    #[test]
    fn binder_does_not_compute_before_first_listener() {
        let (hooks, binder) = setup();
        hooks.input.store(5, Ordering::SeqCst);

        binder.on_update();
        assert_eq!(hooks.recomputes.load(Ordering::SeqCst), 0);
        assert_eq!(binder.get_value(), 0);
        assert!(binder.is_dirty());
    }

    #[test]
    fn first_listener_activates_then_recomputes() {
        let (hooks, binder) = setup();
        hooks.input.store(3, Ordering::SeqCst);

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let _release = binder.add_listener(listener(move |_: &i32| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(binder.is_live());
        assert_eq!(binder.get_value(), 3);
        assert_eq!(*hooks.events.lock(), vec!["activate", "recompute"]);
        // The initial value is not broadcast.
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn live_update_notifies_in_subscription_order() {
        let (hooks, binder) = setup();
        let order = Arc::new(Mutex::new(Vec::new()));

        let order_a = order.clone();
        let _a = binder.add_listener(listener(move |v: &i32| order_a.lock().push(("a", *v))));
        let order_b = order.clone();
        let _b = binder.add_listener(listener(move |v: &i32| order_b.lock().push(("b", *v))));

        hooks.input.store(9, Ordering::SeqCst);
        binder.on_update();

        assert_eq!(*order.lock(), vec![("a", 9), ("b", 9)]);
    }

    #[test]
    fn unchanged_recompute_does_not_notify() {
        let (hooks, binder) = setup();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let _release = binder.add_listener(listener(move |_: &i32| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        }));

        binder.on_update();
        binder.on_update();

        assert_eq!(hooks.recomputes.load(Ordering::SeqCst), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn last_release_deactivates_and_keeps_value() {
        let (hooks, binder) = setup();
        hooks.input.store(4, Ordering::SeqCst);

        let first = binder.add_listener(listener(|_: &i32| {}));
        let second = binder.add_listener(listener(|_: &i32| {}));

        first.release();
        assert!(binder.is_live());

        second.release();
        second.release();
        assert_eq!(binder.phase(), Phase::Dormant { dirty: false });
        assert_eq!(
            hooks.events.lock().iter().filter(|e| **e == "deactivate").count(),
            1
        );

        // Stale while dormant, fresh after reactivation.
        hooks.input.store(8, Ordering::SeqCst);
        binder.on_update();
        assert_eq!(binder.get_value(), 4);

        let _again = binder.add_listener(listener(|_: &i32| {}));
        assert_eq!(binder.get_value(), 8);
    }

    #[test]
    fn listener_added_during_notification_waits_for_next_round() {
        let (hooks, binder) = setup();
        let binder = Arc::new(binder);
        let late_calls = Arc::new(AtomicUsize::new(0));
        let held = Arc::new(Mutex::new(Vec::new()));

        let binder_clone = binder.clone();
        let late_clone = late_calls.clone();
        let held_clone = held.clone();
        let _release = binder.add_listener(listener(move |_: &i32| {
            let late = late_clone.clone();
            let release = binder_clone.add_listener(listener(move |_: &i32| {
                late.fetch_add(1, Ordering::SeqCst);
            }));
            held_clone.lock().push(release);
        }));

        hooks.input.store(1, Ordering::SeqCst);
        binder.on_update();
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);
        assert_eq!(binder.listener_count(), 2);

        hooks.input.store(2, Ordering::SeqCst);
        binder.on_update();
        assert_eq!(late_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn nested_update_supersedes_outer_round() {
        let (hooks, binder) = setup();
        let binder = Arc::new(binder);
        let hooks_clone = hooks.clone();
        let binder_clone = binder.clone();
        let _first = binder.add_listener(listener(move |v: &i32| {
            if *v == 1 {
                hooks_clone.input.store(2, Ordering::SeqCst);
                binder_clone.on_update();
            }
        }));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let _second = binder.add_listener(listener(move |v: &i32| seen_clone.lock().push(*v)));

        hooks.input.store(1, Ordering::SeqCst);
        binder.on_update();

        assert_eq!(*seen.lock(), vec![2]);
        assert_eq!(binder.get_value(), 2);
    }

    #[test]
    fn materialize_fills_value_without_activating() {
        let (hooks, binder) = setup();
        hooks.input.store(6, Ordering::SeqCst);
        binder.on_update();

        binder.materialize();
        assert_eq!(binder.get_value(), 6);
        assert_eq!(binder.phase(), Phase::Dormant { dirty: false });
        assert!(!hooks.events.lock().contains(&"activate"));
    }

    #[test]
    fn dropped_owner_makes_updates_inert() {
        let (hooks, binder) = setup();
        let _release = binder.add_listener(listener(|_: &i32| {}));
        drop(hooks);

        binder.on_update();
        assert_eq!(binder.get_value(), 0);
    }
}
