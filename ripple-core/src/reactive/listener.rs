//! Listener types for the reactive system.
//!
//! A listener is a callback registered on an observable. It receives the
//! new value synchronously whenever that value changes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Unique identifier for a registered listener.
///
/// Every registration gets a fresh ID, so the same closure registered twice
/// is tracked (and released) as two independent listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Generate a new unique listener ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

/// A shared listener callback.
///
/// Listeners are reference counted so a registry can hand out a stable
/// snapshot for notification without holding its lock.
pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Wrap a closure as a [`Listener`].
pub fn listener<T, F>(f: F) -> Listener<T>
where
    F: Fn(&T) + Send + Sync + 'static,
{
    Arc::new(f)
}
