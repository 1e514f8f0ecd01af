//! The observable surface shared by every reactive type in this crate.

use super::listener::Listener;
use super::release::Release;

/// A value that can be read and watched.
///
/// Reading never activates anything: it returns whatever the observable
/// currently holds. Subscribing registers a listener that is called
/// synchronously, in subscription order, each time the value changes.
pub trait Observable<T>: Send + Sync {
    /// Get the current value.
    fn read(&self) -> T;

    /// Register a listener. Drop the subscription with the returned handle.
    fn subscribe(&self, listener: Listener<T>) -> Release;
}
