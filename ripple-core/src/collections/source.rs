//! Set entries.
//!
//! A set is fed by sources: either a literal value, or an observable whose
//! current value is read at recompute time and which is subscribed to while
//! the set is live.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::reactive::{Observable, ObservableValue, Release};

/// A raw entry of an observable set.
pub enum Source<T> {
    /// A literal value, taken as-is.
    Value(T),

    /// A subscribable accessor, resolved by reading it.
    Observable(Arc<dyn Observable<T>>),
}

impl<T> Source<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Wrap a shared observable as a source.
    ///
    /// Identity follows the `Arc`: clones of the returned source are the
    /// same entry, a second `Source::observable` call is a different one.
    pub fn observable<O>(observable: Arc<O>) -> Self
    where
        O: Observable<T> + 'static,
    {
        Source::Observable(observable)
    }

    /// Get the current value of this source.
    pub fn resolve(&self) -> T {
        match self {
            Source::Value(value) => value.clone(),
            Source::Observable(observable) => observable.read(),
        }
    }

    /// Whether this source can be subscribed to.
    pub fn is_observable(&self) -> bool {
        matches!(self, Source::Observable(_))
    }

    /// Source identity: literals compare by value, observables by pointer.
    pub fn same_source(&self, other: &Source<T>) -> bool {
        match (self, other) {
            (Source::Value(a), Source::Value(b)) => a == b,
            (Source::Observable(a), Source::Observable(b)) => {
                Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
            }
            _ => false,
        }
    }

    /// Subscribe `notify` to this source.
    ///
    /// Literal values have nothing to subscribe to and return
    /// [`Release::noop`].
    pub(crate) fn bind(&self, notify: Arc<dyn Fn() + Send + Sync>) -> Release {
        match self {
            Source::Value(_) => Release::noop(),
            Source::Observable(observable) => {
                trace!("binding observable source");
                observable.subscribe(Arc::new(move |_: &T| notify()))
            }
        }
    }
}

impl<T> From<ObservableValue<T>> for Source<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn from(value: ObservableValue<T>) -> Self {
        Source::Observable(Arc::new(value))
    }
}

impl<T: Clone> Clone for Source<T> {
    fn clone(&self) -> Self {
        match self {
            Source::Value(value) => Source::Value(value.clone()),
            Source::Observable(observable) => Source::Observable(Arc::clone(observable)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Source<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Source::Observable(_) => f.write_str("Observable(..)"),
        }
    }
}
