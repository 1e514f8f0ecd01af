//! Reactive Primitives
//!
//! This module implements the demand-driven core: binders, listeners,
//! release handles, and the single-value observable.
//!
//! # Concepts
//!
//! ## Binders
//!
//! A Binder caches a derived value and recomputes it only while someone is
//! listening. The first listener activates it; the last one to leave puts it
//! back to sleep. Updates that arrive while nobody listens are deferred to
//! the next activation, which always recomputes from current source state.
//!
//! ## Observables
//!
//! Everything a caller can watch implements [`Observable`]: `read()` returns
//! the current value, `subscribe()` registers a listener and returns a
//! [`Release`] handle.
//!
//! # Implementation Notes
//!
//! All notification is synchronous. Listener registries are snapshotted
//! before iteration so listeners may freely subscribe, unsubscribe or
//! mutate while being notified.

mod binder;
mod listener;
mod observable;
mod release;
mod value;

pub use binder::{Binder, BinderHooks, Phase};
pub use listener::{listener, Listener, ListenerId};
pub use observable::Observable;
pub use release::Release;
pub use value::ObservableValue;
