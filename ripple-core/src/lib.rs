//! Ripple Core
//!
//! This crate provides a minimal demand-driven reactive-value engine.
//! It implements:
//!
//! - A lazy, listener-gated recomputation primitive (the binder)
//! - Observable sets that synchronize against value-or-observable sources
//! - Observable mapped arrays addressed by mapped-item identity
//!
//! Nothing is computed until something listens. When the last listener
//! leaves, every upstream subscription is released and the last value is
//! kept around, possibly stale, until the next listener arrives.
//!
//! # Architecture
//!
//! The crate is organized into two modules:
//!
//! - `reactive`: Binder, listeners, release handles, single observable values
//! - `collections`: Sets, indexed arrays, mapped views and mapped arrays
//!
//! # Example
//!
//! ```rust
//! use ripple_core::collections::{ObservableSet, Source};
//! use ripple_core::reactive::{listener, Observable, ObservableValue};
//!
//! let selected = ObservableValue::new(2);
//! let set = ObservableSet::new([Source::Value(1), Source::from(selected.clone())]);
//!
//! let release = set.subscribe(listener(|values: &Vec<i32>| {
//!     println!("now: {values:?}");
//! }));
//!
//! selected.set(3); // prints "now: [1, 3]"
//! release.release();
//! ```

pub mod collections;
pub mod error;
pub mod reactive;

pub use error::{ListError, Result};
