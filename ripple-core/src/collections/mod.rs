//! Derived Collections
//!
//! Collections built on top of the binder:
//!
//! - [`ObservableSet`]: resolves a list of sources and keeps its visible
//!   values in sync through a minimal diff.
//! - [`ObservableArray`]: a plain indexed list with fixed indexing.
//! - [`MappedView`]: an element-wise transform of an array whose mapped
//!   items are looked up by identity.
//! - [`ObservableMappedArray`]: an array and its mapped view behind one
//!   surface, with mutations addressed by mapped item.
//!
//! All of them are cheap handles over shared state; cloning one gives
//! another handle to the same collection.

mod array;
mod map;
mod mapped_array;
mod options;
mod set;
mod source;

pub use array::ObservableArray;
pub use map::MappedView;
pub use mapped_array::ObservableMappedArray;
pub use options::{CollectionOptions, Comparer};
pub use set::ObservableSet;
pub use source::Source;
