//! Observable Mapped Array
//!
//! An `ObservableMappedArray` pairs a fixed-indexing [`ObservableArray`] with
//! a [`MappedView`] over it. Callers work with mapped items; every mutation
//! looks up the mapped item's current index and translates into plain list
//! edits. The mapped array owns no storage of its own.
//!
//! # Moves
//!
//! A move is an insert of the raw item followed by a delete of the original:
//!
//! - Forward (`current < target`): insert at `target + 1`, then delete at
//!   `current`. The delete shifts everything after `current` left by one, so
//!   the item lands at `target`.
//! - Backward (`current >= target`): insert at `target`, then delete the
//!   original, which the insert pushed to `current + 1`.
//!
//! Every list edit is staged on the mapped view first, carrying the mapped
//! item into its new slot. Identity therefore survives moves even when the
//! list holds equal raw items.

use std::fmt::{self, Debug};
use std::sync::Arc;

use tracing::trace;

use super::array::ObservableArray;
use super::map::MappedView;
use super::options::CollectionOptions;
use crate::error::{ListError, Result};
use crate::reactive::{Listener, Observable, Release};

/// An observable list exposed through an element-wise transform.
///
/// # Example
///
/// ```rust
/// use ripple_core::collections::ObservableMappedArray;
///
/// let rows = ObservableMappedArray::new(["a", "b", "c", "d"], |s: &&str| s.to_uppercase());
/// let a = rows.get(0).unwrap();
///
/// rows.move_item(&a, 2).unwrap();
/// assert_eq!(rows.list().to_vec(), vec!["b", "c", "a", "d"]);
/// assert_eq!(rows.index_of(&a), Some(2));
/// ```
pub struct ObservableMappedArray<T, M>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    M: Send + Sync + 'static,
{
    list: ObservableArray<T>,
    view: MappedView<T, M>,
}

impl<T, M> ObservableMappedArray<T, M>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    M: Send + Sync + 'static,
{
    /// Create a mapped array from default raw items.
    pub fn new<I, F>(defaults: I, lambda: F) -> Self
    where
        I: IntoIterator<Item = T>,
        F: Fn(&T) -> M + Send + Sync + 'static,
    {
        Self::with_options(defaults, lambda, CollectionOptions::default())
    }

    /// Create a mapped array whose list and view share `options`.
    pub fn with_options<I, F>(defaults: I, lambda: F, options: CollectionOptions<T>) -> Self
    where
        I: IntoIterator<Item = T>,
        F: Fn(&T) -> M + Send + Sync + 'static,
    {
        let list = ObservableArray::with_options(defaults, options);
        let view = MappedView::new(list.clone(), lambda);
        Self { list, view }
    }

    /// Append a raw item and return its mapped item.
    pub fn push(&self, item: T) -> Arc<M> {
        let mapped = self.view.map_item(&item);
        self.view.stage_insert(self.list.len(), item.clone(), Arc::clone(&mapped));
        self.list.push(item);
        mapped
    }

    /// Insert a raw item at `at` and return its mapped item.
    pub fn insert(&self, item: T, at: usize) -> Result<Arc<M>> {
        check_insert(at, self.list.len())?;
        let mapped = self.view.map_item(&item);
        self.view.stage_insert(at, item.clone(), Arc::clone(&mapped));
        self.list.insert(item, at)?;
        Ok(mapped)
    }

    /// Remove the raw item behind `mapped`.
    ///
    /// Returns `false`, leaving the list untouched, if `mapped` is not
    /// currently in the view.
    pub fn remove(&self, mapped: &Arc<M>) -> bool {
        let Some(index) = self.view.index_of(mapped) else {
            return false;
        };
        self.view.stage_delete(index);
        self.list.delete_at(index).is_ok()
    }

    /// Move the item behind `mapped` so it ends up at `target`.
    ///
    /// Returns `Ok(false)` if `mapped` is not in the view. An out-of-range
    /// `target` is reported and leaves the list unchanged.
    pub fn move_item(&self, mapped: &Arc<M>, target: usize) -> Result<bool> {
        let Some(current) = self.view.index_of(mapped) else {
            return Ok(false);
        };
        let Some(item) = self.list.get(current) else {
            return Ok(false);
        };

        let (insert_at, delete_at) = if current < target {
            (target + 1, current)
        } else {
            (target, current + 1)
        };
        check_insert(insert_at, self.list.len())?;

        trace!(from = current, to = target, "moving mapped item");
        self.view.stage_insert(insert_at, item.clone(), Arc::clone(mapped));
        self.list.insert(item, insert_at)?;
        self.view.stage_delete(delete_at);
        self.list.delete_at(delete_at)?;
        Ok(true)
    }

    /// Replace every raw item.
    pub fn set<I>(&self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.list.set(items);
    }

    /// Get the mapped item at `index`.
    pub fn get(&self, index: usize) -> Option<Arc<M>> {
        self.view.get(index)
    }

    /// Find the current index of a mapped item by identity.
    pub fn index_of(&self, mapped: &Arc<M>) -> Option<usize> {
        self.view.index_of(mapped)
    }

    /// Get the number of items.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Whether the array is empty.
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// The underlying raw list.
    pub fn list(&self) -> &ObservableArray<T> {
        &self.list
    }

    /// The mapped view.
    pub fn view(&self) -> &MappedView<T, M> {
        &self.view
    }
}

fn check_insert(at: usize, len: usize) -> Result<()> {
    if at > len {
        return Err(ListError::OutOfBounds { index: at, len });
    }
    Ok(())
}

impl<T, M> Observable<Vec<Arc<M>>> for ObservableMappedArray<T, M>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    M: Send + Sync + 'static,
{
    fn read(&self) -> Vec<Arc<M>> {
        self.view.read()
    }

    fn subscribe(&self, listener: Listener<Vec<Arc<M>>>) -> Release {
        self.view.subscribe(listener)
    }
}

impl<T, M> Clone for ObservableMappedArray<T, M>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    M: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            list: self.list.clone(),
            view: self.view.clone(),
        }
    }
}

impl<T, M> Debug for ObservableMappedArray<T, M>
where
    T: Clone + PartialEq + Send + Sync + Debug + 'static,
    M: Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableMappedArray")
            .field("list", &self.list)
            .field("view", &self.view)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::listener;
    use parking_lot::Mutex;

    fn letters() -> ObservableMappedArray<char, char> {
        ObservableMappedArray::new(['A', 'B', 'C', 'D'], |c: &char| *c)
    }

    #[test]
    fn forward_move_lands_on_target() {
        let array = letters();
        let a = array.get(0).unwrap();

        assert!(array.move_item(&a, 2).unwrap());
        assert_eq!(array.list().to_vec(), vec!['B', 'C', 'A', 'D']);
        assert_eq!(array.index_of(&a), Some(2));
    }

    #[test]
    fn backward_move_lands_on_target() {
        let array = letters();
        let d = array.get(3).unwrap();

        assert!(array.move_item(&d, 1).unwrap());
        assert_eq!(array.list().to_vec(), vec!['A', 'D', 'B', 'C']);
        assert_eq!(array.index_of(&d), Some(1));
    }

    #[test]
    fn move_onto_own_index_is_a_no_op() {
        let array = letters();
        let b = array.get(1).unwrap();

        assert!(array.move_item(&b, 1).unwrap());
        assert_eq!(array.list().to_vec(), vec!['A', 'B', 'C', 'D']);
    }

    #[test]
    fn move_of_missing_item_does_nothing() {
        let array = letters();
        let a = array.get(0).unwrap();
        assert!(array.remove(&a));

        assert!(!array.move_item(&a, 2).unwrap());
        assert_eq!(array.list().to_vec(), vec!['B', 'C', 'D']);
    }

    #[test]
    fn move_past_the_end_is_reported() {
        let array = letters();
        let a = array.get(0).unwrap();

        assert_eq!(
            array.move_item(&a, 4),
            Err(ListError::OutOfBounds { index: 5, len: 4 })
        );
        assert_eq!(array.list().to_vec(), vec!['A', 'B', 'C', 'D']);
    }

    #[test]
    fn remove_missing_item_leaves_array_unchanged() {
        let array = letters();
        let c = array.get(2).unwrap();

        assert!(array.remove(&c));
        assert!(!array.remove(&c));
        assert_eq!(array.list().to_vec(), vec!['A', 'B', 'D']);
    }

    #[test]
    fn push_and_insert_return_mapped_items() {
        let array = ObservableMappedArray::new(vec![1, 2], |n: &i32| n * 10);

        let pushed = array.push(3);
        assert_eq!(*pushed, 30);
        assert_eq!(array.index_of(&pushed), Some(2));

        let inserted = array.insert(0, 0).unwrap();
        assert_eq!(*inserted, 0);
        assert_eq!(array.len(), 4);
        assert_eq!(array.index_of(&pushed), Some(3));

        assert_eq!(
            array.insert(9, 7).unwrap_err(),
            ListError::OutOfBounds { index: 7, len: 4 }
        );
    }

    #[test]
    fn moves_track_identity_among_equal_raw_items() {
        let array = ObservableMappedArray::new(['X', 'A', 'Y', 'A'], |c: &char| *c);
        let first_a = array.get(1).unwrap();
        let last_a = array.get(3).unwrap();

        assert!(array.move_item(&last_a, 0).unwrap());
        assert_eq!(array.list().to_vec(), vec!['A', 'X', 'A', 'Y']);
        assert_eq!(array.index_of(&last_a), Some(0));
        assert_eq!(array.index_of(&first_a), Some(2));

        assert!(array.move_item(&first_a, 4).is_err());
        assert!(array.move_item(&first_a, 2).unwrap());
        assert_eq!(array.index_of(&first_a), Some(2));

        assert!(array.remove(&last_a));
        assert_eq!(array.list().to_vec(), vec!['X', 'A', 'Y']);
        assert_eq!(array.index_of(&first_a), Some(1));
    }

    #[test]
    fn live_moves_track_identity_among_equal_raw_items() {
        let array = ObservableMappedArray::new(['A', 'X', 'A', 'Y'], |c: &char| *c);
        let _release = array.subscribe(listener(|_: &Vec<Arc<char>>| {}));
        let first_a = array.get(0).unwrap();
        let second_a = array.get(2).unwrap();

        assert!(array.move_item(&first_a, 2).unwrap());
        assert_eq!(array.list().to_vec(), vec!['X', 'A', 'A', 'Y']);
        assert_eq!(array.index_of(&first_a), Some(2));
        assert_eq!(array.index_of(&second_a), Some(1));
    }

    #[test]
    fn insert_of_equal_raw_item_returns_the_new_mapped_item() {
        let array = ObservableMappedArray::new(['X', 'A'], |c: &char| c.to_string());
        let old_a = array.get(1).unwrap();

        let new_a = array.insert('A', 0).unwrap();
        assert!(!Arc::ptr_eq(&old_a, &new_a));
        assert_eq!(array.index_of(&new_a), Some(0));
        assert_eq!(array.index_of(&old_a), Some(2));
    }

    #[test]
    fn set_replaces_raw_items() {
        let array = letters();
        array.set(['X', 'Y']);
        assert_eq!(array.len(), 2);
        assert_eq!(*array.get(1).unwrap(), 'Y');
    }

    #[test]
    fn live_move_settles_on_final_order() {
        let array = letters();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = seen.clone();
        let _release = array.subscribe(listener(move |v: &Vec<Arc<char>>| {
            seen_clone.lock().push(v.iter().map(|c| **c).collect::<String>());
        }));

        let d = array.get(3).unwrap();
        array.move_item(&d, 0).unwrap();

        assert_eq!(seen.lock().last().map(String::as_str), Some("DABC"));
        assert_eq!(array.index_of(&d), Some(0));
    }
}
