//! Collection options.

use std::fmt;
use std::sync::Arc;

/// Equality used to compare raw items.
pub type Comparer<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// Options shared by the indexed collections.
///
/// The comparer decides when an array's contents changed and when a mapped
/// view may reuse a previously mapped item. Without one, `PartialEq` is used.
pub struct CollectionOptions<T> {
    comparer: Option<Comparer<T>>,
}

impl<T> CollectionOptions<T>
where
    T: PartialEq,
{
    /// Options with the default (`PartialEq`) comparer.
    pub fn new() -> Self {
        Self { comparer: None }
    }

    /// Use a custom equality for raw items.
    pub fn with_comparer<F>(mut self, comparer: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        self.comparer = Some(Arc::new(comparer));
        self
    }

    /// Compare two items with the configured comparer.
    pub fn items_equal(&self, a: &T, b: &T) -> bool {
        match &self.comparer {
            Some(comparer) => comparer(a, b),
            None => a == b,
        }
    }
}

impl<T: PartialEq> Default for CollectionOptions<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for CollectionOptions<T> {
    fn clone(&self) -> Self {
        Self {
            comparer: self.comparer.clone(),
        }
    }
}

impl<T> fmt::Debug for CollectionOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionOptions")
            .field("custom_comparer", &self.comparer.is_some())
            .finish()
    }
}
