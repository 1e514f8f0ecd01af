//! Error types.
//!
//! Most failure modes in this crate are silent by design: releasing twice,
//! mutating a dormant collection, or removing an item that is not present
//! all succeed as no-ops. The only hard failure is an out-of-range index on
//! an indexed list, which is reported here rather than clamped.

use thiserror::Error;

/// Errors reported by indexed list operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ListError {
    /// The index is past the end of the list.
    #[error("index {index} is out of bounds for list of length {len}")]
    OutOfBounds { index: usize, len: usize },
}

/// Result alias for list operations.
pub type Result<T> = std::result::Result<T, ListError>;
