//! Errors returned by tree operations.
//!
//! Only [`Tree::remove`][crate::linked::Tree::remove] treats a missing item as an error.
//! Lookups like [`Tree::find`][crate::linked::Tree::find] return `None` instead.

use thiserror::Error;

/// Errors that can occur when mutating a [`Tree`][crate::linked::Tree].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The item to remove is not stored in the tree. The tree was not modified.
    #[error("item not in tree")]
    NotFound,
}
