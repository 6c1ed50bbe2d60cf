//! Error kinds returned by the tree operations.

use thiserror::Error;

/// The result of a failed or successful tree operation.
///
/// Every variant here is recoverable: returning one leaves the tree exactly
/// as it was before the call (see each operation's doc comment for the
/// precise point past which it cannot fail).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    /// The path failed the grammar described in [`crate::path`].
    #[error("invalid path")]
    InvalidArgument,
    /// Some intermediate or final path component does not exist.
    #[error("no such folder")]
    NotFound,
    /// The target name is already present, or the target is the root.
    #[error("folder already exists")]
    AlreadyExists,
    /// `remove` was asked to delete a folder that still has children.
    #[error("folder is not empty")]
    NotEmpty,
    /// The root was named as the source of `remove` or `move`.
    #[error("root folder is busy")]
    Busy,
    /// `move`'s target lies inside the subtree rooted at its source.
    #[error("cannot move a folder inside itself")]
    MoveIntoOwnSubtree,
}

/// Shorthand for the result type returned by every tree operation.
pub type TreeResult<T> = Result<T, TreeError>;
