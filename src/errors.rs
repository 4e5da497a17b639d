//! Repository error taxonomy
//!
//! Core operations return `anyhow::Result` and attach context along the way.
//! Failures that callers need to tell apart are raised as a `RepositoryError`
//! at the root of the chain; `RepositoryError::classify` recovers it.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("not a git repository (or any of the parent directories): {0}")]
    RepositoryNotFound(PathBuf),

    #[error("invalid repository state: {0}")]
    InvalidRepositoryState(String),

    #[error("unsupported repositoryformatversion {0}")]
    UnsupportedFormatVersion(i64),

    #[error("object {0} not found")]
    ObjectNotFound(String),

    #[error("corrupt object: {0}")]
    CorruptObject(String),

    #[error("unknown object type '{0}'")]
    UnknownObjectType(String),

    #[error("ref {0} does not point to anything")]
    DanglingRef(String),

    #[error("ref {0} is part of a symbolic ref cycle")]
    RefCycle(String),

    #[error("unable to create '{}': lock file already exists", .0.display())]
    LockHeld(PathBuf),

    #[error("refusing to check out into non-empty directory {}", .0.display())]
    UnsafeCheckout(PathBuf),

    #[error("path conflict at {}", .0.display())]
    PathConflict(PathBuf),
}

impl RepositoryError {
    /// Find the typed repository error inside an `anyhow` chain, if any.
    pub fn classify(error: &anyhow::Error) -> Option<&RepositoryError> {
        error
            .chain()
            .find_map(|cause| cause.downcast_ref::<RepositoryError>())
    }
}
