//! Error types for registry operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during registry operations.
///
/// Store failures are passed through unchanged. The registry never retries
/// and never rolls back in-memory changes made before the failure.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The persistence backend failed.
    #[error("store error: {0}")]
    Store(#[from] folio_store::StoreError),

    /// A settings snapshot could not be diffed for notification.
    #[error("diff error: {0}")]
    Diff(#[from] folio_diff::DiffError),

    /// A settings value is out of range.
    #[error("invalid settings: {0}")]
    Invalid(#[from] folio_types::TypeError),

    /// A settings file could not be parsed or written.
    #[error("settings source {path}: {reason}")]
    Source { path: PathBuf, reason: String },

    /// I/O error while reading settings.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A listener tried to start a settings change from inside a change
    /// notification on the same thread.
    #[error("settings change requested from inside a change notification")]
    ReentrantChange,

    /// A registry lock was poisoned by a panicking thread.
    #[error("registry lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Convenience type alias for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
