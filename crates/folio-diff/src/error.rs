//! Error types for the diff crate.

/// Errors that can occur during diff operations.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// A snapshot could not be converted to its field representation.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A snapshot serialized to something other than a struct-like object.
    #[error("expected an object snapshot, got {0}")]
    NotAnObject(&'static str),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
