use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq)]
pub enum TypeError {
    #[error("document key must not be empty")]
    EmptyKey,

    #[error("brightness out of range: {0} (expected 0..=100)")]
    InvalidBrightness(u8),

    #[error("max zoom must be at least 1.0, got {0}")]
    InvalidMaxZoom(f32),
}
