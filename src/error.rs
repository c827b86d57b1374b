//! Error types for coplay.

use thiserror::Error;

/// Errors that can occur while building or querying a recommender.
#[derive(Debug, Error)]
pub enum CoplayError {
    /// No interaction records were supplied; nothing can be built.
    #[error("input contains no interaction records")]
    EmptyInput,

    /// I/O error (file operations, disk I/O).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record that does not parse as `user \t item \t count`.
    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// A play count below 1. Zero or negative counts are invalid input.
    #[error("invalid play count {count} at line {line}: counts must be >= 1")]
    InvalidCount { line: usize, count: i64 },

    /// A user identifier absent from the training index.
    #[error("unknown user identifier: {0}")]
    UnknownUser(String),

    /// An item identifier absent from the training index.
    #[error("unknown item identifier: {0}")]
    UnknownItem(String),

    /// A persisted similarity matrix whose length does not match the
    /// expected `n(n-1)/2` bytes for the session's user count.
    #[error("similarity matrix size mismatch: expected {expected} bytes, got {actual}")]
    MatrixSizeMismatch { expected: usize, actual: usize },

    /// A similarity value that left `[0, 100]` for valid inputs. This
    /// indicates a numeric fault upstream and is never silently clipped.
    #[error("similarity for user pair ({user_a}, {user_b}) out of range: {value}")]
    NumericFault { user_a: u32, user_b: u32, value: f32 },

    /// An empty test set; error statistics would divide by zero.
    #[error("test set is empty")]
    EmptyTestSet,
}

/// Result type for coplay operations.
pub type Result<T> = std::result::Result<T, CoplayError>;
