//! # Error Types
//!
//! Defines error types used across subsystems.

use thiserror::Error;

/// Errors raised by the storage collaborators (block store, state store).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Block not found in storage.
    #[error("Block not found: {0}")]
    NotFound(u64),

    /// A block was written out of sequence.
    #[error("Non-sequential write: expected block {expected}, got {actual}")]
    NonSequential { expected: u64, actual: u64 },

    /// Applying state deltas failed.
    #[error("State write failed: {0}")]
    StateWrite(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Errors while parsing a logical timestamp from its string form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampParseError {
    /// Missing `_` separator between wall time and counter.
    #[error("Malformed HLC timestamp: {0}")]
    Malformed(String),

    /// One of the numeric parts did not parse.
    #[error("Invalid HLC component in {0}")]
    InvalidComponent(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_sequential_message() {
        let err = StorageError::NonSequential {
            expected: 5,
            actual: 7,
        };
        assert!(err.to_string().contains("expected block 5"));
    }

    #[test]
    fn test_malformed_timestamp_message() {
        let err = TimestampParseError::Malformed("abc".to_string());
        assert!(err.to_string().contains("abc"));
    }
}
