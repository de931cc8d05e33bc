//! # Domain Errors
//!
//! Error types for chain catchup.
//!
//! Unreachable peers and unverifiable blocks are not errors: they only
//! remove a peer as a candidate for the current block. What surfaces here
//! is local storage failure and sustained inability to progress.

use shared_types::StorageError;
use thiserror::Error;

/// Catchup error types.
#[derive(Debug, Error)]
pub enum CatchupError {
    /// Local block or state storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configured pass limit exhausted without reaching the network height.
    #[error("Catchup stalled at height {height} after {passes} passes")]
    Stalled {
        /// Trusted tip when catchup gave up
        height: u64,
        /// Passes attempted
        passes: u32,
    },

    /// Configuration cannot be run with.
    #[error("Invalid catchup config: {0}")]
    InvalidConfig(String),
}

/// Result type for catchup operations.
pub type CatchupResult<T> = Result<T, CatchupError>;
