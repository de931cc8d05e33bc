//! Driven ports (Outbound dependencies)

use async_trait::async_trait;
use shared_types::{HlcTimestamp, ProcessingResult};

/// Applies agreed results to persistent application state.
///
/// Called strictly in timestamp order, once per committed timestamp.
#[async_trait]
pub trait ResultCommitter: Send + Sync {
    async fn apply_processing_results(&self, result: &ProcessingResult) -> Result<(), String>;
}

/// The node's own optimistic execution, built ahead of consensus.
#[async_trait]
pub trait SpeculativeState: Send + Sync {
    /// Discard every speculative write at or after `hlc`.
    async fn rollback_from(&self, hlc: HlcTimestamp) -> Result<(), String>;
}

/// Speculative state for nodes that do not execute ahead of consensus.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSpeculation;

#[async_trait]
impl SpeculativeState for NoSpeculation {
    async fn rollback_from(&self, _hlc: HlcTimestamp) -> Result<(), String> {
        Ok(())
    }
}
