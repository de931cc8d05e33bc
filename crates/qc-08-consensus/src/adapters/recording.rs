//! Recording adapters
//!
//! Keep everything they are asked to do, in order, so callers can inspect
//! what the queue committed or rolled back.

use crate::ports::{ResultCommitter, SpeculativeState};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{HlcTimestamp, ProcessingResult};

/// Applies results to an in-memory log.
pub struct RecordingCommitter {
    applied: RwLock<Vec<ProcessingResult>>,
    fail_with: RwLock<Option<String>>,
}

impl RecordingCommitter {
    pub fn new() -> Self {
        Self {
            applied: RwLock::new(Vec::new()),
            fail_with: RwLock::new(None),
        }
    }

    pub fn applied(&self) -> Vec<ProcessingResult> {
        self.applied.read().clone()
    }

    pub fn applied_timestamps(&self) -> Vec<HlcTimestamp> {
        self.applied.read().iter().map(|r| r.hlc_timestamp).collect()
    }

    pub fn applied_count(&self) -> usize {
        self.applied.read().len()
    }

    /// Make every following apply fail with `reason` (None to recover).
    pub fn set_failure(&self, reason: Option<String>) {
        *self.fail_with.write() = reason;
    }
}

impl Default for RecordingCommitter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultCommitter for RecordingCommitter {
    async fn apply_processing_results(&self, result: &ProcessingResult) -> Result<(), String> {
        if let Some(reason) = self.fail_with.read().clone() {
            return Err(reason);
        }
        self.applied.write().push(result.clone());
        Ok(())
    }
}

/// Records every rollback point.
#[derive(Default)]
pub struct RecordingSpeculativeState {
    rollbacks: RwLock<Vec<HlcTimestamp>>,
}

impl RecordingSpeculativeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rollbacks(&self) -> Vec<HlcTimestamp> {
        self.rollbacks.read().clone()
    }
}

#[async_trait]
impl SpeculativeState for RecordingSpeculativeState {
    async fn rollback_from(&self, hlc: HlcTimestamp) -> Result<(), String> {
        self.rollbacks.write().push(hlc);
        Ok(())
    }
}
