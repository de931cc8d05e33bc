//! Driving ports (Inbound API)

use crate::domain::{ConsensusResult, EntryStage, ReportOutcome, TickReport};
use async_trait::async_trait;
use shared_types::{HlcTimestamp, PeerReport};

/// What the node process drives the validation queue through.
#[async_trait]
pub trait ValidationQueueApi: Send {
    /// Admit one peer report.
    async fn append(&mut self, report: PeerReport) -> ReportOutcome;

    /// Run one evaluate-and-commit tick.
    async fn process_next(&mut self) -> ConsensusResult<TickReport>;

    /// Highest committed timestamp, if any.
    fn last_committed(&self) -> Option<HlcTimestamp>;

    /// Timestamps not yet committed.
    fn pending_count(&self) -> usize;

    /// Where `hlc` sits in the queue; `None` if never seen.
    fn stage(&self, hlc: &HlcTimestamp) -> Option<EntryStage>;
}
