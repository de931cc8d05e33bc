//! # Integration Scenarios
//!
//! Several nodes in one process. Each node owns a validation queue whose
//! committer mints blocks into that node's block and state stores; catchup
//! reads those same stores over the in-process network.

pub mod support;

mod catchup_flow;
mod consensus_flow;
