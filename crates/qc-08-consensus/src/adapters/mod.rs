//! Adapters layer
//!
//! In-process implementations of the outbound ports, used by tests and by
//! embedders that keep application state in memory.

mod recording;

pub use recording::{RecordingCommitter, RecordingSpeculativeState};
