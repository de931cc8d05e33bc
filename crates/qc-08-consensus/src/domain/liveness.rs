//! Commit-loop stall detection
//!
//! The queue cannot commit past an earliest timestamp that never reaches
//! consensus. The monitor counts ticks where work was pending but nothing
//! was committed, and reports a stall once the count crosses a threshold.
//!
//! ```text
//! [HEALTHY] ──idle tick──→ [DEGRADED {n}] ──n >= warn_after──→ [STALLED {n}]
//!     ↑                           │                                 │
//!     └──────────── commit ───────┴─────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

/// Liveness of the commit loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LivenessState {
    #[default]
    Healthy,
    /// Pending work, no commits for `idle_ticks` ticks.
    Degraded { idle_ticks: u64 },
    /// Idle past the warning threshold.
    Stalled { idle_ticks: u64 },
}

#[derive(Debug)]
pub struct LivenessMonitor {
    warn_after: u64,
    idle_ticks: u64,
    state: LivenessState,
}

impl LivenessMonitor {
    pub fn new(warn_after: u64) -> Self {
        Self {
            warn_after: warn_after.max(1),
            idle_ticks: 0,
            state: LivenessState::Healthy,
        }
    }

    pub fn state(&self) -> LivenessState {
        self.state
    }

    pub fn is_stalled(&self) -> bool {
        matches!(self.state, LivenessState::Stalled { .. })
    }

    /// A commit happened, or the queue drained.
    pub fn record_progress(&mut self) -> LivenessState {
        self.idle_ticks = 0;
        self.state = LivenessState::Healthy;
        self.state
    }

    /// A tick passed with pending work and no commit.
    ///
    /// Returns true exactly once per stall, on the tick that crosses the
    /// threshold, so callers can warn without flooding logs.
    pub fn record_idle(&mut self) -> bool {
        self.idle_ticks = self.idle_ticks.saturating_add(1);
        let was_stalled = self.is_stalled();

        self.state = if self.idle_ticks >= self.warn_after {
            LivenessState::Stalled {
                idle_ticks: self.idle_ticks,
            }
        } else {
            LivenessState::Degraded {
                idle_ticks: self.idle_ticks,
            }
        };

        !was_stalled && self.is_stalled()
    }
}
