//! Domain layer for the validation queue
//!
//! - check: the consensus verdict record
//! - determiner: ideal / eager / failed consensus tiers
//! - results: per-timestamp vote bookkeeping
//! - liveness: stall detection for the commit loop
//! - outcome: report admission and tick summaries

mod check;
mod determiner;
mod error;
mod liveness;
mod outcome;
mod results;

pub use check::*;
pub use determiner::*;
pub use error::*;
pub use liveness::*;
pub use outcome::*;
pub use results::*;
