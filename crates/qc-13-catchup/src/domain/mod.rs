//! # Domain Module
//!
//! Core domain types for chain catchup.

pub mod entities;
pub mod errors;
pub mod intermediate;

pub use entities::*;
pub use errors::*;
pub use intermediate::*;

/// Default matching height claims before a height is trusted.
pub const DEFAULT_CONFIRMATIONS: usize = 3;
