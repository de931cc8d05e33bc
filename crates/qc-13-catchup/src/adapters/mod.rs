//! # Adapters
//!
//! In-memory implementations of the catchup ports, for tests and for
//! embedding catchup in a single process.

pub mod in_memory;
pub mod network;

pub use in_memory::{InMemoryBlockStore, InMemoryStateStore};
pub use network::{InProcessNetwork, PeerBehaviour};
