//! # Application Module
//!
//! The catchup coordinator and the serving side peers answer with.

pub mod responder;
pub mod service;

pub use responder::answer_request;
pub use service::{CatchupCoordinator, CatchupDependencies};
