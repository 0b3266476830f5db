//! Logging infrastructure for Greenhouse
//!
//! Structured tracing is set up in the binary; this module holds the
//! reward audit log.

pub mod rewards;

pub use rewards::{RewardEvent, RewardKind, RewardLogger};
