//! Greenhouse - progression and economy engine for a habit garden
//!
//! "Tend it and it shall grow"
//!
//! Gardeners complete habits, daily challenges and focus sessions to earn
//! XP and coins. XP grows their plant through four stages; coins buy pots,
//! decor and backgrounds for the garden.
//!
//! ## Modules
//!
//! - **progression**: pure rules for streaks, rewards, plant growth and calendar days
//! - **catalog**: static shop items and the daily challenge pool
//! - **db**: MongoDB documents and collection wrapper
//! - **store**: the storage trait with MongoDB and in-memory backends
//! - **services**: the operations, one service per area
//! - **engine**: the [`Greenhouse`] facade tying services together
//! - **logging**: reward audit log

pub mod catalog;
pub mod config;
pub mod db;
pub mod engine;
pub mod logging;
pub mod progression;
pub mod services;
pub mod store;
pub mod types;

pub use config::{Args, EngineConfig, OwnershipPolicy};
pub use engine::Greenhouse;
pub use types::{ErrorCategory, GreenhouseError, Result};
