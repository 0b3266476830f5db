//! Configuration for Greenhouse
//!
//! CLI arguments and environment variable handling using clap, plus the
//! immutable [`EngineConfig`] the services are built with.

use clap::Parser;
use std::path::PathBuf;
use uuid::Uuid;

use crate::progression::DayClock;
use crate::types::{GreenhouseError, Result};

/// Largest UTC offset chrono accepts, in minutes
const MAX_OFFSET_MINUTES: i32 = 18 * 60;

/// Default cap on habits per user
pub const DEFAULT_MAX_HABITS: usize = 20;

/// Greenhouse - progression and economy engine for a habit garden
#[derive(Parser, Debug, Clone)]
#[command(name = "greenhouse")]
#[command(about = "Progression and economy engine for a habit-tracking garden")]
pub struct Args {
    /// Unique node identifier, stamped on reward log lines
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "greenhouse")]
    pub mongodb_db: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Development mode: fall back to an in-memory store when MongoDB is
    /// unreachable
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Offset of the server's calendar day from UTC, in minutes.
    /// Every "same day" decision uses this offset.
    #[arg(long, env = "UTC_OFFSET_MINUTES", default_value = "0", allow_hyphen_values = true)]
    pub utc_offset_minutes: i32,

    /// Local hour (0-23) at which the daily reset runs
    #[arg(long, env = "RESET_HOUR", default_value = "0")]
    pub reset_hour: u32,

    /// Run one daily reset immediately at startup
    #[arg(long, env = "RESET_ON_STARTUP", default_value = "false")]
    pub reset_on_startup: bool,

    /// Run a single daily reset and exit (for external cron triggers)
    #[arg(long, env = "RUN_ONCE", default_value = "false")]
    pub run_once: bool,

    /// Maximum habits per user
    #[arg(long, env = "MAX_HABITS", default_value_t = DEFAULT_MAX_HABITS)]
    pub max_habits: usize,

    /// Require ownership for equipped and placed items
    #[arg(long, env = "ENFORCE_OWNERSHIP", default_value = "false")]
    pub enforce_ownership: bool,

    /// Append reward events as JSONL to this file
    #[arg(long, env = "REWARD_LOG")]
    pub reward_log: Option<PathBuf>,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.reset_hour > 23 {
            return Err(format!("RESET_HOUR must be 0-23, got {}", self.reset_hour));
        }

        if self.utc_offset_minutes.abs() >= MAX_OFFSET_MINUTES {
            return Err(format!(
                "UTC_OFFSET_MINUTES must be within +-{}, got {}",
                MAX_OFFSET_MINUTES, self.utc_offset_minutes
            ));
        }

        if self.max_habits == 0 {
            return Err("MAX_HABITS must be at least 1".to_string());
        }

        Ok(())
    }

    /// Build the engine configuration
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let clock = DayClock::from_offset_minutes(self.utc_offset_minutes).ok_or_else(|| {
            GreenhouseError::Config(format!(
                "invalid UTC offset: {} minutes",
                self.utc_offset_minutes
            ))
        })?;

        Ok(EngineConfig {
            clock,
            max_habits: self.max_habits,
            ownership: if self.enforce_ownership {
                OwnershipPolicy::Strict
            } else {
                OwnershipPolicy::Trusting
            },
            reset_hour: self.reset_hour,
        })
    }
}

/// How equip and garden placement treat item ownership
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OwnershipPolicy {
    /// Accept any item id; the client is trusted to check inventory
    #[default]
    Trusting,
    /// Require items to be owned, free or a slot default
    Strict,
}

/// Immutable settings shared by all services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub clock: DayClock,
    pub max_habits: usize,
    pub ownership: OwnershipPolicy,
    /// Local hour of the daily reset
    pub reset_hour: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            clock: DayClock::utc(),
            max_habits: DEFAULT_MAX_HABITS,
            ownership: OwnershipPolicy::Trusting,
            reset_hour: 0,
        }
    }
}
