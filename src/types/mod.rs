//! Shared types for Greenhouse

mod error;

pub use error::{ErrorCategory, GreenhouseError, Result};
