//! Error types for Greenhouse
//!
//! Every failure carries a short human-readable reason (its `Display`) and a
//! machine-distinguishable [`ErrorCategory`].

use mongodb::error::{ErrorKind, WriteFailure};

/// MongoDB server error code for a unique index violation
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Coarse error category for callers that need to branch on failure type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing or malformed input, rejected before any mutation
    Validation,
    /// Unknown user, habit or challenge
    NotFound,
    /// Well-formed request refused by an economy rule
    Rejected,
    /// Unique-key collision
    Conflict,
    /// Storage failure; the mutation must be treated as unconfirmed
    Persistence,
    /// Misconfiguration or invariant breach
    Internal,
}

/// Main error type for Greenhouse operations
#[derive(Debug, thiserror::Error)]
pub enum GreenhouseError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid item: {0}")]
    InvalidItem(String),

    #[error("Already owned: {0}")]
    AlreadyOwned(String),

    #[error("Not enough coins: need {required}, have {available}")]
    InsufficientFunds { required: i64, available: i64 },

    #[error("Max habits reached ({0})")]
    HabitLimit(usize),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GreenhouseError {
    /// Map the error onto its category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) | Self::InvalidItem(_) => ErrorCategory::Validation,
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::AlreadyOwned(_) | Self::InsufficientFunds { .. } | Self::HabitLimit(_) => {
                ErrorCategory::Rejected
            }
            Self::DuplicateKey(_) => ErrorCategory::Conflict,
            Self::Database(_) => ErrorCategory::Persistence,
            Self::Config(_) | Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Whether retrying the same call may succeed
    pub fn is_retriable(&self) -> bool {
        self.category() == ErrorCategory::Persistence
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<mongodb::error::Error> for GreenhouseError {
    fn from(err: mongodb::error::Error) -> Self {
        match err.kind.as_ref() {
            ErrorKind::Write(WriteFailure::WriteError(write_error))
                if write_error.code == DUPLICATE_KEY_CODE =>
            {
                Self::DuplicateKey(write_error.message.clone())
            }
            _ => Self::Database(err.to_string()),
        }
    }
}

impl From<bson::ser::Error> for GreenhouseError {
    fn from(err: bson::ser::Error) -> Self {
        Self::Database(format!("BSON encoding failed: {}", err))
    }
}

impl From<serde_json::Error> for GreenhouseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {}", err))
    }
}

/// Result type alias for Greenhouse operations
pub type Result<T> = std::result::Result<T, GreenhouseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            GreenhouseError::validation("minutes must be positive").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            GreenhouseError::InsufficientFunds {
                required: 50,
                available: 40
            }
            .category(),
            ErrorCategory::Rejected
        );
        assert_eq!(
            GreenhouseError::not_found("habit").category(),
            ErrorCategory::NotFound
        );
    }

    #[test]
    fn test_only_persistence_is_retriable() {
        assert!(GreenhouseError::Database("socket closed".into()).is_retriable());
        assert!(!GreenhouseError::AlreadyOwned("bg_rain".into()).is_retriable());
        assert!(!GreenhouseError::DuplicateKey("date".into()).is_retriable());
    }

    #[test]
    fn test_reason_strings() {
        let err = GreenhouseError::InsufficientFunds {
            required: 50,
            available: 40,
        };
        assert_eq!(err.to_string(), "Not enough coins: need 50, have 40");
        assert_eq!(
            GreenhouseError::HabitLimit(20).to_string(),
            "Max habits reached (20)"
        );
    }
}
