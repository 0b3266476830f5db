//! Reward audit log
//!
//! One JSONL line per economy mutation, so balance changes can be
//! reconstructed after the fact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

/// Reward event types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    HabitCompleted,
    ChallengeCompleted,
    FocusSession,
    ItemPurchased,
    ProgressReset,
}

/// A single balance change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: RewardKind,
    /// Node that applied the change
    pub node_id: String,
    pub user_id: String,
    /// XP delta
    #[serde(default)]
    pub xp: i64,
    /// Coin delta, negative for purchases
    #[serde(default)]
    pub coins: i64,
    /// Habit id, item id, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl RewardEvent {
    pub fn new(kind: RewardKind, node_id: String, user_id: String) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            node_id,
            user_id,
            xp: 0,
            coins: 0,
            subject: None,
            metadata: None,
        }
    }

    pub fn with_xp(mut self, xp: i64) -> Self {
        self.xp = xp;
        self
    }

    pub fn with_coins(mut self, coins: i64) -> Self {
        self.coins = coins;
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Convert to JSONL line
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Writes reward events to a JSONL file. Without a file it only emits
/// tracing events.
#[derive(Clone)]
pub struct RewardLogger {
    inner: Arc<Mutex<RewardLoggerInner>>,
    node_id: String,
}

struct RewardLoggerInner {
    writer: Option<BufWriter<File>>,
    path: Option<PathBuf>,
}

impl RewardLogger {
    pub fn new(node_id: String) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RewardLoggerInner {
                writer: None,
                path: None,
            })),
            node_id,
        }
    }

    /// Append to `path`, creating it if needed
    pub async fn init_file(&self, path: PathBuf) -> std::io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let mut inner = self.inner.lock().await;
        inner.writer = Some(BufWriter::new(file));
        inner.path = Some(path.clone());

        info!("Reward logging initialized to {}", path.display());
        Ok(())
    }

    pub async fn path(&self) -> Option<PathBuf> {
        self.inner.lock().await.path.clone()
    }

    pub async fn log(&self, event: RewardEvent) {
        info!(
            kind = ?event.kind,
            user_id = %event.user_id,
            xp = event.xp,
            coins = event.coins,
            "reward applied"
        );

        let jsonl = match event.to_jsonl() {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to serialize reward event: {}", e);
                return;
            }
        };

        let mut inner = self.inner.lock().await;

        if let Some(ref mut writer) = inner.writer {
            if let Err(e) = writeln!(writer, "{}", jsonl) {
                error!("Failed to write reward event: {}", e);
            }
            if let Err(e) = writer.flush() {
                error!("Failed to flush reward log: {}", e);
            }
        }
    }

    /// Start an event stamped with this node's id
    pub fn event(&self, kind: RewardKind, user_id: impl ToString) -> RewardEvent {
        RewardEvent::new(kind, self.node_id.clone(), user_id.to_string())
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }
}
