//! Habit document schema

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::progression::Difficulty;

/// Collection name for habits
pub const HABIT_COLLECTION: &str = "habits";

/// Habit document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HabitDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Owning user
    pub user_id: ObjectId,

    pub title: String,

    #[serde(default)]
    pub difficulty: Difficulty,

    #[serde(default = "default_frequency")]
    pub frequency: String,

    /// Cleared by the daily reset
    #[serde(default)]
    pub completed_today: bool,

    #[serde(default = "DateTime::now")]
    pub created_at: DateTime,
}

fn default_frequency() -> String {
    "daily".to_string()
}

impl HabitDoc {
    pub fn new(user_id: ObjectId, title: String, difficulty: Difficulty) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            user_id,
            title,
            difficulty,
            frequency: default_frequency(),
            completed_today: false,
            created_at: DateTime::now(),
        }
    }
}

impl IntoIndexes for HabitDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "user_id": 1, "created_at": 1 },
            Some(
                IndexOptions::builder()
                    .name("user_habits_index".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for HabitDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
