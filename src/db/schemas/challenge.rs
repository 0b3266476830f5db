//! Daily challenge document schema
//!
//! One global challenge per calendar date. Created lazily, never mutated,
//! never deleted.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::catalog::{ChallengeCategory, ChallengeSeed};
use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::progression::{challenge_xp_for_label, Difficulty};

/// Collection name for challenges
pub const CHALLENGE_COLLECTION: &str = "challenges";

/// Challenge document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ChallengeDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// `YYYY-MM-DD`, unique
    pub date: String,

    pub description: String,

    pub category: ChallengeCategory,

    #[serde(default)]
    pub difficulty: Difficulty,

    /// Advertised reward; completion grants a flat amount instead
    #[serde(default)]
    pub xp: i64,
}

impl ChallengeDoc {
    /// Build the challenge for `date` from a pool entry
    pub fn from_seed(date: String, seed: &ChallengeSeed) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            date,
            description: seed.description.to_string(),
            category: seed.category,
            difficulty: seed.difficulty.parse().unwrap_or_default(),
            xp: challenge_xp_for_label(seed.difficulty),
        }
    }
}

impl IntoIndexes for ChallengeDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "date": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("date_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for ChallengeDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
