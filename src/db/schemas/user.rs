//! User document schema
//!
//! One document per gardener: progression, engagement, economy, garden
//! layout and per-day stats all live on it.

use bson::{doc, oid::ObjectId, DateTime, Document};
use chrono::Utc;
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::catalog::ItemSlot;
use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// Plant chosen when onboarding has not happened yet
pub const DEFAULT_PLANT_TYPE: &str = "sunflower";

/// Display name when none is given at registration
pub const DEFAULT_DISPLAY_NAME: &str = "Gardener";

/// One item id per equip slot
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EquippedItems {
    #[serde(default = "default_pot")]
    pub pot: String,
    #[serde(default = "default_decor")]
    pub decor: String,
    #[serde(default = "default_background")]
    pub background: String,
}

fn default_pot() -> String {
    ItemSlot::Pot.default_item().to_string()
}

fn default_decor() -> String {
    ItemSlot::Decor.default_item().to_string()
}

fn default_background() -> String {
    ItemSlot::Background.default_item().to_string()
}

impl Default for EquippedItems {
    fn default() -> Self {
        Self {
            pot: default_pot(),
            decor: default_decor(),
            background: default_background(),
        }
    }
}

impl EquippedItems {
    pub fn get(&self, slot: ItemSlot) -> &str {
        match slot {
            ItemSlot::Pot => &self.pot,
            ItemSlot::Decor => &self.decor,
            ItemSlot::Background => &self.background,
        }
    }

    pub fn set(&mut self, slot: ItemSlot, item_id: String) {
        match slot {
            ItemSlot::Pot => self.pot = item_id,
            ItemSlot::Decor => self.decor = item_id,
            ItemSlot::Background => self.background = item_id,
        }
    }

    /// Fill blank slots left behind by legacy records
    pub fn normalize(&mut self) {
        for slot in ItemSlot::ALL {
            if self.get(slot).trim().is_empty() {
                self.set(slot, slot.default_item().to_string());
            }
        }
    }
}

/// A decorative item placed in the garden
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PlacedItem {
    /// Catalog item id
    pub item_id: String,
    /// Placement id, distinct per placed copy
    pub instance_id: String,
    /// Horizontal position, percent of garden width
    pub x: f64,
    /// Vertical position, percent of garden height
    pub y: f64,
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Degrees
    #[serde(default)]
    pub rotation: f64,
}

fn default_scale() -> f64 {
    1.0
}

/// Per-day activity rollup, keyed by `YYYY-MM-DD`
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct DailyStat {
    pub date: String,
    #[serde(default)]
    pub habits_completed: i64,
    #[serde(default)]
    pub xp_gained: i64,
    #[serde(default)]
    pub focus_minutes: f64,
}

impl DailyStat {
    pub fn empty(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            ..Default::default()
        }
    }
}

/// User document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UserDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    /// Login email, unique
    pub email: String,

    #[serde(default = "default_display_name")]
    pub name: String,

    /// Opaque credential hash; never interpreted here
    #[serde(default)]
    pub credential_hash: String,

    #[serde(default = "default_plant_type")]
    pub plant_type: String,

    /// 0 seed, 1 sprout, 2 bud, 3 bloom
    #[serde(default)]
    pub plant_stage: i32,

    #[serde(default)]
    pub xp: i64,

    #[serde(default)]
    pub streak: i32,

    /// Last streak-affecting action
    #[serde(default = "DateTime::now")]
    pub last_active_date: DateTime,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_challenge_completed: Option<DateTime>,

    #[serde(default)]
    pub coins: i64,

    /// Owned item ids, no duplicates
    #[serde(default)]
    pub inventory: Vec<String>,

    #[serde(default)]
    pub equipped_items: EquippedItems,

    #[serde(default)]
    pub placed_items: Vec<PlacedItem>,

    #[serde(default)]
    pub daily_stats: Vec<DailyStat>,
}

fn default_display_name() -> String {
    DEFAULT_DISPLAY_NAME.to_string()
}

fn default_plant_type() -> String {
    DEFAULT_PLANT_TYPE.to_string()
}

impl UserDoc {
    /// Create a new user document with starting progression
    pub fn new(email: String, name: Option<String>, credential_hash: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            email,
            name: name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(default_display_name),
            credential_hash,
            plant_type: default_plant_type(),
            plant_stage: 0,
            xp: 0,
            streak: 0,
            last_active_date: DateTime::now(),
            last_challenge_completed: None,
            coins: 0,
            inventory: Vec::new(),
            equipped_items: EquippedItems::default(),
            placed_items: Vec::new(),
            daily_stats: Vec::new(),
        }
    }

    pub fn last_active(&self) -> chrono::DateTime<Utc> {
        self.last_active_date.to_chrono()
    }

    pub fn last_challenge(&self) -> Option<chrono::DateTime<Utc>> {
        self.last_challenge_completed.map(|d| d.to_chrono())
    }

    pub fn owns(&self, item_id: &str) -> bool {
        self.inventory.iter().any(|owned| owned == item_id)
    }

    /// Stats entry for `date`, appended if missing
    pub fn daily_stat_mut(&mut self, date: &str) -> &mut DailyStat {
        let index = match self.daily_stats.iter().position(|s| s.date == date) {
            Some(index) => index,
            None => {
                self.daily_stats.push(DailyStat::empty(date));
                self.daily_stats.len() - 1
            }
        };
        &mut self.daily_stats[index]
    }
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "email": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("email_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for UserDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
