//! Storage collaborator for the progression engine
//!
//! Rule code talks to [`GardenStore`] only. Two backends ship with the
//! crate: [`MongoGardenStore`] for production and [`InMemoryGardenStore`]
//! for dev mode and tests. Both must agree on the atomic operations below,
//! since the services rely on them for at-most-once rewards.

mod memory;
mod mongo;

pub use memory::InMemoryGardenStore;
pub use mongo::MongoGardenStore;

use async_trait::async_trait;
use bson::{oid::ObjectId, DateTime as BsonDateTime};
use chrono::{DateTime, Utc};
use std::ops::Range;

use crate::db::schemas::{ChallengeDoc, EquippedItems, HabitDoc, PlacedItem, UserDoc};
use crate::types::Result;

/// Increment applied atomically to a user's balances and today's stats
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressDelta {
    /// Daily stats key, `YYYY-MM-DD`
    pub date: String,
    pub coins: i64,
    pub xp: i64,
    pub focus_minutes: f64,
}

/// Progression fields a habit reward is computed from. The reward only
/// lands while the stored user still holds these values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressionState {
    pub xp: i64,
    pub plant_stage: i32,
    pub streak: i32,
    pub last_active_date: BsonDateTime,
}

impl ProgressionState {
    pub fn of(user: &UserDoc) -> Self {
        Self {
            xp: user.xp,
            plant_stage: user.plant_stage,
            streak: user.streak,
            last_active_date: user.last_active_date,
        }
    }
}

/// Habit completion reward: balances and today's stats are incremented,
/// streak and stage are set
#[derive(Debug, Clone, PartialEq)]
pub struct HabitReward {
    /// Daily stats key, `YYYY-MM-DD`
    pub date: String,
    pub xp: i64,
    pub coins: i64,
    pub plant_stage: i32,
    pub streak: i32,
    pub last_active_date: BsonDateTime,
}

/// Field-scoped user mutation; other fields are left alone
#[derive(Debug, Clone, PartialEq)]
pub enum UserUpdate {
    PlantType(String),
    Equipped(EquippedItems),
    Garden(Vec<PlacedItem>),
    /// Zero xp, plant stage and streak
    ResetProgress,
}

#[async_trait]
pub trait GardenStore: Send + Sync {
    // ---- users ----

    /// Insert a new user; a taken email yields `DuplicateKey`
    async fn insert_user(&self, user: UserDoc) -> Result<UserDoc>;

    async fn find_user(&self, user_id: &ObjectId) -> Result<Option<UserDoc>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserDoc>>;

    /// Overwrite a previously loaded user. Returns false when the user no
    /// longer exists. Reward paths never use this; they go through the
    /// atomic operations below.
    async fn save_user(&self, user: &UserDoc) -> Result<bool>;

    /// Apply a field-scoped update and return the user afterwards
    async fn update_user(&self, user_id: &ObjectId, update: UserUpdate)
        -> Result<Option<UserDoc>>;

    /// Debit `price` and add `item_id` to the inventory, only if the user
    /// can afford it and does not own it yet. Returns the updated user, or
    /// `None` when the conditions did not hold (or the user is gone).
    async fn purchase_item(
        &self,
        user_id: &ObjectId,
        item_id: &str,
        price: i64,
    ) -> Result<Option<UserDoc>>;

    /// Grant the challenge reward unless one was already claimed inside
    /// `day`. Returns whether the reward was granted.
    async fn claim_challenge_reward(
        &self,
        user_id: &ObjectId,
        day: Range<DateTime<Utc>>,
        now: DateTime<Utc>,
        xp: i64,
        coins: i64,
    ) -> Result<bool>;

    /// Add to balances and upsert the matching daily stats entry
    async fn increment_progress(
        &self,
        user_id: &ObjectId,
        delta: &ProgressDelta,
    ) -> Result<Option<UserDoc>>;

    /// Apply a habit reward if the user still matches `expected`. Returns
    /// the updated user, or `None` when the user changed in between (or is
    /// gone); the caller reloads and recomputes.
    async fn apply_habit_reward(
        &self,
        user_id: &ObjectId,
        expected: &ProgressionState,
        reward: &HabitReward,
    ) -> Result<Option<UserDoc>>;

    // ---- habits ----

    async fn insert_habit(&self, habit: HabitDoc) -> Result<HabitDoc>;

    /// Find a habit owned by `user_id`
    async fn find_habit(&self, user_id: &ObjectId, habit_id: &ObjectId)
        -> Result<Option<HabitDoc>>;

    /// All habits of a user in creation order
    async fn list_habits(&self, user_id: &ObjectId) -> Result<Vec<HabitDoc>>;

    async fn count_habits(&self, user_id: &ObjectId) -> Result<u64>;

    async fn delete_habit(&self, user_id: &ObjectId, habit_id: &ObjectId) -> Result<bool>;

    /// Compare-and-set on `completed_today`. Returns true only if the flag
    /// was `expected` and is now `completed`.
    async fn set_habit_completed(
        &self,
        habit_id: &ObjectId,
        expected: bool,
        completed: bool,
    ) -> Result<bool>;

    /// Clear `completed_today` everywhere; returns how many habits changed
    async fn reset_all_habits(&self) -> Result<u64>;

    // ---- challenges ----

    async fn find_challenge_by_date(&self, date: &str) -> Result<Option<ChallengeDoc>>;

    /// Insert a challenge; an existing one for the same date yields
    /// `DuplicateKey`
    async fn insert_challenge(&self, challenge: ChallengeDoc) -> Result<ChallengeDoc>;
}
