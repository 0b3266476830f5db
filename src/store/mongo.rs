//! MongoDB-backed garden store

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Bson, DateTime as BsonDateTime, Document};
use chrono::{DateTime, Utc};
use std::ops::Range;
use tracing::{debug, warn};

use super::{GardenStore, HabitReward, ProgressDelta, ProgressionState, UserUpdate};
use crate::db::schemas::{
    ChallengeDoc, DailyStat, HabitDoc, UserDoc, CHALLENGE_COLLECTION, HABIT_COLLECTION,
    USER_COLLECTION,
};
use crate::db::{MongoClient, MongoCollection};
use crate::types::{GreenhouseError, Result};

/// Store over the `users`, `habits` and `challenges` collections
#[derive(Clone)]
pub struct MongoGardenStore {
    users: MongoCollection<UserDoc>,
    habits: MongoCollection<HabitDoc>,
    challenges: MongoCollection<ChallengeDoc>,
}

impl MongoGardenStore {
    /// Open the collections, creating their indexes if needed
    pub async fn new(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            users: client.collection(USER_COLLECTION).await?,
            habits: client.collection(HABIT_COLLECTION).await?,
            challenges: client.collection(CHALLENGE_COLLECTION).await?,
        })
    }

    fn user_set(update: &UserUpdate) -> Result<Document> {
        let mut set = match update {
            UserUpdate::PlantType(plant_type) => doc! {
                "plant_type": plant_type.as_str(),
                "plant_stage": 0,
            },
            UserUpdate::Equipped(equipped) => doc! {
                "equipped_items": bson::to_bson(equipped)?,
            },
            UserUpdate::Garden(items) => doc! {
                "placed_items": bson::to_bson(items)?,
            },
            UserUpdate::ResetProgress => doc! {
                "xp": 0_i64,
                "plant_stage": 0,
                "streak": 0,
            },
        };
        set.insert("metadata.updated_at", BsonDateTime::now());
        Ok(set)
    }
}

fn touched() -> Document {
    doc! { "metadata.updated_at": BsonDateTime::now() }
}

#[async_trait]
impl GardenStore for MongoGardenStore {
    async fn insert_user(&self, mut user: UserDoc) -> Result<UserDoc> {
        let id = self.users.insert_one(user.clone()).await?;
        user._id = Some(id);
        Ok(user)
    }

    async fn find_user(&self, user_id: &ObjectId) -> Result<Option<UserDoc>> {
        self.users.find_one(doc! { "_id": *user_id }).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserDoc>> {
        self.users.find_one(doc! { "email": email }).await
    }

    async fn save_user(&self, user: &UserDoc) -> Result<bool> {
        let id = user
            ._id
            .ok_or_else(|| GreenhouseError::Internal("cannot save a user without an id".into()))?;
        let result = self
            .users
            .replace_one(doc! { "_id": id }, user.clone())
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn update_user(
        &self,
        user_id: &ObjectId,
        update: UserUpdate,
    ) -> Result<Option<UserDoc>> {
        let set = Self::user_set(&update)?;
        self.users
            .find_one_and_update(doc! { "_id": *user_id }, doc! { "$set": set })
            .await
    }

    async fn purchase_item(
        &self,
        user_id: &ObjectId,
        item_id: &str,
        price: i64,
    ) -> Result<Option<UserDoc>> {
        self.users
            .find_one_and_update(
                doc! {
                    "_id": *user_id,
                    "coins": { "$gte": price },
                    "inventory": { "$ne": item_id },
                },
                doc! {
                    "$inc": { "coins": -price },
                    "$push": { "inventory": item_id },
                    "$set": touched(),
                },
            )
            .await
    }

    async fn claim_challenge_reward(
        &self,
        user_id: &ObjectId,
        day: Range<DateTime<Utc>>,
        now: DateTime<Utc>,
        xp: i64,
        coins: i64,
    ) -> Result<bool> {
        let result = self
            .users
            .update_one(
                doc! {
                    "_id": *user_id,
                    "$or": [
                        { "last_challenge_completed": Bson::Null },
                        { "last_challenge_completed": { "$lt": BsonDateTime::from_chrono(day.start) } },
                        { "last_challenge_completed": { "$gte": BsonDateTime::from_chrono(day.end) } },
                    ],
                },
                doc! {
                    "$set": {
                        "last_challenge_completed": BsonDateTime::from_chrono(now),
                        "metadata.updated_at": BsonDateTime::now(),
                    },
                    "$inc": { "xp": xp, "coins": coins },
                },
            )
            .await?;
        Ok(result.modified_count > 0)
    }

    async fn increment_progress(
        &self,
        user_id: &ObjectId,
        delta: &ProgressDelta,
    ) -> Result<Option<UserDoc>> {
        // Two passes: bump an existing entry for the date, else push a new
        // one. A concurrent push between the passes is caught by the retry.
        for attempt in 0..2 {
            let existing = self
                .users
                .find_one_and_update(
                    doc! { "_id": *user_id, "daily_stats.date": delta.date.as_str() },
                    doc! {
                        "$inc": {
                            "coins": delta.coins,
                            "xp": delta.xp,
                            "daily_stats.$.xp_gained": delta.xp,
                            "daily_stats.$.focus_minutes": delta.focus_minutes,
                        },
                        "$set": touched(),
                    },
                )
                .await?;
            if existing.is_some() {
                return Ok(existing);
            }

            let stat = DailyStat {
                date: delta.date.clone(),
                habits_completed: 0,
                xp_gained: delta.xp,
                focus_minutes: delta.focus_minutes,
            };
            let pushed = self
                .users
                .find_one_and_update(
                    doc! { "_id": *user_id, "daily_stats.date": { "$ne": delta.date.as_str() } },
                    doc! {
                        "$inc": { "coins": delta.coins, "xp": delta.xp },
                        "$push": { "daily_stats": bson::to_bson(&stat)? },
                        "$set": touched(),
                    },
                )
                .await?;
            if pushed.is_some() {
                return Ok(pushed);
            }

            debug!(user_id = %user_id, attempt, "daily stats entry raced, retrying");
        }

        if self.find_user(user_id).await?.is_some() {
            warn!(user_id = %user_id, "progress increment did not apply");
            return Err(GreenhouseError::Database(
                "progress increment did not apply".into(),
            ));
        }
        Ok(None)
    }

    async fn apply_habit_reward(
        &self,
        user_id: &ObjectId,
        expected: &ProgressionState,
        reward: &HabitReward,
    ) -> Result<Option<UserDoc>> {
        let guard = doc! {
            "_id": *user_id,
            "xp": expected.xp,
            "plant_stage": expected.plant_stage,
            "streak": expected.streak,
            "last_active_date": expected.last_active_date,
        };
        let set = doc! {
            "plant_stage": reward.plant_stage,
            "streak": reward.streak,
            "last_active_date": reward.last_active_date,
            "metadata.updated_at": BsonDateTime::now(),
        };

        let mut filter = guard.clone();
        filter.insert("daily_stats.date", reward.date.as_str());
        let existing = self
            .users
            .find_one_and_update(
                filter,
                doc! {
                    "$inc": {
                        "xp": reward.xp,
                        "coins": reward.coins,
                        "daily_stats.$.habits_completed": 1_i64,
                        "daily_stats.$.xp_gained": reward.xp,
                    },
                    "$set": set.clone(),
                },
            )
            .await?;
        if existing.is_some() {
            return Ok(existing);
        }

        let stat = DailyStat {
            date: reward.date.clone(),
            habits_completed: 1,
            xp_gained: reward.xp,
            focus_minutes: 0.0,
        };
        let mut filter = guard;
        filter.insert("daily_stats.date", doc! { "$ne": reward.date.as_str() });
        self.users
            .find_one_and_update(
                filter,
                doc! {
                    "$inc": { "xp": reward.xp, "coins": reward.coins },
                    "$push": { "daily_stats": bson::to_bson(&stat)? },
                    "$set": set,
                },
            )
            .await
    }

    async fn insert_habit(&self, mut habit: HabitDoc) -> Result<HabitDoc> {
        let id = self.habits.insert_one(habit.clone()).await?;
        habit._id = Some(id);
        Ok(habit)
    }

    async fn find_habit(
        &self,
        user_id: &ObjectId,
        habit_id: &ObjectId,
    ) -> Result<Option<HabitDoc>> {
        self.habits
            .find_one(doc! { "_id": *habit_id, "user_id": *user_id })
            .await
    }

    async fn list_habits(&self, user_id: &ObjectId) -> Result<Vec<HabitDoc>> {
        self.habits
            .find_many(
                doc! { "user_id": *user_id },
                Some(doc! { "created_at": 1, "_id": 1 }),
            )
            .await
    }

    async fn count_habits(&self, user_id: &ObjectId) -> Result<u64> {
        self.habits.count(doc! { "user_id": *user_id }).await
    }

    async fn delete_habit(&self, user_id: &ObjectId, habit_id: &ObjectId) -> Result<bool> {
        self.habits
            .delete_one(doc! { "_id": *habit_id, "user_id": *user_id })
            .await
    }

    async fn set_habit_completed(
        &self,
        habit_id: &ObjectId,
        expected: bool,
        completed: bool,
    ) -> Result<bool> {
        let result = self
            .habits
            .update_one(
                doc! { "_id": *habit_id, "completed_today": expected },
                doc! {
                    "$set": {
                        "completed_today": completed,
                        "metadata.updated_at": BsonDateTime::now(),
                    }
                },
            )
            .await?;
        Ok(result.modified_count > 0)
    }

    async fn reset_all_habits(&self) -> Result<u64> {
        let result = self
            .habits
            .update_many(
                doc! { "completed_today": true },
                doc! { "$set": { "completed_today": false } },
            )
            .await?;
        Ok(result.modified_count)
    }

    async fn find_challenge_by_date(&self, date: &str) -> Result<Option<ChallengeDoc>> {
        self.challenges.find_one(doc! { "date": date }).await
    }

    async fn insert_challenge(&self, mut challenge: ChallengeDoc) -> Result<ChallengeDoc> {
        let id = self.challenges.insert_one(challenge.clone()).await?;
        challenge._id = Some(id);
        Ok(challenge)
    }
}
