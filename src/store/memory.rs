//! In-memory garden store
//!
//! Same semantics as the MongoDB store, including duplicate-key failures
//! on user email and challenge date. Used in dev mode and tests.

use async_trait::async_trait;
use bson::{oid::ObjectId, DateTime as BsonDateTime};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

use super::{GardenStore, HabitReward, ProgressDelta, ProgressionState, UserUpdate};
use crate::db::schemas::{ChallengeDoc, HabitDoc, UserDoc};
use crate::types::{GreenhouseError, Result};

#[derive(Default)]
pub struct InMemoryGardenStore {
    users: DashMap<ObjectId, UserDoc>,
    /// email -> user id, enforces the unique email index
    emails: DashMap<String, ObjectId>,
    habits: DashMap<ObjectId, HabitDoc>,
    /// date -> challenge, enforces the unique date index
    challenges: DashMap<String, ChallengeDoc>,
    fail_user_writes: AtomicBool,
}

impl InMemoryGardenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make user writes fail with a retriable error until switched back off
    pub fn set_user_write_failure(&self, fail: bool) {
        self.fail_user_writes.store(fail, Ordering::SeqCst);
    }

    fn check_user_write(&self) -> Result<()> {
        if self.fail_user_writes.load(Ordering::SeqCst) {
            return Err(GreenhouseError::Database("user write rejected".into()));
        }
        Ok(())
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn challenge_count(&self) -> usize {
        self.challenges.len()
    }
}

/// Balance addition that refuses to wrap
fn add_balance(current: i64, delta: i64, field: &str) -> Result<i64> {
    current
        .checked_add(delta)
        .ok_or_else(|| GreenhouseError::validation(format!("{} balance would overflow", field)))
}

#[async_trait]
impl GardenStore for InMemoryGardenStore {
    async fn insert_user(&self, mut user: UserDoc) -> Result<UserDoc> {
        self.check_user_write()?;
        let id = ObjectId::new();
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => {
                return Err(GreenhouseError::DuplicateKey(format!(
                    "email {} already registered",
                    user.email
                )))
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }
        user._id = Some(id);
        self.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, user_id: &ObjectId) -> Result<Option<UserDoc>> {
        Ok(self.users.get(user_id).map(|u| u.clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserDoc>> {
        let id = match self.emails.get(email) {
            Some(id) => *id,
            None => return Ok(None),
        };
        self.find_user(&id).await
    }

    async fn save_user(&self, user: &UserDoc) -> Result<bool> {
        self.check_user_write()?;
        let id = user
            ._id
            .ok_or_else(|| GreenhouseError::Internal("cannot save a user without an id".into()))?;
        match self.users.get_mut(&id) {
            Some(mut stored) => {
                let mut updated = user.clone();
                updated.metadata.touch();
                *stored = updated;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_user(
        &self,
        user_id: &ObjectId,
        update: UserUpdate,
    ) -> Result<Option<UserDoc>> {
        self.check_user_write()?;
        let Some(mut user) = self.users.get_mut(user_id) else {
            return Ok(None);
        };
        match update {
            UserUpdate::PlantType(plant_type) => {
                user.plant_type = plant_type;
                user.plant_stage = 0;
            }
            UserUpdate::Equipped(equipped) => user.equipped_items = equipped,
            UserUpdate::Garden(items) => user.placed_items = items,
            UserUpdate::ResetProgress => {
                user.xp = 0;
                user.plant_stage = 0;
                user.streak = 0;
            }
        }
        user.metadata.touch();
        Ok(Some(user.clone()))
    }

    async fn purchase_item(
        &self,
        user_id: &ObjectId,
        item_id: &str,
        price: i64,
    ) -> Result<Option<UserDoc>> {
        self.check_user_write()?;
        let Some(mut user) = self.users.get_mut(user_id) else {
            return Ok(None);
        };
        if user.coins < price || user.owns(item_id) {
            return Ok(None);
        }
        user.coins -= price;
        user.inventory.push(item_id.to_string());
        user.metadata.touch();
        Ok(Some(user.clone()))
    }

    async fn claim_challenge_reward(
        &self,
        user_id: &ObjectId,
        day: Range<DateTime<Utc>>,
        now: DateTime<Utc>,
        xp: i64,
        coins: i64,
    ) -> Result<bool> {
        self.check_user_write()?;
        let Some(mut user) = self.users.get_mut(user_id) else {
            return Ok(false);
        };
        if matches!(user.last_challenge(), Some(last) if day.contains(&last)) {
            return Ok(false);
        }
        let new_xp = add_balance(user.xp, xp, "xp")?;
        let new_coins = add_balance(user.coins, coins, "coins")?;
        user.last_challenge_completed = Some(BsonDateTime::from_chrono(now));
        user.xp = new_xp;
        user.coins = new_coins;
        user.metadata.touch();
        Ok(true)
    }

    async fn increment_progress(
        &self,
        user_id: &ObjectId,
        delta: &ProgressDelta,
    ) -> Result<Option<UserDoc>> {
        self.check_user_write()?;
        let Some(mut user) = self.users.get_mut(user_id) else {
            return Ok(None);
        };
        let coins = add_balance(user.coins, delta.coins, "coins")?;
        let xp = add_balance(user.xp, delta.xp, "xp")?;
        user.coins = coins;
        user.xp = xp;
        let stat = user.daily_stat_mut(&delta.date);
        stat.xp_gained = stat.xp_gained.saturating_add(delta.xp);
        stat.focus_minutes += delta.focus_minutes;
        user.metadata.touch();
        Ok(Some(user.clone()))
    }

    async fn apply_habit_reward(
        &self,
        user_id: &ObjectId,
        expected: &ProgressionState,
        reward: &HabitReward,
    ) -> Result<Option<UserDoc>> {
        self.check_user_write()?;
        let Some(mut user) = self.users.get_mut(user_id) else {
            return Ok(None);
        };
        if ProgressionState::of(&user) != *expected {
            return Ok(None);
        }
        let xp = add_balance(user.xp, reward.xp, "xp")?;
        let coins = add_balance(user.coins, reward.coins, "coins")?;
        user.xp = xp;
        user.coins = coins;
        user.plant_stage = reward.plant_stage;
        user.streak = reward.streak;
        user.last_active_date = reward.last_active_date;
        let stat = user.daily_stat_mut(&reward.date);
        stat.habits_completed += 1;
        stat.xp_gained = stat.xp_gained.saturating_add(reward.xp);
        user.metadata.touch();
        Ok(Some(user.clone()))
    }

    async fn insert_habit(&self, mut habit: HabitDoc) -> Result<HabitDoc> {
        let id = ObjectId::new();
        habit._id = Some(id);
        self.habits.insert(id, habit.clone());
        Ok(habit)
    }

    async fn find_habit(
        &self,
        user_id: &ObjectId,
        habit_id: &ObjectId,
    ) -> Result<Option<HabitDoc>> {
        Ok(self
            .habits
            .get(habit_id)
            .filter(|h| h.user_id == *user_id)
            .map(|h| h.clone()))
    }

    async fn list_habits(&self, user_id: &ObjectId) -> Result<Vec<HabitDoc>> {
        let mut habits: Vec<HabitDoc> = self
            .habits
            .iter()
            .filter(|h| h.user_id == *user_id)
            .map(|h| h.clone())
            .collect();
        habits.sort_by(|a, b| (a.created_at, a._id).cmp(&(b.created_at, b._id)));
        Ok(habits)
    }

    async fn count_habits(&self, user_id: &ObjectId) -> Result<u64> {
        Ok(self.habits.iter().filter(|h| h.user_id == *user_id).count() as u64)
    }

    async fn delete_habit(&self, user_id: &ObjectId, habit_id: &ObjectId) -> Result<bool> {
        Ok(self
            .habits
            .remove_if(habit_id, |_, h| h.user_id == *user_id)
            .is_some())
    }

    async fn set_habit_completed(
        &self,
        habit_id: &ObjectId,
        expected: bool,
        completed: bool,
    ) -> Result<bool> {
        let Some(mut habit) = self.habits.get_mut(habit_id) else {
            return Ok(false);
        };
        if habit.completed_today != expected || expected == completed {
            return Ok(false);
        }
        habit.completed_today = completed;
        habit.metadata.touch();
        Ok(true)
    }

    async fn reset_all_habits(&self) -> Result<u64> {
        let mut reset = 0;
        for mut habit in self.habits.iter_mut() {
            if habit.completed_today {
                habit.completed_today = false;
                reset += 1;
            }
        }
        debug!(reset, "cleared habit completion flags");
        Ok(reset)
    }

    async fn find_challenge_by_date(&self, date: &str) -> Result<Option<ChallengeDoc>> {
        Ok(self.challenges.get(date).map(|c| c.clone()))
    }

    async fn insert_challenge(&self, mut challenge: ChallengeDoc) -> Result<ChallengeDoc> {
        match self.challenges.entry(challenge.date.clone()) {
            Entry::Occupied(_) => Err(GreenhouseError::DuplicateKey(format!(
                "challenge for {} already exists",
                challenge.date
            ))),
            Entry::Vacant(slot) => {
                challenge._id = Some(ObjectId::new());
                slot.insert(challenge.clone());
                Ok(challenge)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CHALLENGE_POOL;
    use crate::progression::Difficulty;
    use chrono::TimeZone;

    fn user(email: &str) -> UserDoc {
        UserDoc::new(email.to_string(), None, String::new())
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let store = InMemoryGardenStore::new();
        tokio_test::block_on(store.insert_user(user("ivy@example.com"))).unwrap();

        let err = tokio_test::block_on(store.insert_user(user("ivy@example.com"))).unwrap_err();
        assert!(matches!(err, GreenhouseError::DuplicateKey(_)));
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_challenge_date_rejected() {
        let store = InMemoryGardenStore::new();
        let seed = &CHALLENGE_POOL[0];
        store
            .insert_challenge(ChallengeDoc::from_seed("2024-05-15".into(), seed))
            .await
            .unwrap();

        let err = store
            .insert_challenge(ChallengeDoc::from_seed("2024-05-15".into(), seed))
            .await
            .unwrap_err();
        assert!(matches!(err, GreenhouseError::DuplicateKey(_)));
        assert_eq!(store.challenge_count(), 1);
    }

    #[tokio::test]
    async fn test_habit_compare_and_set() {
        let store = InMemoryGardenStore::new();
        let owner = store.insert_user(user("ivy@example.com")).await.unwrap();
        let habit = store
            .insert_habit(HabitDoc::new(owner._id.unwrap(), "Read".into(), Difficulty::Easy))
            .await
            .unwrap();
        let id = habit._id.unwrap();

        assert!(store.set_habit_completed(&id, false, true).await.unwrap());
        assert!(!store.set_habit_completed(&id, false, true).await.unwrap());
        assert_eq!(store.reset_all_habits().await.unwrap(), 1);
        assert_eq!(store.reset_all_habits().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_habits_scoped_to_owner() {
        let store = InMemoryGardenStore::new();
        let owner = store.insert_user(user("ivy@example.com")).await.unwrap();
        let other = store.insert_user(user("moss@example.com")).await.unwrap();
        let habit = store
            .insert_habit(HabitDoc::new(owner._id.unwrap(), "Walk".into(), Difficulty::Medium))
            .await
            .unwrap();
        let habit_id = habit._id.unwrap();

        let other_id = other._id.unwrap();
        assert!(store.find_habit(&other_id, &habit_id).await.unwrap().is_none());
        assert!(!store.delete_habit(&other_id, &habit_id).await.unwrap());
        assert_eq!(store.count_habits(&owner._id.unwrap()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_claim_challenge_once_per_window() {
        let store = InMemoryGardenStore::new();
        let id = store
            .insert_user(user("ivy@example.com"))
            .await
            .unwrap()
            ._id
            .unwrap();
        let start = Utc.with_ymd_and_hms(2024, 5, 15, 0, 0, 0).unwrap();
        let day = start..start + chrono::Duration::days(1);
        let now = Utc.with_ymd_and_hms(2024, 5, 15, 9, 0, 0).unwrap();

        assert!(store.claim_challenge_reward(&id, day.clone(), now, 50, 50).await.unwrap());
        assert!(!store.claim_challenge_reward(&id, day, now, 50, 50).await.unwrap());

        let stored = store.find_user(&id).await.unwrap().unwrap();
        assert_eq!(stored.xp, 50);
        assert_eq!(stored.coins, 50);
    }

    #[tokio::test]
    async fn test_claim_ignores_claims_outside_the_day() {
        let store = InMemoryGardenStore::new();
        let mut doc = user("ivy@example.com");
        // Skewed clock left a claim stamped two days ahead
        doc.last_challenge_completed = Some(BsonDateTime::from_chrono(
            Utc.with_ymd_and_hms(2024, 5, 17, 9, 0, 0).unwrap(),
        ));
        let id = store.insert_user(doc).await.unwrap()._id.unwrap();
        let start = Utc.with_ymd_and_hms(2024, 5, 15, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 5, 15, 9, 0, 0).unwrap();

        assert!(store
            .claim_challenge_reward(&id, start..start + chrono::Duration::days(1), now, 50, 50)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_habit_reward_requires_unchanged_progression() {
        let store = InMemoryGardenStore::new();
        let owner = store.insert_user(user("ivy@example.com")).await.unwrap();
        let id = owner._id.unwrap();
        let expected = ProgressionState::of(&owner);
        let reward = HabitReward {
            date: "2024-05-15".into(),
            xp: 20,
            coins: 5,
            plant_stage: 1,
            streak: 1,
            last_active_date: BsonDateTime::from_chrono(
                Utc.with_ymd_and_hms(2024, 5, 15, 9, 0, 0).unwrap(),
            ),
        };

        let updated = store
            .apply_habit_reward(&id, &expected, &reward)
            .await
            .unwrap()
            .unwrap();
        assert_eq!((updated.xp, updated.coins, updated.plant_stage), (20, 5, 1));
        assert_eq!(updated.daily_stats[0].habits_completed, 1);

        // Same expectation again is stale now
        assert!(store
            .apply_habit_reward(&id, &expected, &reward)
            .await
            .unwrap()
            .is_none());
        assert_eq!(store.find_user(&id).await.unwrap().unwrap().xp, 20);
    }

    #[tokio::test]
    async fn test_balance_overflow_is_rejected() {
        let store = InMemoryGardenStore::new();
        let mut doc = user("ivy@example.com");
        doc.coins = i64::MAX - 10;
        let id = store.insert_user(doc).await.unwrap()._id.unwrap();
        let delta = ProgressDelta {
            date: "2024-05-15".into(),
            coins: 60,
            xp: 30,
            focus_minutes: 60.0,
        };

        let err = store.increment_progress(&id, &delta).await.unwrap_err();
        assert!(matches!(err, GreenhouseError::Validation(_)));
        let stored = store.find_user(&id).await.unwrap().unwrap();
        assert_eq!(stored.coins, i64::MAX - 10);
        assert_eq!(stored.xp, 0);
        assert!(stored.daily_stats.is_empty());
    }

    #[tokio::test]
    async fn test_purchase_is_conditional() {
        let store = InMemoryGardenStore::new();
        let mut doc = user("ivy@example.com");
        doc.coins = 60;
        let id = store.insert_user(doc).await.unwrap()._id.unwrap();

        let bought = store.purchase_item(&id, "pot_red", 50).await.unwrap().unwrap();
        assert_eq!(bought.coins, 10);
        assert!(store.purchase_item(&id, "pot_red", 0).await.unwrap().is_none());
        assert!(store.purchase_item(&id, "pot_blue", 50).await.unwrap().is_none());
    }
}
