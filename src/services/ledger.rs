//! Economy ledger
//!
//! Coin and XP accrual for habit completion and focus sessions, plus the
//! explicit progress reset.
//!
//! Habit completion is the only action that advances the streak and the
//! plant stage. Focus sessions and challenges pay XP and coins only; that
//! asymmetry sets the reward pacing and is kept on purpose.

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::ServiceContext;
use crate::db::schemas::{HabitDoc, UserDoc};
use crate::logging::RewardKind;
use crate::progression::{
    advance_streak, focus_reward, habit_xp, next_plant_stage, HABIT_COINS, MAX_FOCUS_MINUTES,
};
use crate::store::{HabitReward, ProgressDelta, ProgressionState, UserUpdate};
use crate::types::{GreenhouseError, Result};

/// Tries at landing one habit reward. Every miss means another write to the
/// same user landed first.
const MAX_REWARD_ATTEMPTS: usize = 32;

/// Result of a habit completion
#[derive(Debug, Clone, Serialize)]
pub struct HabitCompletion {
    pub habit: HabitDoc,
    pub xp: i64,
    pub coins: i64,
    pub plant_stage: i32,
    pub streak: i32,
    /// True when the habit was already done today and nothing changed
    pub already_completed: bool,
}

/// Result of a focus session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FocusOutcome {
    pub coins_earned: i64,
    pub xp_earned: i64,
    pub new_balance: i64,
}

/// Progression fields after a reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub xp: i64,
    pub plant_stage: i32,
    pub streak: i32,
}

#[derive(Clone)]
pub struct LedgerService {
    ctx: ServiceContext,
}

impl LedgerService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Mark a habit done for today and pay out its reward.
    ///
    /// The habit flag is claimed with a compare-and-set, so only one caller
    /// pays out per habit and day. The reward then lands as one guarded
    /// increment on the user; if that fails the flag is released again, so
    /// the flag and the balances never disagree.
    pub async fn complete_habit(
        &self,
        user_id: &ObjectId,
        habit_id: &ObjectId,
        now: DateTime<Utc>,
    ) -> Result<HabitCompletion> {
        let store = &self.ctx.store;
        let mut habit = store
            .find_habit(user_id, habit_id)
            .await?
            .ok_or_else(|| GreenhouseError::not_found(format!("habit {}", habit_id)))?;
        let user = self.ctx.require_user(user_id).await?;

        if !store.set_habit_completed(habit_id, false, true).await? {
            // Done earlier today, or a concurrent call claimed it first
            debug!(habit_id = %habit_id, "habit already completed today");
            habit.completed_today = true;
            return Ok(unchanged(habit, &user));
        }
        habit.completed_today = true;

        let xp_gain = habit_xp(habit.difficulty);
        let user = match self.pay_habit_reward(user_id, user, xp_gain, now).await {
            Ok(user) => user,
            Err(e) => {
                self.release_habit(habit_id).await;
                return Err(e);
            }
        };

        info!(
            user_id = %user_id,
            habit_id = %habit_id,
            xp_gain,
            streak = user.streak,
            plant_stage = user.plant_stage,
            "habit completed"
        );
        self.ctx
            .rewards
            .log(
                self.ctx
                    .rewards
                    .event(RewardKind::HabitCompleted, user_id)
                    .with_xp(xp_gain)
                    .with_coins(HABIT_COINS)
                    .with_subject(habit_id.to_hex()),
            )
            .await;

        Ok(HabitCompletion {
            habit,
            xp: user.xp,
            coins: user.coins,
            plant_stage: user.plant_stage,
            streak: user.streak,
            already_completed: false,
        })
    }

    /// Compute streak and stage from the user as loaded and land them with
    /// the balance increment, reloading whenever another write got there
    /// first.
    async fn pay_habit_reward(
        &self,
        user_id: &ObjectId,
        mut user: UserDoc,
        xp_gain: i64,
        now: DateTime<Utc>,
    ) -> Result<UserDoc> {
        let clock = &self.ctx.config.clock;
        for attempt in 0..MAX_REWARD_ATTEMPTS {
            let streak = advance_streak(clock, user.streak, user.last_active(), now);
            let reward = HabitReward {
                date: clock.iso_date(now),
                xp: xp_gain,
                coins: HABIT_COINS,
                plant_stage: next_plant_stage(user.plant_stage, user.xp.saturating_add(xp_gain)),
                streak: streak.streak,
                last_active_date: bson::DateTime::from_chrono(streak.last_active_date),
            };
            let expected = ProgressionState::of(&user);

            if let Some(updated) = self
                .ctx
                .store
                .apply_habit_reward(user_id, &expected, &reward)
                .await?
            {
                return Ok(updated);
            }
            debug!(user_id = %user_id, attempt, "user changed under habit reward, retrying");
            user = self.ctx.require_user(user_id).await?;
        }

        warn!(user_id = %user_id, "habit reward gave up after {} attempts", MAX_REWARD_ATTEMPTS);
        Err(GreenhouseError::Database(format!(
            "habit reward for user {} kept conflicting",
            user_id
        )))
    }

    async fn release_habit(&self, habit_id: &ObjectId) {
        match self.ctx.store.set_habit_completed(habit_id, true, false).await {
            Ok(true) => warn!(habit_id = %habit_id, "user write failed, habit completion rolled back"),
            Ok(false) => warn!(habit_id = %habit_id, "habit flag changed before rollback"),
            Err(e) => error!(habit_id = %habit_id, "failed to roll back habit completion: {}", e),
        }
    }

    /// Pay out a finished focus session: one coin per whole minute, one XP
    /// per two minutes.
    pub async fn complete_focus_session(
        &self,
        user_id: &ObjectId,
        minutes: f64,
        now: DateTime<Utc>,
    ) -> Result<FocusOutcome> {
        if !minutes.is_finite() || minutes <= 0.0 || minutes > MAX_FOCUS_MINUTES {
            return Err(GreenhouseError::validation(format!(
                "invalid focus duration: {}",
                minutes
            )));
        }

        let reward = focus_reward(minutes);
        let delta = ProgressDelta {
            date: self.ctx.config.clock.iso_date(now),
            coins: reward.coins,
            xp: reward.xp,
            focus_minutes: minutes,
        };

        let user = self
            .ctx
            .store
            .increment_progress(user_id, &delta)
            .await?
            .ok_or_else(|| GreenhouseError::not_found(format!("user {}", user_id)))?;

        info!(
            user_id = %user_id,
            minutes,
            coins = reward.coins,
            balance = user.coins,
            "focus session recorded"
        );
        self.ctx
            .rewards
            .log(
                self.ctx
                    .rewards
                    .event(RewardKind::FocusSession, user_id)
                    .with_xp(reward.xp)
                    .with_coins(reward.coins)
                    .with_metadata(serde_json::json!({ "minutes": minutes })),
            )
            .await;

        Ok(FocusOutcome {
            coins_earned: reward.coins,
            xp_earned: reward.xp,
            new_balance: user.coins,
        })
    }

    /// Zero xp, plant stage and streak. Coins, inventory, garden and habits
    /// are kept.
    pub async fn reset_progress(&self, user_id: &ObjectId) -> Result<ProgressSnapshot> {
        let user = self
            .ctx
            .store
            .update_user(user_id, UserUpdate::ResetProgress)
            .await?
            .ok_or_else(|| GreenhouseError::not_found(format!("user {}", user_id)))?;

        info!(user_id = %user_id, "progress reset");
        self.ctx
            .rewards
            .log(self.ctx.rewards.event(RewardKind::ProgressReset, user_id))
            .await;

        Ok(ProgressSnapshot {
            xp: user.xp,
            plant_stage: user.plant_stage,
            streak: user.streak,
        })
    }
}

fn unchanged(habit: HabitDoc, user: &UserDoc) -> HabitCompletion {
    HabitCompletion {
        habit,
        xp: user.xp,
        coins: user.coins,
        plant_stage: user.plant_stage,
        streak: user.streak,
        already_completed: true,
    }
}
