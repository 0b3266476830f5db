//! Daily reset job
//!
//! Clears every habit's `completed_today` flag and makes sure today's
//! challenge exists. Streaks are not touched here; they are evaluated the
//! next time a gardener completes a habit. Both effects are idempotent, so
//! running the job twice in a day is harmless.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::{ChallengeService, ServiceContext};
use crate::types::Result;

/// Delay before retrying a reset that failed on storage
const RETRY_DELAY: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResetSummary {
    pub habits_reset: u64,
    pub challenge_date: String,
    /// False when the challenge already existed
    pub challenge_created: bool,
}

#[derive(Clone)]
pub struct DailyResetService {
    ctx: ServiceContext,
    challenges: ChallengeService,
}

impl DailyResetService {
    pub fn new(ctx: ServiceContext) -> Self {
        let challenges = ChallengeService::new(ctx.clone());
        Self { ctx, challenges }
    }

    pub async fn run_daily_reset(&self, now: DateTime<Utc>) -> Result<ResetSummary> {
        let habits_reset = self.ctx.store.reset_all_habits().await?;
        let (challenge, challenge_created) = self.challenges.ensure_challenge(now).await?;

        let summary = ResetSummary {
            habits_reset,
            challenge_date: challenge.date,
            challenge_created,
        };
        info!(
            habits_reset = summary.habits_reset,
            date = %summary.challenge_date,
            challenge_created = summary.challenge_created,
            "daily reset complete"
        );
        Ok(summary)
    }

    /// Wait until the next configured reset instant after `now`
    fn until_next_reset(&self, now: DateTime<Utc>) -> Duration {
        let config = &self.ctx.config;
        let next = config.clock.next_occurrence(now, config.reset_hour);
        (next - now).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Run the daily reset at the configured local hour, forever
pub fn spawn_daily_reset_task(service: Arc<DailyResetService>) -> JoinHandle<()> {
    let reset_hour = service.ctx.config.reset_hour;
    let handle = tokio::spawn(async move {
        let mut wait = service.until_next_reset(Utc::now());
        loop {
            tokio::time::sleep(wait).await;
            wait = match service.run_daily_reset(Utc::now()).await {
                Ok(_) => service.until_next_reset(Utc::now()),
                Err(e) if e.is_retriable() => {
                    warn!("Daily reset failed, retrying in {}s: {}", RETRY_DELAY.as_secs(), e);
                    RETRY_DELAY
                }
                Err(e) => {
                    error!("Daily reset failed: {}", e);
                    service.until_next_reset(Utc::now())
                }
            };
        }
    });

    info!(reset_hour, "Daily reset task started");
    handle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::db::schemas::HabitDoc;
    use crate::progression::{DayClock, Difficulty};
    use crate::services::testing::{context, context_with, gardener};
    use crate::store::GardenStore;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_reset_is_idempotent() {
        let (ctx, store) = context();
        let user_id = gardener(&ctx, "ivy@example.com").await._id.unwrap();
        let habit = store
            .insert_habit(HabitDoc::new(user_id, "Read".into(), Difficulty::Easy))
            .await
            .unwrap();
        store
            .set_habit_completed(&habit._id.unwrap(), false, true)
            .await
            .unwrap();
        let service = DailyResetService::new(ctx);
        let now = Utc.with_ymd_and_hms(2024, 5, 15, 0, 0, 5).unwrap();

        let first = service.run_daily_reset(now).await.unwrap();
        assert_eq!(first.habits_reset, 1);
        assert_eq!(first.challenge_date, "2024-05-15");
        assert!(first.challenge_created);

        let second = service.run_daily_reset(now).await.unwrap();
        assert_eq!(second.habits_reset, 0);
        assert!(!second.challenge_created);
        assert_eq!(store.challenge_count(), 1);

        let habit = store
            .find_habit(&user_id, &habit._id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(!habit.completed_today);
    }

    #[tokio::test]
    async fn test_reset_leaves_streaks_alone() {
        let (ctx, store) = context();
        let mut user = gardener(&ctx, "ivy@example.com").await;
        user.streak = 3;
        store.save_user(&user).await.unwrap();

        DailyResetService::new(ctx)
            .run_daily_reset(Utc.with_ymd_and_hms(2024, 5, 20, 0, 0, 0).unwrap())
            .await
            .unwrap();
        let stored = store.find_user(&user._id.unwrap()).await.unwrap().unwrap();
        assert_eq!(stored.streak, 3);
    }

    #[test]
    fn test_wait_targets_local_reset_hour() {
        let (ctx, _store) = context_with(EngineConfig {
            clock: DayClock::from_offset_minutes(120).unwrap(),
            reset_hour: 3,
            ..EngineConfig::default()
        });
        let service = DailyResetService::new(ctx);
        // 00:30 UTC is 02:30 local; next 03:00 local is 30 minutes away
        let now = Utc.with_ymd_and_hms(2024, 5, 15, 0, 30, 0).unwrap();
        assert_eq!(service.until_next_reset(now), Duration::from_secs(30 * 60));
    }
}
