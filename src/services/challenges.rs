//! Daily challenge issuance and completion
//!
//! One challenge exists per calendar date, created lazily by whichever
//! request asks first. Completion is tracked per user by the date of their
//! last claimed reward, not per challenge id.

use bson::oid::ObjectId;
use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info};

use super::ServiceContext;
use crate::catalog::pick_seed;
use crate::db::schemas::{ChallengeDoc, UserDoc};
use crate::logging::RewardKind;
use crate::progression::{DayClock, DAILY_CHALLENGE_COINS, DAILY_CHALLENGE_XP};
use crate::types::{GreenhouseError, Result};

/// Balances after a challenge completion attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChallengeCompletion {
    pub xp: i64,
    pub coins: i64,
    /// True when today's reward had already been claimed
    pub already_completed: bool,
}

/// Whether `user` already claimed the challenge reward on `now`'s day
pub fn is_challenge_completed_today(clock: &DayClock, user: &UserDoc, now: DateTime<Utc>) -> bool {
    user.last_challenge()
        .is_some_and(|last| clock.same_day(last, now))
}

#[derive(Clone)]
pub struct ChallengeService {
    ctx: ServiceContext,
}

impl ChallengeService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Today's challenge, creating it on first request
    pub async fn today_challenge(&self, now: DateTime<Utc>) -> Result<ChallengeDoc> {
        let (challenge, _) = self.ensure_challenge(now).await?;
        Ok(challenge)
    }

    /// Fetch or create the challenge for `now`'s date. The flag reports
    /// whether this call created it.
    ///
    /// Losing the creation race to a concurrent caller is not an error: the
    /// unique date index rejects our insert and the winner's record is read
    /// back instead.
    pub(crate) async fn ensure_challenge(&self, now: DateTime<Utc>) -> Result<(ChallengeDoc, bool)> {
        let clock = &self.ctx.config.clock;
        let date = clock.iso_date(now);

        if let Some(existing) = self.ctx.store.find_challenge_by_date(&date).await? {
            return Ok((existing, false));
        }

        let seed = {
            let mut rng = rand::thread_rng();
            pick_seed(clock.day_of(now).weekday(), &mut rng)
        };
        let candidate = ChallengeDoc::from_seed(date.clone(), seed);

        match self.ctx.store.insert_challenge(candidate).await {
            Ok(created) => {
                info!(date = %date, category = %created.category.as_str(), "created daily challenge");
                Ok((created, true))
            }
            Err(GreenhouseError::DuplicateKey(_)) => {
                debug!(date = %date, "challenge created concurrently, re-fetching");
                let existing = self
                    .ctx
                    .store
                    .find_challenge_by_date(&date)
                    .await?
                    .ok_or_else(|| {
                        GreenhouseError::Internal(format!(
                            "challenge for {} rejected as duplicate but not found",
                            date
                        ))
                    })?;
                Ok((existing, false))
            }
            Err(e) => Err(e),
        }
    }

    /// Claim today's flat challenge reward, at most once per day
    pub async fn complete_challenge(
        &self,
        user_id: &ObjectId,
        now: DateTime<Utc>,
    ) -> Result<ChallengeCompletion> {
        let clock = &self.ctx.config.clock;
        let user = self.ctx.require_user(user_id).await?;

        if is_challenge_completed_today(clock, &user, now) {
            return Ok(ChallengeCompletion {
                xp: user.xp,
                coins: user.coins,
                already_completed: true,
            });
        }

        let day_start = clock.start_of_day(now);
        let claimed = self
            .ctx
            .store
            .claim_challenge_reward(
                user_id,
                day_start..day_start + Duration::days(1),
                now,
                DAILY_CHALLENGE_XP,
                DAILY_CHALLENGE_COINS,
            )
            .await?;

        let current = self.ctx.require_user(user_id).await?;
        if claimed {
            info!(user_id = %user_id, xp = current.xp, coins = current.coins, "challenge completed");
            self.ctx
                .rewards
                .log(
                    self.ctx
                        .rewards
                        .event(RewardKind::ChallengeCompleted, user_id)
                        .with_xp(DAILY_CHALLENGE_XP)
                        .with_coins(DAILY_CHALLENGE_COINS)
                        .with_subject(clock.iso_date(now)),
                )
                .await;
        }

        Ok(ChallengeCompletion {
            xp: current.xp,
            coins: current.coins,
            already_completed: !claimed,
        })
    }
}
