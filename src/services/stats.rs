//! Daily stats aggregation for the stats view

use bson::oid::ObjectId;
use serde::Serialize;

use super::ServiceContext;
use crate::db::schemas::{DailyStat, UserDoc};
use crate::types::Result;

/// Days of history returned with a report
pub const HISTORY_DAYS: usize = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub xp: i64,
    pub streak: i32,
    pub total_habits: i64,
    pub total_focus_minutes: f64,
    /// Most recent entries, oldest first. Days without activity are absent.
    pub history: Vec<DailyStat>,
}

/// Roll a user's daily stats up into a report
pub fn summarize(user: &UserDoc) -> StatsReport {
    let total_habits: i64 = user.daily_stats.iter().map(|s| s.habits_completed).sum();
    let total_focus_minutes: f64 = user.daily_stats.iter().map(|s| s.focus_minutes).sum();

    let mut history = user.daily_stats.clone();
    // ISO dates sort lexically
    history.sort_by(|a, b| a.date.cmp(&b.date));
    let skip = history.len().saturating_sub(HISTORY_DAYS);
    history.drain(..skip);

    StatsReport {
        xp: user.xp,
        streak: user.streak,
        total_habits,
        total_focus_minutes,
        history,
    }
}

#[derive(Clone)]
pub struct StatsService {
    ctx: ServiceContext,
}

impl StatsService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn get_stats(&self, user_id: &ObjectId) -> Result<StatsReport> {
        let user = self.ctx.require_user(user_id).await?;
        Ok(summarize(&user))
    }
}
