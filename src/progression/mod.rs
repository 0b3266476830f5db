//! Pure progression rules
//!
//! No I/O here: functions take plain values and return results, so the
//! services can apply them against any store.

pub mod calendar;
pub mod growth;
pub mod rewards;
pub mod streak;

pub use calendar::DayClock;
pub use growth::{next_plant_stage, PlantStage, MAX_STAGE, STAGE_THRESHOLDS};
pub use rewards::{
    challenge_xp, challenge_xp_for_label, focus_reward, habit_xp, Difficulty, FocusReward,
    DAILY_CHALLENGE_COINS, DAILY_CHALLENGE_XP, HABIT_COINS, MAX_FOCUS_MINUTES,
};
pub use streak::{advance_streak, display_streak, StreakUpdate};
