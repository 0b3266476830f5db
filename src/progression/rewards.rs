//! Reward tables for habits, challenges and focus sessions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coins granted per completed habit, regardless of difficulty
pub const HABIT_COINS: i64 = 5;

/// Flat XP granted for the daily challenge
pub const DAILY_CHALLENGE_XP: i64 = 50;

/// Flat coins granted for the daily challenge
pub const DAILY_CHALLENGE_COINS: i64 = 50;

/// Coins per focused minute
pub const FOCUS_MINUTE_COIN_RATE: f64 = 1.0;

/// Difficulty shared by habits and challenges
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

/// XP for completing a habit
pub fn habit_xp(difficulty: Difficulty) -> i64 {
    match difficulty {
        Difficulty::Easy => 10,
        Difficulty::Medium => 20,
        Difficulty::Hard => 30,
    }
}

/// XP a challenge advertises for its difficulty
pub fn challenge_xp(difficulty: Difficulty) -> i64 {
    match difficulty {
        Difficulty::Easy => 30,
        Difficulty::Medium => 50,
        Difficulty::Hard => 100,
    }
}

/// XP for a difficulty label; unrecognised labels fall back to medium (50)
pub fn challenge_xp_for_label(label: &str) -> i64 {
    label
        .parse::<Difficulty>()
        .map(challenge_xp)
        .unwrap_or_else(|_| challenge_xp(Difficulty::Medium))
}

/// Rewards for a finished focus session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusReward {
    pub coins: i64,
    pub xp: i64,
}

/// Longest focus session that pays out: one day
pub const MAX_FOCUS_MINUTES: f64 = 24.0 * 60.0;

/// One coin per whole minute, one XP per two whole minutes.
/// Caller validates `0 < minutes <= MAX_FOCUS_MINUTES`.
pub fn focus_reward(minutes: f64) -> FocusReward {
    FocusReward {
        coins: (minutes * FOCUS_MINUTE_COIN_RATE).floor() as i64,
        xp: (minutes / 2.0).floor() as i64,
    }
}
