//! Daily challenge seed pool
//!
//! Each weekday draws from one category; the full pool backs it up if a
//! category has no entries.

use chrono::Weekday;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Theme of a daily challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeCategory {
    Mindfulness,
    Fitness,
    Learning,
    Kindness,
    Gratitude,
    Health,
    Environment,
}

impl ChallengeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mindfulness => "mindfulness",
            Self::Fitness => "fitness",
            Self::Learning => "learning",
            Self::Kindness => "kindness",
            Self::Gratitude => "gratitude",
            Self::Health => "health",
            Self::Environment => "environment",
        }
    }
}

impl fmt::Display for ChallengeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category drawn on each day of the week
pub fn category_for_weekday(day: Weekday) -> ChallengeCategory {
    match day {
        Weekday::Mon => ChallengeCategory::Mindfulness,
        Weekday::Tue => ChallengeCategory::Fitness,
        Weekday::Wed => ChallengeCategory::Learning,
        Weekday::Thu => ChallengeCategory::Kindness,
        Weekday::Fri => ChallengeCategory::Gratitude,
        Weekday::Sat => ChallengeCategory::Health,
        Weekday::Sun => ChallengeCategory::Environment,
    }
}

/// One entry of the seed pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeSeed {
    pub description: &'static str,
    pub category: ChallengeCategory,
    /// Difficulty label; unknown labels are rewarded as medium
    pub difficulty: &'static str,
}

const fn seed(
    description: &'static str,
    category: ChallengeCategory,
    difficulty: &'static str,
) -> ChallengeSeed {
    ChallengeSeed {
        description,
        category,
        difficulty,
    }
}

pub static CHALLENGE_POOL: &[ChallengeSeed] = &[
    seed("Meditate for 5 minutes", ChallengeCategory::Mindfulness, "easy"),
    seed("Spend 10 minutes without any screens", ChallengeCategory::Mindfulness, "medium"),
    seed("No social media for 1 hour", ChallengeCategory::Mindfulness, "medium"),
    seed("Take a 10 minute walk", ChallengeCategory::Fitness, "easy"),
    seed("Stretch for 5 minutes", ChallengeCategory::Fitness, "easy"),
    seed("Do 30 minutes of exercise", ChallengeCategory::Fitness, "hard"),
    seed("Read 5 pages of a book", ChallengeCategory::Learning, "easy"),
    seed("Learn 5 words in a new language", ChallengeCategory::Learning, "medium"),
    seed("Watch a lecture or tutorial and take notes", ChallengeCategory::Learning, "hard"),
    seed("Compliment someone today", ChallengeCategory::Kindness, "easy"),
    seed("Call a friend or family member", ChallengeCategory::Kindness, "medium"),
    seed("Write down 3 things you are grateful for", ChallengeCategory::Gratitude, "easy"),
    seed("Send a thank-you message to someone", ChallengeCategory::Gratitude, "medium"),
    seed("Drink 8 glasses of water", ChallengeCategory::Health, "medium"),
    seed("Eat a piece of fruit", ChallengeCategory::Health, "easy"),
    seed("Go to bed 30 mins early", ChallengeCategory::Health, "medium"),
    seed("Water your plants", ChallengeCategory::Environment, "easy"),
    seed("Pick up 5 pieces of litter", ChallengeCategory::Environment, "medium"),
    seed("Go a whole day without single-use plastic", ChallengeCategory::Environment, "hard"),
];

/// Pick a seed for a weekday, uniformly among that day's category
pub fn pick_seed<R: Rng + ?Sized>(day: Weekday, rng: &mut R) -> &'static ChallengeSeed {
    pick_from(CHALLENGE_POOL, category_for_weekday(day), rng)
        .unwrap_or(&CHALLENGE_POOL[0])
}

fn pick_from<'a, R: Rng + ?Sized>(
    pool: &'a [ChallengeSeed],
    category: ChallengeCategory,
    rng: &mut R,
) -> Option<&'a ChallengeSeed> {
    let themed: Vec<&ChallengeSeed> = pool.iter().filter(|c| c.category == category).collect();
    if themed.is_empty() {
        pool.choose(rng)
    } else {
        themed.choose(rng).copied()
    }
}
