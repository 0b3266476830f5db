//! Plant growth stages
//!
//! Stage advances from XP thresholds, one step per evaluation. A completion
//! that jumps XP past two thresholds still moves the plant a single stage;
//! the next evaluation catches up.

use serde::{Deserialize, Serialize};

/// XP needed to leave stage 0, 1 and 2 respectively
pub const STAGE_THRESHOLDS: [i64; 3] = [20, 60, 120];

/// Highest stage a plant can reach
pub const MAX_STAGE: i32 = 3;

/// Visual stage of the plant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlantStage {
    Seed,
    Sprout,
    Bud,
    Bloom,
}

impl PlantStage {
    /// Clamp a stored stage number into a known stage
    pub fn from_index(stage: i32) -> Self {
        match stage {
            i32::MIN..=0 => Self::Seed,
            1 => Self::Sprout,
            2 => Self::Bud,
            _ => Self::Bloom,
        }
    }
}

/// Stage after one evaluation at `xp`. Never regresses.
pub fn next_plant_stage(current: i32, xp: i64) -> i32 {
    match current {
        0 if xp >= STAGE_THRESHOLDS[0] => 1,
        1 if xp >= STAGE_THRESHOLDS[1] => 2,
        2 if xp >= STAGE_THRESHOLDS[2] => 3,
        _ => current,
    }
}
