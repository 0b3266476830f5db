//! Database schemas for Greenhouse
//!
//! Defines MongoDB document structures for users, habits and challenges.

mod challenge;
mod habit;
mod metadata;
mod user;

pub use challenge::{ChallengeDoc, CHALLENGE_COLLECTION};
pub use habit::{HabitDoc, HABIT_COLLECTION};
pub use metadata::Metadata;
pub use user::{
    DailyStat, EquippedItems, PlacedItem, UserDoc, DEFAULT_DISPLAY_NAME, DEFAULT_PLANT_TYPE,
    USER_COLLECTION,
};
