//! Habit create, list and delete

use bson::oid::ObjectId;
use tracing::info;

use super::ServiceContext;
use crate::db::schemas::HabitDoc;
use crate::progression::Difficulty;
use crate::types::{GreenhouseError, Result};

#[derive(Clone)]
pub struct HabitService {
    ctx: ServiceContext,
}

impl HabitService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create a habit, medium difficulty unless given
    pub async fn create_habit(
        &self,
        user_id: &ObjectId,
        title: &str,
        difficulty: Option<Difficulty>,
    ) -> Result<HabitDoc> {
        let title = title.trim();
        if title.is_empty() {
            return Err(GreenhouseError::validation("habit title is required"));
        }

        self.ctx.require_user(user_id).await?;

        let max = self.ctx.config.max_habits;
        if self.ctx.store.count_habits(user_id).await? >= max as u64 {
            return Err(GreenhouseError::HabitLimit(max));
        }

        let habit = self
            .ctx
            .store
            .insert_habit(HabitDoc::new(
                *user_id,
                title.to_string(),
                difficulty.unwrap_or_default(),
            ))
            .await?;

        info!(user_id = %user_id, title, difficulty = %habit.difficulty, "habit created");
        Ok(habit)
    }

    pub async fn list_habits(&self, user_id: &ObjectId) -> Result<Vec<HabitDoc>> {
        self.ctx.store.list_habits(user_id).await
    }

    pub async fn delete_habit(&self, user_id: &ObjectId, habit_id: &ObjectId) -> Result<()> {
        if !self.ctx.store.delete_habit(user_id, habit_id).await? {
            return Err(GreenhouseError::not_found(format!("habit {}", habit_id)));
        }
        info!(user_id = %user_id, habit_id = %habit_id, "habit deleted");
        Ok(())
    }
}
