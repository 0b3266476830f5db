//! Gardener registration and profile view

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use super::ServiceContext;
use crate::db::schemas::{EquippedItems, PlacedItem, UserDoc};
use crate::progression::{display_streak, PlantStage};
use crate::store::UserUpdate;
use crate::types::{GreenhouseError, Result};

/// What the dashboard shows for a gardener
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub id: ObjectId,
    pub email: String,
    pub name: String,
    pub plant_type: String,
    pub plant_stage: i32,
    /// Named stage for rendering the plant
    pub growth: PlantStage,
    pub xp: i64,
    pub coins: i64,
    /// Stored streak, or 0 once it has lapsed
    pub streak: i32,
    pub inventory: Vec<String>,
    pub equipped_items: EquippedItems,
    pub placed_items: Vec<PlacedItem>,
}

#[derive(Clone)]
pub struct ProfileService {
    ctx: ServiceContext,
}

impl ProfileService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create a gardener with starting progression. The credential hash is
    /// stored as given.
    pub async fn register_gardener(
        &self,
        email: &str,
        name: Option<&str>,
        credential_hash: &str,
    ) -> Result<UserDoc> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(GreenhouseError::validation(format!("invalid email '{}'", email)));
        }

        if self.ctx.store.find_user_by_email(&email).await?.is_some() {
            return Err(GreenhouseError::DuplicateKey(format!(
                "email {} is already registered",
                email
            )));
        }

        // The unique email index still decides a concurrent registration
        let user = UserDoc::new(
            email,
            name.map(|n| n.trim().to_string()),
            credential_hash.to_string(),
        );
        let user = self.ctx.store.insert_user(user).await?;

        info!(email = %user.email, user_id = ?user._id, "gardener registered");
        Ok(user)
    }

    pub async fn get_profile(&self, user_id: &ObjectId, now: DateTime<Utc>) -> Result<Profile> {
        let user = self.ctx.require_user(user_id).await?;
        let streak = display_streak(&self.ctx.config.clock, user.streak, user.last_active(), now);

        let mut equipped_items = user.equipped_items;
        equipped_items.normalize();

        Ok(Profile {
            id: *user_id,
            email: user.email,
            name: user.name,
            plant_type: user.plant_type,
            plant_stage: user.plant_stage,
            growth: PlantStage::from_index(user.plant_stage),
            xp: user.xp,
            coins: user.coins,
            streak,
            inventory: user.inventory,
            equipped_items,
            placed_items: user.placed_items,
        })
    }

    /// Choose the plant; growth restarts from seed
    pub async fn setup_plant(&self, user_id: &ObjectId, plant_type: &str) -> Result<UserDoc> {
        let plant_type = plant_type.trim();
        if plant_type.is_empty() {
            return Err(GreenhouseError::validation("plant type is required"));
        }

        let user = self
            .ctx
            .store
            .update_user(user_id, UserUpdate::PlantType(plant_type.to_string()))
            .await?
            .ok_or_else(|| GreenhouseError::not_found(format!("user {}", user_id)))?;

        info!(user_id = %user_id, plant_type, "plant selected");
        Ok(user)
    }
}
