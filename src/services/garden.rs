//! Garden layout
//!
//! The layout is replaced wholesale on every update. Ownership of placed
//! items is a trust boundary: under [`OwnershipPolicy::Trusting`] any item
//! id is accepted, under `Strict` each must be free or owned.

use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

use super::ServiceContext;
use crate::catalog::find_item;
use crate::config::OwnershipPolicy;
use crate::db::schemas::{PlacedItem, UserDoc};
use crate::store::UserUpdate;
use crate::types::{GreenhouseError, Result};

pub const MIN_SCALE: f64 = 0.5;
pub const MAX_SCALE: f64 = 3.0;

/// A placed item as submitted by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedItemInput {
    pub item_id: String,
    pub instance_id: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub scale: Option<f64>,
    #[serde(default)]
    pub rotation: Option<f64>,
}

impl PlacedItemInput {
    fn validate(self) -> Result<PlacedItem> {
        if self.item_id.trim().is_empty() {
            return Err(GreenhouseError::validation("placed item is missing its itemId"));
        }
        if self.instance_id.trim().is_empty() {
            return Err(GreenhouseError::validation(format!(
                "placed {} is missing its instanceId",
                self.item_id
            )));
        }
        if !self.x.is_finite() || !self.y.is_finite() {
            return Err(GreenhouseError::validation(format!(
                "instance {} has non-finite coordinates",
                self.instance_id
            )));
        }

        let scale = match self.scale {
            Some(s) if !s.is_finite() => {
                return Err(GreenhouseError::validation(format!(
                    "instance {} has a non-finite scale",
                    self.instance_id
                )))
            }
            Some(s) => s.clamp(MIN_SCALE, MAX_SCALE),
            None => 1.0,
        };
        let rotation = self.rotation.filter(|r| r.is_finite()).unwrap_or(0.0);

        Ok(PlacedItem {
            item_id: self.item_id,
            instance_id: self.instance_id,
            x: self.x,
            y: self.y,
            scale,
            rotation,
        })
    }
}

#[derive(Clone)]
pub struct GardenService {
    ctx: ServiceContext,
}

impl GardenService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Replace the user's garden with `items`
    pub async fn update_garden(
        &self,
        user_id: &ObjectId,
        items: Vec<PlacedItemInput>,
    ) -> Result<Vec<PlacedItem>> {
        let mut seen = HashSet::with_capacity(items.len());
        let mut placed = Vec::with_capacity(items.len());
        for input in items {
            let item = input.validate()?;
            if !seen.insert(item.instance_id.clone()) {
                return Err(GreenhouseError::validation(format!(
                    "duplicate instanceId {}",
                    item.instance_id
                )));
            }
            placed.push(item);
        }

        if self.ctx.config.ownership == OwnershipPolicy::Strict {
            let user = self.ctx.require_user(user_id).await?;
            check_placement_entitlement(&user, &placed)?;
        }

        let updated = self
            .ctx
            .store
            .update_user(user_id, UserUpdate::Garden(placed))
            .await?
            .ok_or_else(|| GreenhouseError::not_found(format!("user {}", user_id)))?;

        info!(user_id = %user_id, items = updated.placed_items.len(), "garden updated");
        Ok(updated.placed_items)
    }
}

fn check_placement_entitlement(user: &UserDoc, placed: &[PlacedItem]) -> Result<()> {
    for item in placed {
        let entry = find_item(&item.item_id)
            .ok_or_else(|| GreenhouseError::InvalidItem(item.item_id.clone()))?;
        if !entry.is_free() && !user.owns(entry.id) {
            return Err(GreenhouseError::InvalidItem(format!(
                "{} is not owned",
                entry.id
            )));
        }
    }
    Ok(())
}
