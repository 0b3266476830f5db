//! Inventory and equip slots

use bson::oid::ObjectId;
use serde::Serialize;
use tracing::info;

use super::ServiceContext;
use crate::catalog::{find_item, items_for_slot, ItemSlot, ShopItem};
use crate::config::OwnershipPolicy;
use crate::db::schemas::{EquippedItems, UserDoc};
use crate::logging::RewardKind;
use crate::store::UserUpdate;
use crate::types::{GreenhouseError, Result};

/// Balance and inventory after a purchase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Purchase {
    pub new_balance: i64,
    pub inventory: Vec<String>,
}

#[derive(Clone)]
pub struct ShopService {
    ctx: ServiceContext,
}

impl ShopService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Catalog entries, optionally for a single slot
    pub fn list_items(&self, slot: Option<ItemSlot>) -> Vec<&'static ShopItem> {
        items_for_slot(slot)
    }

    pub async fn buy_item(&self, user_id: &ObjectId, item_id: &str) -> Result<Purchase> {
        let item = find_item(item_id)
            .ok_or_else(|| GreenhouseError::InvalidItem(item_id.to_string()))?;
        let user = self.ctx.require_user(user_id).await?;
        check_purchase(&user, item)?;

        let updated = match self
            .ctx
            .store
            .purchase_item(user_id, item.id, item.price)
            .await?
        {
            Some(updated) => updated,
            None => {
                // Balance or inventory moved between the read and the write
                let current = self.ctx.require_user(user_id).await?;
                check_purchase(&current, item)?;
                return Err(GreenhouseError::Database(format!(
                    "purchase of {} did not apply",
                    item.id
                )));
            }
        };

        info!(user_id = %user_id, item_id = %item.id, price = item.price, balance = updated.coins, "item purchased");
        self.ctx
            .rewards
            .log(
                self.ctx
                    .rewards
                    .event(RewardKind::ItemPurchased, user_id)
                    .with_coins(-item.price)
                    .with_subject(item.id),
            )
            .await;

        Ok(Purchase {
            new_balance: updated.coins,
            inventory: updated.inventory,
        })
    }

    /// Put `item_id` into `slot`. Legacy records with blank slots get their
    /// defaults filled in first.
    pub async fn equip_item(
        &self,
        user_id: &ObjectId,
        item_id: &str,
        slot: ItemSlot,
    ) -> Result<EquippedItems> {
        let item_id = item_id.trim();
        if item_id.is_empty() {
            return Err(GreenhouseError::validation("item id is required"));
        }

        let user = self.ctx.require_user(user_id).await?;
        if self.ctx.config.ownership == OwnershipPolicy::Strict {
            check_equip_entitlement(&user, item_id, slot)?;
        }

        let mut equipped = user.equipped_items.clone();
        equipped.normalize();
        equipped.set(slot, item_id.to_string());

        let updated = self
            .ctx
            .store
            .update_user(user_id, UserUpdate::Equipped(equipped))
            .await?
            .ok_or_else(|| GreenhouseError::not_found(format!("user {}", user_id)))?;

        info!(user_id = %user_id, slot = %slot, item_id, "item equipped");
        Ok(updated.equipped_items)
    }
}

fn check_purchase(user: &UserDoc, item: &ShopItem) -> Result<()> {
    if user.owns(item.id) {
        return Err(GreenhouseError::AlreadyOwned(item.id.to_string()));
    }
    if user.coins < item.price {
        return Err(GreenhouseError::InsufficientFunds {
            required: item.price,
            available: user.coins,
        });
    }
    Ok(())
}

/// Strict-mode equip rule: slot defaults always pass; anything else must be
/// a catalog item of the slot's type that is free or owned
fn check_equip_entitlement(user: &UserDoc, item_id: &str, slot: ItemSlot) -> Result<()> {
    if item_id == slot.default_item() {
        return Ok(());
    }
    let item = find_item(item_id).ok_or_else(|| GreenhouseError::InvalidItem(item_id.to_string()))?;
    if item.slot != slot {
        return Err(GreenhouseError::validation(format!(
            "{} is a {} item, not a {}",
            item.id, item.slot, slot
        )));
    }
    if !item.is_free() && !user.owns(item.id) {
        return Err(GreenhouseError::InvalidItem(format!("{} is not owned", item.id)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::services::testing::{context, context_with, gardener};
    use crate::store::GardenStore;

    async fn funded(ctx: &ServiceContext, coins: i64) -> ObjectId {
        let mut user = gardener(ctx, "ivy@example.com").await;
        user.coins = coins;
        ctx.store.save_user(&user).await.unwrap();
        user._id.unwrap()
    }

    #[tokio::test]
    async fn test_buy_item_debits_and_records() {
        let (ctx, _store) = context();
        let user_id = funded(&ctx, 120).await;
        let shop = ShopService::new(ctx);

        let purchase = shop.buy_item(&user_id, "decor_frog").await.unwrap();
        assert_eq!(purchase.new_balance, 20);
        assert_eq!(purchase.inventory, vec!["decor_frog".to_string()]);
    }

    #[tokio::test]
    async fn test_insufficient_funds_leaves_state() {
        let (ctx, store) = context();
        let user_id = funded(&ctx, 40).await;
        let shop = ShopService::new(ctx);

        let err = shop.buy_item(&user_id, "pot_ceramic").await.unwrap_err();
        assert!(matches!(
            err,
            GreenhouseError::InsufficientFunds {
                required: 50,
                available: 40
            }
        ));

        let user = store.find_user(&user_id).await.unwrap().unwrap();
        assert_eq!(user.coins, 40);
        assert!(user.inventory.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_purchase_rejected() {
        let (ctx, store) = context();
        let user_id = funded(&ctx, 500).await;
        let shop = ShopService::new(ctx);

        shop.buy_item(&user_id, "decor_gnome").await.unwrap();
        let err = shop.buy_item(&user_id, "decor_gnome").await.unwrap_err();
        assert!(matches!(err, GreenhouseError::AlreadyOwned(_)));

        let user = store.find_user(&user_id).await.unwrap().unwrap();
        assert_eq!(user.coins, 350);
        assert_eq!(user.inventory.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_item_rejected() {
        let (ctx, _store) = context();
        let user_id = funded(&ctx, 500).await;
        let err = ShopService::new(ctx)
            .buy_item(&user_id, "pot_gold")
            .await
            .unwrap_err();
        assert!(matches!(err, GreenhouseError::InvalidItem(_)));
    }

    #[tokio::test]
    async fn test_equip_fills_legacy_slots() {
        let (ctx, store) = context();
        let mut user = gardener(&ctx, "ivy@example.com").await;
        user.equipped_items.decor = String::new();
        store.save_user(&user).await.unwrap();
        let user_id = user._id.unwrap();

        let equipped = ShopService::new(ctx)
            .equip_item(&user_id, "bg_night", ItemSlot::Background)
            .await
            .unwrap();
        assert_eq!(equipped.background, "bg_night");
        assert_eq!(equipped.decor, "none");
        assert_eq!(equipped.pot, "basic");
    }

    #[tokio::test]
    async fn test_trusting_equip_accepts_unowned() {
        let (ctx, _store) = context();
        let user_id = funded(&ctx, 0).await;
        let equipped = ShopService::new(ctx)
            .equip_item(&user_id, "decor_cat", ItemSlot::Decor)
            .await
            .unwrap();
        assert_eq!(equipped.decor, "decor_cat");
    }

    #[tokio::test]
    async fn test_strict_equip_requires_entitlement() {
        let (ctx, _store) = context_with(EngineConfig {
            ownership: OwnershipPolicy::Strict,
            ..EngineConfig::default()
        });
        let user_id = funded(&ctx, 300).await;
        let shop = ShopService::new(ctx);

        assert!(shop
            .equip_item(&user_id, "decor_cat", ItemSlot::Decor)
            .await
            .is_err());
        assert!(shop
            .equip_item(&user_id, "pot_neon", ItemSlot::Decor)
            .await
            .is_err());

        shop.equip_item(&user_id, "pot_neon", ItemSlot::Pot).await.unwrap();
        shop.equip_item(&user_id, "none", ItemSlot::Decor).await.unwrap();
        shop.buy_item(&user_id, "decor_cat").await.unwrap();
        let equipped = shop
            .equip_item(&user_id, "decor_cat", ItemSlot::Decor)
            .await
            .unwrap();
        assert_eq!(equipped.decor, "decor_cat");
        assert_eq!(equipped.pot, "pot_neon");
    }

    #[tokio::test]
    async fn test_equip_unknown_user() {
        let (ctx, _store) = context();
        let err = ShopService::new(ctx)
            .equip_item(&ObjectId::new(), "pot_neon", ItemSlot::Pot)
            .await
            .unwrap_err();
        assert!(matches!(err, GreenhouseError::NotFound(_)));
    }

    #[test]
    fn test_list_items_by_slot() {
        let (ctx, _store) = context();
        let shop = ShopService::new(ctx);
        assert!(shop
            .list_items(Some(ItemSlot::Background))
            .iter()
            .all(|item| item.slot == ItemSlot::Background));
        assert_eq!(shop.list_items(None).len(), crate::catalog::SHOP_ITEMS.len());
    }
}
