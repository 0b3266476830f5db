//! Engine facade
//!
//! [`Greenhouse`] wires every service to one store and one configuration,
//! and is what an outer transport layer would hold as its shared state.

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::catalog::{ItemSlot, ShopItem};
use crate::config::EngineConfig;
use crate::db::schemas::{ChallengeDoc, EquippedItems, HabitDoc, PlacedItem, UserDoc};
use crate::logging::RewardLogger;
use crate::progression::Difficulty;
use crate::services::{
    ChallengeCompletion, ChallengeService, DailyResetService, FocusOutcome, GardenService,
    HabitCompletion, HabitService, LedgerService, PlacedItemInput, Profile, ProfileService,
    ProgressSnapshot, Purchase, ResetSummary, ServiceContext, ShopService, StatsReport,
    StatsService,
};
use crate::store::GardenStore;
use crate::types::Result;

#[derive(Clone)]
pub struct Greenhouse {
    pub config: EngineConfig,
    pub ledger: LedgerService,
    pub challenges: ChallengeService,
    pub stats: StatsService,
    pub shop: ShopService,
    pub garden: GardenService,
    pub habits: HabitService,
    pub profiles: ProfileService,
    pub daily_reset: Arc<DailyResetService>,
}

impl Greenhouse {
    pub fn new(store: Arc<dyn GardenStore>, config: EngineConfig, rewards: RewardLogger) -> Self {
        let ctx = ServiceContext::new(store, config, rewards);
        Self {
            config,
            ledger: LedgerService::new(ctx.clone()),
            challenges: ChallengeService::new(ctx.clone()),
            stats: StatsService::new(ctx.clone()),
            shop: ShopService::new(ctx.clone()),
            garden: GardenService::new(ctx.clone()),
            habits: HabitService::new(ctx.clone()),
            profiles: ProfileService::new(ctx.clone()),
            daily_reset: Arc::new(DailyResetService::new(ctx)),
        }
    }

    // ---- gardeners ----

    pub async fn register_gardener(
        &self,
        email: &str,
        name: Option<&str>,
        credential_hash: &str,
    ) -> Result<UserDoc> {
        self.profiles
            .register_gardener(email, name, credential_hash)
            .await
    }

    pub async fn get_profile(&self, user_id: &ObjectId, now: DateTime<Utc>) -> Result<Profile> {
        self.profiles.get_profile(user_id, now).await
    }

    pub async fn setup_plant(&self, user_id: &ObjectId, plant_type: &str) -> Result<UserDoc> {
        self.profiles.setup_plant(user_id, plant_type).await
    }

    // ---- habits ----

    pub async fn create_habit(
        &self,
        user_id: &ObjectId,
        title: &str,
        difficulty: Option<Difficulty>,
    ) -> Result<HabitDoc> {
        self.habits.create_habit(user_id, title, difficulty).await
    }

    pub async fn list_habits(&self, user_id: &ObjectId) -> Result<Vec<HabitDoc>> {
        self.habits.list_habits(user_id).await
    }

    pub async fn delete_habit(&self, user_id: &ObjectId, habit_id: &ObjectId) -> Result<()> {
        self.habits.delete_habit(user_id, habit_id).await
    }

    pub async fn complete_habit(
        &self,
        user_id: &ObjectId,
        habit_id: &ObjectId,
        now: DateTime<Utc>,
    ) -> Result<HabitCompletion> {
        self.ledger.complete_habit(user_id, habit_id, now).await
    }

    // ---- rewards ----

    pub async fn complete_focus_session(
        &self,
        user_id: &ObjectId,
        minutes: f64,
        now: DateTime<Utc>,
    ) -> Result<FocusOutcome> {
        self.ledger
            .complete_focus_session(user_id, minutes, now)
            .await
    }

    pub async fn reset_progress(&self, user_id: &ObjectId) -> Result<ProgressSnapshot> {
        self.ledger.reset_progress(user_id).await
    }

    pub async fn today_challenge(&self, now: DateTime<Utc>) -> Result<ChallengeDoc> {
        self.challenges.today_challenge(now).await
    }

    pub async fn complete_challenge(
        &self,
        user_id: &ObjectId,
        now: DateTime<Utc>,
    ) -> Result<ChallengeCompletion> {
        self.challenges.complete_challenge(user_id, now).await
    }

    pub async fn get_stats(&self, user_id: &ObjectId) -> Result<StatsReport> {
        self.stats.get_stats(user_id).await
    }

    // ---- shop and garden ----

    pub fn list_shop_items(&self, slot: Option<ItemSlot>) -> Vec<&'static ShopItem> {
        self.shop.list_items(slot)
    }

    pub async fn buy_item(&self, user_id: &ObjectId, item_id: &str) -> Result<Purchase> {
        self.shop.buy_item(user_id, item_id).await
    }

    pub async fn equip_item(
        &self,
        user_id: &ObjectId,
        item_id: &str,
        slot: ItemSlot,
    ) -> Result<EquippedItems> {
        self.shop.equip_item(user_id, item_id, slot).await
    }

    pub async fn update_garden(
        &self,
        user_id: &ObjectId,
        items: Vec<PlacedItemInput>,
    ) -> Result<Vec<PlacedItem>> {
        self.garden.update_garden(user_id, items).await
    }

    // ---- scheduler ----

    pub async fn run_daily_reset(&self, now: DateTime<Utc>) -> Result<ResetSummary> {
        self.daily_reset.run_daily_reset(now).await
    }
}
