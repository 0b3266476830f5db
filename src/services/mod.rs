//! Engine services
//!
//! Each service owns a [`ServiceContext`] clone and implements one group of
//! operations on top of the [`GardenStore`]:
//!
//! - **ledger**: habit completion, focus sessions, progress reset
//! - **challenges**: daily challenge issuance and completion
//! - **stats**: per-day rollups for the stats view
//! - **shop**: catalog listing, purchases, equip slots
//! - **garden**: placed item layout
//! - **habits**: habit create/list/delete
//! - **profile**: registration, profile view, plant selection
//! - **daily_reset**: the out-of-band daily reset job

pub mod challenges;
pub mod daily_reset;
pub mod garden;
pub mod habits;
pub mod ledger;
pub mod profile;
pub mod shop;
pub mod stats;

pub use challenges::{is_challenge_completed_today, ChallengeCompletion, ChallengeService};
pub use daily_reset::{spawn_daily_reset_task, DailyResetService, ResetSummary};
pub use garden::{GardenService, PlacedItemInput};
pub use habits::HabitService;
pub use ledger::{FocusOutcome, HabitCompletion, LedgerService, ProgressSnapshot};
pub use profile::{Profile, ProfileService};
pub use shop::{Purchase, ShopService};
pub use stats::{summarize, StatsReport, StatsService, HISTORY_DAYS};

use bson::oid::ObjectId;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::db::schemas::UserDoc;
use crate::logging::RewardLogger;
use crate::store::GardenStore;
use crate::types::{GreenhouseError, Result};

/// Shared handles every service needs
#[derive(Clone)]
pub struct ServiceContext {
    pub store: Arc<dyn GardenStore>,
    pub config: EngineConfig,
    pub rewards: RewardLogger,
}

impl ServiceContext {
    pub fn new(store: Arc<dyn GardenStore>, config: EngineConfig, rewards: RewardLogger) -> Self {
        Self {
            store,
            config,
            rewards,
        }
    }

    /// Load a user or fail with `NotFound`
    pub(crate) async fn require_user(&self, user_id: &ObjectId) -> Result<UserDoc> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(|| GreenhouseError::not_found(format!("user {}", user_id)))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::store::InMemoryGardenStore;

    /// Context over a fresh in-memory store with default config
    pub fn context() -> (ServiceContext, Arc<InMemoryGardenStore>) {
        context_with(EngineConfig::default())
    }

    pub fn context_with(config: EngineConfig) -> (ServiceContext, Arc<InMemoryGardenStore>) {
        let store = Arc::new(InMemoryGardenStore::new());
        let ctx = ServiceContext::new(
            store.clone(),
            config,
            RewardLogger::new("test-node".to_string()),
        );
        (ctx, store)
    }

    pub async fn gardener(ctx: &ServiceContext, email: &str) -> UserDoc {
        ctx.store
            .insert_user(UserDoc::new(email.to_string(), None, String::new()))
            .await
            .unwrap()
    }
}
