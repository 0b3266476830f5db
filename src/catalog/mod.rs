//! Static catalogs: shop items and the daily challenge pool

pub mod challenges;
pub mod shop;

pub use challenges::{
    category_for_weekday, pick_seed, ChallengeCategory, ChallengeSeed, CHALLENGE_POOL,
};
pub use shop::{find_item, items_for_slot, ItemSlot, ShopItem, SHOP_ITEMS};
