//! Shop item catalog
//!
//! Process-wide constant table; never mutated at runtime.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Equip slot / item type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemSlot {
    Pot,
    Decor,
    Background,
}

impl ItemSlot {
    pub const ALL: [ItemSlot; 3] = [ItemSlot::Pot, ItemSlot::Decor, ItemSlot::Background];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pot => "pot",
            Self::Decor => "decor",
            Self::Background => "background",
        }
    }

    /// Starter value a slot holds before anything is equipped
    pub fn default_item(&self) -> &'static str {
        match self {
            Self::Pot => "basic",
            Self::Decor => "none",
            Self::Background => "default",
        }
    }
}

impl fmt::Display for ItemSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pot" => Ok(Self::Pot),
            "decor" => Ok(Self::Decor),
            "background" => Ok(Self::Background),
            other => Err(format!("unknown slot '{}'", other)),
        }
    }
}

/// A purchasable item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShopItem {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// 0 means free and implicitly owned
    pub price: i64,
    #[serde(rename = "type")]
    pub slot: ItemSlot,
}

impl ShopItem {
    pub fn is_free(&self) -> bool {
        self.price == 0
    }
}

const fn item(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    price: i64,
    slot: ItemSlot,
) -> ShopItem {
    ShopItem {
        id,
        name,
        description,
        price,
        slot,
    }
}

pub static SHOP_ITEMS: &[ShopItem] = &[
    // Pots
    item("pot_clay", "Clay Pot", "A classic starting pot.", 0, ItemSlot::Pot),
    item("pot_ceramic", "Ceramic White", "Clean and modern.", 50, ItemSlot::Pot),
    item("pot_neon", "Neon Cyber", "Glows in the dark.", 0, ItemSlot::Pot),
    item("pot_tulip", "Potted Tulips", "Lovely pink tulips.", 0, ItemSlot::Pot),
    item("pot_rose", "Potted Roses", "Romantic red roses.", 0, ItemSlot::Pot),
    item("pot_daisy", "Potted Daisies", "Cheerful white daisies.", 0, ItemSlot::Pot),
    item("pot_sunflower", "Potted Sunflowers", "Bright and sunny.", 0, ItemSlot::Pot),
    item("pot_spider_lily", "Red Spider Lily", "Mysterious and beautiful.", 0, ItemSlot::Pot),
    // Decor
    item("decor_none", "No Decor", "Clean slate.", 0, ItemSlot::Decor),
    item("decor_bench", "Wooden Bench", "A cozy spot to rest.", 200, ItemSlot::Decor),
    item("decor_birdbath", "Stone Birdbath", "Attracts local birds.", 250, ItemSlot::Decor),
    item("decor_frog", "Friendly Frog", "Ribbit ribbit.", 100, ItemSlot::Decor),
    item("decor_cat", "Sleeping Cat", "Purrfectly cozy.", 300, ItemSlot::Decor),
    item("decor_archway", "Garden Arch", "A grand entrance.", 400, ItemSlot::Decor),
    item("decor_mailbox", "Cute Mailbox", "You have mail!", 0, ItemSlot::Decor),
    item("decor_firepit", "Stone Fire Pit", "Warmth for the night.", 350, ItemSlot::Decor),
    item("decor_gnome", "Garden Gnome", "A cheery friend.", 150, ItemSlot::Decor),
    item("decor_stones", "Zen Stones", "Peace and balance.", 100, ItemSlot::Decor),
    item("decor_mushrooms", "Magic Mushrooms", "A touch of fantasy.", 250, ItemSlot::Decor),
    // Backgrounds
    item("bg_default", "Sunny Day", "Default bright garden.", 0, ItemSlot::Background),
    item("bg_night", "Midnight", "Peaceful night sky.", 5, ItemSlot::Background),
    item("bg_cherry_blossom", "Cherry Blossom", "Pink petals in the breeze.", 0, ItemSlot::Background),
    item("bg_rain", "Rainy Mood", "Cozy rain sounds.", 300, ItemSlot::Background),
];

/// Look up an item by id
pub fn find_item(id: &str) -> Option<&'static ShopItem> {
    SHOP_ITEMS.iter().find(|item| item.id == id)
}

/// Items for one slot, or the whole catalog
pub fn items_for_slot(slot: Option<ItemSlot>) -> Vec<&'static ShopItem> {
    SHOP_ITEMS
        .iter()
        .filter(|item| slot.map_or(true, |s| item.slot == s))
        .collect()
}
