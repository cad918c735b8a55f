use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product in the catalog. `name` is the unique key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub quantity: i64,
    pub review: String,
    pub created_at: DateTime<Utc>,
}

impl Item {
    pub fn new(name: String, price: i64, quantity: i64, review: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            price,
            quantity,
            review,
            created_at: Utc::now(),
        }
    }
}

/// Name and stock projection of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemQuantity {
    pub name: String,
    pub quantity: i64,
}

impl From<&Item> for ItemQuantity {
    fn from(item: &Item) -> Self {
        Self {
            name: item.name.clone(),
            quantity: item.quantity,
        }
    }
}

/// Columns items can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemSortKey {
    Name,
    Price,
    Quantity,
}

impl FromStr for ItemSortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(ItemSortKey::Name),
            "price" => Ok(ItemSortKey::Price),
            "quantity" => Ok(ItemSortKey::Quantity),
            other => Err(format!("Cannot sort items by '{}'", other)),
        }
    }
}

/// Sorted page request over the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemPage {
    /// Zero-based page index.
    pub page: u64,
    pub per_page: u64,
    pub sort_by: ItemSortKey,
    pub ascending: bool,
}

impl ItemPage {
    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.per_page)
    }
}

/// Exclusive price bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    pub lower: i64,
    pub upper: i64,
}

impl Default for PriceRange {
    fn default() -> Self {
        Self {
            lower: 0,
            upper: 100_000_000,
        }
    }
}

impl PriceRange {
    pub fn contains(&self, price: i64) -> bool {
        price > self.lower && price < self.upper
    }
}
