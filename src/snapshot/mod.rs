//! Canonical stock snapshot model.
//!
//! A [`StockSnapshot`] is one normalized observation of the upstream shops.
//! It is built by [`normalize`] and compared with [`compare`]; once built it
//! is never mutated, only replaced.

pub mod compare;
pub mod normalize;

pub use compare::{Delta, diff, materially_equal};
pub use normalize::{is_absent_sentinel, normalize};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Shop category, in display and diff order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Gear shop (`stock.gear`).
    Gear,
    /// Seed shop (`stock.seeds`).
    Seeds,
    /// Egg shop (`eggs.egg`).
    Eggs,
}

impl Category {
    /// Returns all categories in declaration order.
    pub fn all() -> &'static [Category] {
        &[Self::Gear, Self::Seeds, Self::Eggs]
    }

    /// Stable lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gear => "gear",
            Self::Seeds => "seeds",
            Self::Eggs => "eggs",
        }
    }

    /// Fixed section heading used in notifications.
    pub fn heading(&self) -> &'static str {
        match self {
            Self::Gear => "🧰 Gear",
            Self::Seeds => "🌾 Seeds",
            Self::Eggs => "🥚 Eggs",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One shop entry with a typed quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockItem {
    /// Item name as published upstream.
    pub name: String,
    /// Units in stock.
    pub quantity: i64,
}

impl StockItem {
    pub fn new(name: impl Into<String>, quantity: i64) -> Self {
        Self {
            name: name.into(),
            quantity,
        }
    }
}

/// Weather fields, kept as display text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherReport {
    /// Weather condition, e.g. `Rain`.
    pub condition: Option<String>,
    /// Temperature in degrees Celsius as published.
    pub temperature: Option<String>,
}

/// One normalized, timestamped observation of upstream state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSnapshot {
    /// Capture time. Volatile: never part of equality.
    pub observed_at: DateTime<Utc>,
    /// Items per category; every category is present.
    categories: BTreeMap<Category, Vec<StockItem>>,
    /// Weather shown alongside the stock.
    pub weather: WeatherReport,
}

impl StockSnapshot {
    /// Create a snapshot with every category empty.
    pub fn new(observed_at: DateTime<Utc>) -> Self {
        Self {
            observed_at,
            categories: Category::all()
                .iter()
                .map(|&category| (category, Vec::new()))
                .collect(),
            weather: WeatherReport::default(),
        }
    }

    /// Replace the items of `category`, keeping names unique.
    ///
    /// A repeated name keeps its first position and takes the last quantity.
    pub fn set_items(&mut self, category: Category, items: impl IntoIterator<Item = StockItem>) {
        let mut unique: Vec<StockItem> = Vec::new();
        for item in items {
            match unique.iter_mut().find(|existing| existing.name == item.name) {
                Some(existing) => existing.quantity = item.quantity,
                None => unique.push(item),
            }
        }
        self.categories.insert(category, unique);
    }

    /// Builder form of [`StockSnapshot::set_items`].
    #[must_use]
    pub fn with_items(mut self, category: Category, items: impl IntoIterator<Item = StockItem>) -> Self {
        self.set_items(category, items);
        self
    }

    /// Items of `category` in upstream order.
    pub fn items(&self, category: Category) -> &[StockItem] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Quantity of `name` in `category`, if listed.
    pub fn quantity(&self, category: Category, name: &str) -> Option<i64> {
        self.items(category)
            .iter()
            .find(|item| item.name == name)
            .map(|item| item.quantity)
    }

    /// Total number of listed items across all categories.
    pub fn item_count(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }
}
