//! Material equality and per-item deltas between two snapshots.

use super::{Category, StockItem, StockSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One item's quantity change between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    pub category: Category,
    pub name: String,
    /// Quantity in the previous snapshot, 0 for new items.
    pub previous: i64,
    pub current: i64,
    /// `current - previous`, never zero.
    pub change: i64,
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:+}", self.name, self.change)
    }
}

fn quantities(items: &[StockItem]) -> HashMap<&str, i64> {
    items
        .iter()
        .map(|item| (item.name.as_str(), item.quantity))
        .collect()
}

/// Returns `true` when both snapshots list the same quantities.
///
/// Per category the item→quantity maps must match in both directions.
/// Item order, `observed_at` and weather are ignored.
pub fn materially_equal(prev: &StockSnapshot, curr: &StockSnapshot) -> bool {
    Category::all()
        .iter()
        .all(|&category| quantities(prev.items(category)) == quantities(curr.items(category)))
}

/// Per-item changes from `prev` to `curr`.
///
/// Ordered by category declaration order, then by item order in `curr`.
/// Items listed only in `prev` produce no delta: a sold-out item is
/// dropped upstream, and that absence is not reported.
pub fn diff(prev: &StockSnapshot, curr: &StockSnapshot) -> Vec<Delta> {
    let mut deltas = Vec::new();
    for &category in Category::all() {
        let before = quantities(prev.items(category));
        for item in curr.items(category) {
            let previous = before.get(item.name.as_str()).copied().unwrap_or(0);
            let change = item.quantity.saturating_sub(previous);
            if change != 0 {
                deltas.push(Delta {
                    category,
                    name: item.name.clone(),
                    previous,
                    current: item.quantity,
                    change,
                });
            }
        }
    }
    deltas
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};

    fn snapshot(items: &[(Category, &str, i64)]) -> StockSnapshot {
        let mut snapshot = StockSnapshot::new(DateTime::<Utc>::UNIX_EPOCH);
        for &category in Category::all() {
            let listed: Vec<StockItem> = items
                .iter()
                .filter(|(c, _, _)| *c == category)
                .map(|(_, name, qty)| StockItem::new(*name, *qty))
                .collect();
            snapshot.set_items(category, listed);
        }
        snapshot
    }

    #[test]
    fn increase_yields_positive_delta() {
        let prev = snapshot(&[(Category::Seeds, "X", 3)]);
        let curr = snapshot(&[(Category::Seeds, "X", 7)]);
        let deltas = diff(&prev, &curr);
        assert_eq!(
            deltas,
            vec![Delta {
                category: Category::Seeds,
                name: "X".into(),
                previous: 3,
                current: 7,
                change: 4,
            }]
        );
    }

    #[test]
    fn decrease_yields_negative_delta() {
        let prev = snapshot(&[(Category::Seeds, "X", 3)]);
        let curr = snapshot(&[(Category::Seeds, "X", 1)]);
        let deltas = diff(&prev, &curr);
        assert_eq!(deltas.len(), 1);
        assert_eq!((deltas[0].previous, deltas[0].current, deltas[0].change), (3, 1, -2));
    }

    #[test]
    fn new_item_counts_from_zero() {
        let prev = snapshot(&[]);
        let curr = snapshot(&[(Category::Eggs, "Bug Egg", 4)]);
        let deltas = diff(&prev, &curr);
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].name, "Bug Egg");
        assert_eq!((deltas[0].previous, deltas[0].current, deltas[0].change), (0, 4, 4));
    }

    #[test]
    fn disappeared_item_yields_no_delta() {
        let prev = snapshot(&[(Category::Gear, "Trowel", 2), (Category::Gear, "Rake", 1)]);
        let curr = snapshot(&[(Category::Gear, "Rake", 1)]);
        assert!(diff(&prev, &curr).is_empty());
        assert!(!materially_equal(&prev, &curr));
    }

    #[test]
    fn unchanged_items_yield_no_delta() {
        let prev = snapshot(&[(Category::Seeds, "A", 1), (Category::Seeds, "B", 2)]);
        let curr = snapshot(&[(Category::Seeds, "A", 1), (Category::Seeds, "B", 5)]);
        let deltas = diff(&prev, &curr);
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].name, "B");
    }

    #[test]
    fn deltas_follow_category_then_current_order() {
        let prev = snapshot(&[]);
        let curr = snapshot(&[
            (Category::Eggs, "Egg", 1),
            (Category::Seeds, "Tomato", 1),
            (Category::Seeds, "Apple", 1),
            (Category::Gear, "Rake", 1),
        ]);
        let names: Vec<String> = diff(&prev, &curr).into_iter().map(|d| d.name).collect();
        assert_eq!(names, ["Rake", "Tomato", "Apple", "Egg"]);
    }

    #[test]
    fn equality_ignores_observed_at() {
        let prev = snapshot(&[(Category::Seeds, "Carrot", 5)]);
        let mut curr = prev.clone();
        curr.observed_at = prev.observed_at + Duration::minutes(5);
        assert!(materially_equal(&prev, &curr));
    }

    #[test]
    fn equality_ignores_item_order() {
        let prev = snapshot(&[(Category::Seeds, "A", 1), (Category::Seeds, "B", 2)]);
        let curr = snapshot(&[(Category::Seeds, "B", 2), (Category::Seeds, "A", 1)]);
        assert!(materially_equal(&prev, &curr));
    }

    #[test]
    fn equality_is_quantity_sensitive_in_both_directions() {
        let base = snapshot(&[(Category::Seeds, "A", 1)]);
        let more = snapshot(&[(Category::Seeds, "A", 1), (Category::Seeds, "B", 1)]);
        let changed = snapshot(&[(Category::Seeds, "A", 2)]);
        assert!(!materially_equal(&base, &more));
        assert!(!materially_equal(&more, &base));
        assert!(!materially_equal(&base, &changed));
    }

    #[test]
    fn same_name_in_different_categories_is_distinct() {
        let prev = snapshot(&[(Category::Gear, "Star", 1)]);
        let curr = snapshot(&[(Category::Seeds, "Star", 1)]);
        assert!(!materially_equal(&prev, &curr));
    }

    #[test]
    fn delta_display_is_signed() {
        let up = Delta {
            category: Category::Seeds,
            name: "Carrot".into(),
            previous: 3,
            current: 7,
            change: 4,
        };
        let down = Delta {
            change: -2,
            current: 1,
            ..up.clone()
        };
        assert_eq!(up.to_string(), "Carrot +4");
        assert_eq!(down.to_string(), "Carrot -2");
    }
}
