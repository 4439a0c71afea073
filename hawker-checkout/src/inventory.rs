//! In-memory inventory ledger.

use parking_lot::Mutex;
use std::collections::HashMap;
use thiserror::Error;

/// On-hand units assumed for products absent from the seed. Effectively
/// unlimited, so stress runs don't fail checkouts on inventory.
pub const DEFAULT_ON_HAND: i64 = 100_000;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("insufficient inventory for {product_id}: requested {requested}, available {available}")]
pub struct InsufficientInventory {
    pub product_id: String,
    pub requested: i64,
    pub available: i64,
}

/// product_id -> on-hand units. Mutated only by reserve/release.
pub struct Inventory {
    on_hand: Mutex<HashMap<String, i64>>,
}

impl Inventory {
    pub fn new() -> Self {
        Self {
            on_hand: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_seed<I, S>(seed: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        Self {
            on_hand: Mutex::new(seed.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    /// The stock seed used at process start.
    pub fn seeded() -> Self {
        Self::with_seed([
            // High-demand electronics
            ("sku-laptop", 5_000),
            ("sku-macbook", 3_000),
            ("sku-iphone", 10_000),
            ("sku-ipad", 7_000),
            ("sku-airpods", 15_000),
            ("sku-watch", 8_000),
            ("sku-monitor", 4_000),
            ("sku-keyboard", 12_000),
            ("sku-mouse", 18_000),
            ("sku-headphones", 6_000),
            ("sku-camera", 2_000),
            ("sku-drone", 1_500),
            ("sku-tablet", 5_000),
            // Home & kitchen
            ("sku-blender", 8_000),
            ("sku-toaster", 10_000),
            ("sku-microwave", 5_000),
            ("sku-vacuum", 4_000),
            ("sku-coffee", 7_000),
            ("sku-airfryer", 6_000),
            // Sports & outdoors
            ("sku-bike", 3_000),
            ("sku-yoga-mat", 15_000),
            ("sku-dumbbell", 10_000),
            ("sku-tent", 4_000),
            ("sku-backpack", 8_000),
            // Books & media
            ("sku-book", 20_000),
            ("sku-textbook", 5_000),
            // Clothing
            ("sku-jacket", 7_000),
            ("sku-shoes", 12_000),
            ("sku-jeans", 15_000),
            ("sku-shirt", 20_000),
            // Legacy test skus
            ("sku-123", 50_000),
            ("sku-456", 50_000),
            ("sku-789", 50_000),
        ])
    }

    pub fn on_hand(&self, product_id: &str) -> i64 {
        *self
            .on_hand
            .lock()
            .get(product_id)
            .unwrap_or(&DEFAULT_ON_HAND)
    }

    /// Reserve every `(product_id, quantity)` pair, or none of them.
    ///
    /// Decrements are applied in order under one lock; on the first shortage
    /// the decrements already made in this call are rolled back before the
    /// error is returned, so duplicate product lines are accounted exactly.
    pub fn reserve_all(&self, items: &[(&str, i64)]) -> Result<(), InsufficientInventory> {
        let mut on_hand = self.on_hand.lock();
        for (index, (product_id, quantity)) in items.iter().enumerate() {
            let available = *on_hand.get(*product_id).unwrap_or(&DEFAULT_ON_HAND);
            if available < *quantity {
                for (product_id, quantity) in &items[..index] {
                    *on_hand.entry((*product_id).to_string()).or_insert(DEFAULT_ON_HAND) +=
                        quantity;
                }
                return Err(InsufficientInventory {
                    product_id: (*product_id).to_string(),
                    requested: *quantity,
                    available,
                });
            }
            on_hand.insert((*product_id).to_string(), available - quantity);
        }
        Ok(())
    }

    /// Return every `(product_id, quantity)` pair to the ledger.
    pub fn release_all(&self, items: &[(&str, i64)]) {
        let mut on_hand = self.on_hand.lock();
        for (product_id, quantity) in items {
            *on_hand.entry((*product_id).to_string()).or_insert(0) += quantity;
        }
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_then_release_is_identity() {
        let inventory = Inventory::with_seed([("sku-a", 10), ("sku-b", 5)]);
        let items = [("sku-a", 3), ("sku-b", 2)];
        inventory.reserve_all(&items).unwrap();
        assert_eq!(inventory.on_hand("sku-a"), 7);
        assert_eq!(inventory.on_hand("sku-b"), 3);
        inventory.release_all(&items);
        assert_eq!(inventory.on_hand("sku-a"), 10);
        assert_eq!(inventory.on_hand("sku-b"), 5);
    }

    #[test]
    fn shortage_rolls_back_partial_decrements() {
        let inventory = Inventory::with_seed([("sku-a", 5), ("sku-b", 0)]);
        let err = inventory
            .reserve_all(&[("sku-a", 3), ("sku-b", 1)])
            .unwrap_err();
        assert_eq!(err.product_id, "sku-b");
        assert_eq!(err.available, 0);
        assert_eq!(inventory.on_hand("sku-a"), 5, "partial reserve rolled back");
    }

    #[test]
    fn duplicate_lines_are_accounted_exactly() {
        let inventory = Inventory::with_seed([("sku-a", 100)]);
        let err = inventory
            .reserve_all(&[("sku-a", 60), ("sku-a", 60)])
            .unwrap_err();
        assert_eq!(err.available, 40);
        assert_eq!(inventory.on_hand("sku-a"), 100);

        inventory.reserve_all(&[("sku-a", 60), ("sku-a", 40)]).unwrap();
        assert_eq!(inventory.on_hand("sku-a"), 0);
    }

    #[test]
    fn unknown_products_default_to_the_sentinel() {
        let inventory = Inventory::new();
        assert_eq!(inventory.on_hand("sku-anything"), DEFAULT_ON_HAND);
        inventory.reserve_all(&[("sku-anything", 7)]).unwrap();
        assert_eq!(inventory.on_hand("sku-anything"), DEFAULT_ON_HAND - 7);
    }

    #[test]
    fn seed_contains_the_catalog() {
        let inventory = Inventory::seeded();
        assert_eq!(inventory.on_hand("sku-laptop"), 5_000);
        assert_eq!(inventory.on_hand("sku-123"), 50_000);
    }
}
