//! Ask (sell-side) price index
//!
//! Maintains sell order ids sorted by price ascending (best ask first).
//! Uses BTreeMap for deterministic iteration order.

use std::collections::BTreeMap;
use types::ids::OrderId;
use types::numeric::Price;

use super::price_level::PriceLevel;

/// Ask (sell) side price index
///
/// Levels are iterated from the lowest price up. At each price level,
/// order ids are kept in FIFO order.
#[derive(Debug, Clone, Default)]
pub struct AskBook {
    /// Price levels sorted ascending (lowest price first)
    levels: BTreeMap<Price, PriceLevel>,
}

impl AskBook {
    /// Create a new empty ask book
    pub fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
        }
    }

    /// Queue an order id at the back of its price level
    pub fn insert(&mut self, order_id: OrderId, price: Price) {
        self.levels.entry(price).or_default().push_back(order_id);
    }

    /// Remove an order id from its price level
    ///
    /// Returns true if the order was found and removed
    pub fn remove(&mut self, order_id: &OrderId, price: Price) -> bool {
        if let Some(level) = self.levels.get_mut(&price) {
            if level.remove(order_id) {
                if level.is_empty() {
                    self.levels.remove(&price);
                }
                return true;
            }
        }
        false
    }

    /// Get the best ask price (lowest)
    pub fn best_ask_price(&self) -> Option<Price> {
        self.levels.keys().next().copied()
    }

    /// Levels from best (lowest) to worst
    pub fn levels(&self) -> impl Iterator<Item = (Price, &PriceLevel)> + '_ {
        self.levels.iter().map(|(price, level)| (*price, level))
    }

    /// All resting ids in priority order
    pub fn ids(&self) -> Vec<OrderId> {
        self.levels().flat_map(|(_, level)| level.iter()).collect()
    }

    /// Check if the ask book is empty
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Get the total number of price levels
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}
