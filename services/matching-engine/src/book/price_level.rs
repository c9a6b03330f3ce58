//! Price level implementation with FIFO queue
//!
//! A price level holds the ids of every resting order at one price point, in
//! arrival order. Quantities live in the book's order table, so a level never
//! needs updating when an order is partially filled.

use std::collections::VecDeque;
use types::ids::OrderId;

/// Orders resting at a single price, oldest first
#[derive(Debug, Clone, Default)]
pub struct PriceLevel {
    orders: VecDeque<OrderId>,
}

impl PriceLevel {
    /// Create a new empty price level
    pub fn new() -> Self {
        Self {
            orders: VecDeque::new(),
        }
    }

    /// Append an order at the back of the queue (time priority)
    pub fn push_back(&mut self, order_id: OrderId) {
        self.orders.push_back(order_id);
    }

    /// Remove an order from the queue by id
    ///
    /// Returns true if the order was queued at this level
    pub fn remove(&mut self, order_id: &OrderId) -> bool {
        match self.orders.iter().position(|id| id == order_id) {
            Some(position) => self.orders.remove(position).is_some(),
            None => false,
        }
    }

    /// Oldest order at this level
    pub fn front(&self) -> Option<OrderId> {
        self.orders.front().copied()
    }

    /// Ids in matching order
    pub fn iter(&self) -> impl Iterator<Item = OrderId> + '_ {
        self.orders.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }
}
