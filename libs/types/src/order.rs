//! Order entity
//!
//! An order carries an immutable identity (id, trader, side, pair, amount,
//! price, timestamp) and mutable fill/activity state. Once `active` flips to
//! false the order is terminal.

use crate::errors::OrderError;
use crate::ids::{AccountId, OrderId, TokenId, TradingPair};
use crate::numeric::{Amount, Price};
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller of the base token)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Lifecycle state, derived from `filled` and `active`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Resting with no fills yet
    Open,
    /// Resting with some quantity matched
    PartiallyFilled,
    /// Completely matched (terminal)
    Filled,
    /// Released by its owner (terminal)
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
    }
}

/// Limit order owned by an order book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub trader: AccountId,
    pub side: Side,
    pub pair: TradingPair,
    pub amount: Amount,
    pub price: Price,
    /// Logical submission order within the book
    pub timestamp: u64,
    filled: Amount,
    active: bool,
}

impl Order {
    /// Create a new active order with nothing filled
    pub fn new(
        id: OrderId,
        trader: AccountId,
        side: Side,
        pair: TradingPair,
        amount: Amount,
        price: Price,
        timestamp: u64,
    ) -> Self {
        Self {
            id,
            trader,
            side,
            pair,
            amount,
            price,
            timestamp,
            filled: Amount::ZERO,
            active: true,
        }
    }

    pub fn filled(&self) -> Amount {
        self.filled
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Quantity still open for matching
    pub fn remaining(&self) -> Amount {
        self.amount.saturating_sub(self.filled)
    }

    pub fn is_filled(&self) -> bool {
        self.filled == self.amount
    }

    pub fn status(&self) -> OrderStatus {
        if self.is_filled() {
            OrderStatus::Filled
        } else if !self.active {
            OrderStatus::Cancelled
        } else if self.filled.is_zero() {
            OrderStatus::Open
        } else {
            OrderStatus::PartiallyFilled
        }
    }

    /// `filled <= amount`, and a filled order is never active
    pub fn check_invariant(&self) -> bool {
        self.filled <= self.amount && !(self.active && self.is_filled())
    }

    /// Record a fill; deactivates the order once fully filled.
    pub fn apply_fill(&mut self, quantity: Amount) -> Result<(), OrderError> {
        if !self.active {
            return Err(OrderError::Inactive(self.id));
        }
        let remaining = self.remaining();
        if quantity > remaining {
            return Err(OrderError::Overfill {
                order_id: self.id,
                fill: quantity.to_string(),
                remaining: remaining.to_string(),
            });
        }
        self.filled = self.filled.checked_add(quantity).unwrap_or(self.amount);
        if self.is_filled() {
            self.active = false;
        }
        Ok(())
    }

    /// Release the unfilled remainder
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        if !self.active {
            return Err(OrderError::Inactive(self.id));
        }
        self.active = false;
        Ok(())
    }

    pub fn view(&self) -> OrderView {
        OrderView {
            id: self.id,
            trader: self.trader,
            side: self.side,
            base: self.pair.base.clone(),
            quote: self.pair.quote.clone(),
            amount: self.amount,
            filled: self.filled,
            price: self.price,
            timestamp: self.timestamp,
            active: self.active,
            status: self.status(),
        }
    }
}

/// Read model returned by order lookups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderView {
    pub id: OrderId,
    pub trader: AccountId,
    pub side: Side,
    pub base: TokenId,
    pub quote: TokenId,
    pub amount: Amount,
    pub filled: Amount,
    pub price: Price,
    pub timestamp: u64,
    pub active: bool,
    pub status: OrderStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_order(amount: u128) -> Order {
        Order::new(
            OrderId::new(1),
            AccountId::new(),
            Side::Buy,
            TradingPair::new("FLOOD-2025", "USDC").unwrap(),
            Amount::new(amount),
            Price::from_units(100),
            1,
        )
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn test_order_creation() {
        let order = sample_order(10);
        assert_eq!(order.status(), OrderStatus::Open);
        assert!(order.is_active());
        assert!(order.check_invariant());
        assert_eq!(order.remaining(), Amount::new(10));
    }

    #[test]
    fn test_order_fill() {
        let mut order = sample_order(10);

        order.apply_fill(Amount::new(4)).unwrap();
        assert_eq!(order.status(), OrderStatus::PartiallyFilled);
        assert!(order.is_active());
        assert!(order.check_invariant());

        order.apply_fill(Amount::new(6)).unwrap();
        assert_eq!(order.status(), OrderStatus::Filled);
        assert!(!order.is_active());
        assert!(order.check_invariant());
    }

    #[test]
    fn test_order_overfill_rejected() {
        let mut order = sample_order(10);
        let err = order.apply_fill(Amount::new(11)).unwrap_err();
        assert!(matches!(err, OrderError::Overfill { .. }));
        assert_eq!(order.filled(), Amount::ZERO);
    }

    #[test]
    fn test_order_cancel() {
        let mut order = sample_order(10);
        order.apply_fill(Amount::new(3)).unwrap();
        order.cancel().unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert!(order.status().is_terminal());
        assert_eq!(order.cancel(), Err(OrderError::Inactive(OrderId::new(1))));
    }

    #[test]
    fn test_filled_order_cannot_be_mutated() {
        let mut order = sample_order(5);
        order.apply_fill(Amount::new(5)).unwrap();
        assert_eq!(order.cancel(), Err(OrderError::Inactive(OrderId::new(1))));
        assert_eq!(
            order.apply_fill(Amount::ZERO),
            Err(OrderError::Inactive(OrderId::new(1)))
        );
    }

    #[test]
    fn test_order_view_serialization() {
        let order = sample_order(10);
        let view = order.view();
        let json = serde_json::to_string(&view).unwrap();
        assert!(json.contains(r#""side":"BUY""#));
        assert!(json.contains(r#""status":"OPEN""#));
        let back: OrderView = serde_json::from_str(&json).unwrap();
        assert_eq!(view, back);
    }
}
