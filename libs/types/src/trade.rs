//! Fill records produced by matching
//!
//! A fill is one maker/taker crossing at the maker's price. The buyer always
//! receives `base_amount` of the base token and pays `quote_amount` of the
//! quote token.

use crate::ids::{AccountId, OrderId, TradingPair};
use crate::numeric::{Amount, Price};
use crate::order::Side;
use serde::{Deserialize, Serialize};

/// Executed crossing between a resting order and a taker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    pub pair: TradingPair,
    pub maker_order_id: OrderId,
    /// `None` when the taker hit the maker directly without placing an order
    pub taker_order_id: Option<OrderId>,
    pub maker: AccountId,
    pub taker: AccountId,
    /// Side of the taker
    pub taker_side: Side,
    /// Execution price (always the maker's limit price)
    pub price: Price,
    pub base_amount: Amount,
    pub quote_amount: Amount,
}

impl Fill {
    /// Account receiving base and paying quote
    pub fn buyer(&self) -> AccountId {
        match self.taker_side {
            Side::Buy => self.taker,
            Side::Sell => self.maker,
        }
    }

    /// Account delivering base and receiving quote
    pub fn seller(&self) -> AccountId {
        match self.taker_side {
            Side::Buy => self.maker,
            Side::Sell => self.taker,
        }
    }

    pub fn is_self_trade(&self) -> bool {
        self.maker == self.taker
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fill(taker_side: Side) -> Fill {
        Fill {
            pair: TradingPair::new("FLOOD-2025", "USDC").unwrap(),
            maker_order_id: OrderId::new(1),
            taker_order_id: Some(OrderId::new(2)),
            maker: AccountId::new(),
            taker: AccountId::new(),
            taker_side,
            price: Price::from_units(100),
            base_amount: Amount::new(4),
            quote_amount: Amount::new(400),
        }
    }

    #[test]
    fn test_buyer_and_seller_follow_taker_side() {
        let fill = sample_fill(Side::Buy);
        assert_eq!(fill.buyer(), fill.taker);
        assert_eq!(fill.seller(), fill.maker);

        let fill = sample_fill(Side::Sell);
        assert_eq!(fill.buyer(), fill.maker);
        assert_eq!(fill.seller(), fill.taker);
        assert!(!fill.is_self_trade());
    }

    #[test]
    fn test_fill_serialization() {
        let fill = sample_fill(Side::Sell);
        let json = serde_json::to_string(&fill).unwrap();
        let back: Fill = serde_json::from_str(&json).unwrap();
        assert_eq!(fill, back);
    }
}
