//! Order book for one trading pair
//!
//! Arena + index layout: a dense order table keyed by id owns every `Order`
//! the book ever created, while the bid and ask price indices store ids only.
//! Orders are never dropped from the table; they leave their price level as
//! soon as they become inactive.
//!
//! Mutation of `filled`/`active` goes through the matching engine; this type
//! only exposes shared references to orders outside the crate.

pub mod price_level;
pub mod bid_book;
pub mod ask_book;

pub use price_level::PriceLevel;
pub use bid_book::BidBook;
pub use ask_book::AskBook;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use types::errors::OrderError;
use types::ids::{AccountId, OrderId, TradingPair};
use types::numeric::{Amount, Price};
use types::order::{Order, Side};

/// Resting ids per side, best to worst, FIFO within a price
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookIds {
    pub bids: Vec<OrderId>,
    pub asks: Vec<OrderId>,
}

/// Aggregated view of one price level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthLevel {
    pub price: Price,
    /// Sum of unfilled quantity resting at this price
    pub quantity: Amount,
    pub order_count: usize,
}

/// Top-of-book depth snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDepth {
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
}

/// Order book for a single (base, quote) pair
#[derive(Debug, Clone)]
pub struct OrderBook {
    pair: TradingPair,
    bids: BidBook,
    asks: AskBook,
    /// Every order ever created in this book
    orders: HashMap<OrderId, Order>,
    /// Trader -> ids in creation order (history, never pruned)
    by_trader: HashMap<AccountId, Vec<OrderId>>,
    /// Trader -> number of orders currently resting
    open_counts: HashMap<AccountId, usize>,
    /// Logical clock for time priority
    last_timestamp: u64,
}

impl OrderBook {
    pub fn new(pair: TradingPair) -> Self {
        Self {
            pair,
            bids: BidBook::new(),
            asks: AskBook::new(),
            orders: HashMap::new(),
            by_trader: HashMap::new(),
            open_counts: HashMap::new(),
            last_timestamp: 0,
        }
    }

    pub fn pair(&self) -> &TradingPair {
        &self.pair
    }

    /// Timestamp the next accepted order will carry
    pub fn next_timestamp(&self) -> u64 {
        self.last_timestamp + 1
    }

    /// Add an active order with unfilled quantity to its price/time slot.
    ///
    /// The order must be new to this book, belong to its pair and carry a
    /// timestamp after every order seen so far.
    pub(crate) fn insert(&mut self, order: Order) -> Result<(), OrderError> {
        if !order.is_active() {
            return Err(OrderError::Inactive(order.id));
        }
        if order.remaining().is_zero() {
            return Err(OrderError::InvalidAmount);
        }
        if self.orders.contains_key(&order.id) {
            return Err(OrderError::Duplicate(order.id));
        }
        if order.pair != self.pair {
            return Err(OrderError::WrongPair {
                order_id: order.id,
                pair: order.pair.to_string(),
            });
        }
        if order.timestamp <= self.last_timestamp {
            return Err(OrderError::StaleTimestamp {
                order_id: order.id,
                timestamp: order.timestamp,
                last: self.last_timestamp,
            });
        }
        let (id, trader, side, price) = (order.id, order.trader, order.side, order.price);
        self.record(order);
        match side {
            Side::Buy => self.bids.insert(id, price),
            Side::Sell => self.asks.insert(id, price),
        }
        *self.open_counts.entry(trader).or_default() += 1;
        Ok(())
    }

    /// Store an order in the table and trader index without resting it.
    pub(crate) fn record(&mut self, order: Order) {
        self.last_timestamp = self.last_timestamp.max(order.timestamp);
        let ids = self.by_trader.entry(order.trader).or_default();
        if !ids.contains(&order.id) {
            ids.push(order.id);
        }
        self.orders.insert(order.id, order);
    }

    /// Take an order out of its resting slot. No-op if it is not resting.
    pub(crate) fn remove(&mut self, order_id: OrderId) -> bool {
        let Some(order) = self.orders.get(&order_id) else {
            return false;
        };
        let removed = match order.side {
            Side::Buy => self.bids.remove(&order_id, order.price),
            Side::Sell => self.asks.remove(&order_id, order.price),
        };
        if removed {
            if let Some(count) = self.open_counts.get_mut(&order.trader) {
                *count = count.saturating_sub(1);
            }
        }
        removed
    }

    pub fn order(&self, order_id: OrderId) -> Option<&Order> {
        self.orders.get(&order_id)
    }

    pub(crate) fn order_mut(&mut self, order_id: OrderId) -> Option<&mut Order> {
        self.orders.get_mut(&order_id)
    }

    /// Best resting price on `side`: highest bid for Buy, lowest ask for Sell
    pub fn best_price(&self, side: Side) -> Option<Price> {
        match side {
            Side::Buy => self.bids.best_bid_price(),
            Side::Sell => self.asks.best_ask_price(),
        }
    }

    /// (best bid, best ask)
    pub fn spread(&self) -> (Option<Price>, Option<Price>) {
        (self.best_price(Side::Buy), self.best_price(Side::Sell))
    }

    pub fn is_crossed(&self) -> bool {
        matches!(self.spread(), (Some(bid), Some(ask)) if bid >= ask)
    }

    pub fn list_ids(&self) -> BookIds {
        BookIds {
            bids: self.bids.ids(),
            asks: self.asks.ids(),
        }
    }

    /// Every id the trader ever placed in this book, oldest first
    pub fn orders_by_trader(&self, trader: &AccountId) -> &[OrderId] {
        self.by_trader
            .get(trader)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn open_order_count(&self, trader: &AccountId) -> usize {
        self.open_counts.get(trader).copied().unwrap_or(0)
    }

    /// Aggregated top `levels` price levels on each side
    pub fn depth(&self, levels: usize) -> BookDepth {
        BookDepth {
            bids: self
                .bids
                .levels()
                .take(levels)
                .map(|(price, level)| self.aggregate(price, level))
                .collect(),
            asks: self
                .asks
                .levels()
                .take(levels)
                .map(|(price, level)| self.aggregate(price, level))
                .collect(),
        }
    }

    fn aggregate(&self, price: Price, level: &PriceLevel) -> DepthLevel {
        let quantity = level
            .iter()
            .filter_map(|id| self.orders.get(&id))
            .fold(Amount::ZERO, |acc, order| acc.saturating_add(order.remaining()));
        DepthLevel {
            price,
            quantity,
            order_count: level.order_count(),
        }
    }

    /// Levels resting on `side`, best first
    pub(crate) fn levels(&self, side: Side) -> Box<dyn Iterator<Item = (Price, &PriceLevel)> + '_> {
        match side {
            Side::Buy => Box::new(self.bids.levels()),
            Side::Sell => Box::new(self.asks.levels()),
        }
    }

    pub fn resting_count(&self) -> usize {
        self.open_counts.values().sum()
    }

    pub fn total_orders(&self) -> usize {
        self.orders.len()
    }

    /// Verify the structural invariants of the book.
    ///
    /// Returns a description of the first violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut resting = 0usize;
        for side in [Side::Buy, Side::Sell] {
            for (price, level) in self.levels(side) {
                if level.is_empty() {
                    return Err(format!("empty {side:?} level left at {price}"));
                }
                let mut last_ts = None;
                for id in level.iter() {
                    let order = self
                        .orders
                        .get(&id)
                        .ok_or_else(|| format!("{id} queued but missing from table"))?;
                    if !order.is_active() {
                        return Err(format!("{id} is inactive but still queued"));
                    }
                    if order.side != side || order.price != price {
                        return Err(format!("{id} queued at wrong side/price"));
                    }
                    if last_ts.is_some_and(|ts| ts >= order.timestamp) {
                        return Err(format!("{id} breaks time order at {price}"));
                    }
                    last_ts = Some(order.timestamp);
                    resting += 1;
                }
            }
        }

        for order in self.orders.values() {
            if !order.check_invariant() {
                return Err(format!("{} violates fill bounds", order.id));
            }
        }

        let active = self.orders.values().filter(|o| o.is_active()).count();
        if active != resting {
            return Err(format!("{active} active orders but {resting} queued"));
        }
        if self.is_crossed() {
            return Err("book is crossed".to_string());
        }
        Ok(())
    }
}
