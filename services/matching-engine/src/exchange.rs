//! Per-pair coordinating service
//!
//! Owns one `OrderBook` per trading pair, each behind its own `RwLock`.
//! Writes to a pair are serialized and readers see a consistent book.
//! The settlement bridge is shared, but it is only locked for the allowance
//! check and `settle` of a non-empty batch (book lock first, then ledger).
//! Operations that move no tokens never touch it.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard, RwLock};
use tracing::info;
use types::errors::{EngineError, OrderError};
use types::ids::{AccountId, OrderId, OrderIdAllocator, TradingPair};
use types::numeric::{Amount, Price};
use types::order::{OrderView, Side};

use crate::book::{BookDepth, BookIds, OrderBook};
use crate::config::EngineConfig;
use crate::engine::{Cancellation, MatchingEngine, Placement, TakeResult};
use crate::settlement::SettlementBridge;

type SharedBook = Arc<RwLock<OrderBook>>;

pub struct Exchange<S> {
    engine: MatchingEngine,
    books: DashMap<TradingPair, SharedBook>,
    /// Order id -> pair, for operations addressed by id only
    routes: DashMap<OrderId, TradingPair>,
    ids: OrderIdAllocator,
    settlement: Mutex<S>,
}

impl<S: SettlementBridge> Exchange<S> {
    pub fn new(config: EngineConfig, settlement: S) -> Result<Self, EngineError> {
        let ids = OrderIdAllocator::starting_at(config.first_order_id);
        Ok(Self {
            engine: MatchingEngine::new(config)?,
            books: DashMap::new(),
            routes: DashMap::new(),
            ids,
            settlement: Mutex::new(settlement),
        })
    }

    pub fn place_limit(
        &self,
        trader: AccountId,
        side: Side,
        pair: &TradingPair,
        amount: Amount,
        price: Price,
    ) -> Result<Placement, EngineError> {
        MatchingEngine::validate_limit(amount, price)?;
        let book = self.book_for(pair);
        let mut book = book.write();
        let mut settlement = &self.settlement;
        let placement = self.engine.place_limit(
            &mut book,
            &mut settlement,
            &self.ids,
            trader,
            side,
            amount,
            price,
        )?;
        self.routes.insert(placement.order_id, pair.clone());
        Ok(placement)
    }

    pub fn cancel(&self, caller: AccountId, order_id: OrderId) -> Result<Cancellation, EngineError> {
        let book = self.route(order_id)?;
        let mut book = book.write();
        self.engine.cancel(&mut book, caller, order_id)
    }

    pub fn take_order(
        &self,
        taker: AccountId,
        order_id: OrderId,
        amount: Amount,
    ) -> Result<TakeResult, EngineError> {
        let book = self.route(order_id)?;
        let mut book = book.write();
        let mut settlement = &self.settlement;
        self.engine
            .take_order(&mut book, &mut settlement, taker, order_id, amount)
    }

    pub fn get_order(&self, order_id: OrderId) -> Option<OrderView> {
        let book = self.route(order_id).ok()?;
        let book = book.read();
        book.order(order_id).map(|order| order.view())
    }

    /// Resting ids per side in priority order; empty for unknown pairs
    pub fn get_list(&self, pair: &TradingPair) -> BookIds {
        self.read_book(pair, OrderBook::list_ids).unwrap_or_default()
    }

    pub fn get_orders_by_trader(&self, trader: &AccountId, pair: &TradingPair) -> Vec<OrderId> {
        self.read_book(pair, |book| book.orders_by_trader(trader).to_vec())
            .unwrap_or_default()
    }

    pub fn get_best_price(&self, pair: &TradingPair, side: Side) -> Option<Price> {
        self.read_book(pair, |book| book.best_price(side)).flatten()
    }

    pub fn depth(&self, pair: &TradingPair, levels: usize) -> BookDepth {
        self.read_book(pair, |book| book.depth(levels))
            .unwrap_or_default()
    }

    /// Pairs with an open book
    pub fn pairs(&self) -> Vec<TradingPair> {
        let mut pairs: Vec<_> = self.books.iter().map(|e| e.key().clone()).collect();
        pairs.sort();
        pairs
    }

    /// Run `f` against a consistent snapshot of the pair's book
    pub fn read_book<R>(&self, pair: &TradingPair, f: impl FnOnce(&OrderBook) -> R) -> Option<R> {
        let book = self.books.get(pair).map(|entry| Arc::clone(entry.value()))?;
        let guard = book.read();
        Some(f(&*guard))
    }

    /// Exclusive access to the settlement bridge, e.g. to fund accounts
    pub fn settlement(&self) -> MutexGuard<'_, S> {
        self.settlement.lock()
    }

    fn book_for(&self, pair: &TradingPair) -> SharedBook {
        if let Some(book) = self.books.get(pair) {
            return Arc::clone(book.value());
        }
        let entry = self.books.entry(pair.clone()).or_insert_with(|| {
            info!(pair = %pair, "Opening order book");
            Arc::new(RwLock::new(OrderBook::new(pair.clone())))
        });
        Arc::clone(entry.value())
    }

    fn route(&self, order_id: OrderId) -> Result<SharedBook, EngineError> {
        let pair = self
            .routes
            .get(&order_id)
            .map(|entry| entry.value().clone())
            .ok_or(OrderError::NotFound(order_id))?;
        self.books
            .get(&pair)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| OrderError::NotFound(order_id).into())
    }
}
