//! Trade execution logic
//!
//! Matching runs in two phases. `plan` walks the opposite side of the book
//! read-only, best price first and FIFO within a price, and decides every
//! fill an incoming order would produce. The engine then settles the planned
//! fills and only afterwards commits them to the book.

use types::errors::{EngineError, OrderError};
use types::ids::{AccountId, OrderId, TradingPair};
use types::numeric::{quote_amount, Amount, Price};
use types::order::{Order, Side};
use types::trade::Fill;

use crate::book::OrderBook;
use crate::matching::crossing::incoming_can_match;
use crate::settlement::Transfer;

/// One crossing decided during planning, not yet applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFill {
    pub maker_order_id: OrderId,
    pub maker: AccountId,
    /// Maker's limit price
    pub price: Price,
    pub base_amount: Amount,
    pub quote_amount: Amount,
}

/// Every fill an incoming order produces, in execution order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchPlan {
    pub fills: Vec<PlannedFill>,
    /// Total base quantity matched
    pub matched: Amount,
}

impl MatchPlan {
    pub fn is_empty(&self) -> bool {
        self.fills.is_empty()
    }
}

/// Match executor holding the crossing policy
#[derive(Debug, Clone, Default)]
pub struct MatchExecutor {
    prevent_self_trade: bool,
}

impl MatchExecutor {
    pub fn new(prevent_self_trade: bool) -> Self {
        Self { prevent_self_trade }
    }

    /// Decide the fills `taker` would produce against `book`
    ///
    /// Stops when the taker is exhausted, the opposite side is exhausted, or
    /// the best remaining price no longer crosses. Execution is always at the
    /// resting order's price.
    pub fn plan(&self, book: &OrderBook, taker: &Order) -> Result<MatchPlan, EngineError> {
        let mut plan = MatchPlan::default();
        let mut remaining = taker.remaining();

        'levels: for (price, level) in book.levels(taker.side.opposite()) {
            if remaining.is_zero() || !incoming_can_match(taker.side, taker.price, price) {
                break;
            }

            for maker_id in level.iter() {
                let Some(maker) = book.order(maker_id) else {
                    continue;
                };
                let trade_qty = remaining.min(maker.remaining());
                if trade_qty.is_zero() {
                    continue;
                }
                self.check_self_trade(maker, taker.trader)?;

                let quote = quote_amount(trade_qty, price).ok_or(EngineError::Overflow {
                    context: "fill quote amount",
                })?;
                plan.fills.push(PlannedFill {
                    maker_order_id: maker_id,
                    maker: maker.trader,
                    price,
                    base_amount: trade_qty,
                    quote_amount: quote,
                });

                remaining = remaining.saturating_sub(trade_qty);
                if remaining.is_zero() {
                    break 'levels;
                }
            }
        }

        plan.matched = taker.remaining().saturating_sub(remaining);
        Ok(plan)
    }

    /// Reject a crossing between two orders of the same trader when enabled
    pub fn check_self_trade(&self, maker: &Order, taker: AccountId) -> Result<(), OrderError> {
        if self.prevent_self_trade && maker.trader == taker {
            return Err(OrderError::SelfTrade(maker.id));
        }
        Ok(())
    }

    /// Transfers settling `fill`: base from seller to buyer, quote back
    ///
    /// Zero-valued legs are omitted.
    pub fn transfers_for(fill: &Fill) -> Vec<Transfer> {
        let (buyer, seller) = (fill.buyer(), fill.seller());
        let mut transfers = Vec::with_capacity(2);
        if !fill.base_amount.is_zero() {
            transfers.push(Transfer {
                token: fill.pair.base.clone(),
                from: seller,
                to: buyer,
                amount: fill.base_amount,
            });
        }
        if !fill.quote_amount.is_zero() {
            transfers.push(Transfer {
                token: fill.pair.quote.clone(),
                from: buyer,
                to: seller,
                amount: fill.quote_amount,
            });
        }
        transfers
    }

    /// Turn a planned crossing into the fill record for `taker`
    pub fn to_fill(
        pair: &TradingPair,
        planned: &PlannedFill,
        taker_order_id: Option<OrderId>,
        taker: AccountId,
        taker_side: Side,
    ) -> Fill {
        Fill {
            pair: pair.clone(),
            maker_order_id: planned.maker_order_id,
            taker_order_id,
            maker: planned.maker,
            taker,
            taker_side,
            price: planned.price,
            base_amount: planned.base_amount,
            quote_amount: planned.quote_amount,
        }
    }
}
