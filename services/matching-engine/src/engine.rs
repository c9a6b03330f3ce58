//! Matching engine core
//!
//! The only component allowed to change `filled`/`active` on orders. Each
//! operation runs to completion against one `OrderBook`:
//!
//! 1. validate and plan (read-only)
//! 2. check allowances and settle the whole transfer batch
//! 3. commit fills and book membership
//!
//! Nothing is written to the book before settlement succeeds, so every error
//! leaves the book untouched.

use tracing::{debug, warn};
use types::errors::{EngineError, OrderError};
use types::ids::{AccountId, OrderId, OrderIdAllocator};
use types::numeric::{quote_amount, Amount, Price};
use types::order::{Order, OrderStatus, Side};
use types::trade::Fill;

use crate::book::OrderBook;
use crate::config::EngineConfig;
use crate::events::{EngineEvent, NewOrderEvent, OrderCancelledEvent, OrderFilledEvent};
use crate::matching::{MatchExecutor, PlannedFill};
use crate::settlement::{SettlementBridge, Transfer};

/// Main matching engine
#[derive(Debug, Clone)]
pub struct MatchingEngine {
    config: EngineConfig,
    executor: MatchExecutor,
}

/// Result of placing a limit order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub order_id: OrderId,
    /// Status of the new order once matching finished
    pub status: OrderStatus,
    pub fills: Vec<Fill>,
    pub events: Vec<EngineEvent>,
}

impl Placement {
    /// Base quantity matched on arrival
    pub fn filled(&self) -> Amount {
        self.fills
            .iter()
            .fold(Amount::ZERO, |acc, f| acc.saturating_add(f.base_amount))
    }

    pub fn is_resting(&self) -> bool {
        !self.status.is_terminal()
    }
}

/// Result of a direct take against one resting order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TakeResult {
    pub fill: Fill,
    pub events: Vec<EngineEvent>,
}

/// Result of cancelling a resting order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cancellation {
    pub order_id: OrderId,
    /// Unfilled quantity released by the cancel
    pub released: Amount,
    pub events: Vec<EngineEvent>,
}

impl MatchingEngine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            executor: MatchExecutor::new(config.prevent_self_trade),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Reject a limit order with a zero amount or price
    pub fn validate_limit(amount: Amount, price: Price) -> Result<(), OrderError> {
        if amount.is_zero() || price.is_zero() {
            return Err(OrderError::InvalidAmount);
        }
        Ok(())
    }

    /// Place a limit order, crossing it against the opposite side first.
    ///
    /// Any unfilled remainder rests at `price`. The id is taken from `ids`
    /// only after validation; it is burned if settlement later fails.
    #[allow(clippy::too_many_arguments)]
    pub fn place_limit<S: SettlementBridge + ?Sized>(
        &self,
        book: &mut OrderBook,
        settlement: &mut S,
        ids: &OrderIdAllocator,
        trader: AccountId,
        side: Side,
        amount: Amount,
        price: Price,
    ) -> Result<Placement, EngineError> {
        Self::validate_limit(amount, price)?;

        let mut order = Order::new(
            ids.allocate(),
            trader,
            side,
            book.pair().clone(),
            amount,
            price,
            book.next_timestamp(),
        );

        let plan = self.executor.plan(book, &order).inspect_err(|err| {
            if let EngineError::Order(OrderError::SelfTrade(maker_id)) = err {
                warn!(order_id = %order.id, %maker_id, %trader, "Self-trade prevented");
            }
        })?;

        let will_rest = plan.matched < amount;
        if let Some(limit) = self.config.max_open_orders_per_trader {
            if will_rest && book.open_order_count(&trader) >= limit {
                return Err(OrderError::TooManyOpenOrders { limit }.into());
            }
        }

        let pair = book.pair().clone();
        let fills: Vec<Fill> = plan
            .fills
            .iter()
            .map(|planned| MatchExecutor::to_fill(&pair, planned, Some(order.id), trader, side))
            .collect();
        let transfers: Vec<Transfer> = fills.iter().flat_map(MatchExecutor::transfers_for).collect();
        settle(settlement, &transfers)?;

        // Settled: commit to the book
        for planned in &plan.fills {
            commit_maker_fill(book, planned)?;
        }
        order.apply_fill(plan.matched)?;

        let mut events = Vec::with_capacity(fills.len() + 1);
        events.push(EngineEvent::NewOrder(NewOrderEvent::from(&order)));
        events.extend(fills.iter().map(|f| EngineEvent::OrderFilled(f.into())));

        let (order_id, status) = (order.id, order.status());
        if order.is_active() {
            book.insert(order)?;
        } else {
            book.record(order);
        }

        debug!(
            %order_id,
            pair = %pair,
            ?side,
            %amount,
            %price,
            fills = fills.len(),
            ?status,
            "Limit order placed"
        );

        Ok(Placement {
            order_id,
            status,
            fills,
            events,
        })
    }

    /// Fill up to `amount` of one named resting order, at its price.
    ///
    /// No order is created for the taker and nothing else in the book is
    /// touched.
    pub fn take_order<S: SettlementBridge + ?Sized>(
        &self,
        book: &mut OrderBook,
        settlement: &mut S,
        taker: AccountId,
        order_id: OrderId,
        amount: Amount,
    ) -> Result<TakeResult, EngineError> {
        let target = book.order(order_id).ok_or(OrderError::NotFound(order_id))?;
        if !target.is_active() {
            return Err(OrderError::Inactive(order_id).into());
        }
        let trade_qty = amount.min(target.remaining());
        if trade_qty.is_zero() {
            return Err(OrderError::ZeroFill(order_id).into());
        }
        self.executor.check_self_trade(target, taker).inspect_err(|_| {
            warn!(%order_id, %taker, "Self-trade prevented");
        })?;

        let planned = PlannedFill {
            maker_order_id: order_id,
            maker: target.trader,
            price: target.price,
            base_amount: trade_qty,
            quote_amount: quote_amount(trade_qty, target.price).ok_or(EngineError::Overflow {
                context: "take quote amount",
            })?,
        };
        let fill = MatchExecutor::to_fill(book.pair(), &planned, None, taker, target.side.opposite());
        settle(settlement, &MatchExecutor::transfers_for(&fill))?;

        commit_maker_fill(book, &planned)?;

        debug!(
            %order_id,
            %taker,
            requested = %amount,
            filled = %trade_qty,
            "Direct take executed"
        );

        let events = vec![EngineEvent::OrderFilled(OrderFilledEvent::from(&fill))];
        Ok(TakeResult { fill, events })
    }

    /// Release the unfilled remainder of `order_id`. Only the owner may cancel.
    pub fn cancel(
        &self,
        book: &mut OrderBook,
        caller: AccountId,
        order_id: OrderId,
    ) -> Result<Cancellation, EngineError> {
        let order = book
            .order_mut(order_id)
            .ok_or(OrderError::NotFound(order_id))?;
        if order.trader != caller {
            return Err(OrderError::NotOwner(order_id).into());
        }
        order.cancel()?;
        let released = order.remaining();
        book.remove(order_id);

        debug!(%order_id, trader = %caller, %released, "Order cancelled");

        Ok(Cancellation {
            order_id,
            released,
            events: vec![EngineEvent::OrderCancelled(OrderCancelledEvent {
                order_id,
                trader: caller,
                unfilled: released,
            })],
        })
    }
}

/// Check every debit's allowance, then hand the batch over in one call.
/// Empty batches never reach the bridge.
fn settle<S: SettlementBridge + ?Sized>(
    settlement: &mut S,
    transfers: &[Transfer],
) -> Result<(), EngineError> {
    if transfers.is_empty() {
        return Ok(());
    }
    settlement
        .settle_authorized(transfers)
        .map_err(|err| {
            warn!(transfers = transfers.len(), error = %err, "Settlement rejected");
            EngineError::from(err)
        })
}

fn commit_maker_fill(book: &mut OrderBook, planned: &PlannedFill) -> Result<(), EngineError> {
    let maker = book
        .order_mut(planned.maker_order_id)
        .ok_or(OrderError::NotFound(planned.maker_order_id))?;
    maker.apply_fill(planned.base_amount)?;
    let done = !maker.is_active();
    if done {
        book.remove(planned.maker_order_id);
    }
    debug!(
        maker_order_id = %planned.maker_order_id,
        price = %planned.price,
        base = %planned.base_amount,
        quote = %planned.quote_amount,
        done,
        "Maker filled"
    );
    Ok(())
}
