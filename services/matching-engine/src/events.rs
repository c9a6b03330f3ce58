//! Event structures for the matching engine
//!
//! Every mutating operation returns the events it produced, in emission
//! order. Callers forward them to an `EventSink` for indexing or UI.

use serde::{Deserialize, Serialize};
use types::ids::{AccountId, OrderId, TokenId};
use types::numeric::{Amount, Price};
use types::order::{Order, Side};
use types::trade::Fill;

/// A limit order was accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderEvent {
    pub id: OrderId,
    pub trader: AccountId,
    pub side: Side,
    pub base: TokenId,
    pub quote: TokenId,
    pub amount: Amount,
    pub price: Price,
}

impl From<&Order> for NewOrderEvent {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            trader: order.trader,
            side: order.side,
            base: order.pair.base.clone(),
            quote: order.pair.quote.clone(),
            amount: order.amount,
            price: order.price,
        }
    }
}

/// A maker order was (partially) filled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFilledEvent {
    /// `None` when the fill came from a direct take
    pub taker_order_id: Option<OrderId>,
    pub maker_order_id: OrderId,
    pub maker: AccountId,
    pub taker: AccountId,
    pub price: Price,
    pub base_amount: Amount,
    pub quote_amount: Amount,
}

impl From<&Fill> for OrderFilledEvent {
    fn from(fill: &Fill) -> Self {
        Self {
            taker_order_id: fill.taker_order_id,
            maker_order_id: fill.maker_order_id,
            maker: fill.maker,
            taker: fill.taker,
            price: fill.price,
            base_amount: fill.base_amount,
            quote_amount: fill.quote_amount,
        }
    }
}

/// An order's unfilled remainder was released by its owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelledEvent {
    pub order_id: OrderId,
    pub trader: AccountId,
    pub unfilled: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineEvent {
    NewOrder(NewOrderEvent),
    OrderFilled(OrderFilledEvent),
    OrderCancelled(OrderCancelledEvent),
}

impl EngineEvent {
    /// Order the event is primarily about
    pub fn order_id(&self) -> OrderId {
        match self {
            EngineEvent::NewOrder(e) => e.id,
            EngineEvent::OrderFilled(e) => e.maker_order_id,
            EngineEvent::OrderCancelled(e) => e.order_id,
        }
    }
}

/// Downstream consumer of engine events
pub trait EventSink {
    fn publish(&mut self, event: EngineEvent);

    fn publish_all(&mut self, events: impl IntoIterator<Item = EngineEvent>)
    where
        Self: Sized,
    {
        for event in events {
            self.publish(event);
        }
    }
}

impl EventSink for Vec<EngineEvent> {
    fn publish(&mut self, event: EngineEvent) {
        self.push(event);
    }
}

/// Event with its position in the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencedEvent {
    pub sequence: u64,
    pub event: EngineEvent,
}

/// Append-only, sequence-numbered event log
///
/// Sequences start at 1 and have no gaps.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Vec<SequencedEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence of the newest entry, 0 when empty
    pub fn last_sequence(&self) -> u64 {
        self.entries.last().map(|e| e.sequence).unwrap_or(0)
    }

    /// Entries strictly after `sequence`
    pub fn since(&self, sequence: u64) -> &[SequencedEvent] {
        let start = self.entries.partition_point(|e| e.sequence <= sequence);
        &self.entries[start..]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SequencedEvent> {
        self.entries.iter()
    }
}

impl EventSink for EventLog {
    fn publish(&mut self, event: EngineEvent) {
        let sequence = self.last_sequence() + 1;
        self.entries.push(SequencedEvent { sequence, event });
    }
}
