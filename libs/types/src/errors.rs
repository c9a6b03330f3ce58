//! Error types for the matching engine
//!
//! Error taxonomy using thiserror. Every error is surfaced synchronously to
//! the caller of the operation that produced it.

use thiserror::Error;

use crate::ids::OrderId;

/// Top-level engine error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    #[error("Settlement failed: {0}")]
    Settlement(#[from] SettlementError),

    #[error("Invalid trading pair: {base}/{quote}")]
    InvalidPair { base: String, quote: String },

    #[error("Arithmetic overflow computing {context}")]
    Overflow { context: &'static str },

    #[error("Invalid engine configuration: {reason}")]
    InvalidConfig { reason: String },
}

/// Order-specific errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrderError {
    #[error("Invalid order: amount and price must be greater than zero")]
    InvalidAmount,

    #[error("Order not found: {0}")]
    NotFound(OrderId),

    #[error("Order {0} is no longer active")]
    Inactive(OrderId),

    #[error("Caller does not own order {0}")]
    NotOwner(OrderId),

    #[error("Take request on order {0} would fill nothing")]
    ZeroFill(OrderId),

    #[error("Self-trade prevention triggered against order {0}")]
    SelfTrade(OrderId),

    #[error("Fill of {fill} exceeds remaining {remaining} on order {order_id}")]
    Overfill {
        order_id: OrderId,
        fill: String,
        remaining: String,
    },

    #[error("Trader already has {limit} open orders in this book")]
    TooManyOpenOrders { limit: usize },

    #[error("Order {0} is already in the book")]
    Duplicate(OrderId),

    #[error("Order {order_id} is for {pair}, not this book")]
    WrongPair { order_id: OrderId, pair: String },

    #[error("Order {order_id} timestamp {timestamp} is not after {last}")]
    StaleTimestamp {
        order_id: OrderId,
        timestamp: u64,
        last: u64,
    },
}

/// Errors raised by the token-transfer collaborator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettlementError {
    #[error("Insufficient balance for {token}: required {required}, available {available}")]
    InsufficientBalance {
        token: String,
        required: String,
        available: String,
    },

    #[error("Insufficient allowance for {token}: required {required}, approved {approved}")]
    InsufficientAllowance {
        token: String,
        required: String,
        approved: String,
    },

    #[error("Arithmetic overflow in balance calculation")]
    Overflow,

    #[error("Transfer rejected: {reason}")]
    Rejected { reason: String },
}
