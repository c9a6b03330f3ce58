//! Types library for the claims exchange
//!
//! Core type definitions shared by the matching engine and its callers:
//! identifiers, fixed-point amounts and prices, the order entity, fills and
//! the error taxonomy.
//!
//! # Modules
//! - `ids`: Identifiers (OrderId, AccountId, TokenId, TradingPair)
//! - `numeric`: Fixed-point scaled integers (Amount, Price)
//! - `order`: Order entity and read model
//! - `trade`: Fill records produced by matching
//! - `errors`: Error taxonomy

pub mod ids;
pub mod numeric;
pub mod order;
pub mod trade;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::order::*;
    pub use crate::trade::*;
    pub use crate::errors::*;
}
