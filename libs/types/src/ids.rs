//! Identifier types for exchange entities
//!
//! Order ids are dense, monotonically increasing integers so the order table
//! can be replayed in submission order. Trader identities are opaque UUID v7
//! references supplied by the surrounding ledger.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use crate::errors::EngineError;

/// Unique identifier for an order
///
/// Assigned once at creation by an [`OrderIdAllocator`] and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(u64);

impl OrderId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out order ids in strictly increasing order.
///
/// Safe to share between threads; an id that was allocated for a placement
/// that later failed is simply burned.
#[derive(Debug)]
pub struct OrderIdAllocator {
    next: AtomicU64,
}

impl OrderIdAllocator {
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    pub fn allocate(&self) -> OrderId {
        OrderId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Id the next call to `allocate` will return
    pub fn peek(&self) -> OrderId {
        OrderId(self.next.load(Ordering::Relaxed))
    }
}

impl Default for OrderIdAllocator {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

/// Identity of an order owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Token identifier (insurance token symbol, stablecoin symbol or address)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(String);

impl TokenId {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TokenId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TokenId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Directed trading pair: `base` is priced in `quote`
///
/// Format: "BASE/QUOTE" (e.g., "FLOOD-2025/USDC")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TradingPair {
    pub base: TokenId,
    pub quote: TokenId,
}

impl TradingPair {
    /// Create a pair, rejecting empty symbols and `base == quote`
    pub fn new(base: impl Into<TokenId>, quote: impl Into<TokenId>) -> Result<Self, EngineError> {
        let base = base.into();
        let quote = quote.into();
        if base.as_str().is_empty() || quote.as_str().is_empty() || base == quote {
            return Err(EngineError::InvalidPair {
                base: base.to_string(),
                quote: quote.to_string(),
            });
        }
        Ok(Self { base, quote })
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

impl FromStr for TradingPair {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((base, quote)) if !quote.contains('/') => Self::new(base, quote),
            _ => Err(EngineError::InvalidPair {
                base: s.to_string(),
                quote: String::new(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator_is_monotonic() {
        let alloc = OrderIdAllocator::starting_at(7);
        let a = alloc.allocate();
        let b = alloc.allocate();
        assert_eq!(a, OrderId::new(7));
        assert_eq!(b, OrderId::new(8));
        assert!(a < b);
        assert_eq!(alloc.peek(), OrderId::new(9));
    }

    #[test]
    fn test_account_id_creation() {
        let id1 = AccountId::new();
        let id2 = AccountId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_trading_pair_parse() {
        let pair: TradingPair = "FLOOD-2025/USDC".parse().unwrap();
        assert_eq!(pair.base.as_str(), "FLOOD-2025");
        assert_eq!(pair.quote.as_str(), "USDC");
        assert_eq!(pair.to_string(), "FLOOD-2025/USDC");
    }

    #[test]
    fn test_trading_pair_rejects_same_token() {
        let err = TradingPair::new("USDC", "USDC").unwrap_err();
        assert!(matches!(err, EngineError::InvalidPair { .. }));
    }

    #[test]
    fn test_trading_pair_rejects_bad_format() {
        assert!("USDC".parse::<TradingPair>().is_err());
        assert!("A/B/C".parse::<TradingPair>().is_err());
        assert!("/USDC".parse::<TradingPair>().is_err());
    }

    #[test]
    fn test_trading_pair_serialization() {
        let pair = TradingPair::new("HURR-Q3", "USDT").unwrap();
        let json = serde_json::to_string(&pair).unwrap();
        assert_eq!(json, r#"{"base":"HURR-Q3","quote":"USDT"}"#);
        let back: TradingPair = serde_json::from_str(&json).unwrap();
        assert_eq!(pair, back);
    }

    #[test]
    fn test_order_id_serialization() {
        let id = OrderId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        assert_eq!(id.to_string(), "#42");
    }
}
