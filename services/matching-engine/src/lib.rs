//! Matching Engine Service
//!
//! Price-time priority order matching for insurance-claim tokens traded
//! against stablecoins. One `OrderBook` per (base, quote) pair; the
//! `MatchingEngine` is the only code that fills or deactivates orders, and
//! `Exchange` serializes writers per pair.
//!
//! **Key Invariants:**
//! - Price-time priority strictly enforced; trades execute at the maker's price
//! - Deterministic matching (same inputs → same outputs)
//! - The book is never left crossed after an operation
//! - A rejected settlement leaves the book exactly as it was

pub mod book;
pub mod matching;
pub mod engine;
pub mod events;
pub mod settlement;
pub mod config;
pub mod exchange;

pub use book::{BookDepth, BookIds, DepthLevel, OrderBook};
pub use config::EngineConfig;
pub use engine::{Cancellation, MatchingEngine, Placement, TakeResult};
pub use events::{EngineEvent, EventLog, EventSink};
pub use exchange::Exchange;
pub use settlement::{InMemoryLedger, RecordingSettlement, SettlementBridge, Transfer};
