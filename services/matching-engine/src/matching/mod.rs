//! Matching logic module
//!
//! Implements price-time priority crossing and the settlement batches that
//! accompany each fill.

pub mod crossing;
pub mod executor;

pub use crossing::{can_match, incoming_can_match};
pub use executor::{MatchExecutor, MatchPlan, PlannedFill};
