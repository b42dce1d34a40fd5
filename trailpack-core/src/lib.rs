//! Weight aggregation and categorization engine for trailpack.
//!
//! Everything in this crate is synchronous and performs no I/O. Storage hands it
//! plain snapshots ([`models::Hike`], [`models::GearItem`]) and persists the
//! [`aggregator::PackChange`] intents it returns.

pub mod aggregator;
pub mod catalog;
pub mod category;
pub mod error;
pub mod models;
pub mod units;

pub use error::{CoreError, Result};
