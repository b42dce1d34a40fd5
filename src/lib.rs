//! trailpack: a gear catalog and per-hike packing lists with weight summaries.
//!
//! The weight engine lives in `trailpack-core`; this crate adds SQLite storage,
//! user settings and text rendering for the `tpack` binary.

pub mod config;
pub mod db;
pub mod render;

pub use trailpack_core::{aggregator, catalog, category, models, units, CoreError};
