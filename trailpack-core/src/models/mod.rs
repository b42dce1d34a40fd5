//! Domain models for trailpack.
//!
//! # Core Concepts
//!
//! - [`GearItem`]: A piece of gear in the catalog. Its weight is always stored in
//!   grams; display units are derived on demand.
//! - [`Hike`]: A trip with an ordered packing list it owns exclusively.
//! - [`HikeGear`]: The trip-specific link between a hike and a gear item, carrying
//!   quantity and the worn / consumable / verified flags.
//!
//! Deleting a gear item removes every [`HikeGear`] that references it, in every
//! hike. See [`crate::catalog::CascadeStore`].

mod gear;
mod hike;

pub use gear::*;
pub use hike::*;
