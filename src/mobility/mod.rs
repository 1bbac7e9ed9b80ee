//! Node mobility module.
//!
//! Geometry types, the [`MobilityBehavior`] variants and the per-tier
//! assignment of behaviors to nodes.

pub mod types;
pub mod assigner;

pub use types::{Area, MobilityBehavior, SpeedRange, Vector2};
pub use assigner::{assign_mobility, MobilityPlan};
