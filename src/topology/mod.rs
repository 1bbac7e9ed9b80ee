//! Network topology module.
//!
//! This module builds the two-tier node hierarchy: two wireless clusters
//! and the wired backbone joining their heads with the super-head.

pub mod types;
pub mod builder;

// Re-export key types and functions for easier access
pub use types::{ClusterId, LinkSegment, LinkTech, Membership, Node, NodeId, SegmentId, Tier, Topology};
pub use builder::{build_topology, TopologyError};
