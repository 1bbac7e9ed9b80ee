//! IP address allocation and management module.
//!
//! This module assigns one disjoint subnet per link segment and one unique
//! host address per node interface.

pub mod registry;
pub mod allocator;

use std::net::Ipv4Addr;

use crate::topology::{NodeId, SegmentId};

// Re-export commonly used types
pub use registry::AddressRegistry;
pub use allocator::{AddressPlan, AddressPlanner, InterfaceAddress, Ipv4Subnet, SubnetAllocation};

/// Address planning errors; all of them are fatal configuration errors
#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    #[error("prefix length /{0} is not usable for a host segment")]
    InvalidPrefix(u8),
    #[error("network {network} is not aligned to /{prefix_len}")]
    Misaligned { network: Ipv4Addr, prefix_len: u8 },
    #[error("segment {segment} needs {hosts} host addresses but its range holds {capacity}")]
    SegmentExhausted {
        segment: SegmentId,
        hosts: usize,
        capacity: usize,
    },
    #[error("no address range left for segment {segment}")]
    AddressSpaceExhausted { segment: SegmentId },
    #[error("address {address} already assigned to node {existing}, requested by node {requested}")]
    Conflict {
        address: Ipv4Addr,
        existing: NodeId,
        requested: NodeId,
    },
}
