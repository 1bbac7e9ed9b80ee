//! Subnet and host address allocation.
//!
//! Carves consecutive, equally sized ranges out of a base network, one per
//! link segment in segment order, and numbers the hosts of each segment from
//! `.1` in attachment order.

use log::{debug, info};
use serde::Serialize;
use std::fmt;
use std::net::Ipv4Addr;

use crate::config::AddressingConfig;
use crate::topology::{NodeId, SegmentId, Topology};

use super::registry::AddressRegistry;
use super::AddressError;

/// An IPv4 network in CIDR form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ipv4Subnet {
    network: Ipv4Addr,
    prefix_len: u8,
}

impl Ipv4Subnet {
    /// Network must be aligned to the prefix; host-mode prefixes (/31, /32) are rejected.
    pub fn new(network: Ipv4Addr, prefix_len: u8) -> Result<Self, AddressError> {
        if !(1..=30).contains(&prefix_len) {
            return Err(AddressError::InvalidPrefix(prefix_len));
        }
        let subnet = Self { network, prefix_len };
        if u32::from(network) & !subnet.mask_bits() != 0 {
            return Err(AddressError::Misaligned { network, prefix_len });
        }
        Ok(subnet)
    }

    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    fn mask_bits(&self) -> u32 {
        u32::MAX << (32 - self.prefix_len)
    }

    pub fn mask(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.mask_bits())
    }

    /// Total addresses in the range, network and broadcast included
    fn block_size(&self) -> u64 {
        1u64 << (32 - self.prefix_len)
    }

    pub fn broadcast(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.network) | !self.mask_bits())
    }

    /// Usable host addresses (254 for a /24)
    pub fn capacity(&self) -> usize {
        (self.block_size() - 2) as usize
    }

    /// The `index`-th host address, starting at 1
    pub fn host(&self, index: usize) -> Option<Ipv4Addr> {
        if index == 0 || index > self.capacity() {
            return None;
        }
        Some(Ipv4Addr::from(u32::from(self.network) + index as u32))
    }

    pub fn contains(&self, address: &Ipv4Addr) -> bool {
        u32::from(*address) & self.mask_bits() == u32::from(self.network)
    }

    pub fn overlaps(&self, other: &Ipv4Subnet) -> bool {
        self.contains(&other.network) || other.contains(&self.network)
    }

    /// Same-sized range immediately after this one
    pub fn next(&self) -> Option<Ipv4Subnet> {
        let next = u64::from(u32::from(self.network)) + self.block_size();
        u32::try_from(next).ok().map(|network| Ipv4Subnet {
            network: Ipv4Addr::from(network),
            prefix_len: self.prefix_len,
        })
    }
}

impl fmt::Display for Ipv4Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

impl Serialize for Ipv4Subnet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Address range assigned to one segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubnetAllocation {
    pub segment: SegmentId,
    pub subnet: Ipv4Subnet,
}

/// Address of one node interface on one segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InterfaceAddress {
    pub node: NodeId,
    pub segment: SegmentId,
    pub address: Ipv4Addr,
}

/// Result of address planning for a whole topology
#[derive(Debug, Default)]
pub struct AddressPlan {
    allocations: Vec<SubnetAllocation>,
    interfaces: Vec<InterfaceAddress>,
    registry: AddressRegistry,
}

impl AddressPlan {
    pub fn allocations(&self) -> &[SubnetAllocation] {
        &self.allocations
    }

    pub fn interfaces(&self) -> &[InterfaceAddress] {
        &self.interfaces
    }

    pub fn subnet_of(&self, segment: SegmentId) -> Option<Ipv4Subnet> {
        self.allocations
            .iter()
            .find(|a| a.segment == segment)
            .map(|a| a.subnet)
    }

    pub fn address_of(&self, node: NodeId, segment: SegmentId) -> Option<Ipv4Addr> {
        self.interfaces
            .iter()
            .find(|i| i.node == node && i.segment == segment)
            .map(|i| i.address)
    }

    /// Address of the node's first interface; traffic endpoints bind to it
    pub fn primary_address(&self, node: NodeId) -> Option<Ipv4Addr> {
        self.interfaces.iter().find(|i| i.node == node).map(|i| i.address)
    }

    /// All addresses of a node, in interface order
    pub fn addresses_of(&self, node: NodeId) -> Vec<Ipv4Addr> {
        self.interfaces
            .iter()
            .filter(|i| i.node == node)
            .map(|i| i.address)
            .collect()
    }

    pub fn node_for(&self, address: &Ipv4Addr) -> Option<NodeId> {
        self.registry.node_for(address)
    }
}

/// Assigns one disjoint range per segment
#[derive(Debug, Clone, Copy)]
pub struct AddressPlanner {
    first: Ipv4Subnet,
}

impl AddressPlanner {
    pub fn new(base: Ipv4Addr, prefix_len: u8) -> Result<Self, AddressError> {
        Ok(Self {
            first: Ipv4Subnet::new(base, prefix_len)?,
        })
    }

    pub fn from_config(config: &AddressingConfig) -> Result<Self, AddressError> {
        Self::new(config.base, config.prefix_len)
    }

    /// Allocate consecutive ranges for segments with the given host counts.
    ///
    /// Fails if any segment needs more hosts than a range holds or the
    /// address space runs out.
    pub fn allocate_ranges(&self, host_counts: &[usize]) -> Result<Vec<Ipv4Subnet>, AddressError> {
        let mut ranges = Vec::with_capacity(host_counts.len());
        let mut current = Some(self.first);

        for (segment, &hosts) in host_counts.iter().enumerate() {
            let subnet = current.ok_or(AddressError::AddressSpaceExhausted { segment })?;
            if hosts > subnet.capacity() {
                return Err(AddressError::SegmentExhausted {
                    segment,
                    hosts,
                    capacity: subnet.capacity(),
                });
            }
            ranges.push(subnet);
            current = subnet.next();
        }

        Ok(ranges)
    }

    /// Assign ranges and host addresses for every segment of `topology`
    pub fn plan(&self, topology: &Topology) -> Result<AddressPlan, AddressError> {
        let members: Vec<Vec<NodeId>> = topology
            .segments()
            .iter()
            .map(|segment| topology.segment_members(segment.id))
            .collect();
        let counts: Vec<usize> = members.iter().map(Vec::len).collect();
        let ranges = self.allocate_ranges(&counts)?;

        let mut plan = AddressPlan::default();
        for ((segment, subnet), nodes) in topology.segments().iter().zip(ranges).zip(members) {
            plan.allocations.push(SubnetAllocation {
                segment: segment.id,
                subnet,
            });

            for (index, node) in nodes.into_iter().enumerate() {
                let address = subnet.host(index + 1).ok_or(AddressError::SegmentExhausted {
                    segment: segment.id,
                    hosts: index + 1,
                    capacity: subnet.capacity(),
                })?;
                plan.registry.register(address, node)?;
                plan.interfaces.push(InterfaceAddress {
                    node,
                    segment: segment.id,
                    address,
                });
                debug!("Assigned {} to node {} on segment '{}'", address, node, segment.name);
            }

            info!("Segment '{}' uses {} (mask {})", segment.name, subnet, subnet.mask());
        }

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{build_topology, ClusterId};

    #[test]
    fn test_subnet_basics() {
        let subnet = Ipv4Subnet::new(Ipv4Addr::new(10, 1, 1, 0), 24).unwrap();
        assert_eq!(subnet.capacity(), 254);
        assert_eq!(subnet.mask(), Ipv4Addr::new(255, 255, 255, 0));
        assert_eq!(subnet.broadcast(), Ipv4Addr::new(10, 1, 1, 255));
        assert_eq!(subnet.host(1), Some(Ipv4Addr::new(10, 1, 1, 1)));
        assert_eq!(subnet.host(254), Some(Ipv4Addr::new(10, 1, 1, 254)));
        assert_eq!(subnet.host(0), None);
        assert_eq!(subnet.host(255), None);
        assert_eq!(subnet.next().unwrap().to_string(), "10.1.2.0/24");
    }

    #[test]
    fn test_misaligned_base_rejected() {
        assert!(matches!(
            Ipv4Subnet::new(Ipv4Addr::new(10, 1, 1, 7), 24),
            Err(AddressError::Misaligned { .. })
        ));
        assert!(matches!(
            Ipv4Subnet::new(Ipv4Addr::new(10, 1, 1, 0), 31),
            Err(AddressError::InvalidPrefix(31))
        ));
    }

    #[test]
    fn test_last_range_has_no_successor() {
        let subnet = Ipv4Subnet::new(Ipv4Addr::new(255, 255, 255, 0), 24).unwrap();
        assert_eq!(subnet.next(), None);
    }

    #[test]
    fn test_plan_reference_addresses() {
        let topology = build_topology(5).unwrap();
        let plan = AddressPlanner::new(Ipv4Addr::new(10, 1, 1, 0), 24)
            .unwrap()
            .plan(&topology)
            .unwrap();

        let subnets: Vec<String> = plan.allocations().iter().map(|a| a.subnet.to_string()).collect();
        assert_eq!(subnets, vec!["10.1.1.0/24", "10.1.2.0/24", "10.1.3.0/24"]);

        let head_a = topology.head_of(ClusterId::A).unwrap();
        let head_b = topology.head_of(ClusterId::B).unwrap();
        let super_head = topology.super_head().unwrap();
        let first_a = topology.members_of(ClusterId::A)[0];
        let first_b = topology.members_of(ClusterId::B)[0];

        assert_eq!(plan.primary_address(head_a), Some(Ipv4Addr::new(10, 1, 1, 1)));
        assert_eq!(plan.primary_address(first_a), Some(Ipv4Addr::new(10, 1, 1, 2)));
        assert_eq!(plan.primary_address(first_b), Some(Ipv4Addr::new(10, 1, 2, 2)));
        assert_eq!(plan.address_of(head_a, 2), Some(Ipv4Addr::new(10, 1, 3, 1)));
        assert_eq!(plan.address_of(head_b, 2), Some(Ipv4Addr::new(10, 1, 3, 2)));
        assert_eq!(plan.primary_address(super_head), Some(Ipv4Addr::new(10, 1, 3, 3)));
        assert_eq!(plan.addresses_of(head_a).len(), 2);
        assert_eq!(plan.node_for(&Ipv4Addr::new(10, 1, 2, 2)), Some(first_b));
    }

    #[test]
    fn test_segment_capacity_guard() {
        // 254 members + head = 255 hosts on a /24
        let topology = build_topology(254).unwrap();
        let err = AddressPlanner::new(Ipv4Addr::new(10, 1, 1, 0), 24)
            .unwrap()
            .plan(&topology)
            .unwrap_err();
        assert!(matches!(err, AddressError::SegmentExhausted { segment: 0, hosts: 255, capacity: 254 }));

        let topology = build_topology(253).unwrap();
        assert!(AddressPlanner::new(Ipv4Addr::new(10, 1, 1, 0), 24)
            .unwrap()
            .plan(&topology)
            .is_ok());
    }

    #[test]
    fn test_address_space_exhaustion() {
        let planner = AddressPlanner::new(Ipv4Addr::new(255, 255, 254, 0), 24).unwrap();
        let err = planner.allocate_ranges(&[1, 1, 1]).unwrap_err();
        assert!(matches!(err, AddressError::AddressSpaceExhausted { segment: 2 }));
    }
}
