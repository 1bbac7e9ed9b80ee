//! IP address registry.
//!
//! Tracks which node owns which address so that no address is handed out
//! twice across the whole scenario.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use crate::topology::NodeId;

use super::AddressError;

/// Central record of assigned host addresses
#[derive(Debug, Default)]
pub struct AddressRegistry {
    /// Address -> owning node
    assigned: BTreeMap<Ipv4Addr, NodeId>,
}

impl AddressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `address` as owned by `node`.
    ///
    /// Re-registering the same pair is a no-op; a different owner is a conflict.
    pub fn register(&mut self, address: Ipv4Addr, node: NodeId) -> Result<(), AddressError> {
        match self.assigned.get(&address) {
            Some(&existing) if existing != node => Err(AddressError::Conflict {
                address,
                existing,
                requested: node,
            }),
            Some(_) => Ok(()),
            None => {
                self.assigned.insert(address, node);
                Ok(())
            }
        }
    }

    pub fn is_assigned(&self, address: &Ipv4Addr) -> bool {
        self.assigned.contains_key(address)
    }

    /// Node that owns `address`
    pub fn node_for(&self, address: &Ipv4Addr) -> Option<NodeId> {
        self.assigned.get(address).copied()
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}
