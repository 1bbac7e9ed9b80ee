//! Traffic flow planning.
//!
//! Picks the first member of each cluster as endpoints and schedules a CBR
//! flow from A to B plus an optional reverse flow, each ending in a packet
//! sink on the peer.

use log::{info, warn};
use serde::Serialize;
use std::net::Ipv4Addr;

use crate::config::TrafficConfig;
use crate::ip::AddressPlan;
use crate::topology::{ClusterId, NodeId, Topology};

/// Traffic planning errors
#[derive(Debug, thiserror::Error)]
pub enum TrafficError {
    #[error("cluster {0} has no member nodes to act as a traffic endpoint")]
    NoMemberEndpoints(ClusterId),
    #[error("node {0} has no address to bind traffic to")]
    MissingAddress(NodeId),
}

/// Half-open active interval `[start, stop)` in simulated seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActiveWindow {
    pub start: f64,
    pub stop: f64,
}

impl ActiveWindow {
    pub fn new(start: f64, stop: f64) -> Self {
        Self { start, stop }
    }

    /// A window with `stop <= start` is never active
    pub fn is_degenerate(&self) -> bool {
        self.stop <= self.start
    }

    pub fn duration(&self) -> f64 {
        (self.stop - self.start).max(0.0)
    }

    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time < self.stop
    }
}

/// Direction of a planned flow relative to the clusters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowDirection {
    Forward,
    Reverse,
}

/// A constant-bit-rate UDP flow
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficFlow {
    pub direction: FlowDirection,
    pub source: NodeId,
    pub destination: NodeId,
    pub source_address: Ipv4Addr,
    pub destination_address: Ipv4Addr,
    pub destination_port: u16,
    pub rate_bps: u64,
    pub packet_size: u32,
    pub window: ActiveWindow,
}

impl TrafficFlow {
    /// Seconds between consecutive packets
    pub fn packet_interval(&self) -> f64 {
        f64::from(self.packet_size) * 8.0 / self.rate_bps as f64
    }
}

/// UDP receiver bound to any local address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PacketSink {
    pub node: NodeId,
    pub port: u16,
}

#[derive(Debug, Clone, Default)]
pub struct TrafficPlan {
    pub flows: Vec<TrafficFlow>,
    pub sinks: Vec<PacketSink>,
}

impl TrafficPlan {
    pub fn forward(&self) -> Option<&TrafficFlow> {
        self.flows.iter().find(|f| f.direction == FlowDirection::Forward)
    }

    pub fn reverse(&self) -> Option<&TrafficFlow> {
        self.flows.iter().find(|f| f.direction == FlowDirection::Reverse)
    }

    /// Planned flow carrying traffic between these two addresses, if any
    pub fn flow_between(&self, source: Ipv4Addr, destination: Ipv4Addr) -> Option<&TrafficFlow> {
        self.flows
            .iter()
            .find(|f| f.source_address == source && f.destination_address == destination)
    }
}

/// Schedule the forward (and optionally reverse) flow between cluster members.
///
/// Both flows stop `stop_margin` seconds before `sim_time`. A window that
/// ends up empty is kept and simply never fires.
pub fn plan_traffic(
    topology: &Topology,
    addresses: &AddressPlan,
    config: &TrafficConfig,
    sim_time: f64,
) -> Result<TrafficPlan, TrafficError> {
    let source = first_member(topology, ClusterId::A)?;
    let destination = first_member(topology, ClusterId::B)?;
    let source_address = addresses
        .primary_address(source)
        .ok_or(TrafficError::MissingAddress(source))?;
    let destination_address = addresses
        .primary_address(destination)
        .ok_or(TrafficError::MissingAddress(destination))?;

    let stop = sim_time - config.stop_margin;
    let make_flow = |direction, from, to, from_addr, to_addr, start| TrafficFlow {
        direction,
        source: from,
        destination: to,
        source_address: from_addr,
        destination_address: to_addr,
        destination_port: config.port,
        rate_bps: config.rate_bps,
        packet_size: config.packet_size,
        window: ActiveWindow::new(start, stop),
    };

    let mut plan = TrafficPlan::default();
    plan.flows.push(make_flow(
        FlowDirection::Forward,
        source,
        destination,
        source_address,
        destination_address,
        config.forward_start,
    ));
    plan.sinks.push(PacketSink {
        node: destination,
        port: config.port,
    });

    if config.reverse {
        plan.flows.push(make_flow(
            FlowDirection::Reverse,
            destination,
            source,
            destination_address,
            source_address,
            config.reverse_start,
        ));
        plan.sinks.push(PacketSink {
            node: source,
            port: config.port,
        });
    }

    for flow in &plan.flows {
        if flow.window.is_degenerate() {
            warn!(
                "{:?} flow {} -> {} has an empty window [{}, {}) and will never be active",
                flow.direction, flow.source_address, flow.destination_address, flow.window.start, flow.window.stop
            );
        } else {
            info!(
                "Scheduled {:?} flow {} -> {}:{} at {} bps, {} B packets, active [{}, {})",
                flow.direction,
                flow.source_address,
                flow.destination_address,
                flow.destination_port,
                flow.rate_bps,
                flow.packet_size,
                flow.window.start,
                flow.window.stop
            );
        }
    }

    Ok(plan)
}

fn first_member(topology: &Topology, cluster: ClusterId) -> Result<NodeId, TrafficError> {
    topology
        .members_of(cluster)
        .first()
        .copied()
        .ok_or(TrafficError::NoMemberEndpoints(cluster))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ip::AddressPlanner;
    use crate::topology::build_topology;

    fn plan_for(members: i64, sim_time: f64, config: &TrafficConfig) -> Result<TrafficPlan, TrafficError> {
        let topology = build_topology(members).unwrap();
        let addresses = AddressPlanner::new(Ipv4Addr::new(10, 1, 1, 0), 24)
            .unwrap()
            .plan(&topology)
            .unwrap();
        plan_traffic(&topology, &addresses, config, sim_time)
    }

    #[test]
    fn test_reference_windows() {
        let plan = plan_for(5, 200.0, &TrafficConfig::default()).unwrap();
        let forward = plan.forward().unwrap();
        let reverse = plan.reverse().unwrap();

        assert_eq!(forward.window, ActiveWindow::new(20.0, 199.0));
        assert_eq!(reverse.window, ActiveWindow::new(30.0, 199.0));
        assert_eq!(forward.source_address, Ipv4Addr::new(10, 1, 1, 2));
        assert_eq!(forward.destination_address, Ipv4Addr::new(10, 1, 2, 2));
        assert_eq!(reverse.source_address, forward.destination_address);
        assert_eq!(reverse.destination_address, forward.source_address);
        assert_eq!(forward.destination_port, 9);
        assert_eq!(plan.sinks.len(), 2);
    }

    #[test]
    fn test_packet_interval() {
        let plan = plan_for(1, 200.0, &TrafficConfig::default()).unwrap();
        // 1024 B at 2 Mbps
        assert!((plan.forward().unwrap().packet_interval() - 0.004096).abs() < 1e-12);
    }

    #[test]
    fn test_reverse_flow_optional() {
        let config = TrafficConfig {
            reverse: false,
            ..TrafficConfig::default()
        };
        let plan = plan_for(2, 200.0, &config).unwrap();
        assert_eq!(plan.flows.len(), 1);
        assert!(plan.reverse().is_none());
        assert_eq!(plan.sinks, vec![PacketSink { node: plan.forward().unwrap().destination, port: 9 }]);
    }

    #[test]
    fn test_zero_members_fails() {
        let err = plan_for(0, 200.0, &TrafficConfig::default()).unwrap_err();
        assert!(matches!(err, TrafficError::NoMemberEndpoints(ClusterId::A)));
    }

    #[test]
    fn test_short_run_yields_degenerate_windows() {
        let plan = plan_for(1, 25.0, &TrafficConfig::default()).unwrap();
        assert!(!plan.forward().unwrap().window.is_degenerate());
        let reverse = plan.reverse().unwrap();
        assert!(reverse.window.is_degenerate());
        assert_eq!(reverse.window.duration(), 0.0);
        assert!(!reverse.window.contains(30.0));
    }

    #[test]
    fn test_flow_lookup_by_addresses() {
        let plan = plan_for(3, 200.0, &TrafficConfig::default()).unwrap();
        let reverse = plan
            .flow_between(Ipv4Addr::new(10, 1, 2, 2), Ipv4Addr::new(10, 1, 1, 2))
            .unwrap();
        assert_eq!(reverse.direction, FlowDirection::Reverse);
        assert!(plan
            .flow_between(Ipv4Addr::new(10, 1, 1, 1), Ipv4Addr::new(10, 1, 2, 2))
            .is_none());
    }
}
