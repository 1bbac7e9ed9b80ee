//! Serializable scenario description.
//!
//! This is what an external engine needs to reproduce the planned scenario:
//! nodes with their tier, addresses, mobility model and routing protocol,
//! segments with their address range, and the traffic schedule.

use serde::Serialize;
use std::net::Ipv4Addr;

use crate::ip::Ipv4Subnet;
use crate::mobility::MobilityBehavior;
use crate::topology::{ClusterId, LinkTech, Tier};
use crate::traffic::FlowDirection;

#[derive(Serialize, Debug)]
pub struct ScenarioDescription {
    pub general: DescribedGeneral,
    pub segments: Vec<DescribedSegment>,
    pub nodes: Vec<DescribedNode>,
    pub flows: Vec<DescribedFlow>,
    pub sinks: Vec<DescribedSink>,
}

#[derive(Serialize, Debug)]
pub struct DescribedGeneral {
    pub sim_time: f64,
    pub run: u64,
    pub seed: u64,
    pub members_per_cluster: usize,
    pub routing_protocol: String,
}

#[derive(Serialize, Debug)]
pub struct DescribedSegment {
    pub name: String,
    pub tech: LinkTech,
    pub subnet: Ipv4Subnet,
    /// Node names in attachment (and address) order
    pub nodes: Vec<String>,
}

#[derive(Serialize, Debug)]
pub struct DescribedNode {
    pub name: String,
    pub tier: Tier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<ClusterId>,
    pub addresses: Vec<Ipv4Addr>,
    pub mobility: MobilityBehavior,
    pub routing: String,
}

#[derive(Serialize, Debug)]
pub struct DescribedFlow {
    pub direction: FlowDirection,
    pub source: String,
    pub destination: String,
    pub source_address: Ipv4Addr,
    pub destination_address: Ipv4Addr,
    pub destination_port: u16,
    pub rate_bps: u64,
    pub packet_size: u32,
    pub start: f64,
    pub stop: f64,
}

#[derive(Serialize, Debug)]
pub struct DescribedSink {
    pub node: String,
    pub port: u16,
}
