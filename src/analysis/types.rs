//! Core data types for flow statistics.

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Identifier assigned to a flow by the monitor, unique within a run
pub type FlowId = u32;

/// IANA protocol number for UDP
pub const PROTOCOL_UDP: u8 = 17;

/// Raw per-flow counters accumulated by the flow monitor during the run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowRecord {
    pub tx_packets: u64,
    pub rx_packets: u64,
    pub lost_packets: u64,
    /// Sum over received packets of the number of intermediate forwards
    pub times_forwarded: u64,
    /// Sum of end-to-end delays of received packets, in seconds
    pub delay_sum: f64,
    pub tx_bytes: u64,
    pub rx_bytes: u64,
}

/// Classifier key of a flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FiveTuple {
    pub source_address: Ipv4Addr,
    pub destination_address: Ipv4Addr,
    pub protocol: u8,
    pub source_port: u16,
    pub destination_port: u16,
}

/// Metrics derived from one [`FlowRecord`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub throughput_mbps: f64,
    pub mean_delay: f64,
    pub mean_hop_count: f64,
    pub pdr: f64,
}

/// Everything reported for one flow
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowReport {
    pub flow_id: FlowId,
    pub tuple: FiveTuple,
    pub record: FlowRecord,
    pub metrics: DerivedMetrics,
}
