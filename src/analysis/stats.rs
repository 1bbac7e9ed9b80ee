//! Flow metric derivation.
//!
//! Turns the monitor's raw counters into throughput, mean delay, mean hop
//! count and delivery ratio. A flow that received nothing reports zero for
//! every metric.

use color_eyre::eyre::{eyre, Result};
use log::debug;

use crate::engine::FlowMonitor;

use super::types::{DerivedMetrics, FlowRecord, FlowReport};

/// Start of the measurement interval used for every flow's throughput.
///
/// Matches the forward flow's start time. The reverse flow starts later, so
/// its throughput is slightly understated; kept this way so results stay
/// comparable with earlier result files.
pub const NOMINAL_MEASUREMENT_START: f64 = 20.0;

/// Derive metrics for one flow of a run lasting `sim_time` seconds
pub fn derive_metrics(record: &FlowRecord, sim_time: f64) -> DerivedMetrics {
    if record.rx_packets == 0 {
        return DerivedMetrics::default();
    }

    let rx = record.rx_packets as f64;
    let window = sim_time - NOMINAL_MEASUREMENT_START;
    let throughput_mbps = if window > 0.0 {
        record.rx_bytes as f64 * 8.0 / window / 1e6
    } else {
        0.0
    };
    let pdr = if record.tx_packets > 0 {
        rx / record.tx_packets as f64
    } else {
        0.0
    };

    DerivedMetrics {
        throughput_mbps,
        mean_delay: record.delay_sum / rx,
        mean_hop_count: record.times_forwarded as f64 / rx + 1.0,
        pdr,
    }
}

/// Read every flow from `monitor` once and derive its metrics.
///
/// Reports come out in ascending flow id order. A flow the classifier cannot
/// resolve is an error.
pub fn aggregate_flow_stats<M: FlowMonitor + ?Sized>(monitor: &M, sim_time: f64) -> Result<Vec<FlowReport>> {
    let stats = monitor.flow_stats();
    let mut reports = Vec::with_capacity(stats.len());

    for (flow_id, record) in stats {
        let tuple = monitor
            .resolve(flow_id)
            .ok_or_else(|| eyre!("Flow {} has no classifier entry", flow_id))?;
        let metrics = derive_metrics(&record, sim_time);
        debug!("Flow {} ({} -> {}): {:?}", flow_id, tuple.source_address, tuple.destination_address, metrics);
        reports.push(FlowReport {
            flow_id,
            tuple,
            record,
            metrics,
        });
    }

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::types::{FiveTuple, FlowId, PROTOCOL_UDP};
    use std::collections::BTreeMap;
    use std::net::Ipv4Addr;

    fn record(tx: u64, rx: u64, forwarded: u64, delay: f64, rx_bytes: u64) -> FlowRecord {
        FlowRecord {
            tx_packets: tx,
            rx_packets: rx,
            lost_packets: tx.saturating_sub(rx),
            times_forwarded: forwarded,
            delay_sum: delay,
            tx_bytes: tx * 1052,
            rx_bytes,
        }
    }

    #[test]
    fn test_reference_formulae() {
        let metrics = derive_metrics(&record(100, 80, 160, 4.0, 1_800_000), 200.0);
        // 1.8e6 B * 8 / 180 s / 1e6
        assert!((metrics.throughput_mbps - 0.08).abs() < 1e-12);
        assert!((metrics.mean_delay - 0.05).abs() < 1e-12);
        assert!((metrics.mean_hop_count - 3.0).abs() < 1e-12);
        assert!((metrics.pdr - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_zero_received_is_all_zero() {
        assert_eq!(derive_metrics(&record(500, 0, 0, 0.0, 0), 200.0), DerivedMetrics::default());
        let metrics = derive_metrics(&record(0, 0, 0, 0.0, 0), 200.0);
        assert_eq!(metrics.pdr, 0.0);
        assert!(!metrics.pdr.is_nan());
    }

    #[test]
    fn test_direct_delivery_counts_one_hop() {
        let metrics = derive_metrics(&record(10, 10, 0, 0.01, 10_520), 200.0);
        assert_eq!(metrics.mean_hop_count, 1.0);
        assert_eq!(metrics.pdr, 1.0);
    }

    #[test]
    fn test_reverse_flow_uses_nominal_window() {
        // same bytes, same denominator regardless of when the flow started
        let metrics = derive_metrics(&record(10, 10, 0, 0.0, 1_000_000), 120.0);
        assert!((metrics.throughput_mbps - 0.08).abs() < 1e-12);
    }

    #[test]
    fn test_window_before_measurement_start() {
        let metrics = derive_metrics(&record(10, 10, 0, 0.0, 1000), 15.0);
        assert_eq!(metrics.throughput_mbps, 0.0);
        assert!(metrics.throughput_mbps.is_finite());
    }

    struct FixedMonitor {
        records: BTreeMap<FlowId, FlowRecord>,
        tuples: BTreeMap<FlowId, FiveTuple>,
    }

    impl FlowMonitor for FixedMonitor {
        fn flow_stats(&self) -> BTreeMap<FlowId, FlowRecord> {
            self.records.clone()
        }

        fn resolve(&self, flow_id: FlowId) -> Option<FiveTuple> {
            self.tuples.get(&flow_id).copied()
        }
    }

    fn tuple(src: [u8; 4], dst: [u8; 4]) -> FiveTuple {
        FiveTuple {
            source_address: Ipv4Addr::from(src),
            destination_address: Ipv4Addr::from(dst),
            protocol: PROTOCOL_UDP,
            source_port: 49153,
            destination_port: 9,
        }
    }

    #[test]
    fn test_aggregate_orders_by_flow_id() {
        let mut records = BTreeMap::new();
        records.insert(2, record(10, 5, 5, 0.5, 5260));
        records.insert(1, record(10, 0, 0, 0.0, 0));
        let mut tuples = BTreeMap::new();
        tuples.insert(1, tuple([10, 1, 1, 2], [10, 1, 2, 2]));
        tuples.insert(2, tuple([10, 1, 2, 2], [10, 1, 1, 2]));
        let monitor = FixedMonitor { records, tuples };

        let reports = aggregate_flow_stats(&monitor, 200.0).unwrap();
        let ids: Vec<FlowId> = reports.iter().map(|r| r.flow_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(reports[0].metrics, DerivedMetrics::default());
        assert_eq!(reports[1].tuple.source_address, Ipv4Addr::new(10, 1, 2, 2));
        assert!((reports[1].metrics.mean_hop_count - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_aggregate_requires_classifier_entry() {
        let mut records = BTreeMap::new();
        records.insert(7, record(1, 1, 0, 0.0, 100));
        let monitor = FixedMonitor {
            records,
            tuples: BTreeMap::new(),
        };
        assert!(aggregate_flow_stats(&monitor, 200.0).is_err());
    }
}
