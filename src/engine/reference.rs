//! Built-in time-stepped reference engine.
//!
//! Steps node mobility on a fixed interval, recomputes connectivity at each
//! step and routes every CBR packet emitted during the step over a
//! minimum-hop path. Delivery is resolved within the step; a packet with no
//! path is lost. Everything is derived from the run seed, so the same seed
//! always yields the same counters.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use color_eyre::eyre::{Context, Result};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::analysis::{FiveTuple, FlowId, FlowRecord, PROTOCOL_UDP};
use crate::config::EngineConfig;
use crate::mobility::Vector2;
use crate::scenario::Scenario;
use crate::topology::LinkTech;

use super::connectivity::{Connectivity, Hop};
use super::motion::NodeMotion;
use super::{run_seed, FlowMonitor, SimulationEngine};

/// IPv4 (20) + UDP (8) header bytes counted by the monitor
const IP_UDP_HEADER_BYTES: u32 = 28;

/// First ephemeral port handed to a generator socket
const FIRST_EPHEMERAL_PORT: u16 = 49153;

#[derive(Debug, Clone)]
pub struct ReferenceEngine {
    config: EngineConfig,
    seed: u64,
    trace_path: Option<PathBuf>,
}

impl ReferenceEngine {
    pub fn new(config: EngineConfig, seed: u64) -> Self {
        Self {
            config,
            seed,
            trace_path: None,
        }
    }

    /// Engine configured from the scenario's own settings
    pub fn for_scenario(scenario: &Scenario) -> Self {
        let config = scenario.config();
        let mut engine = Self::new(config.engine.clone(), run_seed(config.general.seed, config.general.run));
        if config.general.tracing {
            engine = engine.with_trace(config.output.trace_path.clone());
        }
        engine
    }

    /// Write one line per packet to `path`
    pub fn with_trace(mut self, path: PathBuf) -> Self {
        self.trace_path = Some(path);
        self
    }

    fn hop_delay(&self, hop: &Hop, wire_bits: f64) -> f64 {
        match hop.tech {
            LinkTech::WirelessAdhoc => wire_bits / self.config.wifi_rate_bps,
            LinkTech::Wired => wire_bits / self.config.backbone_rate_bps + self.config.backbone_delay,
        }
    }
}

/// A generator's pending state during the run
struct Generator {
    flow_index: usize,
    next_packet: u64,
    interval: f64,
    start: f64,
    stop: f64,
}

impl Generator {
    fn next_time(&self) -> f64 {
        self.start + self.next_packet as f64 * self.interval
    }
}

impl SimulationEngine for ReferenceEngine {
    type Monitor = ReferenceMonitor;

    fn run_until(self, scenario: &Scenario, stop_time: f64) -> Result<ReferenceMonitor> {
        let topology = scenario.topology();
        let flows = &scenario.traffic().flows;

        let mut master = StdRng::seed_from_u64(self.seed);
        let mut motions: Vec<NodeMotion> = scenario
            .mobility()
            .iter()
            .map(|(_, behavior)| {
                NodeMotion::new(behavior, self.config.walk_distance, StdRng::seed_from_u64(master.gen()))
            })
            .collect();

        let mut generators: Vec<Generator> = flows
            .iter()
            .enumerate()
            .filter(|(_, flow)| !flow.window.is_degenerate())
            .map(|(flow_index, flow)| Generator {
                flow_index,
                next_packet: 0,
                interval: flow.packet_interval(),
                start: flow.window.start,
                stop: flow.window.stop.min(stop_time),
            })
            .collect();

        let mut monitor = ReferenceMonitor::default();
        let mut flow_ids: BTreeMap<usize, FlowId> = BTreeMap::new();
        let mut trace = self.trace_path.as_ref().map(|_| String::new());

        info!(
            "Reference engine running until {} s (step {} s, seed {})",
            stop_time, self.config.step_interval, self.seed
        );

        let mut now = 0.0;
        while now < stop_time {
            let step_end = (now + self.config.step_interval).min(stop_time);
            let positions: Vec<Vector2> = motions.iter().map(NodeMotion::position).collect();
            let graph = Connectivity::snapshot(topology, &positions, self.config.wifi_range);

            let mut emissions: Vec<(f64, usize)> = Vec::new();
            for (gen_index, generator) in generators.iter_mut().enumerate() {
                loop {
                    let time = generator.next_time();
                    if time >= step_end || time >= generator.stop {
                        break;
                    }
                    emissions.push((time, gen_index));
                    generator.next_packet += 1;
                }
            }
            emissions.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

            for (time, gen_index) in emissions {
                let flow_index = generators[gen_index].flow_index;
                let flow = &flows[flow_index];
                let flow_id = *flow_ids.entry(flow_index).or_insert_with(|| {
                    let id = monitor.records.len() as FlowId + 1;
                    monitor.tuples.insert(
                        id,
                        FiveTuple {
                            source_address: flow.source_address,
                            destination_address: flow.destination_address,
                            protocol: PROTOCOL_UDP,
                            source_port: FIRST_EPHEMERAL_PORT + flow_index as u16,
                            destination_port: flow.destination_port,
                        },
                    );
                    monitor.records.insert(id, FlowRecord::default());
                    debug!("Flow {} classified at {:.6} s", id, time);
                    id
                });

                let wire_bytes = u64::from(flow.packet_size + IP_UDP_HEADER_BYTES);
                let wire_bits = wire_bytes as f64 * 8.0;
                let route = graph.shortest_path(flow.source, flow.destination);

                let record = monitor.records.entry(flow_id).or_default();
                record.tx_packets += 1;
                record.tx_bytes += wire_bytes;
                match &route {
                    Some(hops) => {
                        record.rx_packets += 1;
                        record.rx_bytes += wire_bytes;
                        record.times_forwarded += hops.len().saturating_sub(1) as u64;
                        record.delay_sum += hops.iter().map(|hop| self.hop_delay(hop, wire_bits)).sum::<f64>();
                    }
                    None => record.lost_packets += 1,
                }

                if let Some(lines) = trace.as_mut() {
                    let _ = writeln!(
                        lines,
                        "{:.6} flow={} {} -> {} {} hops={}",
                        time,
                        flow_id,
                        flow.source_address,
                        flow.destination_address,
                        if route.is_some() { "delivered" } else { "lost" },
                        route.as_ref().map_or(0, Vec::len)
                    );
                }
            }

            let dt = step_end - now;
            for motion in &mut motions {
                motion.advance(dt);
            }
            now = step_end;
        }

        if let (Some(path), Some(lines)) = (&self.trace_path, trace) {
            fs::write(path, lines).with_context(|| format!("Failed to write packet trace to {}", path.display()))?;
            info!("Packet trace written to {}", path.display());
        }

        info!("Run complete: {} flows observed", monitor.records.len());
        Ok(monitor)
    }
}

/// Counters collected by the reference engine
#[derive(Debug, Default, Clone)]
pub struct ReferenceMonitor {
    records: BTreeMap<FlowId, FlowRecord>,
    tuples: BTreeMap<FlowId, FiveTuple>,
}

impl FlowMonitor for ReferenceMonitor {
    fn flow_stats(&self) -> BTreeMap<FlowId, FlowRecord> {
        self.records.clone()
    }

    fn resolve(&self, flow_id: FlowId) -> Option<FiveTuple> {
        self.tuples.get(&flow_id).copied()
    }
}
