//! Replay of flow counters exported by an external simulator.
//!
//! The file is JSON:
//!
//! ```json
//! {
//!   "stop_time": 200.0,
//!   "flows": [
//!     {
//!       "flow_id": 1,
//!       "source_address": "10.1.1.2", "destination_address": "10.1.2.2",
//!       "protocol": 17, "source_port": 49153, "destination_port": 9,
//!       "tx_packets": 87402, "rx_packets": 87000, "lost_packets": 402,
//!       "times_forwarded": 174000, "delay_sum": 95.1,
//!       "tx_bytes": 91946904, "rx_bytes": 91524000
//!     }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{bail, Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::analysis::{FiveTuple, FlowId, FlowRecord};
use crate::scenario::Scenario;

use super::{FlowMonitor, SimulationEngine};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayedFlow {
    pub flow_id: FlowId,
    #[serde(flatten)]
    pub tuple: FiveTuple,
    #[serde(flatten)]
    pub record: FlowRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_time: Option<f64>,
    pub flows: Vec<ReplayedFlow>,
}

/// Engine that reads the counters of an already-finished run
#[derive(Debug, Clone)]
pub struct ReplayEngine {
    path: PathBuf,
}

impl ReplayEngine {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SimulationEngine for ReplayEngine {
    type Monitor = ReplayMonitor;

    fn run_until(self, scenario: &Scenario, stop_time: f64) -> Result<ReplayMonitor> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read flow statistics from {}", self.path.display()))?;
        let file: ReplayFile = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse flow statistics in {}", self.path.display()))?;

        if let Some(recorded) = file.stop_time {
            if (recorded - stop_time).abs() > f64::EPSILON {
                warn!(
                    "Replayed run stopped at {} s but the scenario runs for {} s; metrics use the scenario time",
                    recorded, stop_time
                );
            }
        }

        let monitor = ReplayMonitor::from_flows(file.flows)
            .with_context(|| format!("Invalid flow statistics in {}", self.path.display()))?;

        for tuple in monitor.tuples.values() {
            if scenario
                .traffic()
                .flow_between(tuple.source_address, tuple.destination_address)
                .is_none()
            {
                warn!(
                    "Replayed flow {} -> {} does not match any planned flow",
                    tuple.source_address, tuple.destination_address
                );
            }
        }

        info!("Replayed {} flows from {}", monitor.records.len(), self.path.display());
        Ok(monitor)
    }
}

/// Counters loaded from a replay file
#[derive(Debug, Default, Clone)]
pub struct ReplayMonitor {
    records: BTreeMap<FlowId, FlowRecord>,
    tuples: BTreeMap<FlowId, FiveTuple>,
}

impl ReplayMonitor {
    pub fn from_flows(flows: Vec<ReplayedFlow>) -> Result<Self> {
        let mut monitor = Self::default();
        for flow in flows {
            if monitor.records.contains_key(&flow.flow_id) {
                bail!("flow id {} appears more than once", flow.flow_id);
            }
            monitor.tuples.insert(flow.flow_id, flow.tuple);
            monitor.records.insert(flow.flow_id, flow.record);
        }
        Ok(monitor)
    }
}

impl FlowMonitor for ReplayMonitor {
    fn flow_stats(&self) -> BTreeMap<FlowId, FlowRecord> {
        self.records.clone()
    }

    fn resolve(&self, flow_id: FlowId) -> Option<FiveTuple> {
        self.tuples.get(&flow_id).copied()
    }
}
