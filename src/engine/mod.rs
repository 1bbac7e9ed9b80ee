//! Simulation engine seam.
//!
//! The orchestrator drives whatever implements [`SimulationEngine`]: the
//! built-in [`ReferenceEngine`], or a [`ReplayEngine`] that loads counters
//! produced by an external simulator. Running consumes the engine, so a run
//! instance can never be reused, and the returned [`FlowMonitor`] is only
//! available once the run has reached its stop time.

pub mod motion;
pub mod connectivity;
pub mod reference;
pub mod replay;

use std::collections::BTreeMap;

use color_eyre::Result;

use crate::analysis::{FiveTuple, FlowId, FlowRecord};
use crate::scenario::Scenario;

pub use motion::NodeMotion;
pub use connectivity::{Connectivity, Hop};
pub use reference::{ReferenceEngine, ReferenceMonitor};
pub use replay::{ReplayEngine, ReplayMonitor};

/// Read-only view of the per-flow counters collected during a run
pub trait FlowMonitor {
    /// All flows observed, keyed (and therefore ordered) by flow id
    fn flow_stats(&self) -> BTreeMap<FlowId, FlowRecord>;

    /// Classifier lookup of a flow's 5-tuple
    fn resolve(&self, flow_id: FlowId) -> Option<FiveTuple>;
}

/// A discrete-event engine able to execute a planned scenario
pub trait SimulationEngine {
    type Monitor: FlowMonitor;

    /// Run `scenario` until the simulated clock reaches `stop_time`
    fn run_until(self, scenario: &Scenario, stop_time: f64) -> Result<Self::Monitor>;
}

/// Seed of a run's random stream, derived from the base seed and run number
pub fn run_seed(seed: u64, run: u64) -> u64 {
    seed ^ run.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}
