//! Flow statistics for MANETSim runs.
//!
//! This module derives per-flow metrics from the monitor's raw counters,
//! writes console and CSV reports, and summarizes result files across runs.

pub mod types;
pub mod stats;
pub mod report;
pub mod summary;

pub use types::*;
pub use stats::{aggregate_flow_stats, derive_metrics, NOMINAL_MEASUREMENT_START};
pub use report::{print_flow_summary, write_csv_report, write_flow_summary, WriteMode, CSV_HEADER};
pub use summary::{parse_results_csv, summarize_by_class, summarize_by_run, GroupSummary, MetricSummary, ResultRow};
