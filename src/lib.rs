//! # MANETSim - Two-tier MANET scenario orchestrator
//!
//! This library sets up and runs a hierarchical mobile ad-hoc network
//! scenario: two first-level clusters, each with a cluster-head and a
//! configurable number of members on its own ad-hoc wireless segment, and a
//! wired backbone joining both cluster-heads to a super-head.
//!
//! ## Overview
//!
//! A run is described by a YAML file (or defaults plus CLI flags). From it
//! the library builds the node hierarchy, assigns one IPv4 range per
//! segment, attaches a mobility model per tier, schedules a UDP CBR flow in
//! each direction between the first member of each cluster, hands the
//! scenario to a simulation engine and reports per-flow statistics.
//!
//! ## Architecture
//!
//! - `config`: Type-safe configuration structures and validation
//! - `config_loader`: YAML loading and CLI overrides
//! - `topology`: Node hierarchy and segment memberships
//! - `ip`: Per-segment address ranges and interface addresses
//! - `mobility`: Mobility models and their per-tier assignment
//! - `traffic`: CBR flows and packet sinks
//! - `scenario`: The assembled, immutable scenario and its YAML description
//! - `engine`: Engine and flow monitor seams, reference and replay engines
//! - `analysis`: Derived flow metrics, console/CSV reports, result summaries
//! - `orchestrator`: One complete run from configuration to report
//! - `utils`: Duration parsing
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use manetsim::{config_loader, orchestrator, engine::ReferenceEngine, scenario::Scenario};
//! use std::path::Path;
//!
//! let config = config_loader::load_config(Path::new("scenario.yaml"))?;
//! let scenario = Scenario::build(&config)?;
//! let engine = ReferenceEngine::for_scenario(&scenario);
//! let reports = orchestrator::run_built_scenario(&scenario, engine)?;
//! println!("{} flows reported", reports.len());
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Configuration Format
//!
//! ```yaml
//! general:
//!   members: 5
//!   sim_time: "200s"
//!   run: 1
//! output:
//!   csv: "manet-results.csv"
//!   append: false
//! traffic:
//!   rate_bps: 2000000
//!   packet_size: 1024
//! ```
//!
//! ## Error Handling
//!
//! Module-level errors are `thiserror` enums; the run-level API returns
//! `color_eyre::eyre::Result` with context attached at each setup step.

pub mod config;
pub mod config_loader;
pub mod topology;
pub mod ip;
pub mod mobility;
pub mod traffic;
pub mod scenario;
pub mod engine;
pub mod analysis;
pub mod utils;
pub mod orchestrator;
