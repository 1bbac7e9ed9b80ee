use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use manetsim::config_loader::{self, CliOverrides};
use manetsim::engine::{ReferenceEngine, ReplayEngine};
use manetsim::orchestrator;
use manetsim::scenario::Scenario;

/// Two-tier MANET scenario orchestrator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a scenario configuration YAML file (defaults are used without one)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Member nodes per first-level cluster [default: 5]
    #[arg(long, allow_negative_numbers = true)]
    members: Option<i64>,

    /// Simulated time in seconds [default: 200.0]
    #[arg(long)]
    time: Option<f64>,

    /// Run number selecting the random stream [default: 1]
    #[arg(long)]
    run: Option<u64>,

    /// Write a packet trace [default: false]
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    tracing: Option<bool>,

    /// CSV results path [default: manet-results.csv]
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Append rows to the CSV instead of overwriting it [default: false]
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    append: Option<bool>,

    /// Write the planned scenario as YAML to this path
    #[arg(long)]
    scenario_out: Option<PathBuf>,

    /// Replay flow statistics exported by an external engine instead of running the built-in one
    #[arg(long)]
    flow_stats: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            members: self.members,
            sim_time: self.time,
            run: self.run,
            tracing: self.tracing,
            csv: self.csv.clone(),
            append: self.append,
            scenario_out: self.scenario_out.clone(),
        }
    }
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    let mut config = config_loader::load_or_default(args.config.as_deref())?;
    config_loader::apply_cli_overrides(&mut config, &args.overrides())
        .wrap_err("Invalid command-line arguments")?;

    // Initialize logging; RUST_LOG wins over the configured level
    let default_level = config.general.log_level.clone().unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    info!("Starting MANETSim");
    if let Some(path) = &args.config {
        info!("Configuration file: {:?}", path);
    }
    info!(
        "Members per cluster: {}, simulated time: {} s, run: {}",
        config.general.members, config.general.sim_time, config.general.run
    );

    let scenario = Scenario::build(&config)?;
    match args.flow_stats {
        Some(path) => {
            info!("Replaying flow statistics from {:?}", path);
            orchestrator::run_built_scenario(&scenario, ReplayEngine::new(path))?;
        }
        None => {
            orchestrator::run_built_scenario(&scenario, ReferenceEngine::for_scenario(&scenario))?;
        }
    }

    info!("Run completed successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from(&["manetsim", "--members", "3", "--time", "100", "--run", "2"]);

        assert_eq!(args.members, Some(3));
        assert_eq!(args.time, Some(100.0));
        assert_eq!(args.run, Some(2));
        assert_eq!(args.append, None);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_bool_flags() {
        let args = Args::parse_from(&["manetsim", "--append", "--tracing", "false"]);
        assert_eq!(args.append, Some(true));
        assert_eq!(args.tracing, Some(false));
    }

    #[test]
    fn test_negative_members_reach_validation() {
        let args = Args::parse_from(&["manetsim", "--members", "-2"]);
        let mut config = manetsim::config::ScenarioConfig::default();
        assert!(config_loader::apply_cli_overrides(&mut config, &args.overrides()).is_err());
    }

    #[test]
    fn test_replay_args() {
        let args = Args::parse_from(&[
            "manetsim",
            "--csv", "out.csv",
            "--flow-stats", "flows.json",
            "--scenario-out", "scenario.yaml",
        ]);

        assert_eq!(args.csv, Some(PathBuf::from("out.csv")));
        assert_eq!(args.flow_stats, Some(PathBuf::from("flows.json")));
        assert_eq!(args.overrides().scenario_out, Some(PathBuf::from("scenario.yaml")));
    }
}
