//! Run orchestrator.
//!
//! This module coordinates one complete run: scenario setup, engine
//! execution up to the configured simulated time, flow statistics
//! aggregation, the console summary and the CSV report.

use color_eyre::eyre::{Context, Result};
use log::info;

use crate::analysis::{aggregate_flow_stats, print_flow_summary, write_csv_report, FlowReport, WriteMode};
use crate::config::ScenarioConfig;
use crate::engine::SimulationEngine;
use crate::scenario::Scenario;

/// Build the scenario described by `config`, run it on `engine` and report
pub fn run_scenario<E: SimulationEngine>(config: &ScenarioConfig, engine: E) -> Result<Vec<FlowReport>> {
    let scenario = Scenario::build(config)?;
    run_built_scenario(&scenario, engine)
}

/// Run an already-built scenario; used when the engine needs the scenario to be constructed
pub fn run_built_scenario<E: SimulationEngine>(scenario: &Scenario, engine: E) -> Result<Vec<FlowReport>> {
    let config = scenario.config();

    if let Some(path) = &config.output.scenario_out {
        scenario.write_description(path)?;
    }

    let monitor = engine
        .run_until(scenario, scenario.sim_time())
        .wrap_err("Simulation run failed")?;

    let reports = aggregate_flow_stats(&monitor, scenario.sim_time())?;
    print_flow_summary(&reports)?;

    let mode = WriteMode::from_append(config.output.append);
    write_csv_report(&config.output.csv, scenario.run(), &reports, mode)?;

    info!(
        "Run {} finished: {} flows written to {}",
        scenario.run(),
        reports.len(),
        config.output.csv.display()
    );
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ReferenceEngine;
    use std::fs;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> ScenarioConfig {
        let mut config = ScenarioConfig::default();
        config.general.members = 2;
        config.general.sim_time = 35.0;
        config.output.csv = dir.path().join("results.csv");
        config
    }

    #[test]
    fn test_run_writes_csv_and_description() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.output.scenario_out = Some(dir.path().join("scenario.yaml"));

        let scenario = Scenario::build(&config).unwrap();
        let reports = run_built_scenario(&scenario, ReferenceEngine::for_scenario(&scenario)).unwrap();
        assert_eq!(reports.len(), 2);

        let csv = fs::read_to_string(&config.output.csv).unwrap();
        assert_eq!(csv.lines().count(), 3);
        assert!(dir.path().join("scenario.yaml").exists());
    }

    #[test]
    fn test_invalid_config_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.general.members = 0;
        let engine = ReferenceEngine::new(config.engine.clone(), 1);
        assert!(run_scenario(&config, engine).is_err());
        assert!(!config.output.csv.exists());
    }
}
