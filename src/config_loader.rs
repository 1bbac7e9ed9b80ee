use crate::config::ScenarioConfig;
use color_eyre::eyre::{Context, Result};
use log::{debug, info};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Load, parse and validate configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<ScenarioConfig> {
    let config = read_config(config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse a YAML configuration file without validating it
pub fn read_config(config_path: &Path) -> Result<ScenarioConfig> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .with_context(|| format!("Failed to open configuration file {}", config_path.display()))?;

    serde_yaml::from_reader(file)
        .with_context(|| format!("Failed to parse configuration file {}", config_path.display()))
}

/// Read the configuration file when one is given, otherwise start from defaults.
///
/// The result is not validated yet; [`apply_cli_overrides`] validates once
/// the flags have been layered on top.
pub fn load_or_default(config_path: Option<&Path>) -> Result<ScenarioConfig> {
    match config_path {
        Some(path) => read_config(path),
        None => {
            debug!("No configuration file given, using the reference scenario defaults");
            Ok(ScenarioConfig::default())
        }
    }
}

/// CLI arguments that override YAML settings
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub members: Option<i64>,
    pub sim_time: Option<f64>,
    pub run: Option<u64>,
    pub tracing: Option<bool>,
    pub csv: Option<PathBuf>,
    pub append: Option<bool>,
    pub scenario_out: Option<PathBuf>,
}

/// Apply CLI overrides to a scenario configuration
pub fn apply_cli_overrides(config: &mut ScenarioConfig, overrides: &CliOverrides) -> Result<()> {
    if let Some(members) = overrides.members {
        debug!("Overriding members per cluster: {}", members);
        config.general.members = members;
    }
    if let Some(sim_time) = overrides.sim_time {
        debug!("Overriding simulated time: {} s", sim_time);
        config.general.sim_time = sim_time;
    }
    if let Some(run) = overrides.run {
        config.general.run = run;
    }
    if let Some(tracing) = overrides.tracing {
        config.general.tracing = tracing;
    }
    if let Some(csv) = &overrides.csv {
        config.output.csv = csv.clone();
    }
    if let Some(append) = overrides.append {
        config.output.append = append;
    }
    if let Some(path) = &overrides.scenario_out {
        config.output.scenario_out = Some(path.clone());
    }

    // Re-validate after applying overrides
    config.validate()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config() {
        let yaml = r#"
general:
  members: 3
  sim_time: "2m"
  run: 4
output:
  csv: "out.csv"
  append: true
traffic:
  rate_bps: 1000000
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.general.members, 3);
        assert_eq!(config.general.sim_time, 120.0);
        assert_eq!(config.general.run, 4);
        assert!(config.output.append);
        assert_eq!(config.traffic.rate_bps, 1_000_000);
        assert_eq!(config.traffic.packet_size, 1024);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "general:\n  members: -1\n").unwrap();
        assert!(load_config(temp_file.path()).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = ScenarioConfig::default();
        let overrides = CliOverrides {
            members: Some(8),
            sim_time: Some(60.0),
            append: Some(true),
            csv: Some(PathBuf::from("other.csv")),
            ..Default::default()
        };

        apply_cli_overrides(&mut config, &overrides).unwrap();
        assert_eq!(config.general.members, 8);
        assert_eq!(config.general.sim_time, 60.0);
        assert_eq!(config.general.run, 1);
        assert!(config.output.append);
        assert_eq!(config.output.csv, PathBuf::from("other.csv"));
    }

    #[test]
    fn test_overrides_are_validated() {
        let mut config = ScenarioConfig::default();
        let overrides = CliOverrides {
            sim_time: Some(-5.0),
            ..Default::default()
        };
        assert!(apply_cli_overrides(&mut config, &overrides).is_err());
    }

    #[test]
    fn test_flags_override_invalid_file_values() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "general:\n  members: -1\n  run: 7\n").unwrap();

        let mut config = load_or_default(Some(temp_file.path())).unwrap();
        let overrides = CliOverrides {
            members: Some(3),
            ..Default::default()
        };
        apply_cli_overrides(&mut config, &overrides).unwrap();
        assert_eq!(config.general.members, 3);
        assert_eq!(config.general.run, 7);

        // without the flag the file value is still rejected
        let mut config = load_or_default(Some(temp_file.path())).unwrap();
        assert!(apply_cli_overrides(&mut config, &CliOverrides::default()).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_or_default(Some(Path::new("/nonexistent/scenario.yaml"))).is_err());
        assert_eq!(load_or_default(None).unwrap().general.members, 5);
    }
}
