//! Scenario configuration.
//!
//! Mirrors the YAML scenario file. Every field has a default matching the
//! reference two-tier scenario, so an empty file (or no file at all) yields a
//! runnable configuration. CLI flags are layered on top by
//! [`crate::config_loader::apply_cli_overrides`].

use serde::{Deserialize, Deserializer, Serialize};
use std::net::Ipv4Addr;
use std::path::PathBuf;

use crate::ip::Ipv4Subnet;
use crate::mobility::{Area, SpeedRange, Vector2};
use crate::utils::duration::parse_duration_to_seconds;

/// Upper bound on a single generator's packet rate
pub const MAX_PACKETS_PER_SECOND: f64 = 100_000.0;

/// Top-level configuration structure that mirrors the YAML configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub general: GeneralConfig,
    pub output: OutputConfig,
    pub addressing: AddressingConfig,
    pub mobility: MobilityConfig,
    pub traffic: TrafficConfig,
    pub engine: EngineConfig,
}

/// General run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Member nodes per first-level cluster, excluding the cluster-head
    pub members: i64,
    /// Total simulated duration in seconds ("200", "200s", "3m" are accepted)
    #[serde(deserialize_with = "deserialize_seconds")]
    pub sim_time: f64,
    /// Run number, combined with `seed` to select the random stream
    pub run: u64,
    /// Base seed shared by all runs
    pub seed: u64,
    /// Enable packet trace export
    pub tracing: bool,
    /// Routing protocol installed on every node
    pub routing_protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

/// Output sinks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// CSV results path
    pub csv: PathBuf,
    /// Append to the CSV instead of overwriting it
    pub append: bool,
    /// (Optional) Write the planned scenario as YAML to this path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario_out: Option<PathBuf>,
    /// Packet trace path, used when `general.tracing` is set
    pub trace_path: PathBuf,
}

/// Address space carved into one range per link segment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressingConfig {
    /// Network address of the first segment range
    pub base: Ipv4Addr,
    /// Prefix length of every segment range
    pub prefix_len: u8,
}

/// Mobility parameters per tier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MobilityConfig {
    pub member_area_a: Area,
    pub member_area_b: Area,
    pub member_speed: SpeedRange,
    pub head_a_position: Vector2,
    pub head_a_velocity: Vector2,
    pub head_b_position: Vector2,
    pub head_b_velocity: Vector2,
    pub super_head_area: Area,
    pub super_head_speed: SpeedRange,
    /// Pause at each waypoint, in seconds
    pub super_head_pause: f64,
}

/// Constant-bit-rate traffic between the two cluster members
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficConfig {
    /// UDP destination port of both sinks
    pub port: u16,
    /// Offered rate in bits per second
    pub rate_bps: u64,
    /// Payload size in bytes
    pub packet_size: u32,
    pub forward_start: f64,
    pub reverse_start: f64,
    /// Flows stop this many seconds before the end of the run
    pub stop_margin: f64,
    /// Schedule the B -> A flow as well
    pub reverse: bool,
}

/// Parameters of the built-in reference engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Simulated time between mobility/connectivity updates, in seconds
    pub step_interval: f64,
    /// Maximum distance of a wireless link, in meters
    pub wifi_range: f64,
    pub wifi_rate_bps: f64,
    pub backbone_rate_bps: f64,
    /// Propagation delay of the wired backbone, in seconds
    pub backbone_delay: f64,
    /// Distance a random walker covers before picking a new direction and speed
    pub walk_distance: f64,
}

impl ScenarioConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let general = &self.general;
        if general.members < 0 {
            return Err(ValidationError::InvalidTopology(format!(
                "members must be non-negative, got {}",
                general.members
            )));
        }
        if !general.sim_time.is_finite() || general.sim_time <= 0.0 {
            return Err(ValidationError::InvalidGeneral(format!(
                "sim_time must be a positive number of seconds, got {}",
                general.sim_time
            )));
        }
        if general.routing_protocol.trim().is_empty() {
            return Err(ValidationError::InvalidGeneral(
                "routing_protocol cannot be empty".to_string(),
            ));
        }

        let first_range = Ipv4Subnet::new(self.addressing.base, self.addressing.prefix_len)
            .map_err(|e| ValidationError::InvalidAddressing(e.to_string()))?;
        // each cluster segment holds its members plus the cluster-head
        let cluster_hosts = general.members.unsigned_abs().saturating_add(1);
        if cluster_hosts > first_range.capacity() as u64 {
            return Err(ValidationError::InvalidAddressing(format!(
                "{} members per cluster need {} host addresses but a /{} range holds {}",
                general.members,
                cluster_hosts,
                self.addressing.prefix_len,
                first_range.capacity()
            )));
        }

        self.mobility.validate()?;
        self.traffic.validate()?;
        self.engine.validate()?;
        Ok(())
    }

    /// Member count as a size, once validated
    pub fn members_per_cluster(&self) -> usize {
        self.general.members.max(0) as usize
    }
}

impl MobilityConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        for (name, area) in [
            ("member_area_a", &self.member_area_a),
            ("member_area_b", &self.member_area_b),
            ("super_head_area", &self.super_head_area),
        ] {
            if !area.is_valid() {
                return Err(ValidationError::InvalidMobility(format!(
                    "{} must have min < max on both axes, got {}",
                    name, area
                )));
            }
        }
        if self.member_area_a.intersects(&self.member_area_b) {
            return Err(ValidationError::InvalidMobility(
                "member areas of cluster A and B must be disjoint".to_string(),
            ));
        }
        for (name, speed) in [
            ("member_speed", &self.member_speed),
            ("super_head_speed", &self.super_head_speed),
        ] {
            if !speed.is_valid() {
                return Err(ValidationError::InvalidMobility(format!(
                    "{} must satisfy 0 < min <= max, got [{}, {}]",
                    name, speed.min, speed.max
                )));
            }
        }
        if !self.super_head_pause.is_finite() || self.super_head_pause < 0.0 {
            return Err(ValidationError::InvalidMobility(format!(
                "super_head_pause must be >= 0, got {}",
                self.super_head_pause
            )));
        }
        Ok(())
    }
}

impl TrafficConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.rate_bps == 0 {
            return Err(ValidationError::InvalidTraffic("rate_bps must be > 0".to_string()));
        }
        if self.packet_size == 0 {
            return Err(ValidationError::InvalidTraffic("packet_size must be > 0".to_string()));
        }
        let packet_rate = self.rate_bps as f64 / (f64::from(self.packet_size) * 8.0);
        if packet_rate > MAX_PACKETS_PER_SECOND {
            return Err(ValidationError::InvalidTraffic(format!(
                "rate_bps {} with packet_size {} sends {:.0} packets/s, above the limit of {}",
                self.rate_bps, self.packet_size, packet_rate, MAX_PACKETS_PER_SECOND
            )));
        }
        for (name, value) in [
            ("forward_start", self.forward_start),
            ("reverse_start", self.reverse_start),
            ("stop_margin", self.stop_margin),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ValidationError::InvalidTraffic(format!(
                    "{} must be a non-negative number of seconds, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

impl EngineConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        for (name, value) in [
            ("step_interval", self.step_interval),
            ("wifi_range", self.wifi_range),
            ("wifi_rate_bps", self.wifi_rate_bps),
            ("backbone_rate_bps", self.backbone_rate_bps),
            ("walk_distance", self.walk_distance),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ValidationError::InvalidEngine(format!(
                    "{} must be > 0, got {}",
                    name, value
                )));
            }
        }
        if !self.backbone_delay.is_finite() || self.backbone_delay < 0.0 {
            return Err(ValidationError::InvalidEngine(format!(
                "backbone_delay must be >= 0, got {}",
                self.backbone_delay
            )));
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid general configuration: {0}")]
    InvalidGeneral(String),
    #[error("Invalid topology configuration: {0}")]
    InvalidTopology(String),
    #[error("Invalid addressing configuration: {0}")]
    InvalidAddressing(String),
    #[error("Invalid mobility configuration: {0}")]
    InvalidMobility(String),
    #[error("Invalid traffic configuration: {0}")]
    InvalidTraffic(String),
    #[error("Invalid engine configuration: {0}")]
    InvalidEngine(String),
}

/// Accepts either a bare number of seconds or a duration string
fn deserialize_seconds<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Number(f64),
        Text(String),
    }

    match Seconds::deserialize(deserializer)? {
        Seconds::Number(value) => Ok(value),
        Seconds::Text(text) => parse_duration_to_seconds(&text).map_err(serde::de::Error::custom),
    }
}

/// Default implementations
impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            members: 5,
            sim_time: 200.0,
            run: 1,
            seed: 12345,
            tracing: false,
            routing_protocol: "aodv".to_string(),
            log_level: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv: PathBuf::from("manet-results.csv"),
            append: false,
            scenario_out: None,
            trace_path: PathBuf::from("manet-trace.txt"),
        }
    }
}

impl Default for AddressingConfig {
    fn default() -> Self {
        Self {
            base: Ipv4Addr::new(10, 1, 1, 0),
            prefix_len: 24,
        }
    }
}

impl Default for MobilityConfig {
    fn default() -> Self {
        Self {
            member_area_a: Area::new(0.0, 100.0, 0.0, 100.0),
            member_area_b: Area::new(200.0, 300.0, 0.0, 100.0),
            member_speed: SpeedRange::new(0.2, 1.0),
            head_a_position: Vector2::new(50.0, 50.0),
            head_a_velocity: Vector2::new(1.0, 0.3),
            head_b_position: Vector2::new(250.0, 50.0),
            head_b_velocity: Vector2::new(-1.0, 0.3),
            super_head_area: Area::new(100.0, 200.0, 120.0, 220.0),
            super_head_speed: SpeedRange::new(0.3, 0.8),
            super_head_pause: 2.0,
        }
    }
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            port: 9,
            rate_bps: 2_000_000,
            packet_size: 1024,
            forward_start: 20.0,
            reverse_start: 30.0,
            stop_margin: 1.0,
            reverse: true,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            step_interval: 0.1,
            wifi_range: 100.0,
            wifi_rate_bps: 11_000_000.0,
            backbone_rate_bps: 100_000_000.0,
            backbone_delay: 0.00656,
            walk_distance: 1.0,
        }
    }
}
