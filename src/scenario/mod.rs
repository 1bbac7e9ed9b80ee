//! Planned scenario.
//!
//! A [`Scenario`] is the fully set-up, addressed topology with mobility and
//! traffic attached, built before the simulated clock starts. It is
//! immutable afterwards; engines only read it.
//!
//! ## Setup order
//!
//! 1. Validate the configuration
//! 2. Build the node hierarchy and segment memberships
//! 3. Assign one address range per segment
//! 4. Attach mobility behaviors per tier
//! 5. Schedule traffic between the cluster members
//!
//! Any failure aborts setup before an engine ever sees the scenario.

pub mod types;

use std::fs;
use std::path::Path;

use color_eyre::eyre::{Context, Result};
use log::info;

use crate::config::ScenarioConfig;
use crate::ip::{AddressPlan, AddressPlanner};
use crate::mobility::{assign_mobility, MobilityPlan};
use crate::topology::{build_topology, NodeId, Topology};
use crate::traffic::{plan_traffic, TrafficPlan};

pub use types::{DescribedFlow, DescribedGeneral, DescribedNode, DescribedSegment, DescribedSink, ScenarioDescription};

#[derive(Debug)]
pub struct Scenario {
    config: ScenarioConfig,
    topology: Topology,
    addresses: AddressPlan,
    mobility: MobilityPlan,
    traffic: TrafficPlan,
}

impl Scenario {
    /// Run every setup step; configuration errors abort here
    pub fn build(config: &ScenarioConfig) -> Result<Self> {
        config.validate().wrap_err("Scenario configuration is invalid")?;

        let topology = build_topology(config.general.members).wrap_err("Failed to build topology")?;
        let addresses = AddressPlanner::from_config(&config.addressing)
            .and_then(|planner| planner.plan(&topology))
            .wrap_err("Failed to assign addresses")?;
        let mobility = assign_mobility(&topology, &config.mobility);
        let traffic = plan_traffic(&topology, &addresses, &config.traffic, config.general.sim_time)
            .wrap_err("Failed to plan traffic")?;

        info!(
            "Scenario ready: {} nodes, {} segments, {} flows, {} s simulated (run {})",
            topology.nodes().len(),
            topology.segments().len(),
            traffic.flows.len(),
            config.general.sim_time,
            config.general.run
        );

        Ok(Self {
            config: config.clone(),
            topology,
            addresses,
            mobility,
            traffic,
        })
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn addresses(&self) -> &AddressPlan {
        &self.addresses
    }

    pub fn mobility(&self) -> &MobilityPlan {
        &self.mobility
    }

    pub fn traffic(&self) -> &TrafficPlan {
        &self.traffic
    }

    pub fn sim_time(&self) -> f64 {
        self.config.general.sim_time
    }

    pub fn run(&self) -> u64 {
        self.config.general.run
    }

    fn node_name(&self, node: NodeId) -> String {
        self.topology
            .node(node)
            .map(|n| n.name.clone())
            .unwrap_or_else(|| format!("node-{}", node))
    }

    /// Serializable view of the whole scenario
    pub fn describe(&self) -> ScenarioDescription {
        let routing = self.config.general.routing_protocol.clone();

        let segments = self
            .topology
            .segments()
            .iter()
            .filter_map(|segment| {
                let subnet = self.addresses.subnet_of(segment.id)?;
                Some(DescribedSegment {
                    name: segment.name.clone(),
                    tech: segment.tech,
                    subnet,
                    nodes: self
                        .topology
                        .segment_members(segment.id)
                        .into_iter()
                        .map(|n| self.node_name(n))
                        .collect(),
                })
            })
            .collect();

        let nodes = self
            .topology
            .nodes()
            .iter()
            .filter_map(|node| {
                let mobility = self.mobility.behavior(node.id)?.clone();
                Some(DescribedNode {
                    name: node.name.clone(),
                    tier: node.tier,
                    cluster: node.cluster,
                    addresses: self.addresses.addresses_of(node.id),
                    mobility,
                    routing: routing.clone(),
                })
            })
            .collect();

        let flows = self
            .traffic
            .flows
            .iter()
            .map(|flow| DescribedFlow {
                direction: flow.direction,
                source: self.node_name(flow.source),
                destination: self.node_name(flow.destination),
                source_address: flow.source_address,
                destination_address: flow.destination_address,
                destination_port: flow.destination_port,
                rate_bps: flow.rate_bps,
                packet_size: flow.packet_size,
                start: flow.window.start,
                stop: flow.window.stop,
            })
            .collect();

        let sinks = self
            .traffic
            .sinks
            .iter()
            .map(|sink| DescribedSink {
                node: self.node_name(sink.node),
                port: sink.port,
            })
            .collect();

        ScenarioDescription {
            general: DescribedGeneral {
                sim_time: self.sim_time(),
                run: self.run(),
                seed: self.config.general.seed,
                members_per_cluster: self.config.members_per_cluster(),
                routing_protocol: routing,
            },
            segments,
            nodes,
            flows,
            sinks,
        }
    }

    /// Write the scenario description as YAML
    pub fn write_description(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(&self.describe()).context("Failed to serialize scenario description")?;
        fs::write(path, yaml)
            .with_context(|| format!("Failed to write scenario description to {}", path.display()))?;
        info!("Scenario description written to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_reference_scenario() {
        let scenario = Scenario::build(&ScenarioConfig::default()).unwrap();
        assert_eq!(scenario.topology().nodes().len(), 13);
        assert_eq!(scenario.addresses().allocations().len(), 3);
        assert_eq!(scenario.mobility().len(), 13);
        assert_eq!(scenario.traffic().flows.len(), 2);
    }

    #[test]
    fn test_zero_members_fails_setup() {
        let mut config = ScenarioConfig::default();
        config.general.members = 0;
        let err = Scenario::build(&config).unwrap_err();
        assert!(format!("{:#}", err).contains("no member nodes"));
    }

    #[test]
    fn test_negative_members_fails_before_construction() {
        let mut config = ScenarioConfig::default();
        config.general.members = -3;
        let err = Scenario::build(&config).unwrap_err();
        assert!(format!("{:#}", err).contains("members must be non-negative"));
    }

    #[test]
    fn test_oversized_clusters_fail_before_construction() {
        let mut config = ScenarioConfig::default();
        config.general.members = 3_000_000;
        let err = Scenario::build(&config).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("Scenario configuration is invalid"));
        assert!(message.contains("need 3000001 host addresses"));
    }

    #[test]
    fn test_description_yaml() {
        let mut config = ScenarioConfig::default();
        config.general.members = 1;
        let scenario = Scenario::build(&config).unwrap();
        let description = scenario.describe();

        assert_eq!(description.segments[2].name, "backbone");
        assert_eq!(description.segments[2].nodes, vec!["head-a", "head-b", "super-head"]);
        assert_eq!(description.nodes[0].addresses.len(), 2);
        assert_eq!(description.flows[0].source, "member-a0");

        let yaml = serde_yaml::to_string(&description).unwrap();
        assert!(yaml.contains("subnet: 10.1.3.0/24"));
        assert!(yaml.contains("model: random_waypoint"));
        assert!(yaml.contains("routing: aodv"));
    }
}
