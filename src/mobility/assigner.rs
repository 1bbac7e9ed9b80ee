//! Per-tier mobility assignment.
//!
//! Members walk inside their cluster's rectangle, heads drift apart at
//! constant velocity, and the super-head wanders between the clusters on
//! random waypoints. Nothing moves here; this only decides which behavior
//! every node carries.

use log::{debug, info};

use crate::config::MobilityConfig;
use crate::topology::{ClusterId, NodeId, Tier, Topology};

use super::types::MobilityBehavior;

/// One behavior per node, indexed by node id
#[derive(Debug, Clone, Default)]
pub struct MobilityPlan {
    behaviors: Vec<MobilityBehavior>,
}

impl MobilityPlan {
    pub fn behavior(&self, node: NodeId) -> Option<&MobilityBehavior> {
        self.behaviors.get(node)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &MobilityBehavior)> {
        self.behaviors.iter().enumerate()
    }

    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }
}

/// Attach a behavior to every node of `topology` according to its tier
pub fn assign_mobility(topology: &Topology, config: &MobilityConfig) -> MobilityPlan {
    let behaviors: Vec<MobilityBehavior> = topology
        .nodes()
        .iter()
        .map(|node| {
            let behavior = match (node.tier, node.cluster) {
                (Tier::Member, Some(cluster)) => MobilityBehavior::BoundedRandomWalk {
                    area: match cluster {
                        ClusterId::A => config.member_area_a,
                        ClusterId::B => config.member_area_b,
                    },
                    speed: config.member_speed,
                },
                (Tier::ClusterHead, Some(ClusterId::A)) => MobilityBehavior::ConstantVelocity {
                    initial_position: config.head_a_position,
                    velocity: config.head_a_velocity,
                },
                (Tier::ClusterHead, Some(ClusterId::B)) => MobilityBehavior::ConstantVelocity {
                    initial_position: config.head_b_position,
                    velocity: config.head_b_velocity,
                },
                // the super-head, and anything outside a cluster, roams between them
                _ => MobilityBehavior::RandomWaypoint {
                    area: config.super_head_area,
                    speed: config.super_head_speed,
                    pause: config.super_head_pause,
                },
            };
            debug!("Node '{}' -> {}", node.name, behavior.model_name());
            behavior
        })
        .collect();

    info!("Assigned mobility models to {} nodes", behaviors.len());
    MobilityPlan { behaviors }
}
