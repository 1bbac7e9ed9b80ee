//! Hierarchical topology construction.
//!
//! Builds the two first-level clusters, the super-head, and the three link
//! segments joining them. Node creation order is fixed (head A, head B,
//! super-head, members of A, members of B) so node ids and addresses are
//! reproducible across runs.

use log::{debug, info};

use super::types::{ClusterId, LinkSegment, LinkTech, Membership, Node, NodeId, SegmentId, Tier, Topology};

/// Topology construction errors
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error("members per cluster must be non-negative, got {0}")]
    NegativeMemberCount(i64),
}

/// Build the two-cluster hierarchy with `members_per_cluster` members each.
///
/// The value is checked before anything is constructed.
pub fn build_topology(members_per_cluster: i64) -> Result<Topology, TopologyError> {
    if members_per_cluster < 0 {
        return Err(TopologyError::NegativeMemberCount(members_per_cluster));
    }
    let members = members_per_cluster as usize;

    let mut topology = Topology::default();

    let head_a = add_node(&mut topology, "head-a".to_string(), Tier::ClusterHead, Some(ClusterId::A));
    let head_b = add_node(&mut topology, "head-b".to_string(), Tier::ClusterHead, Some(ClusterId::B));
    let super_head = add_node(&mut topology, "super-head".to_string(), Tier::SuperHead, None);

    let mut cluster_members: Vec<(ClusterId, Vec<NodeId>)> = Vec::with_capacity(2);
    for cluster in ClusterId::ALL {
        let ids = (0..members)
            .map(|i| {
                add_node(
                    &mut topology,
                    format!("member-{}{}", cluster.label(), i),
                    Tier::Member,
                    Some(cluster),
                )
            })
            .collect();
        cluster_members.push((cluster, ids));
    }

    for ((cluster, members), head) in cluster_members.iter().zip([head_a, head_b]) {
        let segment = add_segment(
            &mut topology,
            format!("cluster-{}-wifi", cluster.label()),
            LinkTech::WirelessAdhoc,
            Some(*cluster),
        );
        attach(&mut topology, head, segment);
        for &member in members {
            attach(&mut topology, member, segment);
        }
    }

    let backbone = add_segment(&mut topology, "backbone".to_string(), LinkTech::Wired, None);
    for node in [head_a, head_b, super_head] {
        attach(&mut topology, node, backbone);
    }

    info!(
        "Built hierarchical topology: {} nodes ({} members per cluster), {} segments",
        topology.nodes.len(),
        members,
        topology.segments.len()
    );
    Ok(topology)
}

fn add_node(topology: &mut Topology, name: String, tier: Tier, cluster: Option<ClusterId>) -> NodeId {
    let id = topology.nodes.len();
    debug!("Created node {} '{}' ({:?})", id, name, tier);
    topology.nodes.push(Node { id, name, tier, cluster });
    id
}

fn add_segment(topology: &mut Topology, name: String, tech: LinkTech, cluster: Option<ClusterId>) -> SegmentId {
    let id = topology.segments.len();
    topology.segments.push(LinkSegment { id, name, tech, cluster });
    id
}

fn attach(topology: &mut Topology, node: NodeId, segment: SegmentId) {
    topology.memberships.push(Membership { node, segment });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_topology_shape() {
        let topology = build_topology(5).unwrap();
        assert_eq!(topology.nodes().len(), 13);
        assert_eq!(topology.segments().len(), 3);

        let cluster_a = topology.cluster_segment(ClusterId::A).unwrap();
        let cluster_b = topology.cluster_segment(ClusterId::B).unwrap();
        let backbone = topology.backbone_segment().unwrap();
        assert_eq!((cluster_a, cluster_b, backbone), (0, 1, 2));

        assert_eq!(topology.segment_members(cluster_a).len(), 6);
        assert_eq!(topology.segment_members(cluster_b).len(), 6);
        assert_eq!(topology.segment_members(backbone), vec![0, 1, 2]);
    }

    #[test]
    fn test_heads_have_dual_membership() {
        let topology = build_topology(3).unwrap();
        let head_a = topology.head_of(ClusterId::A).unwrap();
        let head_b = topology.head_of(ClusterId::B).unwrap();
        let backbone = topology.backbone_segment().unwrap();

        assert_eq!(topology.node_segments(head_a), vec![0, backbone]);
        assert_eq!(topology.node_segments(head_b), vec![1, backbone]);
        assert_eq!(topology.node_segments(topology.super_head().unwrap()), vec![backbone]);
    }

    #[test]
    fn test_no_node_on_more_than_two_segments() {
        let topology = build_topology(7).unwrap();
        for node in topology.nodes() {
            let segments = topology.node_segments(node.id);
            let expected = match node.tier {
                Tier::ClusterHead => 2,
                Tier::Member | Tier::SuperHead => 1,
            };
            assert_eq!(segments.len(), expected, "node {}", node.name);
        }
    }

    #[test]
    fn test_members_belong_to_their_cluster_segment() {
        let topology = build_topology(4).unwrap();
        for cluster in ClusterId::ALL {
            let segment = topology.cluster_segment(cluster).unwrap();
            for member in topology.members_of(cluster) {
                assert_eq!(topology.node_segments(member), vec![segment]);
            }
        }
    }

    #[test]
    fn test_zero_members_leaves_heads_only() {
        let topology = build_topology(0).unwrap();
        assert_eq!(topology.nodes().len(), 3);
        for cluster in ClusterId::ALL {
            assert_eq!(topology.cluster_nodes(cluster).len(), 1);
            assert!(topology.members_of(cluster).is_empty());
        }
    }

    #[test]
    fn test_negative_members_rejected() {
        assert!(matches!(build_topology(-1), Err(TopologyError::NegativeMemberCount(-1))));
    }
}
