//! Link connectivity snapshots.
//!
//! Wireless neighbors are nodes on the same cluster segment within radio
//! range; every node on the wired backbone reaches every other one directly.

use std::collections::VecDeque;

use crate::mobility::Vector2;
use crate::topology::{LinkTech, NodeId, Topology};

/// One link traversal along a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
    pub from: NodeId,
    pub to: NodeId,
    pub tech: LinkTech,
}

/// Neighbor lists at one instant
#[derive(Debug, Clone)]
pub struct Connectivity {
    adjacency: Vec<Vec<(NodeId, LinkTech)>>,
}

impl Connectivity {
    /// Build the link graph for the given node positions (indexed by node id)
    pub fn snapshot(topology: &Topology, positions: &[Vector2], wifi_range: f64) -> Self {
        let mut adjacency: Vec<Vec<(NodeId, LinkTech)>> = vec![Vec::new(); topology.nodes().len()];

        for segment in topology.segments() {
            let members = topology.segment_members(segment.id);
            for (i, &a) in members.iter().enumerate() {
                for &b in &members[i + 1..] {
                    let linked = match segment.tech {
                        LinkTech::Wired => true,
                        LinkTech::WirelessAdhoc => match (positions.get(a), positions.get(b)) {
                            (Some(pa), Some(pb)) => pa.distance_to(pb) <= wifi_range,
                            _ => false,
                        },
                    };
                    if linked && !adjacency[a].iter().any(|&(n, _)| n == b) {
                        adjacency[a].push((b, segment.tech));
                        adjacency[b].push((a, segment.tech));
                    }
                }
            }
        }

        Self { adjacency }
    }

    pub fn neighbors(&self, node: NodeId) -> &[(NodeId, LinkTech)] {
        self.adjacency.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Minimum-hop route from `from` to `to`, breadth first
    pub fn shortest_path(&self, from: NodeId, to: NodeId) -> Option<Vec<Hop>> {
        if from >= self.adjacency.len() || to >= self.adjacency.len() {
            return None;
        }
        if from == to {
            return Some(Vec::new());
        }

        let mut previous: Vec<Option<(NodeId, LinkTech)>> = vec![None; self.adjacency.len()];
        let mut visited = vec![false; self.adjacency.len()];
        let mut queue = VecDeque::new();
        visited[from] = true;
        queue.push_back(from);

        while let Some(current) = queue.pop_front() {
            for &(next, tech) in &self.adjacency[current] {
                if visited[next] {
                    continue;
                }
                visited[next] = true;
                previous[next] = Some((current, tech));
                if next == to {
                    return Some(Self::unwind(&previous, to));
                }
                queue.push_back(next);
            }
        }

        None
    }

    fn unwind(previous: &[Option<(NodeId, LinkTech)>], to: NodeId) -> Vec<Hop> {
        let mut hops = Vec::new();
        let mut node = to;
        while let Some((prev, tech)) = previous[node] {
            hops.push(Hop { from: prev, to: node, tech });
            node = prev;
        }
        hops.reverse();
        hops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{build_topology, ClusterId};

    /// Heads at the center of their clusters, members in a chain
    fn positions(topology: &Topology, spacing: f64) -> Vec<Vector2> {
        let mut positions = vec![Vector2::default(); topology.nodes().len()];
        positions[topology.head_of(ClusterId::A).unwrap()] = Vector2::new(0.0, 0.0);
        positions[topology.head_of(ClusterId::B).unwrap()] = Vector2::new(1000.0, 0.0);
        positions[topology.super_head().unwrap()] = Vector2::new(500.0, 500.0);
        for (i, member) in topology.members_of(ClusterId::A).into_iter().enumerate() {
            positions[member] = Vector2::new(-(i as f64 + 1.0) * spacing, 0.0);
        }
        for (i, member) in topology.members_of(ClusterId::B).into_iter().enumerate() {
            positions[member] = Vector2::new(1000.0 + (i as f64 + 1.0) * spacing, 0.0);
        }
        positions
    }

    #[test]
    fn test_backbone_always_connected() {
        let topology = build_topology(0).unwrap();
        let graph = Connectivity::snapshot(&topology, &positions(&topology, 50.0), 10.0);
        let path = graph.shortest_path(0, 1).unwrap();
        assert_eq!(path.len(), 1);
        assert_eq!(path[0].tech, LinkTech::Wired);
        assert_eq!(graph.neighbors(2).len(), 2);
    }

    #[test]
    fn test_multi_hop_path_across_backbone() {
        let topology = build_topology(2).unwrap();
        let graph = Connectivity::snapshot(&topology, &positions(&topology, 60.0), 100.0);
        let src = topology.members_of(ClusterId::A)[1];
        let dst = topology.members_of(ClusterId::B)[1];

        let path = graph.shortest_path(src, dst).unwrap();
        // member-a1 -> member-a0 -> head-a => head-b -> member-b0 -> member-b1
        assert_eq!(path.len(), 5);
        let wired = path.iter().filter(|h| h.tech == LinkTech::Wired).count();
        assert_eq!(wired, 1);
        assert_eq!(path.first().unwrap().from, src);
        assert_eq!(path.last().unwrap().to, dst);
    }

    #[test]
    fn test_out_of_range_partitions() {
        let topology = build_topology(2).unwrap();
        let graph = Connectivity::snapshot(&topology, &positions(&topology, 150.0), 100.0);
        let src = topology.members_of(ClusterId::A)[0];
        let dst = topology.members_of(ClusterId::B)[0];
        assert!(graph.shortest_path(src, dst).is_none());
    }

    #[test]
    fn test_clusters_do_not_link_wirelessly() {
        let topology = build_topology(1).unwrap();
        // everyone on the same spot: only segment membership decides
        let graph = Connectivity::snapshot(&topology, &vec![Vector2::default(); topology.nodes().len()], 100.0);
        let member_a = topology.members_of(ClusterId::A)[0];
        let member_b = topology.members_of(ClusterId::B)[0];
        assert!(graph.neighbors(member_a).iter().all(|&(n, _)| n != member_b));
        assert_eq!(graph.shortest_path(member_a, member_b).unwrap().len(), 3);
    }
}
