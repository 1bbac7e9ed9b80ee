//! Topology type definitions.
//!
//! Nodes, link segments and the membership table relating them. A
//! cluster-head sits on two segments, so membership is kept as an explicit
//! `(node, segment)` relation instead of nested containers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a node in creation order
pub type NodeId = usize;

/// Index of a link segment in creation order
pub type SegmentId = usize;

/// Hierarchy level of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    ClusterHead,
    Member,
    SuperHead,
}

/// First-level cluster label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClusterId {
    A,
    B,
}

impl ClusterId {
    pub const ALL: [ClusterId; 2] = [ClusterId::A, ClusterId::B];

    pub fn label(&self) -> &'static str {
        match self {
            ClusterId::A => "a",
            ClusterId::B => "b",
        }
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterId::A => write!(f, "A"),
            ClusterId::B => write!(f, "B"),
        }
    }
}

/// Link-layer technology of a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkTech {
    WirelessAdhoc,
    Wired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub tier: Tier,
    /// Owning cluster; `None` for the super-head
    pub cluster: Option<ClusterId>,
}

/// A broadcast domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkSegment {
    pub id: SegmentId,
    pub name: String,
    pub tech: LinkTech,
    /// Cluster whose wireless segment this is; `None` for the backbone
    pub cluster: Option<ClusterId>,
}

/// One row of the node/segment membership table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Membership {
    pub node: NodeId,
    pub segment: SegmentId,
}

/// The constructed node hierarchy
#[derive(Debug, Clone, Default)]
pub struct Topology {
    pub(crate) nodes: Vec<Node>,
    pub(crate) segments: Vec<LinkSegment>,
    pub(crate) memberships: Vec<Membership>,
}

impl Topology {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn segments(&self) -> &[LinkSegment] {
        &self.segments
    }

    pub fn memberships(&self) -> &[Membership] {
        &self.memberships
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn segment(&self, id: SegmentId) -> Option<&LinkSegment> {
        self.segments.get(id)
    }

    /// Nodes attached to a segment, in attachment order
    pub fn segment_members(&self, segment: SegmentId) -> Vec<NodeId> {
        self.memberships
            .iter()
            .filter(|m| m.segment == segment)
            .map(|m| m.node)
            .collect()
    }

    /// Segments a node is attached to, in attachment order
    pub fn node_segments(&self, node: NodeId) -> Vec<SegmentId> {
        self.memberships
            .iter()
            .filter(|m| m.node == node)
            .map(|m| m.segment)
            .collect()
    }

    /// All nodes of a cluster, head included
    pub fn cluster_nodes(&self, cluster: ClusterId) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.cluster == Some(cluster))
            .map(|n| n.id)
            .collect()
    }

    /// Member nodes of a cluster in creation order
    pub fn members_of(&self, cluster: ClusterId) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.cluster == Some(cluster) && n.tier == Tier::Member)
            .map(|n| n.id)
            .collect()
    }

    pub fn head_of(&self, cluster: ClusterId) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|n| n.cluster == Some(cluster) && n.tier == Tier::ClusterHead)
            .map(|n| n.id)
    }

    pub fn super_head(&self) -> Option<NodeId> {
        self.nodes.iter().find(|n| n.tier == Tier::SuperHead).map(|n| n.id)
    }

    /// Wireless segment of a cluster
    pub fn cluster_segment(&self, cluster: ClusterId) -> Option<SegmentId> {
        self.segments
            .iter()
            .find(|s| s.cluster == Some(cluster))
            .map(|s| s.id)
    }

    pub fn backbone_segment(&self) -> Option<SegmentId> {
        self.segments
            .iter()
            .find(|s| s.tech == LinkTech::Wired)
            .map(|s| s.id)
    }
}
