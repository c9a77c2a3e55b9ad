//! Octree node structure.
//!
//! Nodes are leaves (zero or one body), buckets (several bodies stuck at the
//! depth cap), or internal (exactly eight children).

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::body::BodyId;
use crate::Bounds;

/// Index of a node in the tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// The root is always the first node allocated.
    pub const ROOT: NodeId = NodeId(0);

    pub(crate) fn new(index: usize) -> Self {
        debug_assert!(u32::try_from(index).is_ok(), "NodeId overflow");
        #[allow(clippy::cast_possible_truncation)]
        NodeId(index as u32)
    }

    /// Position in the arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// State of an octree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeState {
    /// Leaf holding zero or one body
    Leaf { body: Option<BodyId> },
    /// Leaf at the depth cap holding two or more inseparable bodies
    Bucket { bodies: Vec<BodyId> },
    /// Internal node; children tile this node's bounds
    Internal { children: [NodeId; 8] },
}

impl Default for NodeState {
    fn default() -> Self {
        Self::Leaf { body: None }
    }
}

/// A node in the octree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OctreeNode {
    /// Spatial bounds of this node
    pub bounds: Bounds,
    /// Geometric midpoint of `bounds`; the split point for children
    pub center: DVec3,
    /// Depth in the tree (0 = root)
    pub depth: u8,
    /// Total mass of every body beneath this node
    pub mass: f64,
    /// Mass-weighted mean position of every body beneath this node
    pub center_of_mass: DVec3,
    /// Node state (leaf, bucket, or internal)
    pub state: NodeState,
}

impl OctreeNode {
    /// Create a new empty leaf.
    #[must_use]
    pub fn new(bounds: Bounds, depth: u8) -> Self {
        Self {
            bounds,
            center: bounds.center(),
            depth,
            mass: 0.0,
            center_of_mass: DVec3::ZERO,
            state: NodeState::default(),
        }
    }

    /// Check if this node holds no bodies and has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self.state, NodeState::Leaf { body: None })
    }

    /// Check if this node is a leaf or bucket.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        !self.is_internal()
    }

    /// Check if this node is internal (has children).
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(self.state, NodeState::Internal { .. })
    }

    /// Check if this node is a depth-capped bucket.
    #[must_use]
    pub fn is_bucket(&self) -> bool {
        matches!(self.state, NodeState::Bucket { .. })
    }

    /// Get children if this is an internal node.
    #[must_use]
    pub fn children(&self) -> Option<&[NodeId; 8]> {
        match &self.state {
            NodeState::Internal { children } => Some(children),
            _ => None,
        }
    }

    /// Bodies stored directly in this node (empty for internal nodes).
    #[must_use]
    pub fn bodies(&self) -> &[BodyId] {
        match &self.state {
            NodeState::Leaf { body } => body.as_slice(),
            NodeState::Bucket { bodies } => bodies,
            NodeState::Internal { .. } => &[],
        }
    }

    /// Longest edge of this node's bounds.
    #[must_use]
    pub fn size(&self) -> f64 {
        self.bounds.longest_edge()
    }
}
