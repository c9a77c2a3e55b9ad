//! Arena-backed Barnes–Hut octree.
//!
//! The tree is built once per force evaluation from the current body
//! positions and dropped afterwards. Nodes live in a single `Vec` and refer
//! to their children by [`NodeId`]; a child is always allocated after its
//! parent, so the arena is in topological order.

use std::fmt;

use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::body::{BodyId, Massive};
use crate::error::BuildError;
use crate::node::{NodeId, NodeState, OctreeNode};
use crate::{octant_index, Bounds};

/// What to do when two bodies still share a leaf at the maximum depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthLimit {
    /// Keep every body in a single bucket leaf at the cap
    #[default]
    Bucket,
    /// Fail the build with [`BuildError::DepthLimitExceeded`]
    Error,
}

/// Configuration for tree construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OctreeConfig {
    /// Maximum subdivision depth (root = 0)
    pub max_depth: u8,
    /// Policy for bodies that cannot be separated before `max_depth`
    pub depth_limit: DepthLimit,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 32,
            depth_limit: DepthLimit::Bucket,
        }
    }
}

impl OctreeConfig {
    /// Set the maximum depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: u8) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the depth limit policy.
    #[must_use]
    pub fn with_depth_limit(mut self, depth_limit: DepthLimit) -> Self {
        self.depth_limit = depth_limit;
        self
    }
}

/// Barnes–Hut octree over a borrowed body slice.
#[derive(Debug, Clone)]
pub struct Octree<'a, B: Massive> {
    /// Contiguous node storage; index 0 is the root
    pub(crate) nodes: Vec<OctreeNode>,
    /// The bodies this tree indexes
    pub(crate) bodies: &'a [B],
    /// Configuration used for the build
    config: OctreeConfig,
}

impl<'a, B: Massive> Octree<'a, B> {
    /// Build a tree over `bodies`.
    ///
    /// 1. Validates every body (finite position, finite non-negative mass).
    /// 2. Computes tight bounds around all positions for the root.
    /// 3. Inserts the bodies in slice order, subdividing as needed.
    /// 4. Aggregates mass and center of mass bottom-up.
    ///
    /// # Errors
    ///
    /// - [`BuildError::EmptyInput`] if `bodies` is empty
    /// - [`BuildError::InvalidBody`] if a body fails validation
    /// - [`BuildError::DepthLimitExceeded`] if bodies cannot be separated and
    ///   the config uses [`DepthLimit::Error`]
    /// - [`BuildError::ExtentOverflow`] if `max - min` overflows on any axis
    /// - [`BuildError::TooManyBodies`] if the slice exceeds `u32::MAX` entries
    pub fn build(bodies: &'a [B], config: OctreeConfig) -> Result<Self, BuildError> {
        if bodies.is_empty() {
            return Err(BuildError::EmptyInput);
        }
        let count = BodyId::try_from(bodies.len())
            .map_err(|_| BuildError::TooManyBodies(bodies.len()))?;

        for (index, body) in bodies.iter().enumerate() {
            validate(index, body)?;
        }

        let bounds =
            Bounds::from_points(bodies.iter().map(Massive::position)).ok_or(BuildError::EmptyInput)?;
        if !bounds.size().is_finite() {
            return Err(BuildError::ExtentOverflow);
        }

        let mut tree = Self {
            nodes: Vec::with_capacity(bodies.len() * 2),
            bodies,
            config,
        };
        tree.nodes.push(OctreeNode::new(bounds, 0));

        for body in 0..count {
            tree.insert(NodeId::ROOT, body)?;
        }

        tree.aggregate_mass();

        let stats = tree.stats();
        debug!(
            bodies = stats.body_count,
            nodes = stats.node_count,
            depth = stats.max_depth_reached,
            buckets = stats.bucket_count,
            "built octree"
        );

        Ok(tree)
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &OctreeConfig {
        &self.config
    }

    /// Get the root node.
    #[must_use]
    pub fn root(&self) -> &OctreeNode {
        &self.nodes[NodeId::ROOT.index()]
    }

    /// Get a node by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &OctreeNode {
        &self.nodes[id.index()]
    }

    /// All nodes in allocation order.
    #[must_use]
    pub fn nodes(&self) -> &[OctreeNode] {
        &self.nodes
    }

    /// The bodies the tree was built from.
    #[must_use]
    pub fn bodies(&self) -> &'a [B] {
        self.bodies
    }

    /// Get statistics.
    #[must_use]
    pub fn stats(&self) -> OctreeStats {
        let mut stats = OctreeStats {
            node_count: self.nodes.len(),
            body_count: self.bodies.len(),
            ..OctreeStats::default()
        };
        for node in &self.nodes {
            stats.max_depth_reached = stats.max_depth_reached.max(node.depth);
            match node.state {
                NodeState::Leaf { .. } => stats.leaf_count += 1,
                NodeState::Bucket { .. } => stats.bucket_count += 1,
                NodeState::Internal { .. } => {}
            }
        }
        stats
    }

    /// Find the leaf (or bucket) holding `body`.
    ///
    /// Descends by octant from the root, so the cost is the depth of the
    /// body's leaf. Returns `None` for an id outside the body slice.
    #[must_use]
    pub fn leaf_of(&self, body: BodyId) -> Option<NodeId> {
        let position = self.bodies.get(body as usize)?.position();
        let mut current = NodeId::ROOT;
        loop {
            let node = self.node(current);
            match &node.state {
                NodeState::Internal { children } => {
                    current = children[octant_index(node.center, position)];
                }
                _ => return node.bodies().contains(&body).then_some(current),
            }
        }
    }

    /// Visit every node depth-first, children in octant order.
    pub fn visit(&self, mut f: impl FnMut(NodeId, &OctreeNode)) {
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            f(id, node);
            if let Some(children) = node.children() {
                stack.extend(children.iter().rev());
            }
        }
    }

    /// Indented listing of every node's bounds, center and mass.
    #[must_use]
    pub fn dump(&self) -> String {
        self.to_string()
    }

    pub(crate) fn position_of(&self, body: BodyId) -> DVec3 {
        self.bodies[body as usize].position()
    }

    pub(crate) fn mass_of(&self, body: BodyId) -> f64 {
        self.bodies[body as usize].mass()
    }

    /// Insert one body, descending from `start`.
    ///
    /// Iterative so that depth is bounded by `config.max_depth` rather than
    /// the call stack.
    fn insert(&mut self, start: NodeId, body: BodyId) -> Result<(), BuildError> {
        let position = self.position_of(body);
        let mut current = start;

        loop {
            let node = &mut self.nodes[current.index()];
            let center = node.center;
            let depth = node.depth;

            let resident = match &mut node.state {
                NodeState::Internal { children } => {
                    current = children[octant_index(center, position)];
                    continue;
                }
                NodeState::Leaf { body: slot } => match *slot {
                    None => {
                        *slot = Some(body);
                        return Ok(());
                    }
                    Some(resident) => resident,
                },
                NodeState::Bucket { bodies } => {
                    bodies.push(body);
                    return Ok(());
                }
            };

            if depth >= self.config.max_depth {
                return self.resolve_depth_limit(current, resident, body);
            }

            // Split, move the resident down, then retry this node as internal.
            let children = self.subdivide(current);
            let octant = octant_index(center, self.position_of(resident));
            self.nodes[children[octant].index()].state = NodeState::Leaf {
                body: Some(resident),
            };
        }
    }

    /// Turn the leaf `id` into an internal node with eight empty children.
    fn subdivide(&mut self, id: NodeId) -> [NodeId; 8] {
        let parent = &self.nodes[id.index()];
        let bounds = parent.bounds;
        let depth = parent.depth + 1;

        let first = self.nodes.len();
        self.nodes
            .extend((0..8).map(|octant| OctreeNode::new(bounds.child_bounds(octant), depth)));

        let children = std::array::from_fn(|octant| NodeId::new(first + octant));
        self.nodes[id.index()].state = NodeState::Internal { children };
        children
    }

    fn resolve_depth_limit(
        &mut self,
        id: NodeId,
        resident: BodyId,
        body: BodyId,
    ) -> Result<(), BuildError> {
        let node = &mut self.nodes[id.index()];
        match self.config.depth_limit {
            DepthLimit::Bucket => {
                warn!(
                    depth = node.depth,
                    resident, body, "bodies inseparable at depth cap, sharing a leaf"
                );
                node.state = NodeState::Bucket {
                    bodies: vec![resident, body],
                };
                Ok(())
            }
            DepthLimit::Error => Err(BuildError::DepthLimitExceeded {
                depth: node.depth,
                body,
            }),
        }
    }

    /// Fill `mass` and `center_of_mass` for every node.
    ///
    /// Walks the arena back to front; since children always follow their
    /// parent, every child is finished before its parent reads it. The
    /// center of mass is a running weighted mean, so it stays finite for any
    /// finite extent.
    fn aggregate_mass(&mut self) {
        for index in (0..self.nodes.len()).rev() {
            let (mass, center_of_mass) = match &self.nodes[index].state {
                NodeState::Internal { children } => children.iter().fold((0.0, DVec3::ZERO), |acc, child| {
                    let child = &self.nodes[child.index()];
                    accumulate(acc, child.center_of_mass, child.mass)
                }),
                _ => self.nodes[index]
                    .bodies()
                    .iter()
                    .fold((0.0, DVec3::ZERO), |acc, &body| {
                        accumulate(acc, self.position_of(body), self.mass_of(body))
                    }),
            };

            let node = &mut self.nodes[index];
            node.mass = mass;
            node.center_of_mass = if mass > 0.0 { center_of_mass } else { node.center };
        }
    }
}

/// Fold one point mass into a running `(total mass, center of mass)`.
fn accumulate((total, center): (f64, DVec3), point: DVec3, mass: f64) -> (f64, DVec3) {
    let total = total + mass;
    if mass > 0.0 {
        (total, center + (point - center) * (mass / total))
    } else {
        (total, center)
    }
}

impl<B: Massive> fmt::Display for Octree<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut result = Ok(());
        self.visit(|id, node| {
            if result.is_err() {
                return;
            }
            let kind = match &node.state {
                NodeState::Leaf { body: None } => "empty".to_string(),
                NodeState::Leaf { body: Some(b) } => format!("body {b}"),
                NodeState::Bucket { bodies } => format!("bucket {bodies:?}"),
                NodeState::Internal { .. } => "internal".to_string(),
            };
            result = writeln!(
                f,
                "{:indent$}#{} [{}, {}, {}]-[{}, {}, {}] center ({}, {}, {}) mass {} {}",
                "",
                id.index(),
                node.bounds.min.x,
                node.bounds.min.y,
                node.bounds.min.z,
                node.bounds.max.x,
                node.bounds.max.y,
                node.bounds.max.z,
                node.center.x,
                node.center.y,
                node.center.z,
                node.mass,
                kind,
                indent = usize::from(node.depth) * 2,
            );
        });
        result
    }
}

/// Statistics about the octree structure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OctreeStats {
    /// Total number of nodes
    pub node_count: usize,
    /// Number of ordinary leaves (empty or single body)
    pub leaf_count: usize,
    /// Number of depth-capped buckets
    pub bucket_count: usize,
    /// Number of bodies indexed
    pub body_count: usize,
    /// Deepest node depth
    pub max_depth_reached: u8,
}

fn validate<B: Massive>(index: usize, body: &B) -> Result<(), BuildError> {
    let reason = if !body.position().is_finite() {
        "position is not finite"
    } else if !body.mass().is_finite() {
        "mass is not finite"
    } else if body.mass() < 0.0 {
        "mass is negative"
    } else {
        return Ok(());
    };
    Err(BuildError::InvalidBody { index, reason })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::PointMass;
    use proptest::prelude::*;

    fn masses(points: &[[f64; 3]]) -> Vec<PointMass> {
        points
            .iter()
            .map(|&p| PointMass::new(DVec3::from_array(p), 1.0))
            .collect()
    }

    /// Every structural invariant the tree promises.
    fn check_invariants<B: Massive>(tree: &Octree<'_, B>) {
        let max_depth = tree.config().max_depth;
        let mut seen = vec![0usize; tree.bodies().len()];

        for node in tree.nodes() {
            assert_eq!(node.center, node.bounds.center());
            match &node.state {
                NodeState::Internal { children } => {
                    let mut volume = 0.0;
                    for (octant, child) in children.iter().enumerate() {
                        let child = tree.node(*child);
                        assert_eq!(child.bounds, node.bounds.child_bounds(octant));
                        assert_eq!(child.depth, node.depth + 1);
                        volume += child.bounds.volume();
                    }
                    let expected = node.bounds.volume();
                    assert!((volume - expected).abs() <= expected.abs() * 1e-9 + 1e-300);
                }
                NodeState::Leaf { body } => {
                    for &b in body {
                        seen[b as usize] += 1;
                    }
                }
                NodeState::Bucket { bodies } => {
                    assert_eq!(node.depth, max_depth);
                    assert!(bodies.len() >= 2);
                    for &b in bodies {
                        seen[b as usize] += 1;
                    }
                }
            }
        }
        assert!(seen.iter().all(|&count| count == 1), "each body in exactly one leaf");

        let count = BodyId::try_from(tree.bodies().len()).unwrap();
        for body in 0..count {
            let leaf = tree.leaf_of(body).expect("body must be reachable");
            assert!(tree.node(leaf).bounds.contains(tree.position_of(body)));
        }
    }

    #[test]
    fn test_empty_input() {
        let bodies: Vec<PointMass> = Vec::new();
        let err = Octree::build(&bodies, OctreeConfig::default()).unwrap_err();
        assert_eq!(err, BuildError::EmptyInput);
    }

    #[test]
    fn test_invalid_bodies() {
        let bodies = vec![
            PointMass::new(DVec3::ZERO, 1.0),
            PointMass::new(DVec3::new(f64::NAN, 0.0, 0.0), 1.0),
        ];
        let err = Octree::build(&bodies, OctreeConfig::default()).unwrap_err();
        assert!(matches!(err, BuildError::InvalidBody { index: 1, .. }));

        let bodies = vec![PointMass::new(DVec3::ONE, f64::INFINITY)];
        assert!(matches!(
            Octree::build(&bodies, OctreeConfig::default()),
            Err(BuildError::InvalidBody { index: 0, .. })
        ));

        let bodies = vec![PointMass::new(DVec3::ONE, -2.0)];
        assert!(matches!(
            Octree::build(&bodies, OctreeConfig::default()),
            Err(BuildError::InvalidBody { index: 0, reason: "mass is negative" })
        ));
    }

    #[test]
    fn test_single_body() {
        let bodies = masses(&[[3.0, -1.0, 2.0]]);
        let tree = Octree::build(&bodies, OctreeConfig::default()).unwrap();
        assert_eq!(tree.nodes().len(), 1);
        assert_eq!(tree.root().state, NodeState::Leaf { body: Some(0) });
        assert_eq!(tree.root().mass, 1.0);
        assert_eq!(tree.root().center_of_mass, DVec3::new(3.0, -1.0, 2.0));
    }

    #[test]
    fn test_two_corners() {
        let bodies = masses(&[[0.0, 0.0, 0.0], [10.0, 10.0, 10.0]]);
        let tree = Octree::build(&bodies, OctreeConfig::default()).unwrap();

        let root = tree.root();
        assert_eq!(root.bounds.min, DVec3::ZERO);
        assert_eq!(root.bounds.max, DVec3::splat(10.0));
        assert_eq!(root.center, DVec3::splat(5.0));
        assert_eq!(octant_index(root.center, bodies[0].position), 0);
        assert_eq!(octant_index(root.center, bodies[1].position), 7);

        let children = root.children().unwrap();
        assert_eq!(tree.node(children[0]).bodies(), &[0]);
        assert_eq!(tree.node(children[7]).bodies(), &[1]);
        assert_eq!(tree.leaf_of(0), Some(children[0]));
        assert_eq!(tree.leaf_of(1), Some(children[7]));
        assert_eq!(tree.stats().node_count, 9);
        check_invariants(&tree);
    }

    #[test]
    fn test_close_pair_separates() {
        let bodies = masses(&[[1.0, 1.0, 1.0], [1.0, 1.0, 1.0001], [9.0, 9.0, 9.0]]);
        let tree = Octree::build(&bodies, OctreeConfig::default()).unwrap();

        // The far body is alone after the first split
        let children = tree.root().children().unwrap();
        assert_eq!(tree.leaf_of(2), Some(children[7]));

        // The close pair needs many levels but ends in separate leaves
        let a = tree.leaf_of(0).unwrap();
        let b = tree.leaf_of(1).unwrap();
        assert_ne!(a, b);
        assert!(tree.node(a).depth >= 17);
        assert_eq!(tree.stats().bucket_count, 0);
        check_invariants(&tree);
    }

    #[test]
    fn test_close_pair_hits_depth_cap() {
        let bodies = masses(&[[1.0, 1.0, 1.0], [1.0, 1.0, 1.0001], [9.0, 9.0, 9.0]]);
        let config = OctreeConfig::default().with_max_depth(8);
        let tree = Octree::build(&bodies, config).unwrap();

        let leaf = tree.leaf_of(0).unwrap();
        assert_eq!(tree.leaf_of(1), Some(leaf));
        assert_eq!(tree.node(leaf).depth, 8);
        assert_eq!(tree.node(leaf).state, NodeState::Bucket { bodies: vec![0, 1] });
        assert_eq!(tree.stats().bucket_count, 1);
        check_invariants(&tree);
    }

    #[test]
    fn test_coincident_bodies_terminate() {
        let bodies = masses(&[[2.0, 2.0, 2.0], [2.0, 2.0, 2.0], [2.0, 2.0, 2.0], [0.0, 0.0, 0.0]]);
        let tree = Octree::build(&bodies, OctreeConfig::default()).unwrap();
        let leaf = tree.leaf_of(0).unwrap();
        assert_eq!(tree.node(leaf).bodies(), &[0, 1, 2]);
        assert_eq!(tree.node(leaf).mass, 3.0);
        check_invariants(&tree);
    }

    #[test]
    fn test_depth_limit_error() {
        let bodies = masses(&[[2.0, 2.0, 2.0], [2.0, 2.0, 2.0]]);
        let config = OctreeConfig::default().with_depth_limit(DepthLimit::Error);
        let err = Octree::build(&bodies, config).unwrap_err();
        assert_eq!(err, BuildError::DepthLimitExceeded { depth: 32, body: 1 });
    }

    #[test]
    fn test_huge_coordinates_stay_finite() {
        let bodies = masses(&[[1.0e308, 0.0, 0.0], [1.7e308, 0.0, 0.0]]);
        let tree = Octree::build(&bodies, OctreeConfig::default()).unwrap();
        check_invariants(&tree);

        let root = tree.root();
        assert!(root.center.is_finite());
        assert!(root.center_of_mass.is_finite());
        assert!((root.center_of_mass.x - 1.35e308).abs() < 1e294);

        let stats = tree.stats();
        assert_eq!(stats.bucket_count, 0);
        assert_eq!(stats.max_depth_reached, 1);
        assert_ne!(tree.leaf_of(0), tree.leaf_of(1));
    }

    #[test]
    fn test_overflowing_extent_rejected() {
        let bodies = masses(&[[-1.7e308, 0.0, 0.0], [1.7e308, 0.0, 0.0]]);
        assert_eq!(
            Octree::build(&bodies, OctreeConfig::default()).unwrap_err(),
            BuildError::ExtentOverflow
        );
    }

    #[test]
    fn test_mass_aggregation() {
        let bodies = vec![
            PointMass::new(DVec3::new(-4.0, 0.0, 0.0), 3.0),
            PointMass::new(DVec3::new(4.0, 0.0, 0.0), 1.0),
            PointMass::new(DVec3::new(0.0, 6.0, -2.0), 2.0),
        ];
        let tree = Octree::build(&bodies, OctreeConfig::default()).unwrap();

        let root = tree.root();
        assert!((root.mass - 6.0).abs() < 1e-12);
        let expected = (DVec3::new(-12.0, 0.0, 0.0) + DVec3::new(4.0, 0.0, 0.0) + DVec3::new(0.0, 12.0, -4.0)) / 6.0;
        assert!(root.center_of_mass.distance(expected) < 1e-12);

        // Every internal node's mass is the sum over its children
        for node in tree.nodes() {
            if let Some(children) = node.children() {
                let sum: f64 = children.iter().map(|c| tree.node(*c).mass).sum();
                assert!((node.mass - sum).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_dump_lists_every_node() {
        let bodies = masses(&[[0.0, 0.0, 0.0], [10.0, 10.0, 10.0]]);
        let tree = Octree::build(&bodies, OctreeConfig::default()).unwrap();
        let dump = tree.dump();
        assert_eq!(dump.lines().count(), 9);
        assert!(dump.starts_with("#0 [0, 0, 0]-[10, 10, 10] center (5, 5, 5)"));
        assert!(dump.contains("body 1"));
    }

    #[test]
    fn test_visit_order() {
        let bodies = masses(&[[0.0, 0.0, 0.0], [10.0, 10.0, 10.0]]);
        let tree = Octree::build(&bodies, OctreeConfig::default()).unwrap();
        let mut order = Vec::new();
        tree.visit(|id, _| order.push(id.index()));
        assert_eq!(order, vec![0, 1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_config_serde() {
        let config = OctreeConfig::default().with_max_depth(12).with_depth_limit(DepthLimit::Error);
        let json = serde_json::to_string(&config).unwrap();
        let back: OctreeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    fn point_mass() -> impl Strategy<Value = PointMass> {
        (-100.0..100.0f64, -100.0..100.0f64, -100.0..100.0f64, 0.1..10.0f64)
            .prop_map(|(x, y, z, m)| PointMass::new(DVec3::new(x, y, z), m))
    }

    proptest! {
        #[test]
        fn prop_structure_holds(bodies in prop::collection::vec(point_mass(), 1..64)) {
            let tree = Octree::build(&bodies, OctreeConfig::default()).unwrap();
            check_invariants(&tree);

            let total: f64 = bodies.iter().map(|b| b.mass).sum();
            prop_assert!((tree.root().mass - total).abs() < 1e-9 * total);
        }

        #[test]
        fn prop_octant_is_pure(
            cx in -10.0..10.0f64, cy in -10.0..10.0f64, cz in -10.0..10.0f64,
            px in -10.0..10.0f64, py in -10.0..10.0f64, pz in -10.0..10.0f64,
        ) {
            let center = DVec3::new(cx, cy, cz);
            let point = DVec3::new(px, py, pz);
            let first = octant_index(center, point);
            prop_assert!(first < 8);
            prop_assert_eq!(first, octant_index(center, point));
            prop_assert_eq!(first & 4 != 0, px > cx);
            prop_assert_eq!(first & 2 != 0, py > cy);
            prop_assert_eq!(first & 1 != 0, pz > cz);
        }
    }
}
