//! Structural hashing for determinism checks.
//!
//! Two trees built from the same set of positions and masses hash equal,
//! regardless of the order the bodies were supplied in (bucket contents are
//! hashed as a sorted set). Floats are hashed by their bit patterns.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use glam::DVec3;

use crate::body::Massive;
use crate::node::{NodeState, OctreeNode};
use crate::octree::Octree;
use crate::Bounds;

/// Compute a deterministic hash of a tree's shape and contents.
///
/// This hash includes, for every node in depth-first octant order:
/// - depth and bounds
/// - node kind
/// - position and mass of every body stored at the node
#[must_use]
pub fn hash_octree<B: Massive>(tree: &Octree<'_, B>) -> u64 {
    let mut hasher = DefaultHasher::new();
    tree.visit(|_, node| hash_node(tree, node, &mut hasher));
    hasher.finish()
}

fn hash_node<B: Massive, H: Hasher>(tree: &Octree<'_, B>, node: &OctreeNode, hasher: &mut H) {
    node.depth.hash(hasher);
    hash_bounds(&node.bounds, hasher);

    match &node.state {
        NodeState::Leaf { body: None } => 0u8.hash(hasher),
        NodeState::Leaf { body: Some(body) } => {
            1u8.hash(hasher);
            body_key(tree, *body).hash(hasher);
        }
        NodeState::Bucket { bodies } => {
            2u8.hash(hasher);
            let mut keys: Vec<_> = bodies.iter().map(|&b| body_key(tree, b)).collect();
            keys.sort_unstable();
            keys.hash(hasher);
        }
        NodeState::Internal { .. } => 3u8.hash(hasher),
    }
}

fn body_key<B: Massive>(tree: &Octree<'_, B>, body: u32) -> ([u64; 3], u64) {
    (bits(tree.position_of(body)), tree.mass_of(body).to_bits())
}

fn hash_bounds<H: Hasher>(bounds: &Bounds, hasher: &mut H) {
    bits(bounds.min).hash(hasher);
    bits(bounds.max).hash(hasher);
}

fn bits(v: DVec3) -> [u64; 3] {
    [v.x.to_bits(), v.y.to_bits(), v.z.to_bits()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::PointMass;
    use crate::octree::OctreeConfig;

    fn bodies() -> Vec<PointMass> {
        vec![
            PointMass::new(DVec3::new(1.0, 2.0, 3.0), 1.0),
            PointMass::new(DVec3::new(-4.0, 0.5, 2.0), 2.0),
            PointMass::new(DVec3::new(3.0, -3.0, -1.0), 0.5),
            PointMass::new(DVec3::new(0.0, 0.0, 0.0), 4.0),
            PointMass::new(DVec3::new(0.0, 0.0, 0.0), 1.0),
        ]
    }

    #[test]
    fn test_hash_same_input() {
        let a = bodies();
        let b = bodies();
        let ta = Octree::build(&a, OctreeConfig::default()).unwrap();
        let tb = Octree::build(&b, OctreeConfig::default()).unwrap();
        assert_eq!(hash_octree(&ta), hash_octree(&tb));
    }

    #[test]
    fn test_hash_ignores_input_order() {
        let a = bodies();
        let mut b = bodies();
        b.reverse();
        let ta = Octree::build(&a, OctreeConfig::default()).unwrap();
        let tb = Octree::build(&b, OctreeConfig::default()).unwrap();
        assert_eq!(hash_octree(&ta), hash_octree(&tb));
    }

    #[test]
    fn test_hash_sees_moved_body() {
        let a = bodies();
        let mut b = bodies();
        b[2].position.x += 1e-9;
        let ta = Octree::build(&a, OctreeConfig::default()).unwrap();
        let tb = Octree::build(&b, OctreeConfig::default()).unwrap();
        assert_ne!(hash_octree(&ta), hash_octree(&tb));
    }
}
