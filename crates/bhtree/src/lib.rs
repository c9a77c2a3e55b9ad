//! # bhtree
//!
//! Barnes–Hut octree for approximate N-body gravity.
//!
//! Point masses are partitioned into a hierarchy of axis-aligned boxes such
//! that each leaf holds at most one body. Every node carries the total mass
//! and center of mass of the bodies beneath it, so a distant cluster can be
//! replaced by a single pseudo-body during force evaluation:
//!
//! - **Arena storage**: nodes live in one `Vec` and refer to children by
//!   [`NodeId`], never by pointer
//! - **Borrowed bodies**: the tree stores indices into the caller's slice
//! - **Bounded depth**: coincident bodies cannot recurse forever; see
//!   [`DepthLimit`]
//! - **Read-only queries**: once built, accelerations can be evaluated in
//!   parallel
//!
//! ## Quick Start
//!
//! ```rust
//! use bhtree::{Gravity, Octree, OctreeConfig, PointMass};
//! use glam::DVec3;
//!
//! let bodies = vec![
//!     PointMass::new(DVec3::new(0.0, 0.0, 0.0), 1.0),
//!     PointMass::new(DVec3::new(10.0, 10.0, 10.0), 1.0),
//! ];
//!
//! let tree = Octree::build(&bodies, OctreeConfig::default()).unwrap();
//! assert_eq!(tree.root().center, DVec3::splat(5.0));
//!
//! let accel = tree.acceleration_on(0, &Gravity::default());
//! assert!(accel.x > 0.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod body;
pub mod error;
pub mod hash;
pub mod node;
pub mod octree;
pub mod query;

// Re-exports for convenience
pub use body::{BodyId, Massive, PointMass};
pub use error::{BuildError, InvalidGravity};
pub use hash::hash_octree;
pub use node::{NodeId, NodeState, OctreeNode};
pub use octree::{DepthLimit, Octree, OctreeConfig, OctreeStats};
pub use query::{Gravity, QueryStats};

use glam::DVec3;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bounds {
    /// Minimum corner
    pub min: DVec3,
    /// Maximum corner
    pub max: DVec3,
}

impl Bounds {
    /// Create bounds from min/max corners.
    #[must_use]
    pub fn from_min_max(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Tight bounds around a set of points.
    ///
    /// Returns `None` for an empty iterator. Every face of the result touches
    /// at least one input point.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = DVec3>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::from_min_max(first, first), |bounds, p| Self {
            min: bounds.min.min(p),
            max: bounds.max.max(p),
        }))
    }

    /// Get the center of the bounds.
    ///
    /// Halves each corner before adding so corners near `f64::MAX` do not
    /// overflow.
    #[must_use]
    pub fn center(&self) -> DVec3 {
        self.min * 0.5 + self.max * 0.5
    }

    /// Get the size of the bounds.
    #[must_use]
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// Longest edge, used as the node size `s` in the opening test.
    #[must_use]
    pub fn longest_edge(&self) -> f64 {
        self.size().max_element()
    }

    /// Enclosed volume.
    #[must_use]
    pub fn volume(&self) -> f64 {
        let size = self.size();
        size.x * size.y * size.z
    }

    /// Check if a point is inside the bounds (faces inclusive).
    #[must_use]
    pub fn contains(&self, point: DVec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Get the octant index for a point (0-7), split at the box center.
    #[must_use]
    pub fn octant_index(&self, point: DVec3) -> usize {
        octant_index(self.center(), point)
    }

    /// Get the bounds of a child octant.
    ///
    /// Bit weights follow [`octant_index`]: x = 4, y = 2, z = 1. A set bit
    /// selects the upper half `[center, max]` on that axis.
    #[must_use]
    pub fn child_bounds(&self, octant: usize) -> Self {
        let center = self.center();
        let min = DVec3::new(
            if octant & 4 == 0 { self.min.x } else { center.x },
            if octant & 2 == 0 { self.min.y } else { center.y },
            if octant & 1 == 0 { self.min.z } else { center.z },
        );
        let max = DVec3::new(
            if octant & 4 == 0 { center.x } else { self.max.x },
            if octant & 2 == 0 { center.y } else { self.max.y },
            if octant & 1 == 0 { center.z } else { self.max.z },
        );
        Self { min, max }
    }
}

/// Octant of `point` relative to a split point.
///
/// Per axis, a coordinate strictly greater than the center's sets that axis
/// bit (x = 4, y = 2, z = 1). Equal coordinates go to the lower octant.
#[must_use]
pub fn octant_index(center: DVec3, point: DVec3) -> usize {
    let mut index = 0;
    if point.x > center.x {
        index |= 4;
    }
    if point.y > center.y {
        index |= 2;
    }
    if point.z > center.z {
        index |= 1;
    }
    index
}
