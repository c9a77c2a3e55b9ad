//! Force queries against a built tree.
//!
//! Traversal applies the multipole-acceptance test at every internal node:
//! when the node's size over the distance to its center of mass is below
//! `theta`, the whole subtree is treated as one point mass. Otherwise the
//! children are opened.

use glam::DVec3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::body::{BodyId, Massive};
use crate::error::InvalidGravity;
use crate::node::{NodeId, NodeState};
use crate::octree::Octree;

/// Gravity law and accuracy settings for a query.
///
/// Queries assume settings that pass [`Gravity::validate`]; a negative
/// softening, for one, turns every acceleration into NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gravity {
    /// Gravitational constant
    pub g: f64,
    /// Softening added to the squared distance (ε²)
    pub softening: f64,
    /// Opening threshold θ; 0 forces exact pairwise evaluation
    pub theta: f64,
}

impl Default for Gravity {
    fn default() -> Self {
        Self {
            g: 1.0,
            softening: 0.0,
            theta: 0.5,
        }
    }
}

impl Gravity {
    /// Set the opening threshold.
    #[must_use]
    pub fn with_theta(mut self, theta: f64) -> Self {
        self.theta = theta;
        self
    }

    /// Check that every field is finite, with `softening` and `theta` not
    /// negative.
    ///
    /// # Errors
    ///
    /// Returns the first field that is out of range.
    pub fn validate(&self) -> Result<(), InvalidGravity> {
        let checks = [
            ("g", "finite", self.g, self.g.is_finite()),
            ("softening", "finite and >= 0", self.softening, self.softening.is_finite() && self.softening >= 0.0),
            ("theta", "finite and >= 0", self.theta, self.theta.is_finite() && self.theta >= 0.0),
        ];
        match checks.into_iter().find(|&(.., ok)| !ok) {
            Some((field, requirement, value, _)) => Err(InvalidGravity {
                field,
                requirement,
                value,
            }),
            None => Ok(()),
        }
    }

    /// Acceleration at `target` due to a point mass `mass` at `source`.
    ///
    /// Coincident points with no softening contribute nothing.
    #[must_use]
    pub fn point_mass(&self, target: DVec3, source: DVec3, mass: f64) -> DVec3 {
        let r = source - target;
        let dist2 = r.length_squared() + self.softening;
        if dist2 == 0.0 {
            return DVec3::ZERO;
        }
        let inv_r = dist2.sqrt().recip();
        r * (self.g * mass * inv_r * inv_r * inv_r)
    }
}

/// Work done by a single query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryStats {
    /// Nodes popped during traversal
    pub nodes_visited: u32,
    /// Point-mass interactions evaluated (bodies or aggregates)
    pub interactions: u32,
}

impl<B: Massive> Octree<'_, B> {
    /// Acceleration on one of the tree's own bodies.
    ///
    /// # Panics
    ///
    /// Panics if `body` is not an index into the tree's body slice.
    #[must_use]
    pub fn acceleration_on(&self, body: BodyId, gravity: &Gravity) -> DVec3 {
        self.acceleration_at(self.position_of(body), Some(body), gravity)
    }

    /// Acceleration at an arbitrary point, optionally skipping one body.
    #[must_use]
    pub fn acceleration_at(&self, point: DVec3, exclude: Option<BodyId>, gravity: &Gravity) -> DVec3 {
        self.acceleration_with_stats(point, exclude, gravity).0
    }

    /// Acceleration at a point plus traversal statistics.
    #[must_use]
    pub fn acceleration_with_stats(
        &self,
        point: DVec3,
        exclude: Option<BodyId>,
        gravity: &Gravity,
    ) -> (DVec3, QueryStats) {
        let mut acc = DVec3::ZERO;
        let mut stats = QueryStats::default();
        let mut stack = vec![NodeId::ROOT];

        while let Some(id) = stack.pop() {
            let node = self.node(id);
            stats.nodes_visited += 1;

            if node.mass == 0.0 {
                continue;
            }

            match &node.state {
                NodeState::Internal { children } => {
                    let dist = node.center_of_mass.distance(point);
                    let far = dist > 0.0
                        && !node.bounds.contains(point)
                        && node.size() / dist < gravity.theta;

                    if far {
                        acc += gravity.point_mass(point, node.center_of_mass, node.mass);
                        stats.interactions += 1;
                    } else {
                        stack.extend(children.iter().rev());
                    }
                }
                _ => {
                    for &body in node.bodies() {
                        if Some(body) == exclude {
                            continue;
                        }
                        acc += gravity.point_mass(point, self.position_of(body), self.mass_of(body));
                        stats.interactions += 1;
                    }
                }
            }
        }

        (acc, stats)
    }

    /// Accelerations on every body, evaluated in parallel.
    ///
    /// The tree is read-only after construction, so each body's traversal is
    /// independent.
    #[must_use]
    pub fn accelerations(&self, gravity: &Gravity) -> Vec<DVec3>
    where
        B: Sync,
    {
        let count = BodyId::try_from(self.bodies.len()).unwrap_or(BodyId::MAX);
        (0..count)
            .into_par_iter()
            .map(|body| self.acceleration_on(body, gravity))
            .collect()
    }
}
