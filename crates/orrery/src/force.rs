//! Gravitational force models.
//!
//! A force model turns the current body state into one acceleration per
//! body. Two models are provided:
//!
//! - [`DirectSum`]: exact pairwise summation, O(n²)
//! - [`BarnesHut`]: a fresh octree per call, O(n log n), accuracy set by θ

use std::fmt;

use bhtree::{Gravity, Octree, OctreeConfig};
use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::error::SimulationError;

/// Source of per-body accelerations.
pub trait ForceModel: Send + Sync + fmt::Debug {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Compute the acceleration on every body.
    ///
    /// # Errors
    ///
    /// Returns an error if the bodies cannot be evaluated (for example, the
    /// octree rejects them).
    fn accelerations(&self, bodies: &[Body]) -> Result<Vec<DVec3>, SimulationError>;
}

/// Which force model a simulation uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceKind {
    /// Pairwise summation
    Direct,
    /// Octree approximation
    #[default]
    BarnesHut,
}

/// Exact Newtonian gravity by pairwise summation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectSum {
    /// Gravitational constant
    pub g: f64,
    /// Softening added to the squared distance
    pub softening: f64,
}

impl DirectSum {
    /// Use the constant and softening of a tree query config.
    #[must_use]
    pub fn from_gravity(gravity: &Gravity) -> Self {
        Self {
            g: gravity.g,
            softening: gravity.softening,
        }
    }
}

impl ForceModel for DirectSum {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn accelerations(&self, bodies: &[Body]) -> Result<Vec<DVec3>, SimulationError> {
        let n = bodies.len();
        let mut out = vec![DVec3::ZERO; n];

        // Each unordered pair once; equal and opposite contributions.
        for i in 0..n {
            let bi = &bodies[i];
            for j in (i + 1)..n {
                let bj = &bodies[j];
                let r = bj.position - bi.position;
                let dist2 = r.length_squared() + self.softening;
                if dist2 == 0.0 {
                    continue;
                }
                let inv_r = dist2.sqrt().recip();
                let coef = self.g * inv_r * inv_r * inv_r;

                out[i] += r * (coef * bj.mass);
                out[j] -= r * (coef * bi.mass);
            }
        }

        Ok(out)
    }
}

/// Newtonian gravity through a per-call Barnes–Hut octree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarnesHut {
    /// Gravity law and opening threshold
    pub gravity: Gravity,
    /// Tree construction settings
    pub tree: OctreeConfig,
}

impl ForceModel for BarnesHut {
    fn name(&self) -> &'static str {
        "barnes_hut"
    }

    fn accelerations(&self, bodies: &[Body]) -> Result<Vec<DVec3>, SimulationError> {
        self.gravity.validate()?;
        if bodies.is_empty() {
            return Ok(Vec::new());
        }
        let tree = Octree::build(bodies, self.tree)?;
        Ok(tree.accelerations(&self.gravity))
    }
}
