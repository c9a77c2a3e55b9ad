//! Body interface for tree construction.
//!
//! The tree never owns body state. It borrows the caller's slice and
//! records positions in that slice as [`BodyId`]s.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Index of a body in the slice the tree was built from.
pub type BodyId = u32;

/// Anything with a position and a mass can be inserted into the tree.
pub trait Massive {
    /// Position in simulation units.
    fn position(&self) -> DVec3;

    /// Mass in simulation units.
    fn mass(&self) -> f64;
}

impl<T: Massive + ?Sized> Massive for &T {
    fn position(&self) -> DVec3 {
        (**self).position()
    }

    fn mass(&self) -> f64 {
        (**self).mass()
    }
}

/// Minimal body: a position and a mass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointMass {
    /// Position
    pub position: DVec3,
    /// Mass
    pub mass: f64,
}

impl PointMass {
    /// Create a point mass.
    #[must_use]
    pub fn new(position: DVec3, mass: f64) -> Self {
        Self { position, mass }
    }
}

impl Massive for PointMass {
    fn position(&self) -> DVec3 {
        self.position
    }

    fn mass(&self) -> f64 {
        self.mass
    }
}
