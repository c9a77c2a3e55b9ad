//! Body state owned by the simulation.

use bhtree::Massive;
use glam::DVec3;
use serde::{Deserialize, Serialize};

/// A point mass with velocity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Position
    pub position: DVec3,
    /// Velocity
    pub velocity: DVec3,
    /// Mass
    pub mass: f64,
}

impl Body {
    /// Create a body.
    #[must_use]
    pub fn new(position: DVec3, velocity: DVec3, mass: f64) -> Self {
        Self {
            position,
            velocity,
            mass,
        }
    }

    /// Create a body with zero velocity.
    #[must_use]
    pub fn at_rest(position: DVec3, mass: f64) -> Self {
        Self::new(position, DVec3::ZERO, mass)
    }

    /// Finite state and non-negative mass.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite() && self.mass.is_finite() && self.mass >= 0.0
    }

    /// Linear momentum `m v`.
    #[must_use]
    pub fn momentum(&self) -> DVec3 {
        self.velocity * self.mass
    }

    /// Kinetic energy `½ m |v|²`.
    #[must_use]
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.length_squared()
    }
}

impl Massive for Body {
    fn position(&self) -> DVec3 {
        self.position
    }

    fn mass(&self) -> f64 {
        self.mass
    }
}
