//! Initial conditions.
//!
//! Scenarios are plain data: a [`ScenarioConfig`] describes how to produce a
//! body list, and can be loaded from JSON. Random scenarios are seeded with
//! ChaCha8 so the same config always yields the same bodies.
//!
//! ```json
//! { "kind": "random_cluster", "count": 500, "radius": 50.0, "seed": 42 }
//! ```

use glam::DVec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::body::Body;
use crate::error::SimulationError;

/// Description of a starting body set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioConfig {
    /// Heavy central body with one light body in orbit
    SunAndPlanet,
    /// Two bodies at rest on the x axis, centered on the origin
    TwoBody {
        /// Separation
        distance: f64,
        /// Mass of the body at -x
        m1: f64,
        /// Mass of the body at +x
        m2: f64,
    },
    /// Bodies scattered uniformly through a ball
    RandomCluster {
        /// Number of bodies
        count: usize,
        /// Ball radius
        radius: f64,
        /// RNG seed
        seed: u64,
    },
    /// Explicit body list
    Custom {
        /// The bodies
        bodies: Vec<Body>,
    },
}

impl ScenarioConfig {
    /// Parse a scenario from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Config`] if the JSON does not describe a
    /// scenario.
    pub fn from_json(json: &str) -> Result<Self, SimulationError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Produce the body list.
    #[must_use]
    pub fn bodies(&self) -> Vec<Body> {
        match self {
            Self::SunAndPlanet => sun_and_planet(),
            Self::TwoBody { distance, m1, m2 } => two_body(*distance, *m1, *m2),
            Self::RandomCluster { count, radius, seed } => random_cluster(*count, *radius, *seed),
            Self::Custom { bodies } => bodies.clone(),
        }
    }
}

/// A mass-100 body at the origin and a mass-1 body at `(30, 0, 0)` moving
/// along +z at 0.4.
#[must_use]
pub fn sun_and_planet() -> Vec<Body> {
    vec![
        Body::at_rest(DVec3::ZERO, 100.0),
        Body::new(DVec3::new(30.0, 0.0, 0.0), DVec3::new(0.0, 0.0, 0.4), 1.0),
    ]
}

/// Two bodies at rest, `distance` apart along x.
#[must_use]
pub fn two_body(distance: f64, m1: f64, m2: f64) -> Vec<Body> {
    vec![
        Body::at_rest(DVec3::new(-distance / 2.0, 0.0, 0.0), m1),
        Body::at_rest(DVec3::new(distance / 2.0, 0.0, 0.0), m2),
    ]
}

/// `count` bodies at rest, uniform in a ball of `radius`, masses in
/// `[0.5, 1.5)`.
#[must_use]
pub fn random_cluster(count: usize, radius: f64, seed: u64) -> Vec<Body> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let bodies: Vec<Body> = (0..count)
        .map(|_| {
            // Rejection sample the unit ball
            let direction = loop {
                let candidate = DVec3::new(
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                );
                if candidate.length_squared() <= 1.0 {
                    break candidate;
                }
            };
            let mass = rng.gen_range(0.5..1.5);
            Body::at_rest(direction * radius, mass)
        })
        .collect();

    debug!(count, radius, seed, "generated random cluster");
    bodies
}
