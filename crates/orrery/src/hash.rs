//! State hashing for determinism verification.
//!
//! Two simulations given identical bodies, config and steps must produce
//! identical hashes, including when force evaluation runs in parallel.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use glam::DVec3;

use crate::simulation::Simulation;

/// Compute a deterministic hash of simulation state.
///
/// Covers tick, time, and every body's position, velocity and mass in
/// order. Floats are hashed by bit pattern.
#[must_use]
pub fn hash_simulation(sim: &Simulation) -> u64 {
    let mut hasher = DefaultHasher::new();

    sim.tick().hash(&mut hasher);
    sim.time().to_bits().hash(&mut hasher);

    sim.bodies().len().hash(&mut hasher);
    for body in sim.bodies() {
        hash_vec(body.position, &mut hasher);
        hash_vec(body.velocity, &mut hasher);
        body.mass.to_bits().hash(&mut hasher);
    }

    hasher.finish()
}

fn hash_vec<H: Hasher>(v: DVec3, hasher: &mut H) {
    v.x.to_bits().hash(hasher);
    v.y.to_bits().hash(hasher);
    v.z.to_bits().hash(hasher);
}
