//! Test setup utilities.

use bhtree::Gravity;
use glam::DVec3;

use crate::body::Body;
use crate::force::ForceKind;
use crate::scenario::random_cluster;
use crate::simulation::{Simulation, SimulationConfig};

// =============================================================================
// Logging
// =============================================================================

/// Route tracing output through the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

// =============================================================================
// Simulation Setup
// =============================================================================

/// Config with the given force model and a small softening.
pub fn config_with(force: ForceKind) -> SimulationConfig {
    SimulationConfig::default().with_force(force).with_gravity(Gravity {
        softening: 0.01,
        ..Gravity::default()
    })
}

/// A seeded random cluster simulation.
pub fn cluster_simulation(count: usize, seed: u64, force: ForceKind) -> Simulation {
    Simulation::new(random_cluster(count, 10.0, seed), config_with(force)).unwrap()
}

/// Two unit masses one unit apart on a circular orbit about the origin.
pub fn circular_binary() -> Vec<Body> {
    // v² = G m / (2 d) for equal masses m separated by d
    let speed = 0.5_f64.sqrt();
    vec![
        Body::new(DVec3::new(-0.5, 0.0, 0.0), DVec3::new(0.0, -speed, 0.0), 1.0),
        Body::new(DVec3::new(0.5, 0.0, 0.0), DVec3::new(0.0, speed, 0.0), 1.0),
    ]
}

// =============================================================================
// Assertions
// =============================================================================

/// Aggregate relative error of `actual` against `expected`.
pub fn relative_error(actual: &[DVec3], expected: &[DVec3]) -> f64 {
    let error: f64 = actual.iter().zip(expected).map(|(a, e)| a.distance(*e)).sum();
    let magnitude: f64 = expected.iter().map(|e| e.length()).sum();
    error / magnitude
}
