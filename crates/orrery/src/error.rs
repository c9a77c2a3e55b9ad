//! Simulation errors.

use bhtree::{BuildError, InvalidGravity};
use thiserror::Error;

/// Errors raised while configuring or stepping a simulation.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The per-step octree could not be built
    #[error("octree build failed: {0}")]
    Tree(#[from] BuildError),

    /// Time step was zero, negative, or not finite
    #[error("invalid time step: {0}")]
    InvalidTimeStep(f64),

    /// A body has non-finite state or negative mass
    #[error("body {index} has invalid state")]
    InvalidBody {
        /// Index of the offending body
        index: usize,
    },

    /// The gravity settings are out of range
    #[error("invalid gravity config: {0}")]
    InvalidGravity(#[from] InvalidGravity),

    /// A force model returned the wrong number of accelerations
    #[error("force model returned {actual} accelerations for {expected} bodies")]
    AccelerationCount {
        /// Number of bodies
        expected: usize,
        /// Number of accelerations returned
        actual: usize,
    },

    /// A scenario or simulation config could not be parsed
    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),
}
