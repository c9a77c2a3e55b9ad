//! # Orrery
//!
//! N-body gravity simulation driven by a Barnes–Hut octree.
//!
//! Orrery owns body state (position, velocity, mass) and advances it in
//! time. Each step it asks a [`ForceModel`] for accelerations, either by
//! direct O(n²) summation or by building a fresh [`bhtree::Octree`] and
//! querying it for every body in parallel.
//!
//! ## Architecture
//!
//! - **Bodies**: plain state, validated before every step
//! - **Force models**: [`DirectSum`] and [`BarnesHut`] behind one trait
//! - **Integrators**: velocity Verlet and leapfrog
//! - **Scenarios**: seeded, reproducible initial conditions
//!
//! ## Usage
//!
//! ```rust
//! use orrery::{ScenarioConfig, Simulation, SimulationConfig};
//!
//! let bodies = ScenarioConfig::SunAndPlanet.bodies();
//! let mut sim = Simulation::new(bodies, SimulationConfig::default()).unwrap();
//! sim.run(10, 0.01).unwrap();
//! assert_eq!(sim.tick(), 10);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export the tree for diagnostics and custom force models
pub use bhtree;

pub mod body;
pub mod error;
pub mod force;
pub mod hash;
pub mod integrator;
pub mod scenario;
pub mod simulation;

#[cfg(test)]
mod tests;

pub use body::Body;
pub use error::SimulationError;
pub use force::{BarnesHut, DirectSum, ForceKind, ForceModel};
pub use hash::hash_simulation;
pub use integrator::Integrator;
pub use scenario::ScenarioConfig;
pub use simulation::{Simulation, SimulationConfig};
