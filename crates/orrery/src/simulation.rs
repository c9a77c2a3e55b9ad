//! Simulation driver.
//!
//! `Simulation` owns the body state and advances it with the configured
//! integrator and force model. The Barnes–Hut tree is rebuilt from scratch
//! inside every force evaluation and never outlives it.
//!
//! # Atomic steps
//!
//! A step integrates into a copy of the bodies and only swaps it in once
//! every force evaluation succeeded and the result is finite. A failed step
//! leaves the simulation exactly as it was.

use std::fmt;

use bhtree::{Gravity, Octree, OctreeConfig};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::body::Body;
use crate::error::SimulationError;
use crate::force::{BarnesHut, DirectSum, ForceKind, ForceModel};
use crate::integrator::Integrator;

/// Configuration for a simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Force model
    pub force: ForceKind,
    /// Time integration scheme
    pub integrator: Integrator,
    /// Gravity law and opening threshold
    pub gravity: Gravity,
    /// Octree settings (Barnes–Hut only)
    pub tree: OctreeConfig,
}

impl SimulationConfig {
    /// Parse a config from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Config`] on malformed JSON and
    /// [`SimulationError::InvalidGravity`] for out-of-range gravity settings.
    pub fn from_json(json: &str) -> Result<Self, SimulationError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the gravity settings.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidGravity`] naming the bad field.
    pub fn validate(&self) -> Result<(), SimulationError> {
        Ok(self.gravity.validate()?)
    }

    /// Set the force model.
    #[must_use]
    pub fn with_force(mut self, force: ForceKind) -> Self {
        self.force = force;
        self
    }

    /// Set the integrator.
    #[must_use]
    pub fn with_integrator(mut self, integrator: Integrator) -> Self {
        self.integrator = integrator;
        self
    }

    /// Set the gravity settings.
    #[must_use]
    pub fn with_gravity(mut self, gravity: Gravity) -> Self {
        self.gravity = gravity;
        self
    }

    /// Instantiate the configured force model.
    #[must_use]
    pub fn force_model(&self) -> Box<dyn ForceModel> {
        match self.force {
            ForceKind::Direct => Box::new(DirectSum::from_gravity(&self.gravity)),
            ForceKind::BarnesHut => Box::new(BarnesHut {
                gravity: self.gravity,
                tree: self.tree,
            }),
        }
    }
}

/// An N-body system advancing in time.
pub struct Simulation {
    /// Current body state
    bodies: Vec<Body>,
    /// Configuration
    config: SimulationConfig,
    /// Force model built from `config`
    force: Box<dyn ForceModel>,
    /// Steps taken
    tick: u64,
    /// Simulated time
    time: f64,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("bodies", &format!("[{} bodies]", self.bodies.len()))
            .field("config", &self.config)
            .field("force", &self.force.name())
            .field("tick", &self.tick)
            .field("time", &self.time)
            .finish()
    }
}

impl Simulation {
    /// Create a simulation at tick 0.
    ///
    /// # Errors
    ///
    /// - [`SimulationError::InvalidGravity`] for out-of-range gravity settings
    /// - [`SimulationError::InvalidBody`] for the first body with non-finite
    ///   state or negative mass
    pub fn new(bodies: Vec<Body>, config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        validate(&bodies)?;
        Ok(Self {
            bodies,
            force: config.force_model(),
            config,
            tick: 0,
            time: 0.0,
        })
    }

    /// Replace the force model with a custom one.
    #[must_use]
    pub fn with_force_model(mut self, force: Box<dyn ForceModel>) -> Self {
        self.force = force;
        self
    }

    /// Current body state.
    #[must_use]
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Configuration.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Steps taken so far.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated time so far.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Advance by one step of length `dt`.
    ///
    /// # Errors
    ///
    /// - [`SimulationError::InvalidTimeStep`] if `dt` is not finite and positive
    /// - any force model error
    /// - [`SimulationError::InvalidBody`] if the step produced non-finite state
    ///
    /// On error the simulation is unchanged.
    pub fn step(&mut self, dt: f64) -> Result<(), SimulationError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SimulationError::InvalidTimeStep(dt));
        }

        let mut next = self.bodies.clone();
        self.config.integrator.step(&mut next, dt, self.force.as_ref())?;
        validate(&next)?;

        self.bodies = next;
        self.tick += 1;
        self.time += dt;

        trace!(tick = self.tick, time = self.time, force = self.force.name(), "step");
        Ok(())
    }

    /// Take `steps` steps of length `dt`.
    ///
    /// # Errors
    ///
    /// Stops at the first failing step and returns its error; earlier steps
    /// are kept.
    pub fn run(&mut self, steps: u64, dt: f64) -> Result<(), SimulationError> {
        for _ in 0..steps {
            self.step(dt)?;
        }
        Ok(())
    }

    /// Accelerations for the current state.
    ///
    /// # Errors
    ///
    /// Propagates force model errors.
    pub fn accelerations(&self) -> Result<Vec<DVec3>, SimulationError> {
        self.force.accelerations(&self.bodies)
    }

    /// Build an octree over the current state for inspection.
    ///
    /// # Errors
    ///
    /// Returns the tree build error, e.g. for an empty system.
    pub fn octree(&self) -> Result<Octree<'_, Body>, SimulationError> {
        Ok(Octree::build(&self.bodies, self.config.tree)?)
    }

    /// Total linear momentum.
    #[must_use]
    pub fn total_momentum(&self) -> DVec3 {
        self.bodies.iter().map(Body::momentum).sum()
    }

    /// Mass-weighted mean position, or the origin for a massless system.
    #[must_use]
    pub fn center_of_mass(&self) -> DVec3 {
        let mass: f64 = self.bodies.iter().map(|b| b.mass).sum();
        if mass == 0.0 {
            return DVec3::ZERO;
        }
        self.bodies.iter().map(|b| b.position * b.mass).sum::<DVec3>() / mass
    }

    /// Total kinetic energy.
    #[must_use]
    pub fn kinetic_energy(&self) -> f64 {
        self.bodies.iter().map(Body::kinetic_energy).sum()
    }

    /// Total (softened) gravitational potential energy, summed pairwise.
    #[must_use]
    pub fn potential_energy(&self) -> f64 {
        let Gravity { g, softening, .. } = self.config.gravity;
        let mut energy = 0.0;
        for (i, bi) in self.bodies.iter().enumerate() {
            for bj in &self.bodies[i + 1..] {
                let dist2 = bi.position.distance_squared(bj.position) + softening;
                if dist2 > 0.0 {
                    energy -= g * bi.mass * bj.mass / dist2.sqrt();
                }
            }
        }
        energy
    }

    /// Kinetic plus potential energy.
    #[must_use]
    pub fn total_energy(&self) -> f64 {
        self.kinetic_energy() + self.potential_energy()
    }

    /// Deterministic hash of the current state.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        crate::hash::hash_simulation(self)
    }
}

fn validate(bodies: &[Body]) -> Result<(), SimulationError> {
    match bodies.iter().position(|b| !b.is_valid()) {
        Some(index) => Err(SimulationError::InvalidBody { index }),
        None => Ok(()),
    }
}
