//! Fixed-step time integrators.
//!
//! Both schemes are symplectic and second order. They differ in how many
//! force evaluations a step costs.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::error::SimulationError;
use crate::force::ForceModel;

/// Time integration scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Integrator {
    /// Kick-drift-kick with two force evaluations per step
    #[default]
    VelocityVerlet,
    /// Drift-kick-drift with one force evaluation per step
    Leapfrog,
}

impl Integrator {
    /// Advance `bodies` in place by `dt`.
    ///
    /// # Errors
    ///
    /// Propagates force model failures, and returns
    /// [`SimulationError::AccelerationCount`] if the model does not return
    /// one acceleration per body. `bodies` may be partially updated on
    /// error; callers that need atomic steps should work on a copy.
    pub fn step(self, bodies: &mut [Body], dt: f64, force: &dyn ForceModel) -> Result<(), SimulationError> {
        match self {
            Self::VelocityVerlet => velocity_verlet(bodies, dt, force),
            Self::Leapfrog => leapfrog(bodies, dt, force),
        }
    }
}

fn velocity_verlet(bodies: &mut [Body], dt: f64, force: &dyn ForceModel) -> Result<(), SimulationError> {
    let half_dt = 0.5 * dt;

    // v(n+1/2) = v(n) + dt/2 a(n)
    let a_old = evaluate(force, bodies)?;
    kick(bodies, &a_old, half_dt);

    // x(n+1) = x(n) + dt v(n+1/2)
    drift(bodies, dt);

    // v(n+1) = v(n+1/2) + dt/2 a(n+1)
    let a_new = evaluate(force, bodies)?;
    kick(bodies, &a_new, half_dt);

    Ok(())
}

fn leapfrog(bodies: &mut [Body], dt: f64, force: &dyn ForceModel) -> Result<(), SimulationError> {
    let half_dt = 0.5 * dt;

    drift(bodies, half_dt);
    let a_mid = evaluate(force, bodies)?;
    kick(bodies, &a_mid, dt);
    drift(bodies, half_dt);

    Ok(())
}

fn evaluate(force: &dyn ForceModel, bodies: &[Body]) -> Result<Vec<DVec3>, SimulationError> {
    let accelerations = force.accelerations(bodies)?;
    if accelerations.len() != bodies.len() {
        return Err(SimulationError::AccelerationCount {
            expected: bodies.len(),
            actual: accelerations.len(),
        });
    }
    Ok(accelerations)
}

fn kick(bodies: &mut [Body], accelerations: &[DVec3], dt: f64) {
    for (body, a) in bodies.iter_mut().zip(accelerations) {
        body.velocity += *a * dt;
    }
}

fn drift(bodies: &mut [Body], dt: f64) {
    for body in bodies.iter_mut() {
        body.position += body.velocity * dt;
    }
}
