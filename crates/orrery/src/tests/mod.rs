//! Determinism and integration tests for the simulation driver.
//!
//! - `determinism.rs`: same inputs produce bit-identical state
//! - `integration.rs`: end-to-end stepping, conservation, error paths
//! - `helpers.rs`: shared setup

mod helpers;
