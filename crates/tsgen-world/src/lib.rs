//! Particle population engine.
//!
//! This crate implements the branching particles, the population that holds
//! them, and the driver that turns an initial population into a timeseries.

pub mod particle;
pub mod population;
pub mod scenario;
pub mod simulation;
pub mod snapshot;

#[cfg(test)]
mod testing;

pub use particle::{Fate, Particle};
pub use population::{Member, Population};
pub use scenario::Scenario;
pub use simulation::Simulation;
pub use snapshot::{ParticleState, RunStats, Snapshot, Timeseries};
