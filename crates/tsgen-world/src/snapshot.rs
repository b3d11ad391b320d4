//! Per-step population snapshots and run output.

use crate::particle::Particle;
use serde::{Deserialize, Serialize};
use tsgen_core::ParticleId;

/// Observable state of one particle at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleState {
    pub id: ParticleId,
    pub parent: Option<ParticleId>,
    pub birth_step: u64,
    pub location: Vec<f64>,
    pub velocity: Vec<f64>,
    pub acceleration: Vec<f64>,
    pub weight: f64,
}

impl ParticleState {
    pub fn capture(id: ParticleId, parent: Option<ParticleId>, birth_step: u64, particle: &Particle) -> Self {
        Self {
            id,
            parent,
            birth_step,
            location: particle.location().to_vec(),
            velocity: particle.velocity().to_vec(),
            acceleration: particle.acceleration().to_vec(),
            weight: particle.weight(),
        }
    }
}

/// Living population at the end of one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Zero-based index of the step that produced this snapshot
    pub step: u64,
    /// Simulation time after the step
    pub time: f64,
    /// Step size used
    pub dtime: f64,
    pub particles: Vec<ParticleState>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn get(&self, id: ParticleId) -> Option<&ParticleState> {
        self.particles.iter().find(|p| p.id == id)
    }

    /// Weighted centroid of particle locations, `None` for an empty
    /// snapshot or zero total weight
    pub fn centroid(&self) -> Option<Vec<f64>> {
        let first = self.particles.first()?;
        let total: f64 = self.particles.iter().map(|p| p.weight).sum();
        if total == 0.0 {
            return None;
        }

        let mut centroid = vec![0.0; first.location.len()];
        for particle in &self.particles {
            for (c, x) in centroid.iter_mut().zip(&particle.location) {
                *c += particle.weight * x;
            }
        }
        centroid.iter_mut().for_each(|c| *c /= total);
        Some(centroid)
    }
}

/// Counters accumulated over a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub steps: u64,
    pub births: u64,
    pub deaths: u64,
    /// Births discarded by the population cap
    pub dropped_births: u64,
    /// Particles removed after a failed operation
    pub dropped_particles: u64,
    pub peak_population: usize,
    pub final_population: usize,
}

/// Ordered per-step snapshots of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeseries {
    pub seed: u64,
    pub snapshots: Vec<Snapshot>,
    pub stats: RunStats,
}

impl Timeseries {
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }

    /// Population size after each step
    pub fn population_sizes(&self) -> Vec<usize> {
        self.snapshots.iter().map(Snapshot::len).collect()
    }

    /// Location of one particle over time, for the steps where it was alive
    pub fn trajectory(&self, id: ParticleId) -> Vec<(f64, Vec<f64>)> {
        self.snapshots
            .iter()
            .filter_map(|s| s.get(id).map(|p| (s.time, p.location.clone())))
            .collect()
    }
}
