//! Population membership and bookkeeping.

use crate::particle::Particle;
use crate::snapshot::ParticleState;
use tracing::warn;
use tsgen_core::ParticleId;

/// A particle together with the identity the population assigned it
#[derive(Debug, Clone)]
pub struct Member {
    pub id: ParticleId,
    pub parent: Option<ParticleId>,
    pub birth_step: u64,
    pub particle: Particle,
}

impl Member {
    pub fn state(&self) -> ParticleState {
        ParticleState::capture(self.id, self.parent, self.birth_step, &self.particle)
    }
}

/// Ordered collection of live particles.
///
/// Ids are handed out sequentially and never reused within a population.
#[derive(Debug, Clone, Default)]
pub struct Population {
    members: Vec<Member>,
    next_id: u64,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the initial population, skipping particles that are already dead.
    pub fn from_particles(particles: impl IntoIterator<Item = Particle>) -> Self {
        let mut population = Self::new();
        for (index, particle) in particles.into_iter().enumerate() {
            if particle.is_alive() {
                population.insert(particle, None, 0);
            } else {
                warn!(index, "Skipping dead particle in initial population");
            }
        }
        population
    }

    /// Add a live particle and return its new id.
    pub fn insert(&mut self, particle: Particle, parent: Option<ParticleId>, birth_step: u64) -> ParticleId {
        let id = ParticleId(self.next_id);
        self.next_id += 1;
        self.members.push(Member {
            id,
            parent,
            birth_step,
            particle,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Member> {
        self.members.iter()
    }

    pub(crate) fn members_mut(&mut self) -> &mut [Member] {
        &mut self.members
    }

    pub fn alive_count(&self) -> usize {
        self.members.iter().filter(|m| m.particle.is_alive()).count()
    }

    /// Keep only the members whose position in `keep` is true and return how
    /// many were removed.
    pub(crate) fn retain_mask(&mut self, keep: &[bool]) -> usize {
        debug_assert_eq!(keep.len(), self.members.len());
        let before = self.members.len();
        let mut index = 0;
        self.members.retain(|_| {
            let kept = keep[index];
            index += 1;
            kept
        });
        before - self.members.len()
    }

    /// Observable state of every member, in population order
    pub fn states(&self) -> Vec<ParticleState> {
        self.members.iter().map(Member::state).collect()
    }
}
