//! Time-stepping driver for a branching particle population.
//!
//! Each step runs in three phases over the live population, always in this
//! order: a death trial for every particle, a move for every survivor, then a
//! birth trial for every survivor using its post-move state. Deaths, failures
//! and newborns are folded into the population only once all three phases
//! are done, so the snapshot for a step holds the moved survivors followed by
//! that step's newborns.

use crate::particle::{Fate, Particle};
use crate::population::Population;
use crate::snapshot::{RunStats, Snapshot, Timeseries};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, instrument, trace, warn};
use tsgen_core::{
    DrawOrder, Error, ErrorPolicy, Overrides, ParticleId, RandomSource, Result, SeededSource,
    SimulationConfig,
};

pub struct Simulation {
    config: SimulationConfig,
    population: Population,
    rng: SeededSource,
    current_step: u64,
    time: f64,
    stats: RunStats,
    /// Step at which a particle error stopped the run under `ErrorPolicy::Abort`
    aborted_at: Option<u64>,
}

/// Per-step results collected before membership changes are applied
struct StepOutcome {
    /// Parallel to the population: false for members leaving this step
    keep: Vec<bool>,
    deaths: u64,
    failures: u64,
    newborns: Vec<(ParticleId, Particle)>,
}

impl StepOutcome {
    fn new(len: usize) -> Self {
        Self {
            keep: vec![true; len],
            deaths: 0,
            failures: 0,
            newborns: Vec::new(),
        }
    }
}

enum MemberOutcome {
    Died,
    Survived { offspring: Option<Particle> },
}

impl Simulation {
    pub fn new(config: SimulationConfig, initial: impl IntoIterator<Item = Particle>) -> Result<Self> {
        config.validate()?;

        let population = Population::from_particles(initial);
        let stats = RunStats {
            peak_population: population.len(),
            final_population: population.len(),
            ..Default::default()
        };

        Ok(Self {
            rng: SeededSource::from_seed(config.seed),
            time: config.start_time,
            config,
            population,
            current_step: 0,
            stats,
            aborted_at: None,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Number of steps completed so far
    pub fn current_step(&self) -> u64 {
        self.current_step
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn is_finished(&self) -> bool {
        self.current_step >= self.config.num_steps
    }

    /// Whether a failed step left the population partially updated.
    ///
    /// An aborted simulation refuses to advance any further.
    pub fn is_aborted(&self) -> bool {
        self.aborted_at.is_some()
    }

    fn ensure_not_aborted(&self) -> Result<()> {
        match self.aborted_at {
            Some(step) => Err(Error::InvalidState(format!(
                "simulation aborted during step {step}; build a new one to rerun"
            ))),
            None => Ok(()),
        }
    }

    /// Run every remaining step and collect their snapshots.
    #[instrument(skip(self), fields(num_steps = self.config.num_steps, seed = self.config.seed))]
    pub fn run(&mut self) -> Result<Timeseries> {
        self.run_until(|| false)
    }

    /// Like [`Simulation::run`], but checks `cancel` before every step and
    /// stops with [`Error::Cancelled`] once it is set.
    #[instrument(skip(self, cancel), fields(num_steps = self.config.num_steps, seed = self.config.seed))]
    pub fn run_with_cancel(&mut self, cancel: &AtomicBool) -> Result<Timeseries> {
        self.run_until(|| cancel.load(Ordering::Relaxed))
    }

    fn run_until(&mut self, cancelled: impl Fn() -> bool) -> Result<Timeseries> {
        self.ensure_not_aborted()?;
        if self.is_finished() {
            return Err(Error::InvalidState(
                "simulation already ran to completion; build a new one to rerun".to_string(),
            ));
        }

        info!(
            "Starting simulation for {} steps with {} particles",
            self.config.num_steps - self.current_step,
            self.population.len()
        );

        let remaining = (self.config.num_steps - self.current_step) as usize;
        let mut snapshots = Vec::with_capacity(remaining);
        while !self.is_finished() {
            if cancelled() {
                warn!(step = self.current_step, "Simulation cancelled");
                return Err(Error::Cancelled {
                    step: self.current_step,
                });
            }
            if let Some(snapshot) = self.step()? {
                snapshots.push(snapshot);
            }
        }

        self.emit_run_summary();

        Ok(Timeseries {
            seed: self.config.seed,
            snapshots,
            stats: self.stats.clone(),
        })
    }

    /// Advance one step and return its snapshot, or `None` once every
    /// configured step has run.
    ///
    /// A particle error under `ErrorPolicy::Abort` leaves the step half
    /// applied, so every later call fails with [`Error::InvalidState`].
    pub fn step(&mut self) -> Result<Option<Snapshot>> {
        self.ensure_not_aborted()?;
        if self.is_finished() {
            return Ok(None);
        }

        let step = self.current_step;
        let dtime = self.config.time_step.dtime(step).ok_or_else(|| {
            Error::InvalidState(format!("no dtime configured for step {step}"))
        })?;

        let evaluated = match self.config.draw_order {
            DrawOrder::Sequential => self.evaluate_sequential(step, dtime),
            DrawOrder::PerParticle => self.evaluate_per_particle(step, dtime),
        };
        let outcome = match evaluated {
            Ok(outcome) => outcome,
            Err(err) => {
                self.aborted_at = Some(step);
                warn!(step, error = %err, "Step aborted, simulation cannot advance further");
                return Err(err);
            }
        };

        self.population.retain_mask(&outcome.keep);
        debug_assert_eq!(self.population.alive_count(), self.population.len());

        let mut births = 0;
        let mut dropped_births = 0;
        for (parent, child) in outcome.newborns {
            if let Some(cap) = self.config.max_population {
                if self.population.len() >= cap {
                    dropped_births += 1;
                    continue;
                }
            }
            let child_id = self.population.insert(child, Some(parent), step + 1);
            births += 1;
            trace!(step, parent_id = %parent, child_id = %child_id, "Particle born");
        }

        if dropped_births > 0 {
            warn!(
                step,
                dropped_births,
                max_population = self.config.max_population,
                "Population cap reached, dropping births"
            );
        }

        self.time += dtime;
        self.current_step += 1;

        let population = self.population.len();
        self.stats.steps += 1;
        self.stats.births += births;
        self.stats.deaths += outcome.deaths;
        self.stats.dropped_births += dropped_births;
        self.stats.dropped_particles += outcome.failures;
        self.stats.peak_population = self.stats.peak_population.max(population);
        self.stats.final_population = population;

        debug!(
            step,
            time = self.time,
            population,
            births,
            deaths = outcome.deaths,
            "Step complete"
        );
        if step % 1000 == 0 {
            info!(
                "Step {}/{}: {} particles alive",
                step, self.config.num_steps, population
            );
        }

        Ok(Some(Snapshot {
            step,
            time: self.time,
            dtime,
            particles: self.population.states(),
        }))
    }

    /// One shared stream, consumed phase by phase in population order.
    fn evaluate_sequential(&mut self, step: u64, dtime: f64) -> Result<StepOutcome> {
        let policy = self.config.error_policy;
        let overrides = &self.config.offspring_overrides;
        let members = self.population.members_mut();
        let mut outcome = StepOutcome::new(members.len());

        for (keep, member) in outcome.keep.iter_mut().zip(members.iter_mut()) {
            match member.particle.survive(dtime, &mut self.rng) {
                Ok(Fate::Survived) => {}
                Ok(Fate::Died) => {
                    *keep = false;
                    outcome.deaths += 1;
                    trace!(step, particle_id = %member.id, "Particle died");
                }
                Err(err) => {
                    absorb(policy, step, member.id, err)?;
                    *keep = false;
                    outcome.failures += 1;
                }
            }
        }

        for (keep, member) in outcome.keep.iter_mut().zip(members.iter_mut()) {
            if !*keep {
                continue;
            }
            if let Err(err) = member.particle.advance(dtime, &mut self.rng) {
                absorb(policy, step, member.id, err)?;
                *keep = false;
                outcome.failures += 1;
            }
        }

        for (keep, member) in outcome.keep.iter_mut().zip(members.iter()) {
            if !*keep {
                continue;
            }
            match member.particle.reproduce(dtime, overrides, &mut self.rng) {
                Ok(Some(child)) => outcome.newborns.push((member.id, child)),
                Ok(None) => {}
                Err(err) => {
                    absorb(policy, step, member.id, err)?;
                    *keep = false;
                    outcome.failures += 1;
                }
            }
        }

        Ok(outcome)
    }

    /// An independent stream per particle id and step, so each particle's
    /// evolution does not depend on the rest of the population.
    fn evaluate_per_particle(&mut self, step: u64, dtime: f64) -> Result<StepOutcome> {
        let policy = self.config.error_policy;
        let overrides = &self.config.offspring_overrides;
        let members = self.population.members_mut();
        let mut outcome = StepOutcome::new(members.len());

        for (keep, member) in outcome.keep.iter_mut().zip(members.iter_mut()) {
            let mut rng = self.rng.substream(member.id.0, step);
            match evaluate_member(&mut member.particle, dtime, overrides, &mut rng) {
                Ok(MemberOutcome::Died) => {
                    *keep = false;
                    outcome.deaths += 1;
                    trace!(step, particle_id = %member.id, "Particle died");
                }
                Ok(MemberOutcome::Survived { offspring }) => {
                    if let Some(child) = offspring {
                        outcome.newborns.push((member.id, child));
                    }
                }
                Err(err) => {
                    absorb(policy, step, member.id, err)?;
                    *keep = false;
                    outcome.failures += 1;
                }
            }
        }

        Ok(outcome)
    }

    fn emit_run_summary(&self) {
        info!(
            event = "run_summary",
            seed = self.config.seed,
            steps = self.stats.steps,
            final_time = self.time,
            births = self.stats.births,
            deaths = self.stats.deaths,
            dropped_births = self.stats.dropped_births,
            dropped_particles = self.stats.dropped_particles,
            peak_population = self.stats.peak_population,
            final_population = self.stats.final_population,
            "Simulation complete"
        );
    }
}

/// Survive, move and reproduce one particle on its own stream.
fn evaluate_member<R: RandomSource + ?Sized>(
    particle: &mut Particle,
    dtime: f64,
    overrides: &Overrides,
    rng: &mut R,
) -> Result<MemberOutcome> {
    if particle.survive(dtime, rng)? == Fate::Died {
        return Ok(MemberOutcome::Died);
    }
    particle.advance(dtime, rng)?;
    let offspring = particle.reproduce(dtime, overrides, rng)?;
    Ok(MemberOutcome::Survived { offspring })
}

/// Apply the run's error policy to a failed particle operation.
fn absorb(policy: ErrorPolicy, step: u64, id: ParticleId, err: Error) -> Result<()> {
    match policy {
        ErrorPolicy::Abort => Err(err),
        ErrorPolicy::DropParticle => {
            warn!(step, particle_id = %id, error = %err, "Dropping particle after failed operation");
            Ok(())
        }
    }
}
