//! Particle state and its stochastic update rules.

use tsgen_core::{
    check_probability, DiffusionParameter, DiffusionQuantity, Error, Overrides, ParticleConfig,
    RandomSource, Rate, Result,
};

/// Outcome of a survival trial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fate {
    Survived,
    Died,
}

/// A single particle with kinematic state and branching rates.
///
/// All four per-dimension vectors share one length, fixed at construction.
/// Once `survive` reports a death the particle rejects every further
/// operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    location: Vec<f64>,
    velocity: Vec<f64>,
    acceleration: Vec<f64>,
    diffusion_parameter: Vec<f64>,
    diffusion_quantity: DiffusionQuantity,
    weight: f64,
    fertility: f64,
    mortality: f64,
    alive: bool,
}

impl Particle {
    pub fn new(config: ParticleConfig) -> Result<Self> {
        let dimension = config.location.len();
        if dimension == 0 {
            return Err(Error::Validation(
                "location must have at least one dimension".to_string(),
            ));
        }

        let velocity = sized_or_zero("velocity", config.velocity, dimension)?;
        let acceleration = sized_or_zero("acceleration", config.acceleration, dimension)?;
        let diffusion_parameter = config.diffusion_parameter.resolve(dimension)?;

        check_rate("fertility", config.fertility)?;
        check_rate("mortality", config.mortality)?;

        Ok(Self {
            location: config.location,
            velocity,
            acceleration,
            diffusion_parameter,
            diffusion_quantity: config.diffusion_quantity,
            weight: config.weight,
            fertility: config.fertility,
            mortality: config.mortality,
            alive: true,
        })
    }

    pub fn dimension(&self) -> usize {
        self.location.len()
    }

    pub fn location(&self) -> &[f64] {
        &self.location
    }

    pub fn velocity(&self) -> &[f64] {
        &self.velocity
    }

    pub fn acceleration(&self) -> &[f64] {
        &self.acceleration
    }

    pub fn diffusion_parameter(&self) -> &[f64] {
        &self.diffusion_parameter
    }

    pub fn diffusion_quantity(&self) -> DiffusionQuantity {
        self.diffusion_quantity
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn fertility(&self) -> f64 {
        self.fertility
    }

    pub fn mortality(&self) -> f64 {
        self.mortality
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Advance the particle by one Euler-Maruyama step of length `dtime`.
    ///
    /// A normal increment with variance `diffusion_parameter[i] * dtime` is
    /// added to each component of the diffusing vector, then velocity and
    /// location are integrated semi-implicitly: velocity first, location from
    /// the updated velocity.
    pub fn advance<R: RandomSource + ?Sized>(&mut self, dtime: f64, rng: &mut R) -> Result<()> {
        self.ensure_alive("move")?;
        if !dtime.is_finite() || dtime < 0.0 {
            return Err(Error::Validation(format!(
                "dtime must be finite and non-negative, got {dtime}"
            )));
        }

        let target = match self.diffusion_quantity {
            DiffusionQuantity::Location => &mut self.location,
            DiffusionQuantity::Velocity => &mut self.velocity,
            DiffusionQuantity::Acceleration => &mut self.acceleration,
        };
        for (value, coefficient) in target.iter_mut().zip(&self.diffusion_parameter) {
            *value += rng.normal((coefficient * dtime).sqrt());
        }

        for (v, a) in self.velocity.iter_mut().zip(&self.acceleration) {
            *v += dtime * a;
        }
        for (x, v) in self.location.iter_mut().zip(&self.velocity) {
            *x += dtime * v;
        }

        Ok(())
    }

    /// Attempt one birth over an interval of length `dtime`.
    ///
    /// Returns the offspring on success and `None` otherwise. Fields missing
    /// from `overrides` are copied from this particle's current state.
    pub fn reproduce<R: RandomSource + ?Sized>(
        &self,
        dtime: f64,
        overrides: &Overrides,
        rng: &mut R,
    ) -> Result<Option<Particle>> {
        self.ensure_alive("reproduce")?;
        let probability = check_probability(Rate::Fertility, self.fertility * dtime)?;

        // Infertile particles never consume a draw.
        if self.fertility == 0.0 || !rng.bernoulli(probability)? {
            return Ok(None);
        }

        Particle::new(self.offspring_config(overrides)).map(Some)
    }

    /// Run one death trial over an interval of length `dtime`.
    pub fn survive<R: RandomSource + ?Sized>(&mut self, dtime: f64, rng: &mut R) -> Result<Fate> {
        self.ensure_alive("survive")?;
        let probability = check_probability(Rate::Mortality, self.mortality * dtime)?;

        if rng.bernoulli(probability)? {
            self.alive = false;
            Ok(Fate::Died)
        } else {
            Ok(Fate::Survived)
        }
    }

    fn offspring_config(&self, overrides: &Overrides) -> ParticleConfig {
        ParticleConfig {
            location: overrides
                .location
                .clone()
                .unwrap_or_else(|| self.location.clone()),
            velocity: Some(
                overrides
                    .velocity
                    .clone()
                    .unwrap_or_else(|| self.velocity.clone()),
            ),
            acceleration: Some(
                overrides
                    .acceleration
                    .clone()
                    .unwrap_or_else(|| self.acceleration.clone()),
            ),
            diffusion_parameter: overrides
                .diffusion_parameter
                .clone()
                .unwrap_or_else(|| DiffusionParameter::Vector(self.diffusion_parameter.clone())),
            diffusion_quantity: overrides
                .diffusion_quantity
                .unwrap_or(self.diffusion_quantity),
            weight: overrides.weight.unwrap_or(self.weight),
            fertility: overrides.fertility.unwrap_or(self.fertility),
            mortality: overrides.mortality.unwrap_or(self.mortality),
        }
    }

    fn ensure_alive(&self, operation: &'static str) -> Result<()> {
        if self.alive {
            Ok(())
        } else {
            Err(Error::DeadParticleOperation { operation })
        }
    }
}

fn sized_or_zero(field: &'static str, values: Option<Vec<f64>>, dimension: usize) -> Result<Vec<f64>> {
    match values {
        None => Ok(vec![0.0; dimension]),
        Some(values) if values.len() == dimension => Ok(values),
        Some(values) => Err(Error::DimensionMismatch {
            field,
            expected: dimension,
            found: values.len(),
        }),
    }
}

fn check_rate(name: &str, rate: f64) -> Result<()> {
    if rate.is_finite() && rate >= 0.0 {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "{name} must be finite and non-negative, got {rate}"
        )))
    }
}
