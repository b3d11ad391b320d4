//! Configuration types for particles and simulation runs.

use crate::error::{Error, Result};
use crate::types::{DiffusionParameter, DiffusionQuantity};
use serde::{Deserialize, Serialize};

/// Field set for constructing a particle.
///
/// Missing kinematic vectors default to zeros of `location`'s length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleConfig {
    pub location: Vec<f64>,
    #[serde(default)]
    pub velocity: Option<Vec<f64>>,
    #[serde(default)]
    pub acceleration: Option<Vec<f64>>,
    #[serde(default)]
    pub diffusion_parameter: DiffusionParameter,
    #[serde(default)]
    pub diffusion_quantity: DiffusionQuantity,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub fertility: f64,
    #[serde(default)]
    pub mortality: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl ParticleConfig {
    /// A particle at `location` with every other field at its default
    pub fn at(location: Vec<f64>) -> Self {
        Self {
            location,
            velocity: None,
            acceleration: None,
            diffusion_parameter: DiffusionParameter::default(),
            diffusion_quantity: DiffusionQuantity::default(),
            weight: default_weight(),
            fertility: 0.0,
            mortality: 0.0,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec<f64>) -> Self {
        self.velocity = Some(velocity);
        self
    }

    pub fn with_acceleration(mut self, acceleration: Vec<f64>) -> Self {
        self.acceleration = Some(acceleration);
        self
    }

    pub fn with_diffusion(
        mut self,
        parameter: impl Into<DiffusionParameter>,
        quantity: DiffusionQuantity,
    ) -> Self {
        self.diffusion_parameter = parameter.into();
        self.diffusion_quantity = quantity;
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_rates(mut self, fertility: f64, mortality: f64) -> Self {
        self.fertility = fertility;
        self.mortality = mortality;
        self
    }
}

/// Offspring fields that replace the parent's values on reproduction.
///
/// Every `None` field is inherited from the parent as it is at call time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceleration: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diffusion_parameter: Option<DiffusionParameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diffusion_quantity: Option<DiffusionQuantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fertility: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mortality: Option<f64>,
}

impl Overrides {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn location(mut self, location: Vec<f64>) -> Self {
        self.location = Some(location);
        self
    }

    pub fn velocity(mut self, velocity: Vec<f64>) -> Self {
        self.velocity = Some(velocity);
        self
    }

    pub fn acceleration(mut self, acceleration: Vec<f64>) -> Self {
        self.acceleration = Some(acceleration);
        self
    }

    pub fn diffusion_parameter(mut self, parameter: impl Into<DiffusionParameter>) -> Self {
        self.diffusion_parameter = Some(parameter.into());
        self
    }

    pub fn diffusion_quantity(mut self, quantity: DiffusionQuantity) -> Self {
        self.diffusion_quantity = Some(quantity);
        self
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn fertility(mut self, fertility: f64) -> Self {
        self.fertility = Some(fertility);
        self
    }

    pub fn mortality(mut self, mortality: f64) -> Self {
        self.mortality = Some(mortality);
        self
    }
}

/// Step size for each step of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeStep {
    /// The same `dtime` on every step
    Fixed(f64),
    /// One explicit `dtime` per step
    Schedule(Vec<f64>),
}

impl TimeStep {
    /// `dtime` for the zero-based step index, `None` past the end of a
    /// schedule.
    pub fn dtime(&self, step: u64) -> Option<f64> {
        match self {
            TimeStep::Fixed(dtime) => Some(*dtime),
            TimeStep::Schedule(schedule) => usize::try_from(step)
                .ok()
                .and_then(|index| schedule.get(index).copied()),
        }
    }

    pub fn validate(&self, num_steps: u64) -> Result<()> {
        let check = |dtime: f64| {
            if dtime.is_finite() && dtime > 0.0 {
                Ok(())
            } else {
                Err(Error::Validation(format!(
                    "dtime must be finite and positive, got {dtime}"
                )))
            }
        };

        match self {
            TimeStep::Fixed(dtime) => check(*dtime),
            TimeStep::Schedule(schedule) => {
                if schedule.len() as u64 != num_steps {
                    return Err(Error::Validation(format!(
                        "dtime schedule has {} entries for {} steps",
                        schedule.len(),
                        num_steps
                    )));
                }
                schedule.iter().try_for_each(|dtime| check(*dtime))
            }
        }
    }
}

impl Default for TimeStep {
    fn default() -> Self {
        TimeStep::Fixed(0.01)
    }
}

/// Order in which random draws are consumed within a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawOrder {
    /// One shared stream, consumed phase by phase in population index order
    #[default]
    Sequential,
    /// An independent stream per particle id and step
    PerParticle,
}

/// What the driver does when a particle operation fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Stop the run and return the error
    #[default]
    Abort,
    /// Log a warning, remove the offending particle, keep going
    DropParticle,
}

/// Simulation run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of steps to run
    pub num_steps: u64,
    /// Step size, fixed or per step
    pub time_step: TimeStep,
    /// Time attached to the initial state
    pub start_time: f64,
    /// Random seed for reproducibility
    pub seed: u64,
    /// Random draw discipline
    pub draw_order: DrawOrder,
    /// Handling of particle-level failures
    pub error_policy: ErrorPolicy,
    /// Soft cap on population size; births past it are dropped
    pub max_population: Option<usize>,
    /// Overrides applied to every offspring
    pub offspring_overrides: Overrides,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_steps: 100,
            time_step: TimeStep::default(),
            start_time: 0.0,
            seed: 0,
            draw_order: DrawOrder::default(),
            error_policy: ErrorPolicy::default(),
            max_population: None,
            offspring_overrides: Overrides::default(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.num_steps == 0 {
            return Err(Error::Validation("num_steps must be positive".to_string()));
        }
        if !self.start_time.is_finite() {
            return Err(Error::Validation(format!(
                "start_time must be finite, got {}",
                self.start_time
            )));
        }
        self.time_step.validate(self.num_steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let config = SimulationConfig::default();
        assert_eq!(config.num_steps, 100);
        assert_eq!(config.draw_order, DrawOrder::Sequential);
        assert_eq!(config.error_policy, ErrorPolicy::Abort);
        assert!(config.offspring_overrides.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let config = SimulationConfig {
            num_steps: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SimulationConfig {
            time_step: TimeStep::Fixed(0.0),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SimulationConfig {
            num_steps: 3,
            time_step: TimeStep::Schedule(vec![0.1, 0.2]),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SimulationConfig {
            num_steps: 2,
            time_step: TimeStep::Schedule(vec![0.1, f64::INFINITY]),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SimulationConfig {
            num_steps: 2,
            time_step: TimeStep::Schedule(vec![0.1, 0.2]),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.time_step.dtime(1), Some(0.2));
    }

    #[test]
    fn test_dtime_past_schedule_end() {
        let schedule = TimeStep::Schedule(vec![0.1, 0.2]);
        assert_eq!(schedule.dtime(0), Some(0.1));
        assert_eq!(schedule.dtime(2), None);
        assert_eq!(schedule.dtime(u64::MAX), None);
        assert_eq!(TimeStep::Fixed(0.5).dtime(u64::MAX), Some(0.5));
    }

    #[test]
    fn test_particle_config_defaults_from_json() {
        let config: ParticleConfig = serde_json::from_str(r#"{"location": [1.0, 2.0]}"#).unwrap();
        assert_eq!(config, ParticleConfig::at(vec![1.0, 2.0]));
        assert_eq!(config.weight, 1.0);
        assert_eq!(config.diffusion_parameter, DiffusionParameter::Scalar(1.0));
    }

    #[test]
    fn test_simulation_config_serialization() {
        let json = r#"{
            "num_steps": 5,
            "time_step": {"schedule": [0.1, 0.1, 0.2, 0.2, 0.5]},
            "seed": 9,
            "draw_order": "per_particle",
            "error_policy": "drop_particle",
            "max_population": 50,
            "offspring_overrides": {"weight": 0.5}
        }"#;
        let config: SimulationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.num_steps, 5);
        assert_eq!(config.draw_order, DrawOrder::PerParticle);
        assert_eq!(config.error_policy, ErrorPolicy::DropParticle);
        assert_eq!(config.offspring_overrides.weight, Some(0.5));
        assert!(config.validate().is_ok());

        let round_trip: SimulationConfig =
            serde_json::from_str(&serde_json::to_string(&config).unwrap()).unwrap();
        assert_eq!(round_trip, config);
    }

    #[test]
    fn test_overrides_builder() {
        let overrides = Overrides::none().weight(5.0).mortality(0.1);
        assert!(!overrides.is_empty());
        assert_eq!(overrides.weight, Some(5.0));
        assert_eq!(overrides.location, None);
    }
}
