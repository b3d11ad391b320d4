//! Self-contained run description: run configuration plus initial particles.

use crate::particle::Particle;
use crate::simulation::Simulation;
use crate::snapshot::Timeseries;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tsgen_core::{ParticleConfig, Result, SimulationConfig};

/// A run that can be loaded from JSON and executed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub simulation: SimulationConfig,
    pub particles: Vec<ParticleConfig>,
}

impl Scenario {
    pub fn new(simulation: SimulationConfig, particles: Vec<ParticleConfig>) -> Self {
        Self {
            simulation,
            particles,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Construct the particles and the driver without running it
    pub fn build(&self) -> Result<Simulation> {
        let particles = self
            .particles
            .iter()
            .cloned()
            .map(Particle::new)
            .collect::<Result<Vec<_>>>()?;

        Simulation::new(self.simulation.clone(), particles)
    }

    /// Run this scenario to completion
    pub fn execute(&self) -> Result<Timeseries> {
        self.build()?.run()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsgen_core::{DiffusionQuantity, Error, TimeStep};

    const SCENARIO: &str = r#"{
        "simulation": {
            "num_steps": 4,
            "time_step": {"fixed": 0.5},
            "seed": 17
        },
        "particles": [
            {"location": [0.0, 0.0], "velocity": [1.0, 0.0], "diffusion_parameter": 0.0},
            {"location": [1.0, 1.0], "diffusion_quantity": "velocity", "diffusion_parameter": [0.1, 0.2]}
        ]
    }"#;

    #[test]
    fn test_scenario_from_json() {
        let scenario = Scenario::from_json(SCENARIO).unwrap();
        assert_eq!(scenario.simulation.num_steps, 4);
        assert_eq!(scenario.simulation.time_step, TimeStep::Fixed(0.5));
        assert_eq!(scenario.particles.len(), 2);
        assert_eq!(
            scenario.particles[1].diffusion_quantity,
            DiffusionQuantity::Velocity
        );
    }

    #[test]
    fn test_scenario_execute() {
        let scenario = Scenario::from_json(SCENARIO).unwrap();
        let series = scenario.execute().unwrap();

        assert_eq!(series.len(), 4);
        assert_eq!(series.seed, 17);
        assert_eq!(series.population_sizes(), vec![2, 2, 2, 2]);
        // The first particle has no noise and drifts at unit speed.
        assert_eq!(series.snapshots[3].particles[0].location, vec![2.0, 0.0]);
    }

    #[test]
    fn test_scenario_rejects_bad_particles() {
        let json = r#"{"particles": [{"location": [0.0], "velocity": [1.0, 2.0]}]}"#;
        let scenario = Scenario::from_json(json).unwrap();
        assert!(matches!(
            scenario.build(),
            Err(Error::DimensionMismatch { field: "velocity", .. })
        ));
    }

    #[test]
    fn test_scenario_json_errors() {
        assert!(matches!(
            Scenario::from_json("{not json"),
            Err(Error::Serialization(_))
        ));
        assert!(matches!(
            Scenario::from_path("/nonexistent/scenario.json"),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_scenario_json_round_trip() {
        let scenario = Scenario::from_json(SCENARIO).unwrap();
        let reparsed = Scenario::from_json(&scenario.to_json().unwrap()).unwrap();
        assert_eq!(reparsed.simulation, scenario.simulation);
        assert_eq!(reparsed.particles, scenario.particles);
    }
}
