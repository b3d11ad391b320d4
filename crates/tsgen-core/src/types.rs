//! Core type definitions for the generator.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a particle within one simulation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticleId(pub u64);

impl fmt::Display for ParticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// The state vector that receives the stochastic increment on each move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffusionQuantity {
    #[default]
    Location,
    Velocity,
    Acceleration,
}

impl DiffusionQuantity {
    pub fn all() -> [DiffusionQuantity; 3] {
        [
            DiffusionQuantity::Location,
            DiffusionQuantity::Velocity,
            DiffusionQuantity::Acceleration,
        ]
    }
}

impl fmt::Display for DiffusionQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffusionQuantity::Location => write!(f, "location"),
            DiffusionQuantity::Velocity => write!(f, "velocity"),
            DiffusionQuantity::Acceleration => write!(f, "acceleration"),
        }
    }
}

/// Diffusion coefficient as supplied by a caller: one value for every
/// dimension, or one value per dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiffusionParameter {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl Default for DiffusionParameter {
    fn default() -> Self {
        DiffusionParameter::Scalar(1.0)
    }
}

impl DiffusionParameter {
    /// Normalize into a per-dimension vector, checking length and sign.
    pub fn resolve(&self, dimension: usize) -> Result<Vec<f64>> {
        let values = match self {
            DiffusionParameter::Scalar(value) => vec![*value; dimension],
            DiffusionParameter::Vector(values) => {
                if values.len() != dimension {
                    return Err(Error::DimensionMismatch {
                        field: "diffusion_parameter",
                        expected: dimension,
                        found: values.len(),
                    });
                }
                values.clone()
            }
        };

        if let Some(bad) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(Error::Validation(format!(
                "diffusion parameter entries must be finite and non-negative, got {bad}"
            )));
        }

        Ok(values)
    }
}

impl From<f64> for DiffusionParameter {
    fn from(value: f64) -> Self {
        DiffusionParameter::Scalar(value)
    }
}

impl From<Vec<f64>> for DiffusionParameter {
    fn from(values: Vec<f64>) -> Self {
        DiffusionParameter::Vector(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_broadcast() {
        let param = DiffusionParameter::Scalar(0.25);
        assert_eq!(param.resolve(3).unwrap(), vec![0.25, 0.25, 0.25]);
    }

    #[test]
    fn test_vector_length_checked() {
        let param = DiffusionParameter::Vector(vec![1.0, 2.0]);
        assert!(matches!(
            param.resolve(3),
            Err(Error::DimensionMismatch {
                field: "diffusion_parameter",
                expected: 3,
                found: 2
            })
        ));
        assert_eq!(param.resolve(2).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_negative_diffusion_rejected() {
        let param = DiffusionParameter::Vector(vec![1.0, -0.5]);
        assert!(matches!(param.resolve(2), Err(Error::Validation(_))));

        let param = DiffusionParameter::Scalar(f64::NAN);
        assert!(param.resolve(1).is_err());
    }

    #[test]
    fn test_diffusion_quantity_serde() {
        let json = serde_json::to_string(&DiffusionQuantity::Velocity).unwrap();
        assert_eq!(json, "\"velocity\"");

        let parsed: DiffusionQuantity = serde_json::from_str("\"acceleration\"").unwrap();
        assert_eq!(parsed, DiffusionQuantity::Acceleration);
        assert_eq!(DiffusionQuantity::default(), DiffusionQuantity::Location);
    }

    #[test]
    fn test_diffusion_parameter_untagged() {
        let scalar: DiffusionParameter = serde_json::from_str("2.0").unwrap();
        assert_eq!(scalar, DiffusionParameter::Scalar(2.0));

        let vector: DiffusionParameter = serde_json::from_str("[1.0, 0.0]").unwrap();
        assert_eq!(vector, DiffusionParameter::Vector(vec![1.0, 0.0]));
    }
}
