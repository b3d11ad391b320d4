//! Error types for the generator.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Which per-particle rate a probability was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rate {
    Fertility,
    Mortality,
    /// A raw probability handed straight to a random source
    Probability,
}

impl std::fmt::Display for Rate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rate::Fertility => write!(f, "fertility * dtime"),
            Rate::Mortality => write!(f, "mortality * dtime"),
            Rate::Probability => write!(f, "probability"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot {operation} a dead particle")]
    DeadParticleOperation { operation: &'static str },

    #[error("dimension mismatch: {field} has length {found}, expected {expected}")]
    DimensionMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("invalid probability: {rate} = {value} is outside [0, 1]")]
    InvalidProbability { rate: Rate, value: f64 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("run cancelled before step {step}")]
    Cancelled { step: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::DeadParticleOperation { operation: "move" };
        assert_eq!(err.to_string(), "cannot move a dead particle");

        let err = Error::InvalidProbability {
            rate: Rate::Mortality,
            value: 1.5,
        };
        assert_eq!(
            err.to_string(),
            "invalid probability: mortality * dtime = 1.5 is outside [0, 1]"
        );
    }
}
