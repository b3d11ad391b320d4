//! Core types and utilities for the tsgen spatiotemporal branching-process generator.

pub mod types;
pub mod config;
pub mod error;
pub mod rng;

pub use error::{Error, Rate, Result};
pub use types::*;
pub use config::*;
pub use rng::*;

#[cfg(test)]
mod tests {
    #[test]
    fn test_error_types_reachable_from_root() {
        let err = crate::Error::InvalidProbability {
            rate: crate::Rate::Fertility,
            value: 2.0,
        };
        let result: crate::Result<()> = Err(err);
        assert!(matches!(
            result,
            Err(crate::Error::InvalidProbability { rate: crate::Rate::Fertility, .. })
        ));
    }
}
