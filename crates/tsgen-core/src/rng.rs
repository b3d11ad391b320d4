//! Injectable sources of randomness.
//!
//! Every stochastic operation takes a `&mut impl RandomSource` rather than
//! touching a process-wide generator, so a run is fully determined by its seed.

use crate::error::{Error, Rate, Result};
use rand::distributions::{Bernoulli, Distribution};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

/// SplitMix64 finalizer, used to decorrelate derived seeds
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// A stream of uniform, normal and Bernoulli draws.
pub trait RandomSource {
    /// Uniform draw in `[0, 1)`
    fn uniform(&mut self) -> f64;

    /// Standard normal draw (mean 0, standard deviation 1)
    fn standard_normal(&mut self) -> f64;

    /// Normal draw with mean 0 and the given standard deviation
    fn normal(&mut self, std_dev: f64) -> f64 {
        std_dev * self.standard_normal()
    }

    /// Single Bernoulli trial with success probability `p`
    fn bernoulli(&mut self, p: f64) -> Result<bool> {
        let p = check_probability(Rate::Probability, p)?;
        Ok(self.uniform() < p)
    }
}

/// Reject probabilities outside `[0, 1]` (NaN included).
pub fn check_probability(rate: Rate, value: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(Error::InvalidProbability { rate, value })
    }
}

/// ChaCha-backed random source seeded from a `u64`
#[derive(Debug, Clone)]
pub struct SeededSource {
    seed: u64,
    rng: ChaCha8Rng,
}

impl SeededSource {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Derive an independent stream for one key (a particle id) at one step.
    ///
    /// The result depends only on `(seed, key, step)`, never on how many
    /// draws this source has already produced.
    pub fn substream(&self, key: u64, step: u64) -> SeededSource {
        let derived = splitmix64(splitmix64(self.seed) ^ step);
        let mut rng = ChaCha8Rng::seed_from_u64(derived);
        rng.set_stream(key);
        Self { seed: derived, rng }
    }
}

impl RandomSource for SeededSource {
    fn uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn standard_normal(&mut self) -> f64 {
        self.rng.sample::<f64, _>(StandardNormal)
    }

    fn bernoulli(&mut self, p: f64) -> Result<bool> {
        let p = check_probability(Rate::Probability, p)?;
        let dist = Bernoulli::new(p).map_err(|_| Error::InvalidProbability {
            rate: Rate::Probability,
            value: p,
        })?;
        Ok(dist.sample(&mut self.rng))
    }
}
