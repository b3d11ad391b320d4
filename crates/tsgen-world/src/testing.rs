//! Deterministic random source for unit tests.

use std::collections::VecDeque;
use tsgen_core::{check_probability, RandomSource, Rate, Result};

/// Replays scripted normal and Bernoulli outcomes and records the
/// probabilities it was asked about.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    normals: VecDeque<f64>,
    bernoulli: VecDeque<bool>,
    probabilities: Vec<f64>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_normals(mut self, normals: impl IntoIterator<Item = f64>) -> Self {
        self.normals.extend(normals);
        self
    }

    pub fn with_bernoulli(mut self, outcomes: impl IntoIterator<Item = bool>) -> Self {
        self.bernoulli.extend(outcomes);
        self
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }
}

impl RandomSource for ScriptedSource {
    fn uniform(&mut self) -> f64 {
        0.5
    }

    fn standard_normal(&mut self) -> f64 {
        self.normals.pop_front().unwrap_or(0.0)
    }

    fn bernoulli(&mut self, p: f64) -> Result<bool> {
        let p = check_probability(Rate::Probability, p)?;
        self.probabilities.push(p);
        Ok(self
            .bernoulli
            .pop_front()
            .expect("scripted bernoulli outcomes exhausted"))
    }
}
