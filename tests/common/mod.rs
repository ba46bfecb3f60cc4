//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use fcr_sizing::sim::estimator::MonteCarloEstimator;
use fcr_sizing::sim::types::{ModelConfig, ModelParams};
use fcr_sizing::sim::year::YearSimulator;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Reference model with a shortened year.
pub fn short_config(slots_per_year: usize) -> ModelConfig {
    ModelConfig::new(ModelParams {
        slots_per_year,
        ..ModelParams::default()
    })
    .expect("reference params are valid")
}

/// Year simulator for `config`.
pub fn year(config: &ModelConfig) -> YearSimulator {
    YearSimulator::new(config).expect("simulator builds from a valid config")
}

/// Estimator running `trials` years of `config`.
pub fn estimator(config: &ModelConfig, trials: usize) -> MonteCarloEstimator {
    MonteCarloEstimator::new(year(config), trials).expect("trials > 0")
}

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
