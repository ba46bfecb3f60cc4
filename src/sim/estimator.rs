//! Monte Carlo estimate of the probability that a portfolio meets its annual target.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, SizingError};

use super::year::YearSimulator;

/// Empirical probability estimate for one portfolio size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Estimate {
    pub n_assets: usize,
    pub trials: usize,
    /// Trials whose year met the minimum success rate.
    pub passing_trials: usize,
    /// `passing_trials / trials`.
    pub probability: f64,
    /// Mean per-year success rate across trials.
    pub mean_success_rate: f64,
}

/// Repeats independent simulated years to estimate a pass probability.
///
/// One `u64` seed per trial is drawn from the caller's random source, then
/// trials run on the rayon pool, each with its own [`StdRng`] and a fresh
/// initial SOC draw. The result only depends on the caller's source, not on
/// thread scheduling.
#[derive(Debug, Clone)]
pub struct MonteCarloEstimator {
    year: YearSimulator,
    trials: usize,
}

impl MonteCarloEstimator {
    /// Creates an estimator running `trials` years per estimate.
    ///
    /// # Errors
    ///
    /// Returns [`SizingError::InvalidTrials`] if `trials` is zero.
    pub fn new(year: YearSimulator, trials: usize) -> Result<Self> {
        if trials == 0 {
            return Err(SizingError::InvalidTrials);
        }
        Ok(Self { year, trials })
    }

    pub fn trials(&self) -> usize {
        self.trials
    }

    pub fn year(&self) -> &YearSimulator {
        &self.year
    }

    /// Estimates the probability that `n_assets` meet the annual target.
    pub fn estimate<R: Rng + ?Sized>(&self, n_assets: usize, rng: &mut R) -> Estimate {
        let seeds: Vec<u64> = (0..self.trials).map(|_| rng.random()).collect();
        let threshold = self.year.config().min_success_rate();

        let rates: Vec<f64> = seeds
            .par_iter()
            .map(|&seed| {
                let mut trial_rng = StdRng::seed_from_u64(seed);
                self.year.run(n_assets, &mut trial_rng)
            })
            .collect();

        let passing_trials = rates.iter().filter(|&&r| r >= threshold).count();
        let mean_success_rate = rates.iter().sum::<f64>() / rates.len() as f64;
        debug!(
            n_assets,
            trials = self.trials,
            passing_trials,
            mean_success_rate,
            "monte carlo estimate"
        );

        Estimate {
            n_assets,
            trials: self.trials,
            passing_trials,
            probability: passing_trials as f64 / self.trials as f64,
            mean_success_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::types::{ModelConfig, ModelParams};

    fn estimator(params: ModelParams, trials: usize) -> MonteCarloEstimator {
        let cfg = ModelConfig::new(params).expect("valid params");
        let year = YearSimulator::new(&cfg).expect("simulator");
        MonteCarloEstimator::new(year, trials).expect("estimator")
    }

    #[test]
    fn zero_trials_rejected() {
        let year = YearSimulator::new(&ModelConfig::reference()).expect("simulator");
        assert!(matches!(
            MonteCarloEstimator::new(year, 0),
            Err(SizingError::InvalidTrials)
        ));
    }

    #[test]
    fn same_seed_same_estimate() {
        let est = estimator(
            ModelParams {
                slots_per_year: 200,
                ..ModelParams::default()
            },
            16,
        );
        let a = est.estimate(145, &mut StdRng::seed_from_u64(5));
        let b = est.estimate(145, &mut StdRng::seed_from_u64(5));
        assert_eq!(a, b);
    }

    #[test]
    fn probability_is_fraction_of_passing_trials() {
        let est = estimator(
            ModelParams {
                slots_per_year: 100,
                ..ModelParams::default()
            },
            10,
        );
        let e = est.estimate(150, &mut StdRng::seed_from_u64(1));
        assert_eq!(e.trials, 10);
        assert!((0.0..=1.0).contains(&e.probability));
        assert_eq!(e.probability, e.passing_trials as f64 / 10.0);
    }

    #[test]
    fn oversized_high_availability_portfolio_approaches_one() {
        let est = estimator(
            ModelParams {
                slots_per_year: 300,
                availability_probability: 0.99,
                ..ModelParams::default()
            },
            20,
        );
        let e = est.estimate(200, &mut StdRng::seed_from_u64(17));
        assert_eq!(e.probability, 1.0);
    }

    #[test]
    fn empty_portfolio_has_zero_probability() {
        let est = estimator(
            ModelParams {
                slots_per_year: 10,
                ..ModelParams::default()
            },
            4,
        );
        let e = est.estimate(0, &mut StdRng::seed_from_u64(0));
        assert_eq!(e.probability, 0.0);
        assert_eq!(e.mean_success_rate, 0.0);
    }
}
