//! Year-long rollout of market slots with path-dependent SOC.

use rand::Rng;
use rand::distr::Distribution;
use rand_distr::Normal;

use crate::error::{Result, SizingError};

use super::slot::SlotSampler;
use super::soc::update_soc;
use super::types::{ModelConfig, SlotOutcome, YearTrace};

/// Runs one simulated year slot by slot.
///
/// Each slot depends on the SOC left by the previous one: slot simulation
/// with the current SOC, then the SOC update driven by the `can_deliver`
/// mask. The lightweight ([`run`](Self::run)) and tracking
/// ([`run_tracked`](Self::run_tracked)) variants share that transition and
/// consume the random source identically.
#[derive(Debug, Clone)]
pub struct YearSimulator {
    sampler: SlotSampler,
    initial_soc: Normal<f64>,
}

impl YearSimulator {
    /// Creates a simulator for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SizingError::InvalidParameter`] if the initial SOC or slot
    /// distributions cannot be built.
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let p = config.params();
        let initial_soc = Normal::new(p.soc_mean_kwh, p.soc_std_kwh)
            .map_err(|e| SizingError::invalid("soc.std_kwh", e.to_string()))?;
        Ok(Self {
            sampler: SlotSampler::new(config)?,
            initial_soc,
        })
    }

    pub fn config(&self) -> &ModelConfig {
        self.sampler.config()
    }

    pub fn sampler(&self) -> &SlotSampler {
        &self.sampler
    }

    /// Draws the starting SOC of `n_assets` assets (kWh).
    ///
    /// Clamped at zero and, if the model sets one, at the SOC cap.
    pub fn initial_socs<R: Rng + ?Sized>(&self, n_assets: usize, rng: &mut R) -> Vec<f64> {
        let cap = self.config().params().soc_cap_kwh.unwrap_or(f64::INFINITY);
        (0..n_assets)
            .map(|_| self.initial_soc.sample(rng).max(0.0).min(cap))
            .collect()
    }

    /// Simulates a year for a fresh portfolio and returns its success rate.
    pub fn run<R: Rng + ?Sized>(&self, n_assets: usize, rng: &mut R) -> f64 {
        let socs = self.initial_socs(n_assets, rng);
        self.run_from(socs, rng)
    }

    /// Simulates a year starting from `socs` and returns its success rate.
    pub fn run_from<R: Rng + ?Sized>(&self, mut socs: Vec<f64>, rng: &mut R) -> f64 {
        let slots = self.config().slots_per_year();
        let mut successes = 0_usize;
        for _ in 0..slots {
            if self.advance(&mut socs, rng).success {
                successes += 1;
            }
        }
        successes as f64 / slots as f64
    }

    /// Whether a fresh portfolio meets the annual success-rate threshold.
    pub fn passes<R: Rng + ?Sized>(&self, n_assets: usize, rng: &mut R) -> bool {
        self.run(n_assets, rng) >= self.config().min_success_rate()
    }

    /// Simulates a year for a fresh portfolio, keeping per-slot history.
    pub fn run_tracked<R: Rng + ?Sized>(&self, n_assets: usize, rng: &mut R) -> YearTrace {
        let socs = self.initial_socs(n_assets, rng);
        self.run_tracked_from(socs, rng)
    }

    /// Simulates a year starting from `socs`, keeping per-slot history.
    ///
    /// `soc_ok_count[t]` is taken after the SOC update of slot `t`: the
    /// number of assets whose new SOC still covers the power drawn for them
    /// in that slot.
    pub fn run_tracked_from<R: Rng + ?Sized>(&self, mut socs: Vec<f64>, rng: &mut R) -> YearTrace {
        let slots = self.config().slots_per_year();
        let hours = self.config().slot_hours();
        let n_assets = socs.len();

        let mut soc_history = Vec::with_capacity(slots + 1);
        let mut delivered_kw = Vec::with_capacity(slots);
        let mut success = Vec::with_capacity(slots);
        let mut available_count = Vec::with_capacity(slots);
        let mut soc_ok_count = Vec::with_capacity(slots);
        soc_history.push(socs.clone());

        for _ in 0..slots {
            let outcome = self.advance(&mut socs, rng);
            soc_history.push(socs.clone());
            delivered_kw.push(outcome.delivered_kw);
            success.push(outcome.success);
            available_count.push(outcome.available_count());
            soc_ok_count.push(
                socs.iter()
                    .zip(&outcome.powers_kw)
                    .filter(|&(&soc, &kw)| soc >= kw * hours)
                    .count(),
            );
        }

        let successes = success.iter().filter(|&&s| s).count();
        YearTrace {
            n_assets,
            soc_history,
            delivered_kw,
            success,
            available_count,
            soc_ok_count,
            success_rate: successes as f64 / slots as f64,
        }
    }

    /// One slot transition: evaluate the slot, then replace `socs` in place.
    fn advance<R: Rng + ?Sized>(&self, socs: &mut Vec<f64>, rng: &mut R) -> SlotOutcome {
        let outcome = self.sampler.simulate(socs, rng);
        *socs = update_soc(self.config(), socs, &outcome.can_deliver);
        outcome
    }
}
