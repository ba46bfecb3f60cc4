//! Single market slot: random asset state and the commitment check.

use rand::Rng;
use rand::distr::{Bernoulli, Distribution};
use rand_distr::Normal;

use crate::error::{Result, SizingError};

use super::types::{ModelConfig, SlotOutcome};

/// Draws one slot's random asset state.
///
/// Holds the power and availability distributions built once from the
/// model, so repeated slots only pay for sampling. Power ratings are
/// redrawn every slot; they are not a fixed property of an asset.
#[derive(Debug, Clone)]
pub struct SlotSampler {
    config: ModelConfig,
    power: Normal<f64>,
    availability: Bernoulli,
}

impl SlotSampler {
    /// Builds the per-slot distributions for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SizingError::InvalidParameter`] if a distribution cannot be
    /// built from the configured moments.
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let p = config.params();
        let power = Normal::new(p.power_mean_kw, p.power_std_kw)
            .map_err(|e| SizingError::invalid("assets.power_std_kw", e.to_string()))?;
        let availability = Bernoulli::new(p.availability_probability)
            .map_err(|e| SizingError::invalid("availability.probability", e.to_string()))?;
        Ok(Self {
            config: config.clone(),
            power,
            availability,
        })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Samples `n` power ratings clamped to the technical floor (kW).
    pub fn sample_powers<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<f64> {
        let floor = self.config.params().power_floor_kw;
        (0..n)
            .map(|_| self.power.sample(rng).max(floor))
            .collect()
    }

    /// Samples `n` independent availability flags.
    pub fn sample_availability<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<bool> {
        (0..n).map(|_| self.availability.sample(rng)).collect()
    }

    /// Simulates one slot for the portfolio whose current SOC is `socs`.
    ///
    /// Draws all power ratings first, then all availability flags, then
    /// evaluates the commitment with [`evaluate_slot`].
    pub fn simulate<R: Rng + ?Sized>(&self, socs: &[f64], rng: &mut R) -> SlotOutcome {
        let n = socs.len();
        let powers_kw = self.sample_powers(n, rng);
        let available = self.sample_availability(n, rng);
        evaluate_slot(&self.config, socs, powers_kw, available)
    }
}

/// Evaluates the commitment for given draws.
///
/// An asset contributes only if it is available *and* its SOC covers
/// `power * slot_hours`. The slot succeeds iff the summed power of
/// contributing assets is at least the required power; equality counts.
///
/// # Panics
///
/// Panics if the three input vectors differ in length.
pub fn evaluate_slot(
    config: &ModelConfig,
    socs: &[f64],
    powers_kw: Vec<f64>,
    available: Vec<bool>,
) -> SlotOutcome {
    assert!(
        socs.len() == powers_kw.len() && socs.len() == available.len(),
        "slot inputs must have one entry per asset"
    );

    let hours = config.slot_hours();
    let sufficient: Vec<bool> = socs
        .iter()
        .zip(&powers_kw)
        .map(|(&soc, &kw)| soc >= kw * hours)
        .collect();
    let can_deliver: Vec<bool> = available
        .iter()
        .zip(&sufficient)
        .map(|(&a, &s)| a && s)
        .collect();
    let delivered_kw: f64 = powers_kw
        .iter()
        .zip(&can_deliver)
        .filter(|&(_, &c)| c)
        .map(|(&kw, _)| kw)
        .sum();

    SlotOutcome {
        success: delivered_kw >= config.required_power_kw(),
        sufficient_count: sufficient.iter().filter(|&&s| s).count(),
        available,
        can_deliver,
        powers_kw,
        delivered_kw,
    }
}
