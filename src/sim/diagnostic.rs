//! One-slot breakdown used to sanity-check model constants before a search.

use std::fmt;

use rand::Rng;
use serde::Serialize;

use crate::error::Result;

use super::types::{ModelConfig, mean};
use super::year::YearSimulator;

/// Snapshot of a single slot simulated from a fresh SOC draw.
#[derive(Debug, Clone, Serialize)]
pub struct SlotDiagnostic {
    pub n_assets: usize,
    pub soc_mean_kwh: f64,
    pub soc_min_kwh: f64,
    pub soc_max_kwh: f64,
    pub power_mean_kw: f64,
    /// Mean of `power * slot_hours` over the drawn ratings (kWh).
    pub energy_requirement_mean_kwh: f64,
    pub available: usize,
    pub sufficient: usize,
    pub deliverable: usize,
    pub delivered_kw: f64,
    pub required_kw: f64,
    pub success: bool,
}

impl SlotDiagnostic {
    /// Draws initial SOCs for `n_assets` and simulates one slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the year simulator cannot be built from `config`.
    pub fn sample<R: Rng + ?Sized>(
        config: &ModelConfig,
        n_assets: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let year = YearSimulator::new(config)?;
        let socs = year.initial_socs(n_assets, rng);
        let outcome = year.sampler().simulate(&socs, rng);

        let power_mean_kw = mean(&outcome.powers_kw);
        Ok(Self {
            n_assets,
            soc_mean_kwh: mean(&socs),
            soc_min_kwh: socs.iter().copied().reduce(f64::min).unwrap_or(0.0),
            soc_max_kwh: socs.iter().copied().reduce(f64::max).unwrap_or(0.0),
            power_mean_kw,
            energy_requirement_mean_kwh: power_mean_kw * config.slot_hours(),
            available: outcome.available_count(),
            sufficient: outcome.sufficient_count,
            deliverable: outcome.deliverable_count(),
            delivered_kw: outcome.delivered_kw,
            required_kw: config.required_power_kw(),
            success: outcome.success,
        })
    }
}

impl fmt::Display for SlotDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Slot Diagnostic ({} assets) ---", self.n_assets)?;
        writeln!(
            f,
            "SOC (kWh):          mean {:.1}, min {:.1}, max {:.1}",
            self.soc_mean_kwh, self.soc_min_kwh, self.soc_max_kwh
        )?;
        writeln!(
            f,
            "Power (kW):         mean {:.1}, energy needed {:.1} kWh",
            self.power_mean_kw, self.energy_requirement_mean_kwh
        )?;
        writeln!(
            f,
            "Assets:             {} available, {} with enough SOC, {} deliverable",
            self.available, self.sufficient, self.deliverable
        )?;
        write!(
            f,
            "Delivered:          {:.2} MW of {:.2} MW -> {}",
            self.delivered_kw / 1000.0,
            self.required_kw / 1000.0,
            if self.success { "OK" } else { "FAIL" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn counts_are_nested() {
        let cfg = ModelConfig::reference();
        let diag = SlotDiagnostic::sample(&cfg, 150, &mut StdRng::seed_from_u64(3)).expect("diag");
        assert!(diag.deliverable <= diag.available);
        assert!(diag.deliverable <= diag.sufficient);
        assert!(diag.available <= 150);
        assert!(diag.soc_min_kwh <= diag.soc_mean_kwh && diag.soc_mean_kwh <= diag.soc_max_kwh);
        assert_eq!(diag.required_kw, 10_000.0);
    }

    #[test]
    fn empty_portfolio_reports_zeros() {
        let cfg = ModelConfig::reference();
        let diag = SlotDiagnostic::sample(&cfg, 0, &mut StdRng::seed_from_u64(0)).expect("diag");
        assert_eq!(diag.soc_mean_kwh, 0.0);
        assert_eq!(diag.delivered_kw, 0.0);
        assert!(!diag.success);
        assert!(format!("{diag}").contains("FAIL"));
    }
}
