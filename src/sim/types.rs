//! Core simulation types: model configuration, slot outcomes, and result records.

use std::fmt;

use serde::Serialize;

use crate::error::{Result, SizingError};

/// Raw model constants before validation.
///
/// Defaults reproduce the reference 10 MW FCR portfolio. Turn into a usable
/// [`ModelConfig`] with [`ModelConfig::new`], which validates every field and
/// derives the recharge rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelParams {
    /// Duration of one market slot in hours.
    pub slot_hours: f64,
    /// Aggregate power committed to the FCR market (kW).
    pub required_power_kw: f64,
    /// Number of market slots in one simulated year.
    pub slots_per_year: usize,
    /// Mean nominal power per asset (kW).
    pub power_mean_kw: f64,
    /// Standard deviation of the nominal power per asset (kW).
    pub power_std_kw: f64,
    /// Technical floor applied to every sampled power rating (kW).
    pub power_floor_kw: f64,
    /// Mean initial state of charge (kWh).
    pub soc_mean_kwh: f64,
    /// Standard deviation of the initial state of charge (kWh).
    pub soc_std_kwh: f64,
    /// Per-slot, per-asset probability of being free for FCR.
    pub availability_probability: f64,
    /// SOC drop per FCR slot, as a fraction of `soc_mean_kwh`.
    pub degradation_per_use: f64,
    /// Target net SOC gain per slot, as a fraction of `soc_mean_kwh`.
    pub target_net_balance: f64,
    /// Fraction of slots a year must meet to count as a successful year.
    pub min_success_rate: f64,
    /// Optional upper clamp on SOC (kWh). `None` leaves SOC unbounded.
    pub soc_cap_kwh: Option<f64>,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            slot_hours: 4.0,
            required_power_kw: 10_000.0,
            slots_per_year: 2190,
            power_mean_kw: 100.0,
            power_std_kw: 20.0,
            power_floor_kw: 20.0,
            soc_mean_kwh: 600.0,
            soc_std_kwh: 100.0,
            availability_probability: 0.70,
            degradation_per_use: 0.002,
            target_net_balance: 0.0005,
            min_success_rate: 0.95,
            soc_cap_kwh: None,
        }
    }
}

/// Validated, immutable model configuration.
///
/// The recharge rate is derived once from the degradation rate, the
/// availability probability, and the target balance so that
///
/// ```text
/// recharge * (1 - p) - degradation * p = target_net_balance
/// ```
///
/// Fields are read-only; changing any parameter means building a new config,
/// which recomputes the recharge rate.
///
/// # Examples
///
/// ```
/// use fcr_sizing::sim::types::{ModelConfig, ModelParams};
///
/// let cfg = ModelConfig::new(ModelParams::default()).unwrap();
/// assert!((cfg.expected_net_balance() - 0.0005).abs() < 1e-12);
/// assert_eq!(cfg.installed_capacity_kw(150), 15_000.0);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ModelConfig {
    params: ModelParams,
    recharge_rate: f64,
}

impl ModelConfig {
    /// Validates `params` and derives the recharge rate.
    ///
    /// # Errors
    ///
    /// Returns [`SizingError::InvalidParameter`] naming the first field that
    /// is out of range. In particular the availability probability must lie
    /// strictly inside `(0, 1)`.
    pub fn new(params: ModelParams) -> Result<Self> {
        validate_params(&params)?;
        Ok(Self {
            recharge_rate: recharge_rate(&params),
            params,
        })
    }

    /// The reference configuration (10 MW, 100 kW assets, p = 0.70).
    pub fn reference() -> Self {
        let params = ModelParams::default();
        Self {
            recharge_rate: recharge_rate(&params),
            params,
        }
    }

    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    pub fn slot_hours(&self) -> f64 {
        self.params.slot_hours
    }

    pub fn required_power_kw(&self) -> f64 {
        self.params.required_power_kw
    }

    pub fn slots_per_year(&self) -> usize {
        self.params.slots_per_year
    }

    pub fn availability_probability(&self) -> f64 {
        self.params.availability_probability
    }

    pub fn min_success_rate(&self) -> f64 {
        self.params.min_success_rate
    }

    /// Derived SOC gain per idle slot, as a fraction of the mean SOC.
    pub fn recharge_rate(&self) -> f64 {
        self.recharge_rate
    }

    /// Absolute SOC drop for an asset used for FCR in one slot (kWh).
    pub fn discharge_step_kwh(&self) -> f64 {
        self.params.degradation_per_use * self.params.soc_mean_kwh
    }

    /// Absolute SOC gain for an asset kept on other markets in one slot (kWh).
    pub fn recharge_step_kwh(&self) -> f64 {
        self.recharge_rate * self.params.soc_mean_kwh
    }

    /// Expected net SOC change per slot as a fraction of the mean SOC.
    pub fn expected_net_balance(&self) -> f64 {
        let p = self.params.availability_probability;
        self.recharge_rate * (1.0 - p) - self.params.degradation_per_use * p
    }

    /// Nameplate capacity of a portfolio of `n_assets` (kW).
    pub fn installed_capacity_kw(&self, n_assets: usize) -> f64 {
        n_assets as f64 * self.params.power_mean_kw
    }

    /// Installed capacity divided by the committed power.
    pub fn oversizing_ratio(&self, n_assets: usize) -> f64 {
        self.installed_capacity_kw(n_assets) / self.params.required_power_kw
    }

    /// Oversizing needed if availability were the only constraint (`1 / p`).
    pub fn theoretical_oversizing(&self) -> f64 {
        1.0 / self.params.availability_probability
    }

    /// Energy an average asset needs to hold its power for a full slot (kWh).
    pub fn nominal_energy_requirement_kwh(&self) -> f64 {
        self.params.power_mean_kw * self.params.slot_hours
    }

    /// Minimum number of average assets whose power covers the commitment.
    pub fn nominal_asset_count(&self) -> f64 {
        self.params.required_power_kw / self.params.power_mean_kw
    }
}

fn recharge_rate(params: &ModelParams) -> f64 {
    let p = params.availability_probability;
    (params.degradation_per_use * p + params.target_net_balance) / (1.0 - p)
}

fn validate_params(p: &ModelParams) -> Result<()> {
    let finite = [
        ("market.slot_hours", p.slot_hours),
        ("market.required_power_kw", p.required_power_kw),
        ("assets.power_mean_kw", p.power_mean_kw),
        ("assets.power_std_kw", p.power_std_kw),
        ("assets.power_floor_kw", p.power_floor_kw),
        ("soc.mean_kwh", p.soc_mean_kwh),
        ("soc.std_kwh", p.soc_std_kwh),
        ("availability.probability", p.availability_probability),
        ("soc.degradation_per_use", p.degradation_per_use),
        ("soc.target_net_balance", p.target_net_balance),
        ("success.min_success_rate", p.min_success_rate),
    ];
    for (field, value) in finite {
        if !value.is_finite() {
            return Err(SizingError::invalid(field, "must be a finite number"));
        }
    }

    if p.slot_hours <= 0.0 {
        return Err(SizingError::invalid("market.slot_hours", "must be > 0"));
    }
    if p.required_power_kw <= 0.0 {
        return Err(SizingError::invalid("market.required_power_kw", "must be > 0"));
    }
    if p.slots_per_year == 0 {
        return Err(SizingError::invalid("market.slots_per_year", "must be > 0"));
    }
    if p.power_mean_kw <= 0.0 {
        return Err(SizingError::invalid("assets.power_mean_kw", "must be > 0"));
    }
    if p.power_std_kw < 0.0 {
        return Err(SizingError::invalid("assets.power_std_kw", "must be >= 0"));
    }
    if p.power_floor_kw < 0.0 {
        return Err(SizingError::invalid("assets.power_floor_kw", "must be >= 0"));
    }
    if p.soc_mean_kwh < 0.0 {
        return Err(SizingError::invalid("soc.mean_kwh", "must be >= 0"));
    }
    if p.soc_std_kwh < 0.0 {
        return Err(SizingError::invalid("soc.std_kwh", "must be >= 0"));
    }
    if !(p.availability_probability > 0.0 && p.availability_probability < 1.0) {
        return Err(SizingError::invalid(
            "availability.probability",
            format!(
                "must be in the open interval (0, 1), got {}",
                p.availability_probability
            ),
        ));
    }
    if p.degradation_per_use < 0.0 {
        return Err(SizingError::invalid("soc.degradation_per_use", "must be >= 0"));
    }
    if p.target_net_balance < 0.0 {
        return Err(SizingError::invalid(
            "soc.target_net_balance",
            "must be >= 0 so that long-run SOC drift is non-negative",
        ));
    }
    if !(0.0..=1.0).contains(&p.min_success_rate) {
        return Err(SizingError::invalid(
            "success.min_success_rate",
            "must be in [0.0, 1.0]",
        ));
    }
    if let Some(cap) = p.soc_cap_kwh {
        if !cap.is_finite() || cap <= 0.0 {
            return Err(SizingError::invalid("soc.cap_kwh", "must be > 0 when set"));
        }
    }
    Ok(())
}

/// Result of one market slot.
#[derive(Debug, Clone)]
pub struct SlotOutcome {
    /// Whether deliverable power met the commitment.
    pub success: bool,
    /// Assets free for FCR this slot (before the energy check).
    pub available: Vec<bool>,
    /// Assets that are available and hold enough energy for the slot.
    pub can_deliver: Vec<bool>,
    /// Power ratings drawn for this slot (kW).
    pub powers_kw: Vec<f64>,
    /// Sum of power over `can_deliver` assets (kW).
    pub delivered_kw: f64,
    /// Number of assets whose SOC covers `power * slot_hours`.
    pub sufficient_count: usize,
}

impl SlotOutcome {
    pub fn available_count(&self) -> usize {
        self.available.iter().filter(|&&a| a).count()
    }

    pub fn deliverable_count(&self) -> usize {
        self.can_deliver.iter().filter(|&&c| c).count()
    }
}

/// Full history of one tracked year.
///
/// `soc_history` holds the initial SOC followed by the SOC after every
/// slot, so it has `slots + 1` rows of `n_assets` values each. All other
/// series have one entry per slot.
#[derive(Debug, Clone, Serialize)]
pub struct YearTrace {
    pub n_assets: usize,
    pub soc_history: Vec<Vec<f64>>,
    pub delivered_kw: Vec<f64>,
    pub success: Vec<bool>,
    pub available_count: Vec<usize>,
    /// Assets whose SOC after the slot's update still covers the power
    /// drawn for them in that slot.
    pub soc_ok_count: Vec<usize>,
    /// Fraction of slots that met the commitment.
    pub success_rate: f64,
}

impl YearTrace {
    pub fn slot_count(&self) -> usize {
        self.success.len()
    }

    pub fn successful_slots(&self) -> usize {
        self.success.iter().filter(|&&s| s).count()
    }

    /// SOC trajectory of a single asset (`slots + 1` values).
    pub fn asset_soc(&self, asset: usize) -> Vec<f64> {
        self.soc_history.iter().map(|row| row[asset]).collect()
    }

    /// Mean SOC across assets in history row `row` (0 for an empty portfolio).
    pub fn mean_soc_at(&self, row: usize) -> f64 {
        mean(&self.soc_history[row])
    }

    /// Lowest SOC in history row `row` (0 for an empty portfolio).
    pub fn min_soc_at(&self, row: usize) -> f64 {
        self.soc_history[row]
            .iter()
            .copied()
            .reduce(f64::min)
            .unwrap_or(0.0)
    }
}

/// Arithmetic mean; zero for an empty slice.
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// One evaluated portfolio size from the capacity search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SizingResult {
    /// Number of assets in the portfolio.
    pub n_assets: usize,
    /// `n_assets * power_mean_kw` (kW).
    pub installed_capacity_kw: f64,
    /// Installed capacity divided by the committed power.
    pub oversizing_ratio: f64,
    /// Estimated probability of a successful year.
    pub probability: f64,
}

impl fmt::Display for SizingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>4} assets | capacity {:>6.1} MW | oversizing x{:.2} | P = {:.3}",
            self.n_assets,
            self.installed_capacity_kw / 1000.0,
            self.oversizing_ratio,
            self.probability,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_recharge_rate_matches_formula() {
        let cfg = ModelConfig::reference();
        let expected = (0.002 * 0.70 + 0.0005) / 0.30;
        assert!((cfg.recharge_rate() - expected).abs() < 1e-12);
    }

    #[test]
    fn expected_balance_equals_target() {
        let params = ModelParams {
            availability_probability: 0.55,
            target_net_balance: 0.001,
            ..ModelParams::default()
        };
        let cfg = ModelConfig::new(params).expect("valid params");
        assert!((cfg.expected_net_balance() - 0.001).abs() < 1e-12);
    }

    #[test]
    fn changing_probability_recomputes_recharge() {
        let base = ModelConfig::reference();
        let other = ModelConfig::new(ModelParams {
            availability_probability: 0.9,
            ..ModelParams::default()
        })
        .expect("valid params");
        assert!(other.recharge_rate() > base.recharge_rate());
        assert!(other.expected_net_balance() >= 0.0);
    }

    #[test]
    fn rejects_probability_of_one() {
        let err = ModelConfig::new(ModelParams {
            availability_probability: 1.0,
            ..ModelParams::default()
        });
        assert!(matches!(
            err,
            Err(SizingError::InvalidParameter { ref field, .. }) if field == "availability.probability"
        ));
    }

    #[test]
    fn rejects_probability_of_zero() {
        let err = ModelConfig::new(ModelParams {
            availability_probability: 0.0,
            ..ModelParams::default()
        });
        assert!(err.is_err());
    }

    #[test]
    fn rejects_negative_balance_target() {
        let err = ModelConfig::new(ModelParams {
            target_net_balance: -0.01,
            ..ModelParams::default()
        });
        assert!(matches!(
            err,
            Err(SizingError::InvalidParameter { ref field, .. }) if field == "soc.target_net_balance"
        ));
    }

    #[test]
    fn rejects_nan() {
        let err = ModelConfig::new(ModelParams {
            power_std_kw: f64::NAN,
            ..ModelParams::default()
        });
        assert!(err.is_err());
    }

    #[test]
    fn rejects_zero_slots() {
        let err = ModelConfig::new(ModelParams {
            slots_per_year: 0,
            ..ModelParams::default()
        });
        assert!(err.is_err());
    }

    #[test]
    fn capacity_and_oversizing() {
        let cfg = ModelConfig::reference();
        assert_eq!(cfg.installed_capacity_kw(100), 10_000.0);
        assert!((cfg.oversizing_ratio(150) - 1.5).abs() < 1e-12);
        assert!((cfg.theoretical_oversizing() - 1.0 / 0.7).abs() < 1e-12);
        assert_eq!(cfg.nominal_energy_requirement_kwh(), 400.0);
    }

    #[test]
    fn trace_soc_row_statistics() {
        let trace = YearTrace {
            n_assets: 3,
            soc_history: vec![vec![600.0, 300.0, 0.0], Vec::new()],
            delivered_kw: vec![0.0],
            success: vec![false],
            available_count: vec![0],
            soc_ok_count: vec![0],
            success_rate: 0.0,
        };
        assert_eq!(trace.mean_soc_at(0), 300.0);
        assert_eq!(trace.min_soc_at(0), 0.0);
        assert_eq!(trace.mean_soc_at(1), 0.0);
        assert_eq!(trace.min_soc_at(1), 0.0);
    }

    #[test]
    fn sizing_result_display_does_not_panic() {
        let r = SizingResult {
            n_assets: 150,
            installed_capacity_kw: 15_000.0,
            oversizing_ratio: 1.5,
            probability: 0.97,
        };
        let s = format!("{r}");
        assert!(s.contains("150"));
    }
}
