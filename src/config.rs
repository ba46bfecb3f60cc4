//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{Result, SizingError};
use crate::sim::search::SearchRange;
use crate::sim::types::{ModelConfig, ModelParams};

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Market commitment and slot structure.
    #[serde(default)]
    pub market: MarketConfig,
    /// Per-asset power rating distribution.
    #[serde(default)]
    pub assets: AssetsConfig,
    /// Per-slot availability for FCR.
    #[serde(default)]
    pub availability: AvailabilityConfig,
    /// State-of-charge distribution and balance.
    #[serde(default)]
    pub soc: SocConfig,
    /// Annual success criterion.
    #[serde(default)]
    pub success: SuccessConfig,
    /// Capacity search range and confidence target.
    #[serde(default)]
    pub search: SearchConfig,
    /// Run-level settings.
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Market commitment and slot structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarketConfig {
    /// Slot duration (hours).
    pub slot_hours: f64,
    /// Committed FCR power (kW).
    pub required_power_kw: f64,
    /// Slots in one simulated year.
    pub slots_per_year: usize,
}

impl Default for MarketConfig {
    fn default() -> Self {
        let p = ModelParams::default();
        Self {
            slot_hours: p.slot_hours,
            required_power_kw: p.required_power_kw,
            slots_per_year: p.slots_per_year,
        }
    }
}

/// Per-asset power rating distribution.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetsConfig {
    pub power_mean_kw: f64,
    pub power_std_kw: f64,
    /// Technical floor applied to every sampled rating (kW).
    pub power_floor_kw: f64,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        let p = ModelParams::default();
        Self {
            power_mean_kw: p.power_mean_kw,
            power_std_kw: p.power_std_kw,
            power_floor_kw: p.power_floor_kw,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AvailabilityConfig {
    /// Probability that an asset is free for FCR in a slot, in (0, 1).
    pub probability: f64,
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            probability: ModelParams::default().availability_probability,
        }
    }
}

/// State-of-charge distribution and balance.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SocConfig {
    /// Mean initial SOC (kWh).
    pub mean_kwh: f64,
    /// Standard deviation of the initial SOC (kWh).
    pub std_kwh: f64,
    /// SOC drop per FCR slot as a fraction of `mean_kwh`.
    pub degradation_per_use: f64,
    /// Target net SOC gain per slot as a fraction of `mean_kwh`.
    pub target_net_balance: f64,
    /// Optional upper clamp on SOC (kWh).
    pub cap_kwh: Option<f64>,
}

impl Default for SocConfig {
    fn default() -> Self {
        let p = ModelParams::default();
        Self {
            mean_kwh: p.soc_mean_kwh,
            std_kwh: p.soc_std_kwh,
            degradation_per_use: p.degradation_per_use,
            target_net_balance: p.target_net_balance,
            cap_kwh: p.soc_cap_kwh,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SuccessConfig {
    /// Fraction of slots a year must meet, in [0, 1].
    pub min_success_rate: f64,
}

impl Default for SuccessConfig {
    fn default() -> Self {
        Self {
            min_success_rate: ModelParams::default().min_success_rate,
        }
    }
}

/// Capacity search range and confidence target.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    pub min_assets: usize,
    pub max_assets: usize,
    pub step: usize,
    /// Required probability of a successful year.
    pub confidence: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        let range = SearchRange::default();
        Self {
            min_assets: range.min_assets,
            max_assets: range.max_assets,
            step: range.step,
            confidence: 0.95,
        }
    }
}

/// Run-level settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Master random seed. `None` draws one from the OS at startup.
    pub seed: Option<u64>,
    /// Monte Carlo trials per candidate size.
    pub trials: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            trials: 100,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"availability.probability"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario (reference 10 MW portfolio).
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the high-availability preset: assets free for FCR 85% of slots.
    pub fn high_availability() -> Self {
        Self {
            availability: AvailabilityConfig { probability: 0.85 },
            search: SearchConfig {
                min_assets: 100,
                max_assets: 300,
                ..SearchConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the low-energy preset: smaller batteries, tighter SOC margin.
    pub fn low_energy() -> Self {
        Self {
            soc: SocConfig {
                mean_kwh: 450.0,
                std_kwh: 80.0,
                ..SocConfig::default()
            },
            search: SearchConfig {
                max_assets: 600,
                ..SearchConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "high_availability", "low_energy"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> std::result::Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "high_availability" => Ok(Self::high_availability()),
            "low_energy" => Ok(Self::low_energy()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> std::result::Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new(
                "scenario",
                format!("cannot read \"{}\": {e}", path.display()),
            )
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> std::result::Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid. Model constants
    /// are checked by [`ModelConfig::new`], which reports the first
    /// out-of-range constant; search and run settings are all listed.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if let Err(e) = self.model_config() {
            errors.push(match e {
                SizingError::InvalidParameter { field, message } => ConfigError { field, message },
                other => ConfigError::new("model", other.to_string()),
            });
        }

        let s = &self.search;
        if s.min_assets == 0 {
            errors.push(ConfigError::new("search.min_assets", "must be > 0"));
        }
        if s.step == 0 {
            errors.push(ConfigError::new("search.step", "must be > 0"));
        }
        if s.min_assets > s.max_assets {
            errors.push(ConfigError::new(
                "search.min_assets",
                "must be <= search.max_assets",
            ));
        }
        if !(0.0..=1.0).contains(&s.confidence) {
            errors.push(ConfigError::new("search.confidence", "must be in [0.0, 1.0]"));
        }

        if self.simulation.trials == 0 {
            errors.push(ConfigError::new("simulation.trials", "must be > 0"));
        }

        errors
    }

    /// Flattens the model sections into [`ModelParams`].
    pub fn model_params(&self) -> ModelParams {
        ModelParams {
            slot_hours: self.market.slot_hours,
            required_power_kw: self.market.required_power_kw,
            slots_per_year: self.market.slots_per_year,
            power_mean_kw: self.assets.power_mean_kw,
            power_std_kw: self.assets.power_std_kw,
            power_floor_kw: self.assets.power_floor_kw,
            soc_mean_kwh: self.soc.mean_kwh,
            soc_std_kwh: self.soc.std_kwh,
            availability_probability: self.availability.probability,
            degradation_per_use: self.soc.degradation_per_use,
            target_net_balance: self.soc.target_net_balance,
            min_success_rate: self.success.min_success_rate,
            soc_cap_kwh: self.soc.cap_kwh,
        }
    }

    /// Builds the validated model configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SizingError::InvalidParameter`](crate::error::SizingError)
    /// for the first out-of-range model constant.
    pub fn model_config(&self) -> Result<ModelConfig> {
        ModelConfig::new(self.model_params())
    }

    pub fn search_range(&self) -> SearchRange {
        SearchRange {
            min_assets: self.search.min_assets,
            max_assets: self.search.max_assets,
            step: self.search.step,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = ScenarioConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn baseline_matches_reference_model() {
        let cfg = ScenarioConfig::baseline();
        assert_eq!(cfg.model_params(), ModelParams::default());
        assert_eq!(cfg.simulation.trials, 100);
        assert_eq!(cfg.search_range(), SearchRange::default());
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[market]
slot_hours = 4.0
required_power_kw = 5000.0
slots_per_year = 1000

[assets]
power_mean_kw = 120.0
power_std_kw = 10.0
power_floor_kw = 30.0

[availability]
probability = 0.6

[soc]
mean_kwh = 700.0
std_kwh = 50.0
degradation_per_use = 0.003
target_net_balance = 0.001
cap_kwh = 1000.0

[success]
min_success_rate = 0.9

[search]
min_assets = 50
max_assets = 200
step = 5
confidence = 0.9

[simulation]
seed = 7
trials = 40
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.market.slots_per_year), Some(1000));
        assert_eq!(cfg.as_ref().map(|c| c.soc.cap_kwh), Some(Some(1000.0)));
        assert_eq!(cfg.as_ref().map(|c| c.simulation.seed), Some(Some(7)));
        assert!(cfg.as_ref().is_some_and(|c| c.validate().is_empty()));
        assert!(cfg.as_ref().is_some_and(|c| c.model_config().is_ok()));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[market]
slot_hours = 4.0
bogus_field = true
"#;
        let result = ScenarioConfig::from_toml_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn validation_catches_probability_of_one() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.availability.probability = 1.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "availability.probability"));
        assert!(cfg.model_config().is_err());
    }

    #[test]
    fn validation_catches_negative_balance() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.soc.target_net_balance = -0.001;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "soc.target_net_balance"));
    }

    #[test]
    fn validation_catches_bad_search() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.search.min_assets = 0;
        cfg.search.step = 0;
        cfg.search.confidence = 1.2;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "search.min_assets"));
        assert!(errors.iter().any(|e| e.field == "search.step"));
        assert!(errors.iter().any(|e| e.field == "search.confidence"));
    }

    #[test]
    fn validation_reports_every_problem() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.market.slots_per_year = 0;
        cfg.search.step = 0;
        cfg.simulation.trials = 0;
        let errors = cfg.validate();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.field == "market.slots_per_year"));
    }

    #[test]
    fn validation_catches_non_finite_model_values() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.assets.power_std_kw = f64::INFINITY;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "assets.power_std_kw"));

        let toml = r#"
[soc]
mean_kwh = inf
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).expect("TOML accepts inf");
        assert!(cfg.validate().iter().any(|e| e.field == "soc.mean_kwh"));
    }

    #[test]
    fn validation_catches_bad_min_success_rate() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.success.min_success_rate = 2.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "success.min_success_rate"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn high_availability_raises_probability() {
        let base = ScenarioConfig::baseline();
        let high = ScenarioConfig::high_availability();
        assert!(high.availability.probability > base.availability.probability);
    }

    #[test]
    fn low_energy_lowers_soc() {
        let base = ScenarioConfig::baseline();
        let low = ScenarioConfig::low_energy();
        assert_eq!(low.soc.mean_kwh, 450.0);
        assert!(low.soc.mean_kwh < base.soc.mean_kwh);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[availability]
probability = 0.8
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok());
        let cfg = cfg.ok();
        // probability overridden
        assert_eq!(cfg.as_ref().map(|c| c.availability.probability), Some(0.8));
        // market kept default
        assert_eq!(cfg.as_ref().map(|c| c.market.slots_per_year), Some(2190));
        // seed left unset
        assert_eq!(cfg.as_ref().map(|c| c.simulation.seed), Some(None));
    }
}
