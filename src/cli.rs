use std::path::PathBuf;

use clap::Parser;

use fcr_sizing::config::ScenarioConfig;

/// Size a battery portfolio for a frequency-containment reserve commitment.
///
/// If no `--scenario` or `--preset` is given, the baseline preset is used.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Load the scenario from a TOML file.
    #[clap(long, conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,

    /// Use a built-in preset: baseline, high_availability, low_energy.
    #[clap(long)]
    pub preset: Option<String>,

    /// Master random seed. Overrides `simulation.seed`.
    #[clap(long)]
    pub seed: Option<u64>,

    /// Monte Carlo trials per candidate size. Overrides `simulation.trials`.
    #[clap(long)]
    pub trials: Option<usize>,

    /// Required probability of a successful year. Overrides `search.confidence`.
    #[clap(long)]
    pub confidence: Option<f64>,

    #[clap(long)]
    pub min_assets: Option<usize>,

    #[clap(long)]
    pub max_assets: Option<usize>,

    #[clap(long)]
    pub step: Option<usize>,

    /// Skip the search and track one year for this many assets.
    #[clap(long, value_name = "N_ASSETS")]
    pub analyze: Option<usize>,

    /// Write the per-slot trace of the tracked year to CSV.
    #[clap(long)]
    pub telemetry_out: Option<PathBuf>,

    /// Write the SOC matrix of the tracked year to CSV.
    #[clap(long)]
    pub soc_out: Option<PathBuf>,

    /// Limit the SOC matrix to the first N assets.
    #[clap(long, value_name = "N", requires = "soc_out")]
    pub soc_assets: Option<usize>,

    /// Write every scanned candidate to CSV.
    #[clap(long)]
    pub scan_out: Option<PathBuf>,

    /// Start the REST API server after the run.
    #[cfg(feature = "api")]
    #[clap(long)]
    pub serve: bool,

    /// API server port.
    #[cfg(feature = "api")]
    #[clap(long, default_value = "3000")]
    pub port: u16,
}

impl Args {
    /// Applies command-line overrides on top of a loaded scenario.
    pub fn apply_overrides(&self, scenario: &mut ScenarioConfig) {
        if let Some(seed) = self.seed {
            scenario.simulation.seed = Some(seed);
        }
        if let Some(trials) = self.trials {
            scenario.simulation.trials = trials;
        }
        if let Some(confidence) = self.confidence {
            scenario.search.confidence = confidence;
        }
        if let Some(min) = self.min_assets {
            scenario.search.min_assets = min;
        }
        if let Some(max) = self.max_assets {
            scenario.search.max_assets = max;
        }
        if let Some(step) = self.step {
            scenario.search.step = step;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_scenario_values() {
        let args = Args::parse_from([
            "fcr-sizing",
            "--seed",
            "7",
            "--trials",
            "20",
            "--min-assets",
            "120",
            "--step",
            "5",
        ]);
        let mut scenario = ScenarioConfig::baseline();
        args.apply_overrides(&mut scenario);
        assert_eq!(scenario.simulation.seed, Some(7));
        assert_eq!(scenario.simulation.trials, 20);
        assert_eq!(scenario.search.min_assets, 120);
        assert_eq!(scenario.search.step, 5);
        assert_eq!(scenario.search.max_assets, 400);
    }

    #[test]
    fn scenario_and_preset_conflict() {
        let res = Args::try_parse_from([
            "fcr-sizing",
            "--scenario",
            "a.toml",
            "--preset",
            "baseline",
        ]);
        assert!(res.is_err());
    }
}
