//! FCR portfolio sizing entry point: CLI wiring, search, and tracked year.

mod cli;

use std::io;
use std::process::ExitCode;

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{error, info, warn};

use fcr_sizing::config::ScenarioConfig;
use fcr_sizing::error::{Result, SizingError};
use fcr_sizing::io::export::{export_scan_csv, export_soc_csv, export_trace_csv};
use fcr_sizing::sim::diagnostic::SlotDiagnostic;
use fcr_sizing::sim::estimator::MonteCarloEstimator;
use fcr_sizing::sim::kpi::YearReport;
use fcr_sizing::sim::search::{CapacitySearch, SearchOutcome};
use fcr_sizing::sim::types::ModelConfig;
use fcr_sizing::sim::year::YearSimulator;

use crate::cli::Args;

fn main() -> ExitCode {
    // Logs go to stderr so stdout carries only results
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Loads the scenario: `--scenario` takes priority, then `--preset`, then baseline.
fn load_scenario(args: &Args) -> Result<ScenarioConfig> {
    let mut scenario = if let Some(path) = &args.scenario {
        ScenarioConfig::from_toml_file(path)?
    } else if let Some(name) = &args.preset {
        ScenarioConfig::from_preset(name)?
    } else {
        ScenarioConfig::baseline()
    };
    args.apply_overrides(&mut scenario);

    let errors = scenario.validate();
    if let Some(first) = errors.first().cloned() {
        for e in &errors {
            error!("{e}");
        }
        return Err(first.into());
    }
    Ok(scenario)
}

fn print_model_summary(model: &ModelConfig) {
    let p = model.params();
    println!("--- Model ---");
    println!(
        "Commitment:          {:.1} MW over {} slots of {} h",
        model.required_power_kw() / 1000.0,
        model.slots_per_year(),
        model.slot_hours(),
    );
    println!(
        "Assets:              {:.0} +/- {:.0} kW (floor {:.0} kW), SOC {:.0} +/- {:.0} kWh",
        p.power_mean_kw, p.power_std_kw, p.power_floor_kw, p.soc_mean_kwh, p.soc_std_kwh,
    );
    println!(
        "Availability:        p = {:.2} (theoretical oversizing x{:.2})",
        model.availability_probability(),
        model.theoretical_oversizing(),
    );
    println!(
        "SOC balance:         -{:.2} kWh per use, +{:.2} kWh per idle slot, net {:+.4}% per slot ({:+.1}% per year)",
        model.discharge_step_kwh(),
        model.recharge_step_kwh(),
        model.expected_net_balance() * 100.0,
        model.expected_net_balance() * model.slots_per_year() as f64 * 100.0,
    );
    println!(
        "Energy per slot:     {:.0} kWh for an average asset",
        model.nominal_energy_requirement_kwh(),
    );
}

fn run(args: &Args) -> Result<()> {
    let scenario = load_scenario(args)?;
    let model = scenario.model_config()?;

    let seed = scenario
        .simulation
        .seed
        .unwrap_or_else(|| rand::rng().random());
    info!(seed, "seeding random source");
    let mut rng = StdRng::seed_from_u64(seed);

    if args.analyze == Some(0) {
        return Err(SizingError::EmptyPortfolio);
    }

    print_model_summary(&model);

    // Diagnostic slot at the first size the run looks at
    let diagnostic_size = args.analyze.unwrap_or(scenario.search.min_assets);
    let diagnostic = SlotDiagnostic::sample(&model, diagnostic_size, &mut rng)?;
    println!("\n{diagnostic}");

    let year = YearSimulator::new(&model)?;
    let (outcome, n_assets) = match args.analyze {
        Some(n) => (None, n),
        None => {
            let estimator = MonteCarloEstimator::new(year.clone(), scenario.simulation.trials)?;
            let search = CapacitySearch::new(
                estimator,
                scenario.search_range(),
                scenario.search.confidence,
            )?;
            let outcome = search.run(&mut rng);

            println!("\n--- Capacity Search (target P >= {:.2}) ---", search.confidence_target());
            for candidate in outcome.scanned() {
                println!("{candidate}");
            }
            if let Some(path) = &args.scan_out {
                export_scan_csv(outcome.scanned(), path)?;
                info!(path = %path.display(), "search scan written");
            }

            let n = match &outcome {
                SearchOutcome::Found { sizing, .. } => {
                    println!("\nMinimum portfolio: {sizing}");
                    sizing.n_assets
                }
                SearchOutcome::Exhausted { max_size, .. } => {
                    println!(
                        "\nNo size up to {max_size} assets reached P >= {:.2}.",
                        search.confidence_target()
                    );
                    println!("Try one of:");
                    println!("  - raise search.max_assets (--max-assets) above {max_size}");
                    println!(
                        "  - relax success.min_success_rate (currently {:.3})",
                        model.min_success_rate()
                    );
                    println!(
                        "  - raise availability.probability (currently {:.2})",
                        model.availability_probability()
                    );
                    warn!(max_size, "search exhausted; no year tracked");
                    return Ok(());
                }
            };
            (Some(outcome), n)
        }
    };

    let trace = year.run_tracked(n_assets, &mut rng);
    let report = YearReport::from_trace(&trace, &model);
    println!("\n{report}");

    if let Some(path) = &args.telemetry_out {
        export_trace_csv(&trace, &model, path)?;
        info!(path = %path.display(), "trace written");
    }
    if let Some(path) = &args.soc_out {
        export_soc_csv(&trace, args.soc_assets, path)?;
        info!(path = %path.display(), "SOC matrix written");
    }
    if args.scan_out.is_some() && outcome.is_none() {
        warn!("--scan-out ignored: no search was run");
    }

    #[cfg(feature = "api")]
    if args.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(fcr_sizing::api::AppState {
            config: model,
            outcome,
            report,
            trace,
        });
        let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(fcr_sizing::api::serve(state, addr))?;
    }

    Ok(())
}
