mod common;

use fcr_sizing::sim::kpi::YearReport;
use fcr_sizing::sim::search::{CapacitySearch, SearchOutcome, SearchRange};
use fcr_sizing::sim::types::{ModelConfig, ModelParams};

use common::{estimator, rng, short_config, year};

#[test]
fn hundred_assets_fall_far_short() {
    // ~70 available assets carry ~7 MW of a 10 MW commitment
    let est = estimator(&ModelConfig::reference(), 10);
    let e = est.estimate(100, &mut rng(1));
    assert!(e.probability < 0.95);
    assert_eq!(e.passing_trials, 0);
    assert!(e.mean_success_rate < 0.1, "rate {}", e.mean_success_rate);
}

#[test]
fn theoretical_size_beats_nominal_size() {
    let est = estimator(&ModelConfig::reference(), 8);
    let nominal = est.estimate(100, &mut rng(2));
    let oversized = est.estimate(143, &mut rng(2));
    assert!(
        oversized.mean_success_rate > nominal.mean_success_rate + 0.15,
        "143 assets: {:.3}, 100 assets: {:.3}",
        oversized.mean_success_rate,
        nominal.mean_success_rate
    );
    assert!(oversized.probability >= nominal.probability);
}

#[test]
fn lightweight_and_tracking_years_agree() {
    let sim = year(&ModelConfig::reference());
    let socs = sim.initial_socs(145, &mut rng(10));

    let rate = sim.run_from(socs.clone(), &mut rng(11));
    let trace = sim.run_tracked_from(socs, &mut rng(11));

    assert_eq!(rate, trace.success_rate);
    assert_eq!(
        trace.successful_slots() as f64 / trace.slot_count() as f64,
        rate
    );
}

#[test]
fn tracked_year_shape() {
    let sim = year(&ModelConfig::reference());
    let trace = sim.run_tracked(40, &mut rng(5));
    assert_eq!(trace.soc_history.len(), 2191);
    assert!(trace.soc_history.iter().all(|row| row.len() == 40));
    assert_eq!(trace.asset_soc(39).len(), 2191);
    assert!(trace.soc_history.iter().flatten().all(|&s| s >= 0.0));
    assert!(
        trace
            .soc_ok_count
            .iter()
            .zip(&trace.available_count)
            .all(|(&ok, &avail)| ok <= 40 && avail <= 40)
    );
}

#[test]
fn positive_balance_raises_mean_soc_over_the_year() {
    let cfg = ModelConfig::reference();
    let trace = year(&cfg).run_tracked(150, &mut rng(6));
    let report = YearReport::from_trace(&trace, &cfg);
    assert!(report.final_mean_soc_kwh > report.initial_mean_soc_kwh);
    assert!(report.expected_net_balance > 0.0);
}

#[test]
fn search_returns_first_clearing_size() {
    let cfg = short_config(300);
    let range = SearchRange {
        min_assets: 120,
        max_assets: 220,
        step: 10,
    };
    let search = CapacitySearch::new(estimator(&cfg, 10), range, 0.8).expect("valid search");
    let outcome = search.run(&mut rng(2024));

    let SearchOutcome::Found { sizing, scanned } = outcome else {
        panic!("a 20 MW nameplate portfolio clears a 10 MW commitment");
    };
    assert!(sizing.probability >= 0.8);
    assert_eq!(scanned.last(), Some(&sizing));
    let expected: Vec<usize> = (120..=sizing.n_assets).step_by(10).collect();
    assert_eq!(
        scanned.iter().map(|c| c.n_assets).collect::<Vec<_>>(),
        expected
    );
    assert!(
        scanned[..scanned.len() - 1]
            .iter()
            .all(|c| c.probability < 0.8)
    );
}

#[test]
fn high_availability_large_portfolio_is_certain() {
    let cfg = ModelConfig::new(ModelParams {
        availability_probability: 0.99,
        slots_per_year: 500,
        ..ModelParams::default()
    })
    .expect("valid params");
    let e = estimator(&cfg, 20).estimate(200, &mut rng(3));
    assert_eq!(e.probability, 1.0);
}

#[test]
fn same_seed_same_search() {
    let cfg = short_config(100);
    let range = SearchRange {
        min_assets: 130,
        max_assets: 160,
        step: 10,
    };
    let search = CapacitySearch::new(estimator(&cfg, 6), range, 0.5).expect("valid search");
    let a = search.run(&mut rng(77));
    let b = search.run(&mut rng(77));
    assert_eq!(a.scanned(), b.scanned());
}
