//! Post-hoc diagnostics computed from a tracked year.

use std::fmt;

use serde::Serialize;

use super::types::{ModelConfig, YearTrace, mean};

/// Aggregate indicators derived from one [`YearTrace`].
///
/// Computed after the run so that reported values always agree with the
/// per-slot series.
#[derive(Debug, Clone, Serialize)]
pub struct YearReport {
    pub n_assets: usize,
    pub slots: usize,
    /// Fraction of slots that met the commitment.
    pub success_rate: f64,
    pub successful_slots: usize,
    /// Whether `success_rate` reaches the annual threshold.
    pub meets_target: bool,
    pub min_success_rate: f64,
    /// Nameplate capacity (kW).
    pub installed_capacity_kw: f64,
    pub oversizing_ratio: f64,
    /// `1 / p`.
    pub theoretical_oversizing: f64,
    pub mean_available: f64,
    pub min_available: usize,
    pub mean_soc_ok: f64,
    pub min_soc_ok: usize,
    /// Mean deliverable power per slot (kW).
    pub mean_delivered_kw: f64,
    /// Lowest deliverable power in any slot (kW).
    pub min_delivered_kw: f64,
    /// Mean SOC across assets before the first slot (kWh).
    pub initial_mean_soc_kwh: f64,
    /// Mean SOC across assets after the last slot (kWh).
    pub final_mean_soc_kwh: f64,
    /// Assets whose SOC reached zero at least once.
    pub depleted_assets: usize,
    /// Longest run of consecutive failed slots.
    pub longest_failure_streak: usize,
    /// Expected net SOC change per slot (fraction of mean SOC).
    pub expected_net_balance: f64,
}

impl YearReport {
    /// Computes all indicators from `trace`.
    ///
    /// Means over an empty portfolio or an empty year are reported as zero.
    pub fn from_trace(trace: &YearTrace, config: &ModelConfig) -> Self {
        let n = trace.n_assets;
        let slots = trace.slot_count();

        let mut streak = 0_usize;
        let mut longest_failure_streak = 0_usize;
        for &ok in &trace.success {
            streak = if ok { 0 } else { streak + 1 };
            longest_failure_streak = longest_failure_streak.max(streak);
        }

        let depleted_assets = (0..n)
            .filter(|&asset| trace.soc_history.iter().any(|row| row[asset] <= 0.0))
            .count();

        Self {
            n_assets: n,
            slots,
            success_rate: trace.success_rate,
            successful_slots: trace.successful_slots(),
            meets_target: slots > 0 && trace.success_rate >= config.min_success_rate(),
            min_success_rate: config.min_success_rate(),
            installed_capacity_kw: config.installed_capacity_kw(n),
            oversizing_ratio: config.oversizing_ratio(n),
            theoretical_oversizing: config.theoretical_oversizing(),
            mean_available: mean_count(&trace.available_count),
            min_available: trace.available_count.iter().copied().min().unwrap_or(0),
            mean_soc_ok: mean_count(&trace.soc_ok_count),
            min_soc_ok: trace.soc_ok_count.iter().copied().min().unwrap_or(0),
            mean_delivered_kw: mean(&trace.delivered_kw),
            min_delivered_kw: trace
                .delivered_kw
                .iter()
                .copied()
                .reduce(f64::min)
                .unwrap_or(0.0),
            initial_mean_soc_kwh: trace.soc_history.first().map_or(0.0, |row| mean(row)),
            final_mean_soc_kwh: trace.soc_history.last().map_or(0.0, |row| mean(row)),
            depleted_assets,
            longest_failure_streak,
            expected_net_balance: config.expected_net_balance(),
        }
    }
}

fn mean_count(values: &[usize]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<usize>() as f64 / values.len() as f64
    }
}

fn share(count: f64, n_assets: usize) -> f64 {
    if n_assets == 0 {
        0.0
    } else {
        100.0 * count / n_assets as f64
    }
}

impl fmt::Display for YearReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Year Report ({} assets) ---", self.n_assets)?;
        writeln!(
            f,
            "Annual success rate:   {:.2}% ({} / {} slots, target {:.0}%: {})",
            self.success_rate * 100.0,
            self.successful_slots,
            self.slots,
            self.min_success_rate * 100.0,
            if self.meets_target { "met" } else { "missed" },
        )?;
        writeln!(
            f,
            "Installed capacity:    {:.1} MW (oversizing x{:.2}, theoretical 1/p x{:.2})",
            self.installed_capacity_kw / 1000.0,
            self.oversizing_ratio,
            self.theoretical_oversizing,
        )?;
        writeln!(
            f,
            "Available assets:      mean {:.1} ({:.1}%), min {}",
            self.mean_available,
            share(self.mean_available, self.n_assets),
            self.min_available,
        )?;
        writeln!(
            f,
            "SOC-sufficient assets: mean {:.1} ({:.1}%), min {}",
            self.mean_soc_ok,
            share(self.mean_soc_ok, self.n_assets),
            self.min_soc_ok,
        )?;
        writeln!(
            f,
            "Delivered power:       mean {:.2} MW, min {:.2} MW",
            self.mean_delivered_kw / 1000.0,
            self.min_delivered_kw / 1000.0,
        )?;
        writeln!(
            f,
            "Mean SOC:              {:.1} kWh -> {:.1} kWh (expected balance {:+.3}% per slot)",
            self.initial_mean_soc_kwh,
            self.final_mean_soc_kwh,
            self.expected_net_balance * 100.0,
        )?;
        writeln!(f, "Depleted assets:       {}", self.depleted_assets)?;
        write!(f, "Longest failure run:   {} slots", self.longest_failure_streak)
    }
}
