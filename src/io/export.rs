//! CSV export for year traces and search scans.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::error::Result;
use crate::sim::types::{ModelConfig, SizingResult, YearTrace};

/// Column header for the per-slot year trace.
const TRACE_HEADER: &str = "slot,time_hr,delivered_kw,required_kw,success,\
                            available_count,soc_ok_count,mean_soc_kwh,min_soc_kwh,\
                            cumulative_success_rate";

/// Column header for the capacity search scan.
const SCAN_HEADER: &str = "n_assets,installed_capacity_kw,oversizing_ratio,probability";

fn create(path: &Path) -> Result<io::BufWriter<File>> {
    Ok(io::BufWriter::new(File::create(path)?))
}

/// Exports a tracked year to a CSV file, one row per slot.
///
/// # Errors
///
/// Returns an error if file creation or writing fails.
pub fn export_trace_csv(trace: &YearTrace, config: &ModelConfig, path: &Path) -> Result<()> {
    write_trace_csv(trace, config, create(path)?)
}

/// Writes a tracked year as CSV to any writer.
///
/// SOC columns describe the state at the start of each slot, which is the
/// state the slot was evaluated against.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_trace_csv(trace: &YearTrace, config: &ModelConfig, writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(TRACE_HEADER.split(',').map(str::trim))?;

    let mut successes = 0_usize;
    for slot in 0..trace.slot_count() {
        if trace.success[slot] {
            successes += 1;
        }
        let mean_soc = trace.mean_soc_at(slot);
        let min_soc = trace.min_soc_at(slot);

        wtr.write_record(&[
            slot.to_string(),
            format!("{:.1}", slot as f64 * config.slot_hours()),
            format!("{:.4}", trace.delivered_kw[slot]),
            format!("{:.1}", config.required_power_kw()),
            trace.success[slot].to_string(),
            trace.available_count[slot].to_string(),
            trace.soc_ok_count[slot].to_string(),
            format!("{mean_soc:.4}"),
            format!("{min_soc:.4}"),
            format!("{:.6}", successes as f64 / (slot + 1) as f64),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports the SOC matrix of the first `max_assets` assets (all if `None`).
///
/// # Errors
///
/// Returns an error if file creation or writing fails.
pub fn export_soc_csv(trace: &YearTrace, max_assets: Option<usize>, path: &Path) -> Result<()> {
    write_soc_csv(trace, max_assets, create(path)?)
}

/// Writes `slots + 1` rows of `slot,asset_0,...`; row 0 is the initial SOC.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_soc_csv(trace: &YearTrace, max_assets: Option<usize>, writer: impl Write) -> Result<()> {
    let k = max_assets.map_or(trace.n_assets, |m| m.min(trace.n_assets));
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    let header: Vec<String> = std::iter::once("slot".to_string())
        .chain((0..k).map(|i| format!("asset_{i}")))
        .collect();
    wtr.write_record(&header)?;

    for (slot, row) in trace.soc_history.iter().enumerate() {
        let record: Vec<String> = std::iter::once(slot.to_string())
            .chain(row[..k].iter().map(|soc| format!("{soc:.4}")))
            .collect();
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports every candidate evaluated by the capacity search.
///
/// # Errors
///
/// Returns an error if file creation or writing fails.
pub fn export_scan_csv(scanned: &[SizingResult], path: &Path) -> Result<()> {
    write_scan_csv(scanned, create(path)?)
}

/// Writes scanned candidates as CSV, in scan order.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_scan_csv(scanned: &[SizingResult], writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(SCAN_HEADER.split(','))?;
    for c in scanned {
        wtr.write_record(&[
            c.n_assets.to_string(),
            format!("{:.1}", c.installed_capacity_kw),
            format!("{:.4}", c.oversizing_ratio),
            format!("{:.4}", c.probability),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
