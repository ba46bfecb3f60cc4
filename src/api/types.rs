//! API response and query types.
//!
//! Telemetry field names follow the trace CSV columns.

use serde::{Deserialize, Serialize};

use crate::sim::kpi::YearReport;
use crate::sim::search::SearchOutcome;
use crate::sim::types::{ModelConfig, YearTrace};

/// Search result with the model it was computed for.
#[derive(Debug, Serialize)]
pub struct SizingResponse {
    pub config: ModelConfig,
    pub outcome: SearchOutcome,
}

/// KPI report of the tracked year.
#[derive(Debug, Serialize)]
pub struct YearResponse {
    pub config: ModelConfig,
    pub report: YearReport,
}

/// Single slot of the tracked year.
#[derive(Debug, Serialize)]
pub struct TelemetryRecord {
    /// Slot index.
    pub slot: usize,
    /// Slot start time in hours.
    pub time_hr: f64,
    /// Power deliverable by assets that were available with enough SOC (kW).
    pub delivered_kw: f64,
    pub required_kw: f64,
    pub success: bool,
    pub available_count: usize,
    pub soc_ok_count: usize,
    /// Mean SOC at slot start (kWh).
    pub mean_soc_kwh: f64,
}

impl TelemetryRecord {
    /// Builds the record for `slot`; the caller guarantees `slot < trace.slot_count()`.
    pub fn from_trace(trace: &YearTrace, config: &ModelConfig, slot: usize) -> Self {
        Self {
            slot,
            time_hr: slot as f64 * config.slot_hours(),
            delivered_kw: trace.delivered_kw[slot],
            required_kw: config.required_power_kw(),
            success: trace.success[slot],
            available_count: trace.available_count[slot],
            soc_ok_count: trace.soc_ok_count[slot],
            mean_soc_kwh: trace.mean_soc_at(slot),
        }
    }
}

/// Optional range query parameters for the telemetry endpoint.
#[derive(Debug, Deserialize)]
pub struct TelemetryQuery {
    /// Start slot (inclusive).
    pub from: Option<usize>,
    /// End slot (inclusive).
    pub to: Option<usize>,
}

/// Error response body for 4xx errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
