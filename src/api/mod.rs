//! Read-only REST API over a finished sizing run.
//!
//! Provides three GET endpoints:
//! - `/sizing`: search outcome with every scanned candidate
//! - `/year`: KPI report of the tracked year
//! - `/telemetry`: per-slot records with optional range filtering

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::error::Result;
use crate::sim::kpi::YearReport;
use crate::sim::search::SearchOutcome;
use crate::sim::types::{ModelConfig, YearTrace};

/// Immutable application state shared across all request handlers.
///
/// Constructed once after the run completes and wrapped in `Arc`; all data
/// is read-only so no locks are needed.
pub struct AppState {
    /// Model configuration used for this run.
    pub config: ModelConfig,
    /// Capacity search result, absent when a fixed size was analyzed.
    pub outcome: Option<SearchOutcome>,
    /// KPI report of the tracked year.
    pub report: YearReport,
    /// Per-slot history of the tracked year.
    pub trace: YearTrace,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/sizing", get(handlers::get_sizing))
        .route("/year", get(handlers::get_year))
        .route("/telemetry", get(handlers::get_telemetry))
        .with_state(state)
}

/// Binds to the given address and serves the API until the process exits.
///
/// # Errors
///
/// Returns an I/O error if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
