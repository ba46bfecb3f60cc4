//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::types::{ErrorResponse, SizingResponse, TelemetryQuery, TelemetryRecord, YearResponse};

/// Returns the capacity search outcome.
///
/// `GET /sizing` → 200 + `SizingResponse` JSON, or 404 when no search ran.
pub async fn get_sizing(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.outcome {
        Some(outcome) => Ok(Json(SizingResponse {
            config: state.config.clone(),
            outcome: outcome.clone(),
        })),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "no capacity search was run".to_string(),
            }),
        )),
    }
}

/// Returns the KPI report of the tracked year.
///
/// `GET /year` → 200 + `YearResponse` JSON
pub async fn get_year(State(state): State<Arc<AppState>>) -> Json<YearResponse> {
    Json(YearResponse {
        config: state.config.clone(),
        report: state.report.clone(),
    })
}

/// Returns per-slot records, optionally filtered by slot range.
///
/// `GET /telemetry` → 200 + `Vec<TelemetryRecord>` JSON
/// `GET /telemetry?from=N&to=M` → filtered range (inclusive)
/// `GET /telemetry?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_telemetry(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TelemetryQuery>,
) -> impl IntoResponse {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(usize::MAX);

    if from > to {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("`from` ({from}) must be <= `to` ({to})"),
            }),
        ));
    }

    let last = state.trace.slot_count();
    let records: Vec<TelemetryRecord> = (from..last)
        .take_while(|&slot| slot <= to)
        .map(|slot| TelemetryRecord::from_trace(&state.trace, &state.config, slot))
        .collect();

    Ok(Json(records))
}
