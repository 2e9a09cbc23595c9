//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;

use super::AppState;
use super::types::{ErrorResponse, HouseRecord, HousesQuery, StateResponse, TelemetryQuery};
use crate::devices::HouseFilter;
use crate::sim::history::HistorySample;
use crate::sim::types::StepResult;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(error: String) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error }))
}

/// `GET /state` → 200 + `StateResponse` JSON
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    Json(StateResponse {
        params: state.params.clone(),
        kpi: state.kpi.clone(),
        latest_step: state.results.last().cloned(),
        metrics: state.metrics.clone(),
        time: state.clock.to_string(),
    })
}

/// Returns step records, optionally filtered by cycle index.
///
/// `GET /telemetry` → 200 + `Vec<StepResult>` JSON
/// `GET /telemetry?from=N&to=M` → filtered range (inclusive)
/// `GET /telemetry?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_telemetry(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TelemetryQuery>,
) -> Result<Json<Vec<StepResult>>, ApiError> {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(u64::MAX);

    if from > to {
        return Err(bad_request(format!(
            "`from` ({from}) must be <= `to` ({to})"
        )));
    }

    let records = state
        .results
        .iter()
        .filter(|r| r.cycle_index >= from && r.cycle_index <= to)
        .cloned()
        .collect();

    Ok(Json(records))
}

/// `GET /houses?filter=all|ev|suppressed|active` → 200 + `Vec<HouseRecord>`;
/// an unknown filter → 400.
pub async fn get_houses(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HousesQuery>,
) -> Result<Json<Vec<HouseRecord>>, ApiError> {
    let filter = match query.filter.as_deref() {
        None => HouseFilter::All,
        Some(name) => name.parse::<HouseFilter>().map_err(bad_request)?,
    };

    let houses: Vec<HouseRecord> = state
        .fleet
        .filter(filter)
        .map(|h| HouseRecord::new(h, &state.clock))
        .collect();

    Ok(Json(houses))
}

/// `GET /history` → 200 + samples oldest first.
pub async fn get_history(State(state): State<Arc<AppState>>) -> Json<Vec<HistorySample>> {
    Json(state.history.clone())
}
