//! Read-only REST API over a completed simulation run.
//!
//! Provides four GET endpoints:
//! - `/state` - engine parameters, KPI report, latest step and current metrics
//! - `/telemetry` - step records with optional cycle range filtering
//! - `/houses` - per-house state with an optional filter
//! - `/history` - the bounded trend history

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::devices::Fleet;
use crate::rng::RandomSource;
use crate::sim::clock::SimulationClock;
use crate::sim::engine::Simulation;
use crate::sim::history::HistorySample;
use crate::sim::kpi::KpiReport;
use crate::sim::metrics::MetricsSnapshot;
use crate::sim::types::{EngineParams, StepResult};

pub use types::{ErrorResponse, HouseRecord, HousesQuery, StateResponse, TelemetryQuery};

/// Immutable application state shared across all request handlers.
///
/// Constructed once after the simulation run completes and wrapped in
/// `Arc`; no locks needed since all data is read-only.
pub struct AppState {
    pub params: EngineParams,
    pub kpi: KpiReport,
    /// Per-step simulation results.
    pub results: Vec<StepResult>,
    /// Fleet as left by the last step.
    pub fleet: Fleet,
    pub clock: SimulationClock,
    pub history: Vec<HistorySample>,
    /// Aggregate of the final fleet state.
    pub metrics: MetricsSnapshot,
}

impl AppState {
    /// Snapshots a finished simulation and its step records.
    pub fn from_simulation<R: RandomSource>(sim: &Simulation<R>, results: Vec<StepResult>) -> Self {
        let kpi = KpiReport::from_results(&results, sim.feeder().stress_threshold_pct());
        Self {
            params: sim.params().clone(),
            kpi,
            results,
            fleet: sim.fleet().clone(),
            clock: *sim.clock(),
            history: sim.history().to_vec(),
            metrics: sim.metrics(),
        }
    }
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/telemetry", get(handlers::get_telemetry))
        .route("/houses", get(handlers::get_houses))
        .route("/history", get(handlers::get_history))
        .with_state(state)
}

/// Binds to the given address and serves the API.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
