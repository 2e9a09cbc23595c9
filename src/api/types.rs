//! API response and query types.

use serde::{Deserialize, Serialize};

use crate::devices::{CycleKind, EvState, House};
use crate::sim::clock::SimulationClock;
use crate::sim::kpi::KpiReport;
use crate::sim::metrics::MetricsSnapshot;
use crate::sim::types::{EngineParams, StepResult};

/// Combined state response.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub params: EngineParams,
    pub kpi: KpiReport,
    /// Most recent step record, absent before the first step.
    pub latest_step: Option<StepResult>,
    /// Aggregate of the fleet as it stands.
    pub metrics: MetricsSnapshot,
    /// Wrapped `HH:MM` of the simulation clock.
    pub time: String,
}

/// One house as exposed by `/houses`.
#[derive(Debug, Serialize)]
pub struct HouseRecord {
    pub id: u32,
    pub has_ev: bool,
    pub battery_pct: f64,
    pub ev_state: EvState,
    pub ac_present: bool,
    pub ac_running: bool,
    pub ac_suppressed: bool,
    /// Running cycle appliances with their progress (%).
    pub cycles: Vec<(CycleKind, f64)>,
}

impl HouseRecord {
    /// Builds the record against `clock`, which decides the EV state.
    pub fn new(house: &House, clock: &SimulationClock) -> Self {
        Self {
            id: house.id(),
            has_ev: house.has_ev(),
            battery_pct: house.battery(),
            ev_state: house.ev_state(clock.is_night(), clock.cycle_index()),
            ac_present: house.appliances.ac,
            ac_running: house.ac_running(),
            ac_suppressed: house.ac_suppressed(),
            cycles: house
                .appliances
                .cycles()
                .filter(|(_, c)| c.is_active())
                .map(|(kind, c)| (kind, c.progress()))
                .collect(),
        }
    }
}

/// Optional range query parameters for the telemetry endpoint.
#[derive(Debug, Deserialize)]
pub struct TelemetryQuery {
    /// Start cycle index (inclusive).
    pub from: Option<u64>,
    /// End cycle index (inclusive).
    pub to: Option<u64>,
}

/// Optional filter for the houses endpoint (`all`, `ev`, `suppressed`, `active`).
#[derive(Debug, Deserialize)]
pub struct HousesQuery {
    pub filter: Option<String>,
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
