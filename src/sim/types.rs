//! Core simulation types: engine parameters and per-step records.

use std::fmt;

use serde::Serialize;

use super::clock::{DEFAULT_START_MINUTES, SimulationClock};
use super::controller::ShedPolicy;
use super::feeder::{STRESS_THRESHOLD, TRANSFORMER_CAPACITY};
use super::history::HISTORY_CAPACITY;
use super::metrics::MetricsSnapshot;
use super::step::StepMode;
use crate::devices::REFERENCE_FLEET_SIZE;

/// Seed of the reference scenario's fleet.
pub const REFERENCE_SEED: u64 = 42;

/// Everything needed to build a [`Simulation`](super::engine::Simulation).
///
/// # Examples
///
/// ```
/// use gridpulse::sim::types::EngineParams;
///
/// let params = EngineParams::default();
/// assert_eq!(params.houses, 50);
/// assert_eq!(params.capacity_w, 225_000.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineParams {
    /// Number of houses on the feeder.
    pub houses: usize,
    /// Fleet generation seed; the runtime random stream is derived from it.
    pub seed: u64,
    /// Clock start in minutes after midnight.
    pub start_minutes: u64,
    /// Transformer rating (W).
    pub capacity_w: f64,
    /// Stress percentage that triggers shedding in stress-test mode.
    pub stress_threshold_pct: f64,
    pub policy: ShedPolicy,
    pub history_capacity: usize,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self::new(REFERENCE_FLEET_SIZE, REFERENCE_SEED)
    }
}

impl EngineParams {
    /// Reference parameters with a custom fleet size and seed.
    pub fn new(houses: usize, seed: u64) -> Self {
        Self {
            houses,
            seed,
            start_minutes: DEFAULT_START_MINUTES,
            capacity_w: TRANSFORMER_CAPACITY,
            stress_threshold_pct: STRESS_THRESHOLD,
            policy: ShedPolicy::default(),
            history_capacity: HISTORY_CAPACITY,
        }
    }
}

/// Complete record of one simulation step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    /// Clock cycle index after the step.
    pub cycle_index: u64,
    /// Clock minutes after the step.
    pub raw_minutes: u64,
    pub mode: StepMode,
    /// Whether stress-test mode was active when the step settled.
    pub stress_test: bool,
    /// Appliance demand (W).
    pub raw_load_w: f64,
    /// Transformer load (W).
    pub net_load_w: f64,
    /// EV contribution (W; positive=V2G, negative=charging).
    pub ev_net_w: f64,
    pub stress_pct: f64,
    pub over_threshold: bool,
    pub ac_on: usize,
    pub ac_suppressed: usize,
    pub cycle_active: usize,
    pub ev_charging: usize,
    pub ev_v2g: usize,
    pub avg_battery_pct: f64,
    /// Shed passes run by the post-step check.
    pub shed_passes: usize,
    pub co2_saved_lbs: f64,
    pub cost_saved_usd: f64,
    /// Running total of emissions avoided (lb).
    pub total_co2_saved_lbs: f64,
    /// Running total of cost avoided (USD).
    pub total_cost_saved_usd: f64,
}

impl StepResult {
    /// Builds a record from the settled metrics of a step.
    #[expect(clippy::too_many_arguments)]
    pub fn from_metrics(
        clock: &SimulationClock,
        mode: StepMode,
        stress_test: bool,
        over_threshold: bool,
        metrics: &MetricsSnapshot,
        shed_passes: usize,
        total_co2_saved_lbs: f64,
        total_cost_saved_usd: f64,
    ) -> Self {
        Self {
            cycle_index: clock.cycle_index(),
            raw_minutes: clock.raw_minutes(),
            mode,
            stress_test,
            raw_load_w: metrics.raw_load_w,
            net_load_w: metrics.net_load_w,
            ev_net_w: metrics.ev_net_w,
            stress_pct: metrics.stress_pct,
            over_threshold,
            ac_on: metrics.ac_on,
            ac_suppressed: metrics.ac_suppressed,
            cycle_active: metrics.cycle_active,
            ev_charging: metrics.ev_charging,
            ev_v2g: metrics.ev_v2g,
            avg_battery_pct: metrics.avg_battery_pct,
            shed_passes,
            co2_saved_lbs: metrics.co2_saved_lbs,
            cost_saved_usd: metrics.cost_saved_usd,
            total_co2_saved_lbs,
            total_cost_saved_usd,
        }
    }

    /// Wrapped `HH:MM` label of the step's clock.
    pub fn time_label(&self) -> String {
        format!(
            "{:02}:{:02}",
            (self.raw_minutes / 60) % 24,
            self.raw_minutes % 60
        )
    }
}

impl fmt::Display for StepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode {
            StepMode::Day => "day",
            StepMode::Night => "night",
        };
        write!(
            f,
            "c={:>3} ({}) {:<5} | net={:>7.1} kW  raw={:>7.1} kW  ev={:>6.1} kW  \
             stress={:>5.1}% | ac(on={}, off={}) cycles={} ev(chg={}, v2g={}) \
             soc={:.1}% | shed={} stress_test={} | saved {:.2} lb / ${:.2}",
            self.cycle_index,
            self.time_label(),
            mode,
            self.net_load_w / 1000.0,
            self.raw_load_w / 1000.0,
            self.ev_net_w / 1000.0,
            self.stress_pct,
            self.ac_on,
            self.ac_suppressed,
            self.cycle_active,
            self.ev_charging,
            self.ev_v2g,
            self.avg_battery_pct,
            self.shed_passes,
            self.stress_test,
            self.total_co2_saved_lbs,
            self.total_cost_saved_usd,
        )
    }
}
