//! Load and stress aggregation over the fleet.

use serde::Serialize;

use super::clock::SimulationClock;
use super::feeder::Feeder;
use super::power_balance::feeder_net_w;
use crate::devices::{ApplianceKind, EV_CHARGE_W, EvState, Fleet, V2G_DISCHARGE_W};

/// Energy accounting interval per step (h).
pub const STEP_HOURS: f64 = 0.25;
/// Grid emissions avoided per kWh not drawn at peak (lb CO2).
pub const CO2_LBS_PER_KWH: f64 = 0.92;
/// Peak tariff avoided per kWh (USD).
pub const PEAK_PRICE_PER_KWH: f64 = 0.13;
/// Saving per kWh shifted into the off-peak valley (USD).
pub const VALLEY_SAVING_PER_KWH: f64 = 0.07;

/// Feeder metrics derived from one fleet and clock state.
///
/// Recomputed on demand and never stored as source of truth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    /// Appliance demand before EV contribution (W).
    pub raw_load_w: f64,
    /// Transformer load after EV contribution (W).
    pub net_load_w: f64,
    /// EV fleet contribution (W; positive=V2G, negative=charging).
    pub ev_net_w: f64,
    /// Present ACs currently running.
    pub ac_on: usize,
    /// Present ACs held off by demand response.
    pub ac_suppressed: usize,
    /// Running cycle appliances across all houses.
    pub cycle_active: usize,
    pub ev_charging: usize,
    pub ev_v2g: usize,
    pub ev_count: usize,
    /// Mean EV state of charge (%), `0` without EVs.
    pub avg_battery_pct: f64,
    /// Net load as a percentage of rating, clamped to `[0, 100]`.
    pub stress_pct: f64,
    /// Emissions avoided this step by suppression and V2G (lb).
    pub co2_saved_lbs: f64,
    /// Cost avoided this step by suppression, valley charging and V2G (USD).
    pub cost_saved_usd: f64,
}

/// Aggregates the fleet against the reference transformer.
pub fn aggregate(fleet: &Fleet, clock: &SimulationClock) -> MetricsSnapshot {
    aggregate_on(&Feeder::default(), fleet, clock)
}

/// Aggregates the fleet against `feeder`'s rating.
///
/// Pure: reads the fleet and clock, mutates nothing.
pub fn aggregate_on(feeder: &Feeder, fleet: &Fleet, clock: &SimulationClock) -> MetricsSnapshot {
    let ac_kwh = ApplianceKind::Ac.watts() / 1000.0 * STEP_HOURS;
    let charge_kwh = EV_CHARGE_W / 1000.0 * STEP_HOURS;
    let v2g_kwh = V2G_DISCHARGE_W / 1000.0 * STEP_HOURS;

    let mut raw_load_w = 0.0;
    let mut ev_net_w = 0.0;
    let mut ac_on = 0;
    let mut ac_suppressed = 0;
    let mut cycle_active = 0;
    let mut ev_charging = 0;
    let mut ev_v2g = 0;
    let mut co2_saved_lbs = 0.0;
    let mut cost_saved_usd = 0.0;
    let mut battery_sum = 0.0;
    let mut ev_count = 0;

    for house in fleet.houses() {
        if house.ac_suppressed() {
            ac_suppressed += 1;
            co2_saved_lbs += ac_kwh * CO2_LBS_PER_KWH;
            cost_saved_usd += ac_kwh * PEAK_PRICE_PER_KWH;
        } else if house.ac_running() {
            raw_load_w += ApplianceKind::Ac.watts();
            ac_on += 1;
        }

        raw_load_w += house.appliances.cycle_load_w();
        cycle_active += house.appliances.active_cycles();

        if house.has_ev() {
            ev_count += 1;
            battery_sum += house.battery();
        }
        match house.ev_state(clock.is_night(), clock.cycle_index()) {
            EvState::Charging => {
                ev_net_w -= EV_CHARGE_W;
                ev_charging += 1;
                cost_saved_usd += charge_kwh * VALLEY_SAVING_PER_KWH;
            }
            EvState::V2g => {
                ev_net_w += V2G_DISCHARGE_W;
                ev_v2g += 1;
                co2_saved_lbs += v2g_kwh * CO2_LBS_PER_KWH;
                cost_saved_usd += v2g_kwh * PEAK_PRICE_PER_KWH;
            }
            EvState::Idle => {}
        }
    }

    let net_load_w = feeder_net_w(raw_load_w, ev_net_w);
    let avg_battery_pct = if ev_count > 0 {
        battery_sum / ev_count as f64
    } else {
        0.0
    };

    MetricsSnapshot {
        raw_load_w,
        net_load_w,
        ev_net_w,
        ac_on,
        ac_suppressed,
        cycle_active,
        ev_charging,
        ev_v2g,
        ev_count,
        avg_battery_pct,
        stress_pct: feeder.stress_pct(net_load_w),
        co2_saved_lbs,
        cost_saved_usd,
    }
}
