//! Per-step state transitions for houses, EVs and the clock.
//!
//! Neither transition can fail once started, so a step is applied entirely
//! or not at all.

use serde::Serialize;

use super::clock::SimulationClock;
use crate::devices::{CYCLE_KINDS, EvState, Fleet, House};
use crate::rng::RandomSource;

/// Progress a running cycle appliance gains per day step (%).
pub const CYCLE_PROGRESS_PER_STEP: f64 = 25.0;
/// Chance an idle cycle appliance starts during a day step.
pub const CYCLE_START_PROBABILITY: f64 = 0.08;
/// Battery removed by one V2G discharge step (percentage points).
pub const V2G_STEP_PCT: f64 = 3.0;
/// Battery added by one daytime trickle-charge step (percentage points).
pub const TRICKLE_STEP_PCT: f64 = 1.0;
/// Trickle charging stops at this state of charge (%).
pub const TRICKLE_CEILING_PCT: f64 = 90.0;
/// Battery added by one night charging step (percentage points).
pub const NIGHT_CHARGE_STEP_PCT: f64 = 20.0;
/// Length of the demand-response rotation (every third house sheds AC).
pub const AC_ROTA_PERIOD: u64 = 3;

/// Operating mode of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepMode {
    /// Peak shave: AC rota, cycle appliances run, EVs discharge.
    Day,
    /// Valley fill: no shedding, cycle loads stop, EVs charge.
    Night,
}

/// Whether the AC rota suppresses house `index` during cycle `cycle`.
///
/// Deterministic round-robin, no randomness involved.
pub fn ac_rota_suppressed(index: usize, cycle: u64) -> bool {
    (index as u64 + cycle) % AC_ROTA_PERIOD == 0
}

/// Advances the fleet by one peak-shave interval.
///
/// The rota uses the cycle being executed, i.e. the clock's cycle index
/// before this call increments it. EV discharge follows [`House::ev_state`]
/// on the incremented index, the same cycle the aggregator reads afterwards,
/// so a discharging step reports its V2G offset.
pub fn step_day<R: RandomSource + ?Sized>(
    fleet: &mut Fleet,
    clock: &mut SimulationClock,
    rng: &mut R,
) {
    let rota_cycle = clock.cycle_index();
    clock.advance_day();
    let ev_cycle = clock.cycle_index();
    for (index, house) in fleet.houses_mut().iter_mut().enumerate() {
        day_house(house, index, rota_cycle, ev_cycle, rng);
    }
}

fn day_house<R: RandomSource + ?Sized>(
    house: &mut House,
    index: usize,
    rota_cycle: u64,
    ev_cycle: u64,
    rng: &mut R,
) {
    if house.appliances.ac {
        house.is_ac_suppressed = ac_rota_suppressed(index, rota_cycle);
    }

    for kind in CYCLE_KINDS {
        let appliance = house.appliances.cycle_mut(kind);
        if appliance.is_active() {
            appliance.advance(CYCLE_PROGRESS_PER_STEP);
        } else if rng.chance(CYCLE_START_PROBABILITY) {
            appliance.start();
        }
    }

    if house.has_ev() {
        if house.ev_state(false, ev_cycle) == EvState::V2g {
            house.discharge(V2G_STEP_PCT);
        } else if house.battery() < TRICKLE_CEILING_PCT {
            house.charge(TRICKLE_STEP_PCT);
        }
    }
}

/// Advances the fleet by one valley-fill interval.
///
/// Consumes no randomness.
pub fn step_night(fleet: &mut Fleet, clock: &mut SimulationClock) {
    for house in fleet.houses_mut() {
        house.is_ac_suppressed = false;
        for kind in CYCLE_KINDS {
            house.appliances.cycle_mut(kind).stop();
        }
        if house.has_ev() && house.battery() < 100.0 {
            house.charge(NIGHT_CHARGE_STEP_PCT);
        }
    }
    clock.advance_night();
}
