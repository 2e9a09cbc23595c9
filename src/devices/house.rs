//! Household model with optional EV.

use serde::Serialize;

use super::appliance::ApplianceSet;

/// EV charger draw while valley-filling (W).
pub const EV_CHARGE_W: f64 = 7000.0;
/// EV export while discharging to the feeder (W).
pub const V2G_DISCHARGE_W: f64 = 3200.0;
/// State of charge an EV must exceed before it discharges (%).
pub const V2G_MIN_BATTERY: f64 = 40.0;

/// What an EV is doing to the feeder in the current interval.
///
/// # Power Flow Convention (Feeder)
/// `Charging` draws from the feeder, `V2g` offsets feeder load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvState {
    /// No EV, or an EV neither charging nor discharging.
    Idle,
    Charging,
    V2g,
}

/// One household on the feeder.
///
/// `id` and `has_ev` are fixed at creation. `battery` is a state of charge
/// in `[0, 100]` and stays `0` for houses without an EV.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct House {
    id: u32,
    has_ev: bool,
    battery: f64,
    /// Demand-response flag. A present AC runs unless this is set.
    pub is_ac_suppressed: bool,
    pub appliances: ApplianceSet,
}

impl House {
    /// Creates a house. `battery` is clamped to `[0, 100]` and ignored
    /// when `has_ev` is false.
    pub fn new(id: u32, has_ev: bool, battery: f64, appliances: ApplianceSet) -> Self {
        Self {
            id,
            has_ev,
            battery: if has_ev { battery.clamp(0.0, 100.0) } else { 0.0 },
            is_ac_suppressed: false,
            appliances,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn has_ev(&self) -> bool {
        self.has_ev
    }

    /// EV state of charge (%), `0` without an EV.
    pub fn battery(&self) -> f64 {
        self.battery
    }

    /// Adds `delta` percentage points, clamped to `[0, 100]`. No-op without an EV.
    pub fn charge(&mut self, delta: f64) {
        if self.has_ev {
            self.battery = (self.battery + delta).clamp(0.0, 100.0);
        }
    }

    /// Removes `delta` percentage points, floored at `0`. No-op without an EV.
    pub fn discharge(&mut self, delta: f64) {
        self.charge(-delta);
    }

    /// Whether the AC is present and currently drawing.
    pub fn ac_running(&self) -> bool {
        self.appliances.ac && !self.is_ac_suppressed
    }

    /// Whether the AC is present and held off by demand response.
    pub fn ac_suppressed(&self) -> bool {
        self.appliances.ac && self.is_ac_suppressed
    }

    /// Classifies the EV's feeder interaction for the given interval.
    ///
    /// At night any EV below full charges. By day, on even cycles, an EV
    /// above [`V2G_MIN_BATTERY`] discharges.
    pub fn ev_state(&self, is_night: bool, cycle_index: u64) -> EvState {
        if !self.has_ev {
            return EvState::Idle;
        }
        if is_night {
            if self.battery < 100.0 {
                return EvState::Charging;
            }
        } else if cycle_index % 2 == 0 && self.battery > V2G_MIN_BATTERY {
            return EvState::V2g;
        }
        EvState::Idle
    }
}
