//! The ordered set of houses on one transformer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::appliance::{ApplianceSet, CYCLE_KINDS, CycleAppliance, CycleKind};
use super::house::House;
use crate::error::EngineError;
use crate::rng::{ParkMiller, RandomSource};

/// Houses on the reference feeder.
pub const REFERENCE_FLEET_SIZE: usize = 50;

const EV_PROBABILITY: f64 = 0.4;
const BATTERY_MIN: f64 = 15.0;
const BATTERY_SPAN: f64 = 70.0;
const AC_PROBABILITY: f64 = 0.7;

/// Start probability and maximum initial progress for each cycle kind.
fn initial_cycle_odds(kind: CycleKind) -> (f64, f64) {
    match kind {
        CycleKind::Washer => (0.3, 60.0),
        CycleKind::Dryer => (0.2, 40.0),
        CycleKind::Dishwasher => (0.4, 50.0),
    }
}

/// Fixed-length, ordered collection of houses.
///
/// Created once by [`Fleet::generate`]; afterwards only the step engine and
/// the shedding controller mutate it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fleet {
    houses: Vec<House>,
}

impl Fleet {
    /// Generates a reproducible fleet of `size` houses from `seed`.
    ///
    /// Draws per house, in order: EV ownership, battery (EV houses only),
    /// AC presence, then active flag and progress for washer, dryer and
    /// dishwasher. Progress is kept only for appliances drawn as active.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidFleetSize`] for `size == 0` and
    /// [`EngineError::SeedOutOfRange`] for seeds the generator rejects.
    pub fn generate(seed: u64, size: usize) -> Result<Self, EngineError> {
        if size == 0 {
            return Err(EngineError::InvalidFleetSize(size));
        }
        let mut r = ParkMiller::new(seed)?;
        let houses = (0..size)
            .map(|i| Self::generate_house(&mut r, i as u32 + 1))
            .collect();
        Ok(Self { houses })
    }

    fn generate_house(r: &mut ParkMiller, id: u32) -> House {
        let has_ev = r.chance(EV_PROBABILITY);
        let battery = if has_ev {
            BATTERY_MIN + r.next_unit() * BATTERY_SPAN
        } else {
            0.0
        };
        let mut appliances = ApplianceSet {
            ac: r.chance(AC_PROBABILITY),
            ..ApplianceSet::default()
        };
        for kind in CYCLE_KINDS {
            let (p_active, max_progress) = initial_cycle_odds(kind);
            let active = r.chance(p_active);
            let progress = r.next_unit() * max_progress;
            *appliances.cycle_mut(kind) = if active {
                CycleAppliance::running(progress)
            } else {
                CycleAppliance::idle()
            };
        }
        House::new(id, has_ev, battery, appliances)
    }

    /// Wraps an explicit house list.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidFleetSize`] for an empty list.
    pub fn from_houses(houses: Vec<House>) -> Result<Self, EngineError> {
        if houses.is_empty() {
            return Err(EngineError::InvalidFleetSize(0));
        }
        Ok(Self { houses })
    }

    pub fn len(&self) -> usize {
        self.houses.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.houses.is_empty()
    }

    pub fn houses(&self) -> &[House] {
        &self.houses
    }

    pub(crate) fn houses_mut(&mut self) -> &mut [House] {
        &mut self.houses
    }

    /// Returns the house at zero-based `index`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::HouseIndexOutOfRange`] outside `[0, len)`.
    pub fn house(&self, index: usize) -> Result<&House, EngineError> {
        self.houses
            .get(index)
            .ok_or(EngineError::HouseIndexOutOfRange {
                index,
                len: self.houses.len(),
            })
    }

    /// Houses matching `filter`, in fleet order.
    pub fn filter(&self, filter: HouseFilter) -> impl Iterator<Item = &House> {
        self.houses.iter().filter(move |h| filter.matches(h))
    }

    /// Number of EV-equipped houses.
    pub fn ev_count(&self) -> usize {
        self.houses.iter().filter(|h| h.has_ev()).count()
    }
}

/// House selection used by the dashboard lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HouseFilter {
    #[default]
    All,
    /// Houses with an EV.
    Ev,
    /// Houses whose AC is present and suppressed.
    Suppressed,
    /// Houses with at least one running cycle appliance.
    Active,
}

impl HouseFilter {
    pub fn matches(self, house: &House) -> bool {
        match self {
            HouseFilter::All => true,
            HouseFilter::Ev => house.has_ev(),
            HouseFilter::Suppressed => house.ac_suppressed(),
            HouseFilter::Active => house.appliances.active_cycles() > 0,
        }
    }
}

impl FromStr for HouseFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(HouseFilter::All),
            "ev" => Ok(HouseFilter::Ev),
            "suppressed" => Ok(HouseFilter::Suppressed),
            "active" => Ok(HouseFilter::Active),
            other => Err(format!(
                "unknown filter \"{other}\", expected all, ev, suppressed or active"
            )),
        }
    }
}

impl fmt::Display for HouseFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HouseFilter::All => "all",
            HouseFilter::Ev => "ev",
            HouseFilter::Suppressed => "suppressed",
            HouseFilter::Active => "active",
        };
        f.write_str(name)
    }
}
