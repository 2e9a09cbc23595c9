//! Shared test fixtures for integration tests.

use gridpulse::devices::{ApplianceSet, CycleAppliance, Fleet, House};
use gridpulse::rng::Scripted;
use gridpulse::sim::engine::Simulation;
use gridpulse::sim::types::EngineParams;

/// The reference fleet: 50 houses from seed 42.
pub fn reference_fleet() -> Fleet {
    gridpulse::create_fleet(42, 50).expect("reference fleet")
}

/// House with an AC and every cycle appliance running (12.4 kW).
pub fn busy_house(id: u32, has_ev: bool, battery: f64) -> House {
    let set = ApplianceSet {
        ac: true,
        washer: CycleAppliance::running(0.0),
        dryer: CycleAppliance::running(25.0),
        dishwasher: CycleAppliance::running(50.0),
    };
    House::new(id, has_ev, battery, set)
}

/// House with only an EV.
pub fn ev_house(id: u32, battery: f64) -> House {
    House::new(id, true, battery, ApplianceSet::default())
}

pub fn fleet_of(houses: Vec<House>) -> Fleet {
    Fleet::from_houses(houses).expect("non-empty fleet")
}

/// Reference simulation whose every runtime draw is `draw`.
pub fn scripted_simulation(draw: f64) -> Simulation<Scripted> {
    Simulation::with_rng(EngineParams::default(), Scripted::constant(draw))
        .expect("reference params")
}

/// Asserts the cycle progress invariant on every house.
pub fn assert_progress_invariant(fleet: &Fleet) {
    for house in fleet.houses() {
        for (kind, appliance) in house.appliances.cycles() {
            let p = appliance.progress();
            if appliance.is_active() {
                assert!(
                    (0.0..100.0).contains(&p),
                    "house {} {kind:?} active with progress {p}",
                    house.id()
                );
            } else {
                assert_eq!(p, 0.0, "house {} {kind:?} idle with progress {p}", house.id());
            }
        }
    }
}

/// Asserts every battery lies in `[0, 100]` and non-EV batteries are 0.
pub fn assert_battery_bounds(fleet: &Fleet) {
    for house in fleet.houses() {
        let b = house.battery();
        assert!((0.0..=100.0).contains(&b), "house {} battery {b}", house.id());
        if !house.has_ev() {
            assert_eq!(b, 0.0);
        }
    }
}
