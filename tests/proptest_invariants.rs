//! Property-based tests for the step engine, aggregation and allocation.
//!
//! Uses proptest to generate fleets, draw scripts and step sequences, then
//! verify the invariants every step must preserve.

use gridpulse::devices::Fleet;
use gridpulse::rng::Scripted;
use gridpulse::sim::allocation::{EvCapacity, allocate, plan_total};
use gridpulse::sim::clock::SimulationClock;
use gridpulse::sim::controller::emergency_shed;
use gridpulse::sim::feeder::Feeder;
use gridpulse::sim::metrics::aggregate;
use gridpulse::sim::step::{StepMode, step_day, step_night};
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

fn arb_fleet() -> impl Strategy<Value = Fleet> {
    (1u64..2_147_483_647, 1usize..60)
        .prop_map(|(seed, size)| gridpulse::create_fleet(seed, size).expect("valid seed and size"))
}

fn arb_modes(max_steps: usize) -> impl Strategy<Value = Vec<StepMode>> {
    proptest::collection::vec(
        prop_oneof![3 => Just(StepMode::Day), 1 => Just(StepMode::Night)],
        1..=max_steps,
    )
}

fn arb_draws() -> impl Strategy<Value = Vec<f64>> {
    proptest::collection::vec(0.0f64..1.0, 1..32)
}

fn arb_capacities() -> impl Strategy<Value = Vec<EvCapacity>> {
    proptest::collection::vec(0.0f64..10_000.0, 0..20).prop_map(|caps| {
        caps.into_iter()
            .enumerate()
            .map(|(i, available)| EvCapacity {
                id: i as u32 + 1,
                available,
            })
            .collect()
    })
}

fn check_fleet(fleet: &Fleet) -> Result<(), TestCaseError> {
    for house in fleet.houses() {
        prop_assert!((0.0..=100.0).contains(&house.battery()));
        if !house.has_ev() {
            prop_assert_eq!(house.battery(), 0.0);
        }
        for (_, appliance) in house.appliances.cycles() {
            if appliance.is_active() {
                prop_assert!((0.0..100.0).contains(&appliance.progress()));
            } else {
                prop_assert_eq!(appliance.progress(), 0.0);
            }
        }
    }
    Ok(())
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Battery bounds and the progress invariant survive any step sequence.
    #[test]
    fn steps_preserve_house_invariants(
        mut fleet in arb_fleet(),
        modes in arb_modes(40),
        draws in arb_draws(),
    ) {
        let mut clock = SimulationClock::default();
        let mut rng = Scripted::new(draws);
        check_fleet(&fleet)?;
        for mode in &modes {
            match mode {
                StepMode::Day => step_day(&mut fleet, &mut clock, &mut rng),
                StepMode::Night => step_night(&mut fleet, &mut clock),
            }
            check_fleet(&fleet)?;
        }
        prop_assert_eq!(clock.cycle_index(), modes.len() as u64);
    }

    /// Fleet generation is a pure function of seed and size.
    #[test]
    fn fleet_generation_is_deterministic(seed in 1u64..2_147_483_647, size in 1usize..80) {
        let a = gridpulse::create_fleet(seed, size).expect("valid");
        let b = gridpulse::create_fleet(seed, size).expect("valid");
        prop_assert_eq!(a, b);
    }

    /// Stress is non-decreasing in net load and always within [0, 100].
    #[test]
    fn stress_is_monotonic_and_bounded(a in -500_000.0f64..500_000.0, b in -500_000.0f64..500_000.0) {
        let feeder = Feeder::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let (s_lo, s_hi) = (feeder.stress_pct(lo), feeder.stress_pct(hi));
        prop_assert!(s_lo <= s_hi);
        prop_assert!((0.0..=100.0).contains(&s_lo));
        prop_assert!((0.0..=100.0).contains(&s_hi));
        if lo > 0.0 && hi < feeder.capacity_w() && hi - lo > 1.0 {
            prop_assert!(s_lo < s_hi);
        }
    }

    /// Aggregation never mutates and always reports a clamped stress.
    #[test]
    fn aggregation_is_pure(fleet in arb_fleet(), night in any::<bool>(), draws in arb_draws()) {
        let mut fleet = fleet;
        let mut clock = SimulationClock::default();
        if night {
            step_night(&mut fleet, &mut clock);
        } else {
            step_day(&mut fleet, &mut clock, &mut Scripted::new(draws));
        }
        let before = fleet.clone();
        let first = aggregate(&fleet, &clock);
        let second = aggregate(&fleet, &clock);
        prop_assert_eq!(&fleet, &before);
        prop_assert_eq!(&first, &second);
        prop_assert!((0.0..=100.0).contains(&first.stress_pct));
        prop_assert_eq!(first.net_load_w, first.raw_load_w - first.ev_net_w);
    }

    /// A second shed pass after a certain-stop pass changes nothing.
    #[test]
    fn shedding_reaches_a_fixed_point(mut fleet in arb_fleet(), draws in arb_draws()) {
        let mut rng = Scripted::new(draws);
        emergency_shed(&mut fleet, 1.0, &mut rng);
        let settled = fleet.clone();
        let report = emergency_shed(&mut fleet, 1.0, &mut rng);
        prop_assert!(report.is_empty());
        prop_assert_eq!(fleet, settled);
    }

    /// Greedy allocation never over-commits an EV or the requirement and
    /// keeps input order.
    #[test]
    fn allocation_respects_bounds(evs in arb_capacities(), required in 0.0f64..100_000.0) {
        let plan = allocate(&evs, required).expect("finite requirement");
        let total = plan_total(&plan);
        let capacity: f64 = evs.iter().map(|e| e.available).sum();

        prop_assert!(plan.len() <= evs.len());
        for (a, ev) in plan.iter().zip(&evs) {
            prop_assert_eq!(a.id, ev.id);
            prop_assert!(a.give <= ev.available);
            prop_assert!(a.give >= 0.0);
        }
        prop_assert!(total <= required + 1e-6);
        prop_assert!(total <= capacity + 1e-6);
        if capacity >= required {
            prop_assert!((total - required).abs() < 1e-6);
        }
    }
}
