//! Simulation driver that owns the fleet, clock, controller, and history.

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use super::allocation::{DispatchPlan, v2g_capacities};
use super::clock::SimulationClock;
use super::controller::{LoadShedController, Settled, ShedReport, SurgeReport, Transition};
use super::feeder::Feeder;
use super::history::{History, HistorySample};
use super::metrics::{MetricsSnapshot, aggregate_on};
use super::schedule::RunPlan;
use super::step::{StepMode, step_day, step_night};
use super::types::{EngineParams, StepResult};
use crate::devices::{Fleet, House};
use crate::error::EngineError;
use crate::rng::RandomSource;

/// Offset added to the fleet seed to derive the runtime random stream.
pub const RUNTIME_SEED_OFFSET: u64 = 7919;

/// A running neighborhood simulation.
///
/// Generic over the runtime random source so tests can script every draw.
/// Fleet generation always uses the Park-Miller stream of `params.seed`;
/// `R` only feeds cycle starts, shedding, and surges.
pub struct Simulation<R: RandomSource = StdRng> {
    params: EngineParams,
    feeder: Feeder,
    fleet: Fleet,
    clock: SimulationClock,
    controller: LoadShedController,
    history: History,
    rng: R,
    total_co2_saved_lbs: f64,
    total_cost_saved_usd: f64,
}

impl Simulation<StdRng> {
    /// Builds a simulation whose runtime draws come from a seeded [`StdRng`].
    ///
    /// # Errors
    ///
    /// Same as [`Simulation::with_rng`].
    pub fn from_params(params: EngineParams) -> Result<Self, EngineError> {
        let rng = StdRng::seed_from_u64(params.seed.wrapping_add(RUNTIME_SEED_OFFSET));
        Self::with_rng(params, rng)
    }
}

impl<R: RandomSource> Simulation<R> {
    /// Generates the fleet from `params` and wires up the driver.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid fleet size or seed, or for feeder,
    /// policy, or history parameters outside their ranges.
    pub fn with_rng(params: EngineParams, rng: R) -> Result<Self, EngineError> {
        let fleet = Fleet::generate(params.seed, params.houses)?;
        Self::with_fleet(params, fleet, rng)
    }

    /// Wires up a driver around an existing fleet. `params.houses` is
    /// overwritten with the fleet's size.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidParameter`] for out-of-range feeder,
    /// policy, or history parameters.
    pub fn with_fleet(mut params: EngineParams, fleet: Fleet, rng: R) -> Result<Self, EngineError> {
        validate_params(&params)?;
        params.houses = fleet.len();

        let feeder = Feeder::new(params.capacity_w, params.stress_threshold_pct);
        let clock = SimulationClock::new(params.start_minutes);
        let controller = LoadShedController::new(params.policy);
        let history = History::with_capacity(params.history_capacity);

        info!(
            houses = fleet.len(),
            evs = fleet.ev_count(),
            seed = params.seed,
            capacity_w = params.capacity_w,
            "neighborhood initialized"
        );

        Ok(Self {
            params,
            feeder,
            fleet,
            clock,
            controller,
            history,
            rng,
            total_co2_saved_lbs: 0.0,
            total_cost_saved_usd: 0.0,
        })
    }

    /// Advances one step in `mode`, runs the post-step shedding check, and
    /// records the settled state.
    pub fn step(&mut self, mode: StepMode) -> StepResult {
        match mode {
            StepMode::Day => {
                step_day(&mut self.fleet, &mut self.clock, &mut self.rng);
                info!(
                    cycle = self.clock.cycle_index(),
                    time = %self.clock,
                    "peak shave cycle complete - 15 min elapsed"
                );
            }
            StepMode::Night => {
                step_night(&mut self.fleet, &mut self.clock);
                info!(
                    cycle = self.clock.cycle_index(),
                    time = %self.clock,
                    "valley fill initiated - EV charging active"
                );
            }
        }

        let settled = self.settle();
        self.record(mode, settled)
    }

    pub fn step_day(&mut self) -> StepResult {
        self.step(StepMode::Day)
    }

    pub fn step_night(&mut self) -> StepResult {
        self.step(StepMode::Night)
    }

    /// Executes every step of `plan`, toggling stress-test mode at the
    /// edges of its window.
    pub fn run(&mut self, plan: &RunPlan) -> Vec<StepResult> {
        let mut results = Vec::with_capacity(plan.len());
        for (index, mode) in plan.modes.iter().enumerate() {
            if let Some(window) = plan.stress_window {
                let wanted = window.is_active(index);
                if wanted && !self.controller.is_stress_test() {
                    self.enter_stress_test();
                } else if !wanted && self.controller.is_stress_test() {
                    self.exit_stress_test();
                }
            }
            results.push(self.step(*mode));
        }
        results
    }

    /// Metrics of the fleet as it stands.
    pub fn metrics(&self) -> MetricsSnapshot {
        aggregate_on(&self.feeder, &self.fleet, &self.clock)
    }

    /// Runs one shed pass regardless of controller mode.
    pub fn emergency_shed(&mut self) -> ShedReport {
        self.controller.shed(&mut self.fleet, &mut self.rng)
    }

    /// Injects the stress-test surge and sheds until the feeder settles.
    /// Returns `None` if stress-test mode is already on.
    pub fn enter_stress_test(&mut self) -> Option<SurgeReport> {
        let report = self.controller.enter(&mut self.fleet, &mut self.rng)?;
        let settled = self.settle();
        debug!(
            passes = settled.passes,
            stress_pct = settled.metrics.stress_pct,
            "stress surge settled"
        );
        Some(report)
    }

    /// Leaves stress-test mode with one normalizing shed pass. Returns
    /// `None` if stress-test mode is off.
    pub fn exit_stress_test(&mut self) -> Option<ShedReport> {
        self.controller.exit(&mut self.fleet, &mut self.rng)
    }

    pub fn toggle_stress_test(&mut self) -> Transition {
        match self.exit_stress_test() {
            Some(report) => Transition::Exited(report),
            None => Transition::Entered(self.enter_stress_test().unwrap_or_default()),
        }
    }

    /// Greedy V2G plan covering the feeder's load above its stress threshold.
    ///
    /// # Errors
    ///
    /// Propagates [`EngineError::NonFiniteRequirement`].
    pub fn v2g_relief_plan(&self) -> Result<DispatchPlan, EngineError> {
        let metrics = self.metrics();
        let required_w = self.feeder.excess_w(metrics.net_load_w);
        let plan = DispatchPlan::build(&v2g_capacities(&self.fleet), required_w)?;
        debug!(
            required_w,
            evs = plan.allocations.len(),
            shortfall_w = plan.shortfall_w,
            "v2g relief plan built"
        );
        Ok(plan)
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn feeder(&self) -> &Feeder {
        &self.feeder
    }

    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    /// House at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::HouseIndexOutOfRange`] past the fleet's end.
    pub fn house(&self, index: usize) -> Result<&House, EngineError> {
        self.fleet.house(index)
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn controller(&self) -> &LoadShedController {
        &self.controller
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Running totals of `(CO2 lb, USD)` avoided.
    pub fn totals(&self) -> (f64, f64) {
        (self.total_co2_saved_lbs, self.total_cost_saved_usd)
    }

    fn settle(&mut self) -> Settled {
        self.controller
            .settle(&self.feeder, &mut self.fleet, &self.clock, &mut self.rng)
    }

    fn record(&mut self, mode: StepMode, settled: Settled) -> StepResult {
        let metrics = settled.metrics;
        self.total_co2_saved_lbs += metrics.co2_saved_lbs;
        self.total_cost_saved_usd += metrics.cost_saved_usd;
        self.history.push(HistorySample {
            net_load_w: metrics.net_load_w,
            stress_pct: metrics.stress_pct,
            timestamp: self.clock.raw_minutes(),
        });

        StepResult::from_metrics(
            &self.clock,
            mode,
            self.controller.is_stress_test(),
            self.feeder.over_threshold(metrics.stress_pct),
            &metrics,
            settled.passes,
            self.total_co2_saved_lbs,
            self.total_cost_saved_usd,
        )
    }
}

fn validate_params(params: &EngineParams) -> Result<(), EngineError> {
    let invalid = |field, reason| Err(EngineError::InvalidParameter { field, reason });

    if !(params.capacity_w.is_finite() && params.capacity_w > 0.0) {
        return invalid("capacity_w", "must be finite and > 0");
    }
    if !(0.0..=100.0).contains(&params.stress_threshold_pct) {
        return invalid("stress_threshold_pct", "must be within [0, 100]");
    }
    if !(0.0..=1.0).contains(&params.policy.stop_probability) {
        return invalid("stop_probability", "must be within [0, 1]");
    }
    if !(0.0..=1.0).contains(&params.policy.surge_probability) {
        return invalid("surge_probability", "must be within [0, 1]");
    }
    if params.history_capacity == 0 {
        return invalid("history_capacity", "must be > 0");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{ApplianceSet, CycleAppliance};
    use crate::rng::Scripted;
    use crate::sim::controller::ControllerMode;
    use crate::sim::event::StressTestWindow;

    fn scripted(params: EngineParams, draw: f64) -> Simulation<Scripted> {
        Simulation::with_rng(params, Scripted::constant(draw)).expect("valid params")
    }

    #[test]
    fn reference_simulation_starts_at_four_pm() {
        let sim = Simulation::from_params(EngineParams::default()).expect("valid params");
        assert_eq!(sim.fleet().len(), 50);
        assert_eq!(sim.clock().to_string(), "16:00");
        assert!(sim.history().is_empty());
        assert_eq!(sim.controller().mode(), ControllerMode::Normal);
    }

    #[test]
    fn invalid_fleet_size_is_rejected() {
        let err = Simulation::from_params(EngineParams::new(0, 42)).err();
        assert_eq!(err, Some(EngineError::InvalidFleetSize(0)));
    }

    #[test]
    fn invalid_threshold_is_rejected() {
        let mut params = EngineParams::default();
        params.stress_threshold_pct = 120.0;
        assert!(matches!(
            Simulation::from_params(params),
            Err(EngineError::InvalidParameter {
                field: "stress_threshold_pct",
                ..
            })
        ));
    }

    #[test]
    fn each_step_appends_one_history_sample() {
        let mut sim = scripted(EngineParams::default(), 0.99);
        let day = sim.step_day();
        let night = sim.step_night();
        assert_eq!(sim.history().len(), 2);
        assert_eq!(day.cycle_index, 1);
        assert_eq!(night.cycle_index, 2);
        let latest = sim.history().latest().copied().expect("two samples");
        assert_eq!(latest.net_load_w, night.net_load_w);
        assert_eq!(latest.timestamp, night.raw_minutes);
    }

    #[test]
    fn totals_accumulate_per_step() {
        let mut sim = scripted(EngineParams::default(), 0.99);
        let first = sim.step_day();
        let second = sim.step_day();
        let (co2, usd) = sim.totals();
        assert_eq!(co2, first.co2_saved_lbs + second.co2_saved_lbs);
        assert_eq!(usd, first.cost_saved_usd + second.cost_saved_usd);
        assert_eq!(second.total_cost_saved_usd, usd);
    }

    #[test]
    fn normal_mode_never_sheds_after_a_step() {
        let mut sim = scripted(EngineParams::default(), 0.0);
        for _ in 0..8 {
            assert_eq!(sim.step_day().shed_passes, 0);
        }
    }

    #[test]
    fn stress_test_settles_below_threshold_or_fully_shed() {
        let mut sim = scripted(EngineParams::default(), 0.0);
        let report = sim.enter_stress_test().expect("was normal");
        assert!(report.cycles_started > 0);

        let result = sim.step_day();
        assert!(result.stress_test);
        // Every cycle is stopped by a zero draw, so the feeder must settle.
        assert!(!result.over_threshold);
        assert!(sim.enter_stress_test().is_none());
    }

    #[test]
    fn toggle_round_trips_mode() {
        let mut sim = scripted(EngineParams::default(), 0.5);
        assert!(matches!(sim.toggle_stress_test(), Transition::Entered(_)));
        assert!(sim.controller().is_stress_test());
        assert!(matches!(sim.toggle_stress_test(), Transition::Exited(_)));
        assert!(!sim.controller().is_stress_test());
    }

    #[test]
    fn run_follows_plan_and_stress_window() {
        let mut sim = scripted(EngineParams::default(), 0.99);
        let plan = RunPlan::day_night(3, 1, 2).with_stress_window(StressTestWindow::new(1, 3));
        let results = sim.run(&plan);

        assert_eq!(results.len(), 8);
        let flags: Vec<bool> = results.iter().map(|r| r.stress_test).collect();
        assert_eq!(
            flags,
            vec![false, true, true, false, false, false, false, false]
        );
        assert_eq!(results[3].mode, StepMode::Night);
    }

    #[test]
    fn relief_plan_covers_excess_in_fleet_order() {
        let busy = ApplianceSet {
            ac: true,
            washer: CycleAppliance::running(0.0),
            dryer: CycleAppliance::running(0.0),
            dishwasher: CycleAppliance::running(0.0),
        };
        let fleet = Fleet::from_houses(vec![
            House::new(1, true, 80.0, busy),
            House::new(2, true, 30.0, busy),
            House::new(3, true, 90.0, busy),
        ])
        .expect("non-empty fleet");
        // 37.2 kW of appliances less 6.4 kW of V2G on a 30 kW feeder
        // whose threshold sits at 25.5 kW.
        let mut params = EngineParams::default();
        params.capacity_w = 30_000.0;
        let sim = Simulation::with_fleet(params, fleet, Scripted::constant(0.99))
            .expect("valid params");

        let plan = sim.v2g_relief_plan().expect("finite excess");
        assert_eq!(plan.required_w, 5_300.0);
        let gives: Vec<(u32, f64)> = plan.allocations.iter().map(|a| (a.id, a.give)).collect();
        assert_eq!(gives, vec![(1, 3_200.0), (3, 2_100.0)]);
        assert_eq!(plan.shortfall_w, 0.0);
        assert_eq!(sim.params().houses, 3);
    }

    #[test]
    fn house_lookup_reports_out_of_range() {
        let sim = scripted(EngineParams::new(5, 42), 0.5);
        assert!(sim.house(4).is_ok());
        assert_eq!(
            sim.house(5).err(),
            Some(EngineError::HouseIndexOutOfRange { index: 5, len: 5 })
        );
    }
}
