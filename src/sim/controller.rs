//! Emergency load shedding and the stress-test surge that exercises it.

use std::ops::AddAssign;

use serde::Serialize;
use tracing::{info, warn};

use super::clock::SimulationClock;
use super::feeder::Feeder;
use super::metrics::{MetricsSnapshot, aggregate_on};
use crate::devices::{CYCLE_KINDS, Fleet};
use crate::rng::RandomSource;

/// Chance an emergency shed pass stops a running cycle appliance.
pub const SHED_STOP_PROBABILITY: f64 = 0.4;
/// Chance the stress-test surge starts an idle cycle appliance.
pub const SURGE_START_PROBABILITY: f64 = 0.6;

/// Probabilities used by the shedding and surge paths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShedPolicy {
    pub stop_probability: f64,
    pub surge_probability: f64,
}

impl Default for ShedPolicy {
    fn default() -> Self {
        Self {
            stop_probability: SHED_STOP_PROBABILITY,
            surge_probability: SURGE_START_PROBABILITY,
        }
    }
}

/// What one or more shed passes changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ShedReport {
    /// ACs newly suppressed.
    pub ac_suppressed: usize,
    /// Cycle appliances force-stopped.
    pub cycles_stopped: usize,
}

impl ShedReport {
    /// `true` when the pass left the fleet untouched.
    pub fn is_empty(&self) -> bool {
        self.ac_suppressed == 0 && self.cycles_stopped == 0
    }
}

impl AddAssign for ShedReport {
    fn add_assign(&mut self, rhs: Self) {
        self.ac_suppressed += rhs.ac_suppressed;
        self.cycles_stopped += rhs.cycles_stopped;
    }
}

/// What the stress-test surge changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SurgeReport {
    /// ACs released from suppression.
    pub ac_released: usize,
    /// Cycle appliances started.
    pub cycles_started: usize,
}

/// One corrective shed pass.
///
/// Suppresses every present, running AC and stops each running cycle
/// appliance with probability `stop_probability`. Draws are consumed only
/// for running appliances, so a fleet with every AC suppressed and no cycle
/// running is left unchanged and consumes nothing.
pub fn emergency_shed<R: RandomSource + ?Sized>(
    fleet: &mut Fleet,
    stop_probability: f64,
    rng: &mut R,
) -> ShedReport {
    let mut report = ShedReport::default();
    for house in fleet.houses_mut() {
        if house.ac_running() {
            house.is_ac_suppressed = true;
            report.ac_suppressed += 1;
        }
        for kind in CYCLE_KINDS {
            let appliance = house.appliances.cycle_mut(kind);
            if appliance.is_active() && rng.chance(stop_probability) {
                appliance.stop();
                report.cycles_stopped += 1;
            }
        }
    }
    report
}

/// Injects the artificial demand surge of a stress test.
///
/// Clears every suppression flag and starts each idle cycle appliance with
/// probability `surge_probability`.
pub fn enter_stress_test<R: RandomSource + ?Sized>(
    fleet: &mut Fleet,
    surge_probability: f64,
    rng: &mut R,
) -> SurgeReport {
    let mut report = SurgeReport::default();
    for house in fleet.houses_mut() {
        if house.ac_suppressed() {
            report.ac_released += 1;
        }
        house.is_ac_suppressed = false;
        for kind in CYCLE_KINDS {
            let appliance = house.appliances.cycle_mut(kind);
            if !appliance.is_active() && rng.chance(surge_probability) {
                appliance.start();
                report.cycles_started += 1;
            }
        }
    }
    report
}

/// Normalizes the fleet after a stress test with a single shed pass.
pub fn exit_stress_test<R: RandomSource + ?Sized>(
    fleet: &mut Fleet,
    stop_probability: f64,
    rng: &mut R,
) -> ShedReport {
    emergency_shed(fleet, stop_probability, rng)
}

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerMode {
    #[default]
    Normal,
    /// Surge injected; shedding re-checked after every step.
    StressTest,
}

/// A mode change and its effect on the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Entered(SurgeReport),
    Exited(ShedReport),
}

/// Result of the post-step shedding check.
#[derive(Debug, Clone, PartialEq)]
pub struct Settled {
    /// Metrics of the fleet as left by the check.
    pub metrics: MetricsSnapshot,
    /// Shed passes run.
    pub passes: usize,
    /// Combined effect of every pass.
    pub shed: ShedReport,
}

/// Two-state load-shedding controller.
///
/// `Normal -> StressTest` injects a surge, `StressTest -> Normal` runs one
/// shed pass, and while in `StressTest` [`LoadShedController::settle`]
/// sheds whenever stress is above the feeder threshold.
#[derive(Debug, Clone, Default)]
pub struct LoadShedController {
    mode: ControllerMode,
    policy: ShedPolicy,
}

impl LoadShedController {
    pub fn new(policy: ShedPolicy) -> Self {
        Self {
            mode: ControllerMode::Normal,
            policy,
        }
    }

    pub fn mode(&self) -> ControllerMode {
        self.mode
    }

    pub fn policy(&self) -> &ShedPolicy {
        &self.policy
    }

    pub fn is_stress_test(&self) -> bool {
        self.mode == ControllerMode::StressTest
    }

    /// Runs one emergency shed pass regardless of mode.
    pub fn shed<R: RandomSource + ?Sized>(&self, fleet: &mut Fleet, rng: &mut R) -> ShedReport {
        let report = emergency_shed(fleet, self.policy.stop_probability, rng);
        warn!(
            ac_suppressed = report.ac_suppressed,
            cycles_stopped = report.cycles_stopped,
            "emergency load shedding - reducing transformer stress"
        );
        report
    }

    /// Enters stress-test mode. Returns `None` if already in it.
    pub fn enter<R: RandomSource + ?Sized>(
        &mut self,
        fleet: &mut Fleet,
        rng: &mut R,
    ) -> Option<SurgeReport> {
        if self.is_stress_test() {
            return None;
        }
        let report = enter_stress_test(fleet, self.policy.surge_probability, rng);
        self.mode = ControllerMode::StressTest;
        info!(
            ac_released = report.ac_released,
            cycles_started = report.cycles_started,
            "transformer stress simulation initiated"
        );
        Some(report)
    }

    /// Leaves stress-test mode with one shed pass. Returns `None` if not in it.
    pub fn exit<R: RandomSource + ?Sized>(
        &mut self,
        fleet: &mut Fleet,
        rng: &mut R,
    ) -> Option<ShedReport> {
        if !self.is_stress_test() {
            return None;
        }
        self.mode = ControllerMode::Normal;
        info!("transformer stress simulation ended");
        Some(self.shed(fleet, rng))
    }

    /// Flips the mode.
    pub fn toggle<R: RandomSource + ?Sized>(&mut self, fleet: &mut Fleet, rng: &mut R) -> Transition {
        match self.exit(fleet, rng) {
            Some(report) => Transition::Exited(report),
            None => Transition::Entered(self.enter(fleet, rng).unwrap_or_default()),
        }
    }

    /// Post-step hook: in stress-test mode, sheds until stress is at or
    /// below the threshold or a pass changes nothing.
    ///
    /// Every productive pass suppresses an AC or stops a cycle, so the loop
    /// ends after at most one pass per running load.
    pub fn settle<R: RandomSource + ?Sized>(
        &self,
        feeder: &Feeder,
        fleet: &mut Fleet,
        clock: &SimulationClock,
        rng: &mut R,
    ) -> Settled {
        let mut metrics = aggregate_on(feeder, fleet, clock);
        let mut passes = 0;
        let mut shed = ShedReport::default();

        while self.is_stress_test() && feeder.over_threshold(metrics.stress_pct) {
            let report = self.shed(fleet, rng);
            passes += 1;
            shed += report;
            if report.is_empty() {
                break;
            }
            metrics = aggregate_on(feeder, fleet, clock);
        }

        Settled {
            metrics,
            passes,
            shed,
        }
    }
}
