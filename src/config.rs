//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::devices::REFERENCE_FLEET_SIZE;
use crate::rng::PARK_MILLER_MODULUS;
use crate::sim::clock::DEFAULT_START_MINUTES;
use crate::sim::controller::{SHED_STOP_PROBABILITY, SURGE_START_PROBABILITY, ShedPolicy};
use crate::sim::event::StressTestWindow;
use crate::sim::feeder::{STRESS_THRESHOLD, TRANSFORMER_CAPACITY};
use crate::sim::history::HISTORY_CAPACITY;
use crate::sim::schedule::RunPlan;
use crate::sim::types::{EngineParams, REFERENCE_SEED};

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Fleet and clock parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Transformer rating and shedding threshold.
    #[serde(default)]
    pub feeder: FeederConfig,
    /// Shed and surge probabilities.
    #[serde(default)]
    pub shedding: SheddingConfig,
    /// Day/night step pattern.
    #[serde(default)]
    pub run: RunConfig,
    /// Optional stress-test window.
    #[serde(default)]
    pub stress_test: StressTestConfig,
}

/// Fleet and clock parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Fleet seed in `1..=2147483646`.
    pub seed: u64,
    /// Number of houses (must be > 0).
    pub houses: usize,
    /// Clock start in minutes after midnight.
    pub start_minutes: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: REFERENCE_SEED,
            houses: REFERENCE_FLEET_SIZE,
            start_minutes: DEFAULT_START_MINUTES,
        }
    }
}

/// Transformer rating and shedding threshold.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeederConfig {
    /// Rated capacity (W).
    pub capacity_w: f64,
    /// Stress percentage that triggers shedding in stress-test mode.
    pub stress_threshold_pct: f64,
}

impl Default for FeederConfig {
    fn default() -> Self {
        Self {
            capacity_w: TRANSFORMER_CAPACITY,
            stress_threshold_pct: STRESS_THRESHOLD,
        }
    }
}

/// Shed and surge probabilities.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SheddingConfig {
    /// Chance a shed pass stops a running cycle appliance.
    pub shed_stop_probability: f64,
    /// Chance the surge starts an idle cycle appliance.
    pub surge_start_probability: f64,
}

impl Default for SheddingConfig {
    fn default() -> Self {
        Self {
            shed_stop_probability: SHED_STOP_PROBABILITY,
            surge_start_probability: SURGE_START_PROBABILITY,
        }
    }
}

/// Day/night step pattern: `cycles` repetitions of `day_steps` peak-shave
/// steps followed by `night_steps` valley-fill steps.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub day_steps: usize,
    pub night_steps: usize,
    pub cycles: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            day_steps: 8,
            night_steps: 4,
            cycles: 2,
        }
    }
}

/// Longest run a scenario may request (steps).
pub const MAX_RUN_STEPS: usize = 1_000_000;

impl RunConfig {
    /// Steps in the run, saturating at `usize::MAX`.
    pub fn total_steps(&self) -> usize {
        self.checked_total_steps().unwrap_or(usize::MAX)
    }

    fn checked_total_steps(&self) -> Option<usize> {
        self.day_steps
            .checked_add(self.night_steps)?
            .checked_mul(self.cycles)
    }
}

/// Stress-test window over step indices `[start_step, end_step)`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StressTestConfig {
    pub enabled: bool,
    pub start_step: usize,
    pub end_step: usize,
}

impl Default for StressTestConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            start_step: 2,
            end_step: 6,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.houses"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// The reference neighborhood: 50 houses, seed 42, no stress test.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Baseline with a surge injected over steps 2..6 of the first evening.
    pub fn stress_test() -> Self {
        Self {
            stress_test: StressTestConfig {
                enabled: true,
                start_step: 2,
                end_step: 6,
            },
            ..Self::default()
        }
    }

    /// Short evenings and long nights to exercise overnight EV charging.
    pub fn valley_fill() -> Self {
        Self {
            simulation: SimulationConfig {
                start_minutes: 1200,
                ..SimulationConfig::default()
            },
            run: RunConfig {
                day_steps: 4,
                night_steps: 8,
                cycles: 3,
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "stress_test", "valley_fill"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "stress_test" => Ok(Self::stress_test()),
            "valley_fill" => Ok(Self::valley_fill()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new(
                "scenario",
                format!("cannot read \"{}\": {e}", path.display()),
            )
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let s = &self.simulation;
        if s.seed == 0 || s.seed >= PARK_MILLER_MODULUS {
            errors.push(ConfigError::new(
                "simulation.seed",
                format!("must be in 1..={}", PARK_MILLER_MODULUS - 1),
            ));
        }
        if s.houses == 0 {
            errors.push(ConfigError::new("simulation.houses", "must be > 0"));
        }
        if s.start_minutes >= 24 * 60 {
            errors.push(ConfigError::new(
                "simulation.start_minutes",
                "must be < 1440",
            ));
        }

        let f = &self.feeder;
        if !(f.capacity_w.is_finite() && f.capacity_w > 0.0) {
            errors.push(ConfigError::new("feeder.capacity_w", "must be > 0"));
        }
        if !(0.0..=100.0).contains(&f.stress_threshold_pct) {
            errors.push(ConfigError::new(
                "feeder.stress_threshold_pct",
                "must be in [0, 100]",
            ));
        }

        let sh = &self.shedding;
        if !(0.0..=1.0).contains(&sh.shed_stop_probability) {
            errors.push(ConfigError::new(
                "shedding.shed_stop_probability",
                "must be in [0.0, 1.0]",
            ));
        }
        if !(0.0..=1.0).contains(&sh.surge_start_probability) {
            errors.push(ConfigError::new(
                "shedding.surge_start_probability",
                "must be in [0.0, 1.0]",
            ));
        }

        let r = &self.run;
        if r.day_steps == 0 && r.night_steps == 0 {
            errors.push(ConfigError::new(
                "run.day_steps",
                "day_steps + night_steps must be > 0",
            ));
        }
        if r.cycles == 0 {
            errors.push(ConfigError::new("run.cycles", "must be > 0"));
        }
        if r.checked_total_steps().is_none_or(|n| n > MAX_RUN_STEPS) {
            errors.push(ConfigError::new(
                "run.cycles",
                format!("(day_steps + night_steps) * cycles must be <= {MAX_RUN_STEPS}"),
            ));
        }

        let st = &self.stress_test;
        if st.enabled && st.start_step >= st.end_step {
            errors.push(ConfigError::new(
                "stress_test.start_step",
                "must be < stress_test.end_step",
            ));
        }

        errors
    }

    /// Engine parameters described by this scenario.
    pub fn engine_params(&self) -> EngineParams {
        EngineParams {
            houses: self.simulation.houses,
            seed: self.simulation.seed,
            start_minutes: self.simulation.start_minutes,
            capacity_w: self.feeder.capacity_w,
            stress_threshold_pct: self.feeder.stress_threshold_pct,
            policy: ShedPolicy {
                stop_probability: self.shedding.shed_stop_probability,
                surge_probability: self.shedding.surge_start_probability,
            },
            history_capacity: HISTORY_CAPACITY,
        }
    }

    /// Step plan described by this scenario.
    ///
    /// Only meaningful on a validated config; an enabled window with
    /// `start_step >= end_step` is dropped.
    pub fn run_plan(&self) -> RunPlan {
        let plan = RunPlan::day_night(self.run.day_steps, self.run.night_steps, self.run.cycles);
        let st = &self.stress_test;
        if st.enabled && st.start_step < st.end_step {
            plan.with_stress_window(StressTestWindow::new(st.start_step, st.end_step))
        } else {
            plan
        }
    }
}
