//! Neighborhood transformer simulator with peak shaving, valley filling,
//! and emergency load shedding.
//!
//! The free functions re-exported here form the stateless core: build a
//! fleet, advance it, aggregate it, shed it, and split a power target over
//! EVs. [`sim::engine::Simulation`] wraps them into a stateful driver.

pub mod config;
pub mod devices;
pub mod error;
pub mod io;
pub mod rng;
/// Clock, step engine, controller, aggregation and allocation.
pub mod sim;

#[cfg(feature = "api")]
pub mod api;

pub use devices::{APPLIANCE_SPECS, Fleet, House};
pub use error::EngineError;
pub use sim::allocation::{Allocation, EvCapacity, allocate};
pub use sim::controller::{emergency_shed, enter_stress_test, exit_stress_test};
pub use sim::feeder::{STRESS_THRESHOLD, TRANSFORMER_CAPACITY};
pub use sim::metrics::{MetricsSnapshot, aggregate};
pub use sim::step::{step_day, step_night};

/// Builds a deterministic fleet of `size` houses from `seed`.
///
/// # Errors
///
/// See [`Fleet::generate`].
///
/// # Examples
///
/// ```
/// let a = gridpulse::create_fleet(42, 50).unwrap();
/// let b = gridpulse::create_fleet(42, 50).unwrap();
/// assert_eq!(a, b);
/// assert!(gridpulse::create_fleet(42, 0).is_err());
/// ```
pub fn create_fleet(seed: u64, size: usize) -> Result<Fleet, EngineError> {
    Fleet::generate(seed, size)
}
