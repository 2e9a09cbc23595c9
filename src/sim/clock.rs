use std::fmt;

use serde::Serialize;

/// Minutes into the day when the reference scenario starts (16:00).
pub const DEFAULT_START_MINUTES: u64 = 960;
/// Minutes into the day at which night operation begins (22:00).
pub const NIGHT_START_MINUTES: u64 = 1320;
/// Simulated minutes per day step.
pub const DAY_STEP_MINUTES: u64 = 15;
/// Simulated minutes per night step once night has begun.
pub const NIGHT_STEP_MINUTES: u64 = 60;

/// Simulated time and operating mode of the feeder.
///
/// `raw_minutes` only moves forward and is never wrapped for logic;
/// [`SimulationClock::time_of_day`] wraps it for display.
///
/// # Examples
///
/// ```
/// use gridpulse::sim::clock::SimulationClock;
///
/// let clock = SimulationClock::new(1575);
/// assert_eq!(clock.raw_minutes(), 1575);
/// assert_eq!(clock.time_of_day(), (2, 15));
/// assert_eq!(clock.to_string(), "02:15");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SimulationClock {
    raw_minutes: u64,
    is_night: bool,
    cycle_index: u64,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(DEFAULT_START_MINUTES)
    }
}

impl SimulationClock {
    /// Creates a daytime clock at `start_minutes` with cycle index 0.
    pub fn new(start_minutes: u64) -> Self {
        Self {
            raw_minutes: start_minutes,
            is_night: false,
            cycle_index: 0,
        }
    }

    pub fn raw_minutes(&self) -> u64 {
        self.raw_minutes
    }

    pub fn is_night(&self) -> bool {
        self.is_night
    }

    /// Number of completed steps.
    pub fn cycle_index(&self) -> u64 {
        self.cycle_index
    }

    /// Wrapped `(hour, minute)` for display.
    pub fn time_of_day(&self) -> (u64, u64) {
        ((self.raw_minutes / 60) % 24, self.raw_minutes % 60)
    }

    /// Completes a day step: day mode, 15 minutes, next cycle.
    pub(crate) fn advance_day(&mut self) {
        self.is_night = false;
        self.raw_minutes += DAY_STEP_MINUTES;
        self.cycle_index += 1;
    }

    /// Completes a night step: night mode, jump to 22:00 on the first
    /// night step or move an hour on, next cycle.
    pub(crate) fn advance_night(&mut self) {
        self.is_night = true;
        self.raw_minutes = if self.raw_minutes < NIGHT_START_MINUTES {
            NIGHT_START_MINUTES
        } else {
            self.raw_minutes + NIGHT_STEP_MINUTES
        };
        self.cycle_index += 1;
    }
}

impl fmt::Display for SimulationClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m) = self.time_of_day();
        write!(f, "{h:02}:{m:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_clock() {
        let clock = SimulationClock::default();
        assert_eq!(clock.raw_minutes(), 960);
        assert!(!clock.is_night());
        assert_eq!(clock.cycle_index(), 0);
    }

    #[test]
    fn test_advance_day() {
        let mut clock = SimulationClock::new(100);
        clock.advance_day();
        clock.advance_day();
        assert_eq!(clock.raw_minutes(), 130);
        assert_eq!(clock.cycle_index(), 2);
    }

    #[test]
    fn test_advance_night_jumps_then_hours() {
        let mut clock = SimulationClock::new(960);
        clock.advance_night();
        assert!(clock.is_night());
        assert_eq!(clock.raw_minutes(), 1320);
        clock.advance_night();
        assert_eq!(clock.raw_minutes(), 1380);
        assert_eq!(clock.cycle_index(), 2);
    }

    #[test]
    fn test_raw_minutes_never_wrap() {
        let mut clock = SimulationClock::new(1380);
        for _ in 0..3 {
            clock.advance_night();
        }
        assert_eq!(clock.raw_minutes(), 1560);
        assert_eq!(clock.time_of_day(), (2, 0));
        assert_eq!(clock.to_string(), "02:00");
    }

    #[test]
    fn test_day_after_night_clears_flag() {
        let mut clock = SimulationClock::default();
        clock.advance_night();
        clock.advance_day();
        assert!(!clock.is_night());
        assert_eq!(clock.raw_minutes(), 1335);
    }
}
