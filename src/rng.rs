//! Random sources for fleet generation and probabilistic control branches.

use rand::Rng;
use rand::rngs::StdRng;

use crate::error::EngineError;

/// Modulus of the Park-Miller generator (2^31 - 1).
pub const PARK_MILLER_MODULUS: u64 = 2_147_483_647;
/// Multiplier of the Park-Miller generator (7^5).
const MULTIPLIER: u64 = 16_807;

/// A source of uniform draws in `[0, 1)`.
///
/// Step and shedding functions take this as a parameter instead of reaching
/// for a global generator, so tests can substitute [`Scripted`] and assert
/// exact outcomes.
pub trait RandomSource {
    /// Returns the next draw in `[0, 1)`.
    fn next_unit(&mut self) -> f64;

    /// Returns `true` with the given probability.
    fn chance(&mut self, probability: f64) -> bool {
        self.next_unit() < probability
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }
}

/// Runtime source for appliance start, shed and surge decisions.
impl RandomSource for StdRng {
    fn next_unit(&mut self) -> f64 {
        self.random::<f64>()
    }
}

/// Minimal-standard linear congruential generator.
///
/// `s' = (s * 16807) mod 2147483647`, emitting `(s' - 1) / 2147483646`.
/// Two generators built from the same seed produce identical streams.
///
/// # Examples
///
/// ```
/// use gridpulse::rng::{ParkMiller, RandomSource};
///
/// let mut a = ParkMiller::new(42).unwrap();
/// let mut b = ParkMiller::new(42).unwrap();
/// assert_eq!(a.next_unit(), b.next_unit());
/// ```
#[derive(Debug, Clone)]
pub struct ParkMiller {
    state: u64,
    seed: u64,
}

impl ParkMiller {
    /// Creates a generator from `seed`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SeedOutOfRange`] unless `1 <= seed <= 2147483646`.
    /// A zero seed would lock the recurrence at zero.
    pub fn new(seed: u64) -> Result<Self, EngineError> {
        if seed == 0 || seed >= PARK_MILLER_MODULUS {
            return Err(EngineError::SeedOutOfRange(seed));
        }
        Ok(Self { state: seed, seed })
    }

    /// Rewinds the stream to its first draw.
    pub fn restart(&mut self) {
        self.state = self.seed;
    }
}

impl RandomSource for ParkMiller {
    fn next_unit(&mut self) -> f64 {
        self.state = (self.state * MULTIPLIER) % PARK_MILLER_MODULUS;
        (self.state - 1) as f64 / (PARK_MILLER_MODULUS - 1) as f64
    }
}

/// Replays a fixed list of draws, cycling when exhausted.
///
/// An empty script always yields `0.0`.
#[derive(Debug, Clone, Default)]
pub struct Scripted {
    draws: Vec<f64>,
    cursor: usize,
}

impl Scripted {
    /// Creates a source replaying `draws` in order.
    pub fn new(draws: Vec<f64>) -> Self {
        Self { draws, cursor: 0 }
    }

    /// Creates a source that returns `value` forever.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// Number of draws consumed so far.
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for Scripted {
    fn next_unit(&mut self) -> f64 {
        if self.draws.is_empty() {
            return 0.0;
        }
        let value = self.draws[self.cursor % self.draws.len()];
        self.cursor += 1;
        value
    }
}
