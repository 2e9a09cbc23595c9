use serde::Serialize;

/// Rated capacity of the reference neighborhood transformer (W, 225 kVA).
pub const TRANSFORMER_CAPACITY: f64 = 225_000.0;
/// Stress level above which emergency shedding is requested (%).
pub const STRESS_THRESHOLD: f64 = 85.0;

/// The transformer feeding the neighborhood.
///
/// Net load convention:
/// - Positive values load the transformer (consumption)
/// - Negative values mean the feeder exports (V2G exceeding demand)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feeder {
    capacity_w: f64,
    stress_threshold_pct: f64,
}

impl Default for Feeder {
    fn default() -> Self {
        Self::new(TRANSFORMER_CAPACITY, STRESS_THRESHOLD)
    }
}

impl Feeder {
    /// Creates a feeder with the given rating and shedding threshold.
    ///
    /// # Panics
    ///
    /// Panics if `capacity_w` is not positive or the threshold is outside
    /// `[0, 100]`. Configuration validation rejects both before this point.
    pub fn new(capacity_w: f64, stress_threshold_pct: f64) -> Self {
        assert!(capacity_w > 0.0);
        assert!((0.0..=100.0).contains(&stress_threshold_pct));

        Self {
            capacity_w,
            stress_threshold_pct,
        }
    }

    /// Rated capacity (W).
    pub fn capacity_w(&self) -> f64 {
        self.capacity_w
    }

    /// Stress percentage above which shedding is requested.
    pub fn stress_threshold_pct(&self) -> f64 {
        self.stress_threshold_pct
    }

    /// Net load as a percentage of rating, clamped to `[0, 100]`.
    pub fn stress_pct(&self, net_load_w: f64) -> f64 {
        (net_load_w / self.capacity_w * 100.0).clamp(0.0, 100.0)
    }

    /// Returns `true` when `stress_pct` is strictly above the threshold.
    pub fn over_threshold(&self, stress_pct: f64) -> bool {
        stress_pct > self.stress_threshold_pct
    }

    /// Load that must come off the feeder to return to the threshold (W).
    ///
    /// Zero when already at or below it.
    pub fn excess_w(&self, net_load_w: f64) -> f64 {
        (net_load_w - self.capacity_w * self.stress_threshold_pct / 100.0).max(0.0)
    }
}
