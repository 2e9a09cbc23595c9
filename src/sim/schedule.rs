use serde::Serialize;

use super::event::StressTestWindow;
use super::step::StepMode;

/// Ordered step modes for a driver to execute, plus an optional stress test.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunPlan {
    pub modes: Vec<StepMode>,
    pub stress_window: Option<StressTestWindow>,
}

impl RunPlan {
    /// Repeats `day_steps` peak-shave steps followed by `night_steps`
    /// valley-fill steps, `cycles` times.
    pub fn day_night(day_steps: usize, night_steps: usize, cycles: usize) -> Self {
        let len = day_steps.saturating_add(night_steps).saturating_mul(cycles);
        let mut modes = Vec::with_capacity(len);
        for _ in 0..cycles {
            modes.extend(std::iter::repeat_n(StepMode::Day, day_steps));
            modes.extend(std::iter::repeat_n(StepMode::Night, night_steps));
        }
        Self {
            modes,
            stress_window: None,
        }
    }

    /// Adds a stress-test window to the plan.
    pub fn with_stress_window(mut self, window: StressTestWindow) -> Self {
        self.stress_window = Some(window);
        self
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}
