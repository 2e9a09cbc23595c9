use serde::Serialize;

/// Step range during which a driver keeps stress-test mode on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StressTestWindow {
    /// First step with stress-test mode on (inclusive).
    pub start_step: usize,
    /// First step after the window (exclusive); mode is switched off here.
    pub end_step: usize,
}

impl StressTestWindow {
    /// Creates a window spanning `[start_step, end_step)`.
    ///
    /// # Panics
    ///
    /// Panics if `start_step >= end_step`.
    pub fn new(start_step: usize, end_step: usize) -> Self {
        assert!(start_step < end_step);

        Self {
            start_step,
            end_step,
        }
    }

    /// Returns `true` when `step` falls within the window.
    pub fn is_active(&self, step: usize) -> bool {
        step >= self.start_step && step < self.end_step
    }
}

#[cfg(test)]
mod tests {
    use super::StressTestWindow;

    #[test]
    fn active_only_inside_window() {
        let window = StressTestWindow::new(5, 8);
        assert!(!window.is_active(4));
        assert!(window.is_active(5));
        assert!(window.is_active(7));
        assert!(!window.is_active(8));
    }

    #[test]
    #[should_panic]
    fn empty_window_panics() {
        StressTestWindow::new(3, 3);
    }
}
