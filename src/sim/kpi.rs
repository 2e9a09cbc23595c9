//! Post-hoc KPI computation from simulation results.

use std::fmt;

use serde::Serialize;

use super::types::StepResult;

/// Aggregate indicators derived from a complete simulation run.
///
/// Computed post-hoc from `Vec<StepResult>` so the report always agrees
/// with the step records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiReport {
    pub steps: usize,
    /// Highest settled transformer stress (%).
    pub peak_stress_pct: f64,
    /// Mean settled transformer stress (%).
    pub mean_stress_pct: f64,
    /// Highest transformer load (W).
    pub peak_net_load_w: f64,
    /// Steps whose settled stress stayed strictly above `threshold_pct`.
    pub steps_over_threshold: usize,
    pub threshold_pct: f64,
    /// Emergency shed passes run by post-step checks.
    pub total_shed_passes: usize,
    pub total_co2_saved_lbs: f64,
    pub total_cost_saved_usd: f64,
    /// Fleet average EV state of charge after the last step (%).
    pub final_avg_battery_pct: f64,
}

impl KpiReport {
    /// Computes all KPIs from the step records of one run.
    ///
    /// # Arguments
    ///
    /// * `results` - Step records in execution order
    /// * `threshold_pct` - Stress percentage counted as an excursion
    pub fn from_results(results: &[StepResult], threshold_pct: f64) -> Self {
        let Some(last) = results.last() else {
            return Self {
                steps: 0,
                peak_stress_pct: 0.0,
                mean_stress_pct: 0.0,
                peak_net_load_w: 0.0,
                steps_over_threshold: 0,
                threshold_pct,
                total_shed_passes: 0,
                total_co2_saved_lbs: 0.0,
                total_cost_saved_usd: 0.0,
                final_avg_battery_pct: 0.0,
            };
        };

        let mut peak_stress = 0.0_f64;
        let mut stress_sum = 0.0_f64;
        let mut peak_net = f64::NEG_INFINITY;
        let mut over = 0_usize;
        let mut passes = 0_usize;

        for r in results {
            peak_stress = peak_stress.max(r.stress_pct);
            stress_sum += r.stress_pct;
            peak_net = peak_net.max(r.net_load_w);
            if r.stress_pct > threshold_pct {
                over += 1;
            }
            passes += r.shed_passes;
        }

        Self {
            steps: results.len(),
            peak_stress_pct: peak_stress,
            mean_stress_pct: stress_sum / results.len() as f64,
            peak_net_load_w: peak_net,
            steps_over_threshold: over,
            threshold_pct,
            total_shed_passes: passes,
            // Records carry running totals, so the last one holds the sum.
            total_co2_saved_lbs: last.total_co2_saved_lbs,
            total_cost_saved_usd: last.total_cost_saved_usd,
            final_avg_battery_pct: last.avg_battery_pct,
        }
    }
}

impl fmt::Display for KpiReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- KPI Report ({} steps) ---", self.steps)?;
        writeln!(f, "Peak stress:           {:.1}%", self.peak_stress_pct)?;
        writeln!(f, "Mean stress:           {:.1}%", self.mean_stress_pct)?;
        writeln!(
            f,
            "Peak net load:         {:.1} kW",
            self.peak_net_load_w / 1000.0
        )?;
        writeln!(
            f,
            "Steps over {:.0}%:       {}",
            self.threshold_pct, self.steps_over_threshold
        )?;
        writeln!(f, "Shed passes:           {}", self.total_shed_passes)?;
        writeln!(
            f,
            "Saved:                 {:.2} lb CO2 / ${:.2}",
            self.total_co2_saved_lbs, self.total_cost_saved_usd
        )?;
        write!(f, "Final avg SoC:         {:.1}%", self.final_avg_battery_pct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::step::StepMode;

    fn make_result(stress_pct: f64, shed_passes: usize) -> StepResult {
        StepResult {
            cycle_index: 1,
            raw_minutes: 975,
            mode: StepMode::Day,
            stress_test: false,
            raw_load_w: stress_pct * 2_250.0,
            net_load_w: stress_pct * 2_250.0,
            ev_net_w: 0.0,
            stress_pct,
            over_threshold: stress_pct > 85.0,
            ac_on: 0,
            ac_suppressed: 0,
            cycle_active: 0,
            ev_charging: 0,
            ev_v2g: 0,
            avg_battery_pct: 50.0,
            shed_passes,
            co2_saved_lbs: 0.0,
            cost_saved_usd: 0.0,
            total_co2_saved_lbs: 0.0,
            total_cost_saved_usd: 0.0,
        }
    }

    #[test]
    fn stress_statistics() {
        let results: Vec<StepResult> = [40.0, 90.0, 80.0, 50.0]
            .iter()
            .map(|&s| make_result(s, 0))
            .collect();
        let kpi = KpiReport::from_results(&results, 85.0);
        assert_eq!(kpi.peak_stress_pct, 90.0);
        assert!((kpi.mean_stress_pct - 65.0).abs() < 1e-9);
        assert_eq!(kpi.peak_net_load_w, 202_500.0);
        assert_eq!(kpi.steps_over_threshold, 1);
    }

    #[test]
    fn threshold_is_strict() {
        let results = vec![make_result(85.0, 0); 3];
        assert_eq!(KpiReport::from_results(&results, 85.0).steps_over_threshold, 0);
    }

    #[test]
    fn totals_come_from_last_record() {
        let mut results = vec![make_result(10.0, 1), make_result(20.0, 2)];
        results[1].total_co2_saved_lbs = 4.5;
        results[1].total_cost_saved_usd = 1.25;
        results[1].avg_battery_pct = 77.0;
        let kpi = KpiReport::from_results(&results, 85.0);
        assert_eq!(kpi.total_shed_passes, 3);
        assert_eq!(kpi.total_co2_saved_lbs, 4.5);
        assert_eq!(kpi.total_cost_saved_usd, 1.25);
        assert_eq!(kpi.final_avg_battery_pct, 77.0);
    }

    #[test]
    fn empty_results() {
        let kpi = KpiReport::from_results(&[], 85.0);
        assert_eq!(kpi.steps, 0);
        assert_eq!(kpi.peak_net_load_w, 0.0);
        assert_eq!(kpi.threshold_pct, 85.0);
    }

    #[test]
    fn display_lists_every_indicator() {
        let kpi = KpiReport::from_results(&[make_result(50.0, 0)], 85.0);
        let text = kpi.to_string();
        assert!(text.contains("Peak stress"));
        assert!(text.contains("Final avg SoC"));
    }
}
