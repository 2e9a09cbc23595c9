//! CSV export for simulation step results.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::step::StepMode;
use crate::sim::types::StepResult;

/// Column header for CSV telemetry export.
const HEADER: &str = "cycle,time,mode,stress_test,raw_load_w,net_load_w,ev_net_w,\
                      stress_pct,over_threshold,ac_on,ac_suppressed,cycle_active,\
                      ev_charging,ev_v2g,avg_battery_pct,shed_passes,\
                      co2_saved_lbs,cost_saved_usd,total_co2_saved_lbs,total_cost_saved_usd";

/// Exports simulation results to a CSV file at the given path.
///
/// Writes a header row followed by one data row per step. Produces
/// deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(results: &[StepResult], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(results, buf)
}

/// Writes simulation results as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(results: &[StepResult], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in results {
        let mode = match r.mode {
            StepMode::Day => "day",
            StepMode::Night => "night",
        };
        wtr.write_record(&[
            r.cycle_index.to_string(),
            r.time_label(),
            mode.to_string(),
            r.stress_test.to_string(),
            format!("{:.1}", r.raw_load_w),
            format!("{:.1}", r.net_load_w),
            format!("{:.1}", r.ev_net_w),
            format!("{:.3}", r.stress_pct),
            r.over_threshold.to_string(),
            r.ac_on.to_string(),
            r.ac_suppressed.to_string(),
            r.cycle_active.to_string(),
            r.ev_charging.to_string(),
            r.ev_v2g.to_string(),
            format!("{:.3}", r.avg_battery_pct),
            r.shed_passes.to_string(),
            format!("{:.4}", r.co2_saved_lbs),
            format!("{:.4}", r.cost_saved_usd),
            format!("{:.4}", r.total_co2_saved_lbs),
            format!("{:.4}", r.total_cost_saved_usd),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
