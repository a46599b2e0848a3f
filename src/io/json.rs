use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::control::analytics::SETTLING_THRESHOLD;
use crate::control::{Gains, PerformanceMetrics};
use crate::physics::ANGLE_LIMIT;
use crate::sim::TickRecord;

/// Summary statistics computed from a control-loop trajectory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub gains: Gains,
    pub duration_s: f64,
    pub ticks: usize,
    pub final_angle_deg: f64,
    pub peak_angle_deg: f64,
    pub peak_angle_time_s: f64,
    pub rms_error_deg: f64,
    pub mean_abs_error_deg: f64,
    pub peak_output: f64,
    /// Time since |error| last exceeded the settling threshold.
    pub settled_for_s: f64,
    pub fell: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<PerformanceMetrics>,
}

impl RunSummary {
    /// Compute summary from trajectory data. The first record is the initial
    /// state and carries no control action, so it is skipped for error stats.
    pub fn from_trajectory(gains: Gains, trajectory: &[TickRecord]) -> Self {
        let controlled = trajectory.get(1..).unwrap_or(&[]);
        let n = controlled.len().max(1) as f64;

        let (peak_angle_deg, peak_angle_time_s) = trajectory
            .iter()
            .map(|r| (r.state.angle_degrees.abs(), r.time))
            .fold((0.0_f64, 0.0_f64), |best, cur| if cur.0 > best.0 { cur } else { best });

        let rms = (controlled.iter().map(|r| r.error * r.error).sum::<f64>() / n).sqrt();
        let mean_abs = controlled.iter().map(|r| r.error.abs()).sum::<f64>() / n;
        let peak_output = controlled.iter().map(|r| r.output.abs()).fold(0.0_f64, f64::max);

        let end = trajectory.last().map_or(0.0, |r| r.time);
        let last_excursion = controlled
            .iter()
            .rev()
            .find(|r| r.error.abs() > SETTLING_THRESHOLD)
            .map(|r| r.time);
        let start = trajectory.first().map_or(0.0, |r| r.time);
        let settled_for_s = end - last_excursion.unwrap_or(start);

        RunSummary {
            gains,
            duration_s: end - start,
            ticks: controlled.len(),
            final_angle_deg: trajectory.last().map_or(0.0, |r| r.state.angle_degrees),
            peak_angle_deg,
            peak_angle_time_s,
            rms_error_deg: rms,
            mean_abs_error_deg: mean_abs,
            peak_output,
            settled_for_s,
            fell: trajectory.iter().any(|r| r.state.angle.abs() >= ANGLE_LIMIT),
            metrics: None,
        }
    }

    /// Attach the controller's live metrics at the end of the run.
    pub fn with_metrics(mut self, metrics: PerformanceMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

/// Write run summary as pretty JSON to a writer.
pub fn write_summary<W: Write>(writer: &mut W, summary: &RunSummary) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, summary)?;
    writeln!(writer)
}

/// Write run summary JSON to a file.
pub fn write_summary_file(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_summary(&mut file, summary)
}
