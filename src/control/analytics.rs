use std::fmt;

use serde::Serialize;

use super::history::History;

/// Samples averaged for the stability classification.
pub const STABILITY_WINDOW: usize = 10;
/// Default window for the RMS error in [`PerformanceMetrics`].
pub const RMS_WINDOW: usize = 50;
/// |error| above which the loop is considered unsettled, deg.
pub const SETTLING_THRESHOLD: f64 = 1.0;

/// Upper bounds on mean |error| (deg) for each class, ascending.
const STABILITY_THRESHOLDS: [(f64, StabilityStatus); 4] = [
    (0.5, StabilityStatus::VeryStable),
    (2.0, StabilityStatus::Stable),
    (5.0, StabilityStatus::Settling),
    (15.0, StabilityStatus::Oscillating),
];

/// Coarse loop health, ordered from best to worst after `Initializing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StabilityStatus {
    Initializing,
    VeryStable,
    Stable,
    Settling,
    Oscillating,
    Unstable,
}

impl fmt::Display for StabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StabilityStatus::Initializing => "Initializing",
            StabilityStatus::VeryStable => "Very Stable",
            StabilityStatus::Stable => "Stable",
            StabilityStatus::Settling => "Settling",
            StabilityStatus::Oscillating => "Oscillating",
            StabilityStatus::Unstable => "Unstable",
        };
        f.write_str(label)
    }
}

/// Snapshot handed to renderers alongside the physics state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    pub stability: StabilityStatus,
    pub rms_error: f64,
    pub current_error: f64,
    pub avg_error: f64,
    pub output: f64,
    /// Integral term of the last tick (ki · accumulator).
    pub integral: f64,
    /// Derivative term of the last tick (kd · filtered rate).
    pub derivative: f64,
}

pub fn stability_status(history: &History) -> StabilityStatus {
    if history.len() < STABILITY_WINDOW {
        return StabilityStatus::Initializing;
    }
    let mean = history
        .recent(STABILITY_WINDOW)
        .map(|s| s.error.abs())
        .sum::<f64>()
        / STABILITY_WINDOW as f64;

    STABILITY_THRESHOLDS
        .iter()
        .find(|(limit, _)| mean < *limit)
        .map_or(StabilityStatus::Unstable, |(_, status)| *status)
}

/// Root-mean-square of the newest `window` errors; 0 until that many exist.
pub fn rms_error(history: &History, window: usize) -> f64 {
    if window == 0 || history.len() < window {
        return 0.0;
    }
    let sum_sq: f64 = history.recent(window).map(|s| s.error * s.error).sum();
    (sum_sq / window as f64).sqrt()
}

/// Least-squares slope of error against sample index over the newest
/// `window` samples. Negative means the error is shrinking (for positive
/// errors). 0 with too little history or a degenerate fit.
pub fn error_trend(history: &History, window: usize) -> f64 {
    if window < 2 || history.len() < window {
        return 0.0;
    }
    let n = window as f64;
    let (mut sx, mut sy, mut sxy, mut sxx) = (0.0, 0.0, 0.0, 0.0);
    for (i, s) in history.recent(window).enumerate() {
        let x = i as f64;
        sx += x;
        sy += s.error;
        sxy += x * s.error;
        sxx += x * x;
    }
    let denom = n * sxx - sx * sx;
    if denom.abs() < 1e-12 {
        return 0.0;
    }
    (n * sxy - sx * sy) / denom
}

/// Time since |error| last exceeded `threshold`, scanning newest to oldest.
/// Spans the whole history if it never did.
pub fn settling_time(history: &History, threshold: f64) -> f64 {
    let mut elapsed = 0.0;
    for s in history.iter().rev() {
        if s.error.abs() > threshold {
            break;
        }
        elapsed += s.dt;
    }
    elapsed
}

/// Largest |measurement − setpoint| seen across the history.
pub fn overshoot(history: &History) -> f64 {
    history
        .iter()
        .map(|s| (s.measurement - s.setpoint).abs())
        .fold(0.0_f64, f64::max)
}

/// Mean |error| over the whole history; 0 when empty.
pub fn mean_abs_error(history: &History) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    history.errors().map(f64::abs).sum::<f64>() / history.len() as f64
}
