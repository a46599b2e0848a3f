//! Discrete PID law with anti-windup, filtered derivative, slew-rate
//! limiting and output clamping.
//!
//! The measurement is the lean in degrees and the output is a torque. The
//! controller keeps one tick of memory (previous error, filtered derivative,
//! last output) plus a bounded history that feeds the analytics only.

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use super::analytics::{self, PerformanceMetrics, StabilityStatus};
use super::config::{Gains, PidConfig};
use super::history::{History, Sample};
use crate::clock::{Clock, SystemClock};
use crate::error::SimError;

/// Timestep substituted for a non-positive or non-finite `dt`, s.
pub const MIN_DT: f64 = 0.001;

/// Result of one control tick. Read-only: the components are derived values
/// and are never fed back into the law.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PidOutput {
    pub output: f64,
    pub p: f64,
    pub i: f64,
    pub d: f64,
    pub error: f64,
}

/// Per-tick memory, saved and restored around tuning experiments.
#[derive(Debug, Clone)]
pub(crate) struct Memory {
    setpoint: f64,
    integral: f64,
    prev_error: f64,
    filtered_derivative: f64,
    last_output: f64,
    last: PidOutput,
    history: History,
    last_call: Option<f64>,
}

pub struct PidController {
    config: PidConfig,
    setpoint: f64,
    integral: f64,
    prev_error: f64,
    filtered_derivative: f64,
    last_output: f64,
    last: PidOutput,
    history: History,
    clock: Box<dyn Clock>,
    last_call: Option<f64>,
}

impl PidController {
    /// Controller with the given gains and default limits.
    pub fn new(kp: f64, ki: f64, kd: f64) -> Result<Self, SimError> {
        Self::from_config(PidConfig::default().with_gains(Gains::new(kp, ki, kd)))
    }

    pub fn from_config(config: PidConfig) -> Result<Self, SimError> {
        config.validate()?;
        let history = History::new(config.history_capacity);
        let rest = config.resting_output();
        Ok(Self {
            config,
            setpoint: 0.0,
            integral: 0.0,
            prev_error: 0.0,
            filtered_derivative: 0.0,
            last_output: rest,
            last: PidOutput { output: rest, ..PidOutput::default() },
            history,
            clock: Box::new(SystemClock::new()),
            last_call: None,
        })
    }

    /// Replace the time source used by [`calculate_now`](Self::calculate_now).
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self.last_call = None;
        self
    }

    /// Run one tick of the control law.
    ///
    /// A non-positive or non-finite `dt` is replaced with [`MIN_DT`]. A
    /// non-finite setpoint or measurement holds the previous output and leaves
    /// the accumulators untouched.
    pub fn calculate(&mut self, setpoint: f64, measured: f64, dt: f64) -> PidOutput {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { MIN_DT };

        let error = setpoint - measured;
        if !error.is_finite() {
            warn!(setpoint, measured, "non-finite control input, holding output");
            return PidOutput { output: self.last_output, ..self.last };
        }
        self.setpoint = setpoint;

        let c = &self.config;

        // ── P ──
        let p = c.kp * error;

        // ── I: clamp the accumulator, not the scaled term ──
        self.integral = (self.integral + error * dt).clamp(c.integral_min, c.integral_max);
        let i = c.ki * self.integral;

        // ── D: first-order low-pass on the raw error rate ──
        let raw_rate = (error - self.prev_error) / dt;
        if raw_rate.is_finite() {
            let alpha = c.derivative_filter;
            self.filtered_derivative = alpha * raw_rate + (1.0 - alpha) * self.filtered_derivative;
        }
        let d = c.kd * self.filtered_derivative;

        let mut output = p + i + d;
        if !output.is_finite() {
            output = self.last_output;
        }

        // ── Slew limit, then saturate ──
        let max_step = c.max_rate * dt;
        output = output
            .clamp(self.last_output - max_step, self.last_output + max_step)
            .clamp(c.output_min, c.output_max);

        self.prev_error = error;
        self.last_output = output;
        self.history.push(Sample { error, output, measurement: measured, setpoint, dt });
        self.last = PidOutput { output, p, i, d, error };
        self.last
    }

    /// Like [`calculate`](Self::calculate), with `dt` taken from the injected
    /// clock as the time since the previous `calculate_now` call.
    pub fn calculate_now(&mut self, setpoint: f64, measured: f64) -> PidOutput {
        let now = self.clock.now();
        let dt = self.last_call.map_or(MIN_DT, |prev| now - prev);
        self.last_call = Some(now);
        self.calculate(setpoint, measured, dt)
    }

    /// Clear the per-tick memory and the history. Gains and setpoint are kept.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
        self.filtered_derivative = 0.0;
        self.last_output = self.config.resting_output();
        self.last = PidOutput { output: self.last_output, ..PidOutput::default() };
        self.history.clear();
        self.last_call = None;
        debug!("controller reset");
    }

    /// Swap gains in place. Accumulators are kept so live re-tuning is smooth.
    pub fn set_gains(&mut self, kp: f64, ki: f64, kd: f64) {
        let gains = Gains::new(kp, ki, kd);
        if !gains.is_finite() {
            warn!(kp, ki, kd, "ignoring non-finite gains");
            return;
        }
        self.config = self.config.clone().with_gains(gains);
        debug!(kp, ki, kd, "gains updated");
    }

    pub fn set_setpoint(&mut self, value: f64) {
        if !value.is_finite() {
            warn!(value, "ignoring non-finite setpoint");
            return;
        }
        self.setpoint = value;
    }

    pub fn gains(&self) -> Gains {
        self.config.gains()
    }

    pub fn config(&self) -> &PidConfig {
        &self.config
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn previous_error(&self) -> f64 {
        self.prev_error
    }

    pub fn filtered_derivative(&self) -> f64 {
        self.filtered_derivative
    }

    pub fn last_output(&self) -> f64 {
        self.last_output
    }

    pub fn last(&self) -> PidOutput {
        self.last
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    // ── Analytics (read-only, never feed back into the law) ──

    pub fn stability_status(&self) -> StabilityStatus {
        analytics::stability_status(&self.history)
    }

    pub fn rms_error(&self, window: usize) -> f64 {
        analytics::rms_error(&self.history, window)
    }

    pub fn error_trend(&self, window: usize) -> f64 {
        analytics::error_trend(&self.history, window)
    }

    pub fn settling_time(&self) -> f64 {
        analytics::settling_time(&self.history, analytics::SETTLING_THRESHOLD)
    }

    pub fn overshoot(&self) -> f64 {
        analytics::overshoot(&self.history)
    }

    pub fn performance_metrics(&self) -> PerformanceMetrics {
        PerformanceMetrics {
            stability: self.stability_status(),
            rms_error: self.rms_error(analytics::RMS_WINDOW),
            current_error: self.last.error,
            avg_error: analytics::mean_abs_error(&self.history),
            output: self.last.output,
            integral: self.last.i,
            derivative: self.last.d,
        }
    }

    pub(crate) fn save_memory(&self) -> Memory {
        Memory {
            setpoint: self.setpoint,
            integral: self.integral,
            prev_error: self.prev_error,
            filtered_derivative: self.filtered_derivative,
            last_output: self.last_output,
            last: self.last,
            history: self.history.clone(),
            last_call: self.last_call,
        }
    }

    pub(crate) fn restore_memory(&mut self, memory: Memory) {
        self.setpoint = memory.setpoint;
        self.integral = memory.integral;
        self.prev_error = memory.prev_error;
        self.filtered_derivative = memory.filtered_derivative;
        self.last_output = memory.last_output;
        self.last = memory.last;
        self.history = memory.history;
        self.last_call = memory.last_call;
    }
}

impl fmt::Debug for PidController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PidController")
            .field("config", &self.config)
            .field("setpoint", &self.setpoint)
            .field("integral", &self.integral)
            .field("prev_error", &self.prev_error)
            .field("filtered_derivative", &self.filtered_derivative)
            .field("last_output", &self.last_output)
            .field("history_len", &self.history.len())
            .finish_non_exhaustive()
    }
}

impl super::Controller for PidController {
    fn control(&mut self, setpoint: f64, measurement: f64, dt: f64) -> f64 {
        self.calculate(setpoint, measurement, dt).output
    }

    fn reset(&mut self) {
        PidController::reset(self);
    }

    fn name(&self) -> &str {
        "PidController"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const DT: f64 = 0.01;

    /// Wide limits so only the term under test shapes the output.
    fn unlimited(kp: f64, ki: f64, kd: f64) -> PidController {
        PidController::from_config(PidConfig {
            kp,
            ki,
            kd,
            output_min: -1e9,
            output_max: 1e9,
            integral_min: -1e9,
            integral_max: 1e9,
            derivative_filter: 0.5,
            max_rate: 1e12,
            history_capacity: 100,
        })
        .unwrap()
    }

    #[test]
    fn pure_proportional() {
        let mut pid = unlimited(2.0, 0.0, 0.0);
        let out = pid.calculate(1.0, 0.5, DT);
        assert!((out.output - 1.0).abs() < 1e-12, "P should be kp * error");
        assert!((out.p - 1.0).abs() < 1e-12);
        assert!((out.error - 0.5).abs() < 1e-12);
    }

    #[test]
    fn integral_accumulates_error_dt() {
        let mut pid = unlimited(0.0, 1.0, 0.0);
        pid.calculate(1.0, 0.0, 0.1);
        let out = pid.calculate(1.0, 0.0, 0.1);
        assert!((pid.integral() - 0.2).abs() < 1e-12);
        assert!((out.i - 0.2).abs() < 1e-12);
    }

    #[test]
    fn derivative_is_low_pass_filtered() {
        let mut pid = unlimited(0.0, 0.0, 1.0);
        pid.calculate(0.0, 0.0, DT);
        // Step in error of 1.0 → raw rate 100, filtered by alpha = 0.5
        let out = pid.calculate(1.0, 0.0, DT);
        assert!((out.d - 50.0).abs() < 1e-9);
        // Held error → raw rate 0, filtered value halves
        let out = pid.calculate(1.0, 0.0, DT);
        assert!((out.d - 25.0).abs() < 1e-9);
    }

    #[test]
    fn slew_rate_limits_each_tick() {
        let cfg = PidConfig { kp: 100.0, ki: 0.0, kd: 0.0, max_rate: 10.0, ..PidConfig::default() };
        let mut pid = PidController::from_config(cfg).unwrap();
        let out = pid.calculate(10.0, 0.0, 0.1);
        assert!((out.output - 1.0).abs() < 1e-12, "limited to max_rate * dt");
        let out = pid.calculate(10.0, 0.0, 0.1);
        assert!((out.output - 2.0).abs() < 1e-12);
    }

    #[test]
    fn output_is_clamped() {
        let cfg = PidConfig { kp: 1000.0, ki: 0.0, kd: 0.0, max_rate: 1e9, ..PidConfig::default() };
        let mut pid = PidController::from_config(cfg).unwrap();
        let out = pid.calculate(10.0, 0.0, DT);
        assert_eq!(out.output, 50.0);
        let out = pid.calculate(-10.0, 0.0, DT);
        assert_eq!(out.output, -50.0);
    }

    #[test]
    fn band_excluding_zero_starts_inside_it() {
        let cfg = PidConfig { output_min: 5.0, output_max: 50.0, max_rate: 100.0, ..PidConfig::default() };
        let mut pid = PidController::from_config(cfg).unwrap();
        assert_eq!(pid.last_output(), 5.0);

        let out = pid.calculate(0.0, 0.0, DT);
        assert_eq!(out.output, 5.0);
        assert!((out.output - 5.0).abs() <= 100.0 * DT);

        for _ in 0..20 {
            pid.calculate(30.0, 0.0, DT);
        }
        assert!(pid.last_output() > 5.0);
        pid.reset();
        assert_eq!(pid.last_output(), 5.0);
        assert_eq!(pid.last().output, 5.0);
    }

    #[test]
    fn integral_clamps_on_the_accumulator() {
        let cfg = PidConfig { ki: 1.0, integral_min: -1.0, integral_max: 1.0, ..PidConfig::default() };
        let mut pid = PidController::from_config(cfg).unwrap();
        for _ in 0..1000 {
            pid.calculate(100.0, 0.0, DT);
        }
        assert_eq!(pid.integral(), 1.0);
        // Raising ki does not reintroduce the wound-up error
        pid.set_gains(2.0, 10.0, 0.5);
        let out = pid.calculate(100.0, 0.0, DT);
        assert!((out.i - 10.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_dt_uses_epsilon() {
        let mut pid = unlimited(0.0, 1.0, 0.0);
        pid.calculate(1.0, 0.0, 0.0);
        assert!((pid.integral() - MIN_DT).abs() < 1e-15);
        pid.calculate(1.0, 0.0, -5.0);
        pid.calculate(1.0, 0.0, f64::NAN);
        assert!((pid.integral() - 3.0 * MIN_DT).abs() < 1e-15);
    }

    #[test]
    fn non_finite_measurement_holds_output() {
        let mut pid = PidController::new(2.0, 0.1, 0.5).unwrap();
        let first = pid.calculate(0.0, -1.0, DT);
        let integral = pid.integral();
        let held = pid.calculate(0.0, f64::NAN, DT);
        assert_eq!(held.output, first.output);
        assert_eq!(pid.integral(), integral);
        assert_eq!(pid.history().len(), 1);
    }

    #[test]
    fn set_gains_keeps_accumulators() {
        let mut pid = PidController::new(2.0, 0.5, 0.5).unwrap();
        for _ in 0..10 {
            pid.calculate(0.0, 1.0, DT);
        }
        let integral = pid.integral();
        let filtered = pid.filtered_derivative();
        pid.set_gains(4.0, 1.0, 0.1);
        assert_eq!(pid.gains(), Gains::new(4.0, 1.0, 0.1));
        assert_eq!(pid.integral(), integral);
        assert_eq!(pid.filtered_derivative(), filtered);

        pid.set_gains(f64::NAN, 1.0, 1.0);
        assert_eq!(pid.gains(), Gains::new(4.0, 1.0, 0.1));
    }

    #[test]
    fn reset_clears_memory_and_history() {
        let mut pid = PidController::new(2.0, 0.5, 0.5).unwrap();
        for _ in 0..20 {
            pid.calculate(0.0, 3.0, DT);
        }
        pid.reset();
        assert_eq!(pid.integral(), 0.0);
        assert_eq!(pid.previous_error(), 0.0);
        assert_eq!(pid.filtered_derivative(), 0.0);
        assert_eq!(pid.last_output(), 0.0);
        assert!(pid.history().is_empty());
        assert_eq!(pid.gains(), Gains::new(2.0, 0.5, 0.5));
    }

    #[test]
    fn calculate_now_reads_the_injected_clock() {
        let clock = ManualClock::new(10.0);
        let mut pid = unlimited(0.0, 1.0, 0.0).with_clock(clock.clone());
        pid.calculate_now(1.0, 0.0);
        assert!((pid.integral() - MIN_DT).abs() < 1e-15, "first call has no elapsed time");
        clock.advance(0.05);
        pid.calculate_now(1.0, 0.0);
        assert!((pid.integral() - (MIN_DT + 0.05)).abs() < 1e-12);
        // Frozen clock → zero elapsed → epsilon
        pid.calculate_now(1.0, 0.0);
        assert!((pid.integral() - (2.0 * MIN_DT + 0.05)).abs() < 1e-12);
    }

    #[test]
    fn performance_metrics_reflect_last_tick() {
        let mut pid = PidController::new(2.0, 0.1, 0.5).unwrap();
        let out = pid.calculate(0.0, 2.0, 0.02);
        let m = pid.performance_metrics();
        assert_eq!(m.stability, StabilityStatus::Initializing);
        assert_eq!(m.current_error, -2.0);
        assert_eq!(m.output, out.output);
        assert_eq!(m.integral, out.i);
        assert_eq!(m.derivative, out.d);
        assert!((m.avg_error - 2.0).abs() < 1e-12);
    }
}
