//! Relaxed-oscillation auto-tuning.
//!
//! The experiment runs the control law against a plant for a bounded number
//! of fixed-size steps, counts sign changes of the output, and turns the
//! observed oscillation period and amplitudes into gains with a damped
//! Ziegler–Nichols rule:
//!
//! ```text
//! Ku  = 4·A_out / (π·A_err)
//! kp' = 0.6·Ku    ki' = 1.2·Ku/Pu    kd' = 0.075·Ku·Pu
//! ```
//!
//! The controller's live memory is saved before and restored after the run,
//! so tuning never disturbs the loop it is embedded in.

use std::f64::consts::PI;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use super::pid::PidController;

/// Steps simulated per experiment.
pub const TUNE_STEPS: usize = 2000;
/// Fixed timestep of the experiment, s.
pub const TUNE_DT: f64 = 0.01;
/// Zero-crossings needed for a usable estimate (two full cycles).
pub const MIN_CROSSINGS: usize = 4;

/// Output magnitudes below this are treated as zero when detecting crossings.
const ZERO_BAND: f64 = 1e-9;

/// Something the controller can drive during a tuning experiment.
pub trait Plant {
    /// Current measurement, in the controller's units.
    fn measure(&self) -> f64;
    /// Apply `output` and advance by `dt`.
    fn actuate(&mut self, output: f64, dt: f64);
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TunedGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub ultimate_gain: f64,
    pub ultimate_period: f64,
    pub crossings: usize,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TuneError {
    #[error("detected {crossings} output zero-crossings, need at least {required}")]
    InsufficientOscillation { crossings: usize, required: usize },

    #[error("oscillation amplitude too small to estimate the ultimate gain")]
    FlatResponse,
}

impl PidController {
    /// Tune against `plant` and, on success, adopt the derived gains.
    ///
    /// Pass a copy of the plant (or a scratch model) when the real one must
    /// not move. On failure the gains are left untouched.
    pub fn auto_tune<P: Plant>(&mut self, setpoint: f64, mut plant: P) -> Result<TunedGains, TuneError> {
        let saved = self.save_memory();
        self.reset();
        let result = run_experiment(self, setpoint, &mut plant);
        self.restore_memory(saved);

        match result {
            Ok(tuned) => {
                info!(
                    kp = tuned.kp,
                    ki = tuned.ki,
                    kd = tuned.kd,
                    ku = tuned.ultimate_gain,
                    pu = tuned.ultimate_period,
                    "auto-tune succeeded"
                );
                self.set_gains(tuned.kp, tuned.ki, tuned.kd);
                Ok(tuned)
            }
            Err(e) => {
                warn!("auto-tune failed: {e}");
                Err(e)
            }
        }
    }
}

fn run_experiment<P: Plant>(
    pid: &mut PidController,
    setpoint: f64,
    plant: &mut P,
) -> Result<TunedGains, TuneError> {
    let mut outputs = Vec::with_capacity(TUNE_STEPS);
    let mut errors = Vec::with_capacity(TUNE_STEPS);
    let mut crossings: Vec<usize> = Vec::new();
    let mut prev_sign = 0.0;

    for k in 0..TUNE_STEPS {
        let out = pid.calculate(setpoint, plant.measure(), TUNE_DT);
        plant.actuate(out.output, TUNE_DT);

        if out.output.abs() > ZERO_BAND {
            let sign = out.output.signum();
            if prev_sign != 0.0 && sign != prev_sign {
                crossings.push(k);
            }
            prev_sign = sign;
        }
        outputs.push(out.output);
        errors.push(out.error);
    }

    if crossings.len() < MIN_CROSSINGS {
        return Err(TuneError::InsufficientOscillation {
            crossings: crossings.len(),
            required: MIN_CROSSINGS,
        });
    }

    // Half-periods between consecutive crossings, ignoring the lead-in.
    let half_periods = crossings.windows(2).map(|w| (w[1] - w[0]) as f64 * TUNE_DT);
    let mean_half = half_periods.sum::<f64>() / (crossings.len() - 1) as f64;
    let period = 2.0 * mean_half;

    let settled = crossings[0];
    let a_out = half_span(&outputs[settled..]);
    let a_err = half_span(&errors[settled..]);
    if a_out < ZERO_BAND || a_err < ZERO_BAND || period <= 0.0 {
        return Err(TuneError::FlatResponse);
    }

    let ku = 4.0 * a_out / (PI * a_err);
    Ok(TunedGains {
        kp: 0.6 * ku,
        ki: 1.2 * ku / period,
        kd: 0.075 * ku * period,
        ultimate_gain: ku,
        ultimate_period: period,
        crossings: crossings.len(),
    })
}

/// Half of the peak-to-peak span.
fn half_span(xs: &[f64]) -> f64 {
    let (lo, hi) = xs
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)));
    if lo.is_finite() && hi.is_finite() {
        (hi - lo) / 2.0
    } else {
        0.0
    }
}
