use serde::{Deserialize, Serialize};

use crate::error::{self, SimError};

/// Proportional, integral and derivative gains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl Gains {
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }

    pub fn is_finite(&self) -> bool {
        self.kp.is_finite() && self.ki.is_finite() && self.kd.is_finite()
    }
}

/// Tuning and limits of the PID law.
///
/// Output units are torque (N·m); the measurement is the lean in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidConfig {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub output_min: f64,
    pub output_max: f64,
    /// Anti-windup band on the accumulated error·dt.
    pub integral_min: f64,
    pub integral_max: f64,
    /// Weight of the newest raw derivative in the low-pass filter, in (0, 1).
    pub derivative_filter: f64,
    /// Largest output change per second.
    pub max_rate: f64,
    /// Samples retained for analytics.
    pub history_capacity: usize,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            kp: 2.0,
            ki: 0.1,
            kd: 0.5,
            output_min: -50.0,
            output_max: 50.0,
            integral_min: -50.0,
            integral_max: 50.0,
            derivative_filter: 0.5,
            max_rate: 200.0,
            history_capacity: 500,
        }
    }
}

impl PidConfig {
    pub fn gains(&self) -> Gains {
        Gains::new(self.kp, self.ki, self.kd)
    }

    /// Output held before the first tick: zero, pulled into the output band.
    pub fn resting_output(&self) -> f64 {
        0.0_f64.clamp(self.output_min, self.output_max)
    }

    pub fn with_gains(mut self, gains: Gains) -> Self {
        self.kp = gains.kp;
        self.ki = gains.ki;
        self.kd = gains.kd;
        self
    }

    pub fn validate(&self) -> Result<(), SimError> {
        for (name, value) in [("kp", self.kp), ("ki", self.ki), ("kd", self.kd)] {
            if !value.is_finite() {
                return Err(SimError::InvalidParameter { name, value });
            }
        }
        error::band("output", self.output_min, self.output_max)?;
        error::band("integral", self.integral_min, self.integral_max)?;
        error::unit_open("derivative_filter", self.derivative_filter)?;
        error::positive("max_rate", self.max_rate)?;
        if self.history_capacity == 0 {
            return Err(SimError::ZeroCapacity);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(PidConfig::default().validate().is_ok());
    }

    #[test]
    fn flipped_output_band_is_rejected() {
        let cfg = PidConfig { output_min: 10.0, output_max: -10.0, ..PidConfig::default() };
        assert!(matches!(cfg.validate(), Err(SimError::InvalidBounds { name: "output", .. })));
    }

    #[test]
    fn nan_gain_is_rejected() {
        let cfg = PidConfig::default().with_gains(Gains::new(f64::NAN, 0.0, 0.0));
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn resting_output_sits_inside_the_band() {
        assert_eq!(PidConfig::default().resting_output(), 0.0);
        let cfg = PidConfig { output_min: 5.0, output_max: 50.0, ..PidConfig::default() };
        assert_eq!(cfg.resting_output(), 5.0);
        let cfg = PidConfig { output_min: -50.0, output_max: -2.0, ..PidConfig::default() };
        assert_eq!(cfg.resting_output(), -2.0);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let cfg = PidConfig { history_capacity: 0, ..PidConfig::default() };
        assert_eq!(cfg.validate(), Err(SimError::ZeroCapacity));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: PidConfig = toml::from_str("kp = 4.0\nmax_rate = 100.0\n").unwrap();
        assert_eq!(cfg.kp, 4.0);
        assert_eq!(cfg.max_rate, 100.0);
        assert_eq!(cfg.kd, PidConfig::default().kd);
    }
}
