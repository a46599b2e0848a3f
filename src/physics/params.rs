use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use crate::error::{self, SimError};

// ---------------------------------------------------------------------------
// Physical constants
// ---------------------------------------------------------------------------

pub const STANDARD_GRAVITY: f64 = 9.81; // m/s^2

/// Safety stop on the lean angle, rad. Not a physical limit.
pub const ANGLE_LIMIT: f64 = FRAC_PI_2;

// ---------------------------------------------------------------------------
// Reset policy
// ---------------------------------------------------------------------------

/// Initial lean applied at construction and on every reset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum InitialTilt {
    /// Exactly upright: angle zero.
    Upright,
    /// A fixed lean, rad.
    Fixed { angle: f64 },
    /// Uniformly drawn in `[-max_angle, max_angle]`, redrawn on every reset.
    /// The generator is seeded, so a sequence of resets is reproducible.
    Random { max_angle: f64, seed: u64 },
}

impl Default for InitialTilt {
    fn default() -> Self {
        InitialTilt::Fixed { angle: 0.05 }
    }
}

// ---------------------------------------------------------------------------
// Pendulum parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsParams {
    pub mass: f64,                // kg
    pub length: f64,              // m, pivot to centre of mass
    pub gravity: f64,             // m/s^2
    pub friction: f64,            // N·m·s/rad, viscous damping at the pivot
    pub lateral_speed_gain: f64,  // m/s of target ground speed per unit sin(angle)
    pub lateral_smoothing: f64,   // 1/s, how fast ground speed tracks its target
    pub ground_friction: f64,     // per-tick velocity retention, in (0, 1)
    pub disturbance_decay: f64,   // per-tick disturbance retention, in (0, 1)
    pub trail_max_points: usize,  // 0 disables the trail
    pub trail_timeout: f64,       // s, age after which trail points are evicted
    pub initial_tilt: InitialTilt,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            mass: 1.0,
            length: 1.0,
            gravity: STANDARD_GRAVITY,
            friction: 0.1,
            lateral_speed_gain: 2.0,
            lateral_smoothing: 5.0,
            ground_friction: 0.98,
            disturbance_decay: 0.9,
            trail_max_points: 50,
            trail_timeout: 2.0,
            initial_tilt: InitialTilt::default(),
        }
    }
}

impl PhysicsParams {
    /// Rotational inertia about the pivot for a point mass: m·l².
    pub fn inertia(&self) -> f64 {
        self.mass * self.length * self.length
    }

    pub fn validate(&self) -> Result<(), SimError> {
        error::positive("mass", self.mass)?;
        error::positive("length", self.length)?;
        error::non_negative("gravity", self.gravity)?;
        error::non_negative("friction", self.friction)?;
        error::non_negative("lateral_speed_gain", self.lateral_speed_gain)?;
        error::non_negative("lateral_smoothing", self.lateral_smoothing)?;
        error::unit_open("ground_friction", self.ground_friction)?;
        error::unit_open("disturbance_decay", self.disturbance_decay)?;
        error::non_negative("trail_timeout", self.trail_timeout)?;
        match self.initial_tilt {
            InitialTilt::Upright => {}
            InitialTilt::Fixed { angle } => {
                if !angle.is_finite() || angle.abs() > ANGLE_LIMIT {
                    return Err(SimError::InvalidBounds {
                        name: "initial_tilt.angle",
                        min: -ANGLE_LIMIT,
                        max: ANGLE_LIMIT,
                    });
                }
            }
            InitialTilt::Random { max_angle, .. } => {
                error::non_negative("initial_tilt.max_angle", max_angle)?;
                if max_angle > ANGLE_LIMIT {
                    return Err(SimError::InvalidParameter {
                        name: "initial_tilt.max_angle",
                        value: max_angle,
                    });
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Fluent construction of [`PhysicsParams`], validated on `build`.
pub struct PhysicsBuilder {
    params: PhysicsParams,
}

impl PhysicsBuilder {
    pub fn new() -> Self {
        Self { params: PhysicsParams::default() }
    }

    pub fn mass(mut self, v: f64) -> Self { self.params.mass = v; self }
    pub fn length(mut self, v: f64) -> Self { self.params.length = v; self }
    pub fn gravity(mut self, v: f64) -> Self { self.params.gravity = v; self }
    pub fn friction(mut self, v: f64) -> Self { self.params.friction = v; self }
    pub fn lateral_speed_gain(mut self, v: f64) -> Self { self.params.lateral_speed_gain = v; self }
    pub fn lateral_smoothing(mut self, v: f64) -> Self { self.params.lateral_smoothing = v; self }
    pub fn ground_friction(mut self, v: f64) -> Self { self.params.ground_friction = v; self }
    pub fn disturbance_decay(mut self, v: f64) -> Self { self.params.disturbance_decay = v; self }
    pub fn initial_tilt(mut self, v: InitialTilt) -> Self { self.params.initial_tilt = v; self }
    pub fn trail(mut self, max_points: usize, timeout: f64) -> Self {
        self.params.trail_max_points = max_points;
        self.params.trail_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<PhysicsParams, SimError> {
        self.params.validate()?;
        Ok(self.params)
    }
}

impl Default for PhysicsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(PhysicsParams::default().validate().is_ok());
    }

    #[test]
    fn builder_rejects_zero_mass() {
        let err = PhysicsBuilder::new().mass(0.0).build().unwrap_err();
        assert_eq!(err, SimError::InvalidParameter { name: "mass", value: 0.0 });
    }

    #[test]
    fn builder_rejects_decay_outside_unit_interval() {
        assert!(PhysicsBuilder::new().disturbance_decay(1.0).build().is_err());
        assert!(PhysicsBuilder::new().ground_friction(0.0).build().is_err());
    }

    #[test]
    fn fixed_tilt_must_be_inside_the_stop() {
        let res = PhysicsBuilder::new()
            .initial_tilt(InitialTilt::Fixed { angle: 2.0 })
            .build();
        assert!(res.is_err());
    }

    #[test]
    fn tilt_round_trips_through_toml() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            tilt: InitialTilt,
        }
        let text = "[tilt]\nmode = \"random\"\nmax_angle = 0.1\nseed = 7\n";
        let w: Wrapper = toml::from_str(text).unwrap();
        assert_eq!(w.tilt, InitialTilt::Random { max_angle: 0.1, seed: 7 });
    }
}
