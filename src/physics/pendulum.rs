use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use super::params::{InitialTilt, PhysicsParams, ANGLE_LIMIT};
use super::state::{RobotState, StateSnapshot};
use super::trail::Trail;
use crate::control::Plant;
use crate::error::SimError;

// ---------------------------------------------------------------------------
// Inverted pendulum on a wheeled base
// ---------------------------------------------------------------------------

/// Single-DOF inverted pendulum integrated with semi-implicit Euler.
///
/// Owns the [`RobotState`]; it changes only through `step`, `reset`,
/// `apply_torque` and `apply_disturbance`.
#[derive(Debug, Clone)]
pub struct PhysicsModel {
    params: PhysicsParams,
    state: RobotState,
    time: f64,
    trail: Trail,
    rng: Option<StdRng>,
}

impl PhysicsModel {
    /// Pendulum with the given mass, length, gravity and pivot friction;
    /// every other parameter takes its default.
    pub fn new(mass: f64, length: f64, gravity: f64, friction: f64) -> Result<Self, SimError> {
        Self::with_params(PhysicsParams {
            mass,
            length,
            gravity,
            friction,
            ..PhysicsParams::default()
        })
    }

    pub fn with_params(params: PhysicsParams) -> Result<Self, SimError> {
        params.validate()?;
        let rng = match params.initial_tilt {
            InitialTilt::Random { seed, .. } => Some(StdRng::seed_from_u64(seed)),
            _ => None,
        };
        let trail = Trail::new(params.trail_max_points, params.trail_timeout);
        let mut model = Self {
            params,
            state: RobotState::default(),
            time: 0.0,
            trail,
            rng,
        };
        model.state = RobotState::tilted(model.initial_angle());
        Ok(model)
    }

    fn initial_angle(&mut self) -> f64 {
        match self.params.initial_tilt {
            InitialTilt::Upright => 0.0,
            InitialTilt::Fixed { angle } => angle,
            InitialTilt::Random { max_angle, .. } => match self.rng.as_mut() {
                Some(rng) if max_angle > 0.0 => rng.gen_range(-max_angle..=max_angle),
                _ => 0.0,
            },
        }
    }

    /// Advance the state by `dt` seconds.
    ///
    /// A non-positive or non-finite `dt` leaves the state untouched.
    pub fn step(&mut self, dt: f64) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }

        let p = &self.params;
        let s = &mut self.state;
        let inertia = p.inertia();
        let was_inside = s.angle.abs() < ANGLE_LIMIT;

        // --- Rotational dynamics ---
        s.angular_acceleration = (p.gravity / p.length) * s.angle.sin()
            - (p.friction / inertia) * s.angular_velocity
            + s.torque / inertia
            + s.disturbance_force / inertia;
        s.angular_velocity += s.angular_acceleration * dt;
        s.angle += s.angular_velocity * dt;

        // Safety stop: the body rests against it instead of pushing through.
        if s.angle.abs() > ANGLE_LIMIT {
            if was_inside {
                warn!(angle = s.angle, "pendulum reached the safety stop");
            }
            s.angle = s.angle.clamp(-ANGLE_LIMIT, ANGLE_LIMIT);
            s.angular_velocity = 0.0;
        }

        // --- Lateral dynamics, driven by the lean ---
        let target_speed = s.angle.sin() * p.lateral_speed_gain;
        s.velocity += (target_speed - s.velocity) * p.lateral_smoothing * dt;
        s.velocity *= p.ground_friction;
        s.position += s.velocity * dt;

        s.disturbance_force *= p.disturbance_decay;

        self.time += dt;
        let tip = self.tip_position();
        self.trail.record(tip, self.time);
    }

    /// Command torque for subsequent steps. Limits belong to the controller.
    pub fn apply_torque(&mut self, value: f64) {
        if !value.is_finite() {
            warn!(value, "ignoring non-finite torque command");
            return;
        }
        self.state.torque = value;
    }

    /// Replace (not add to) the current disturbance impulse.
    pub fn apply_disturbance(&mut self, magnitude: f64) {
        if !magnitude.is_finite() {
            warn!(magnitude, "ignoring non-finite disturbance");
            return;
        }
        debug!(magnitude, "disturbance applied");
        self.state.disturbance_force = magnitude;
    }

    /// Return to the configured initial condition and clear the trail.
    pub fn reset(&mut self) {
        let angle = self.initial_angle();
        self.state = RobotState::tilted(angle);
        self.time = 0.0;
        self.trail.clear();
        debug!(angle, "physics reset");
    }

    pub fn state(&self) -> &RobotState {
        &self.state
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.state.snapshot()
    }

    pub fn params(&self) -> &PhysicsParams {
        &self.params
    }

    /// Simulated time since construction or the last reset, s.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    /// Body tip in world coordinates: [lateral, height].
    pub fn tip_position(&self) -> Vector2<f64> {
        let l = self.params.length;
        Vector2::new(
            self.state.position + l * self.state.angle.sin(),
            l * self.state.angle.cos(),
        )
    }
}

impl Plant for PhysicsModel {
    fn measure(&self) -> f64 {
        self.state.angle_degrees()
    }

    fn actuate(&mut self, output: f64, dt: f64) {
        self.apply_torque(output);
        self.step(dt);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
