use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::control::{Controller, PerformanceMetrics, PidController, PidOutput, TuneError, TunedGains};
use crate::error::{self, SimError};
use crate::physics::{PhysicsModel, StateSnapshot};

// ---------------------------------------------------------------------------
// Run configuration
// ---------------------------------------------------------------------------

/// A disturbance injected once simulated time reaches `time`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledDisturbance {
    pub time: f64,      // s
    pub magnitude: f64, // torque-equivalent impulse
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub dt: f64,       // fixed timestep for batch runs, s
    pub duration: f64, // s
    pub max_dt: f64,   // cap on wall-clock frame time for real-time drivers, s
    pub setpoint: f64, // deg
    pub disturbances: Vec<ScheduledDisturbance>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dt: 0.02,         // 50 Hz
            duration: 10.0,
            max_dt: 0.05,
            setpoint: 0.0,
            disturbances: Vec::new(),
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        error::positive("run.dt", self.dt)?;
        error::non_negative("run.duration", self.duration)?;
        error::positive("run.max_dt", self.max_dt)?;
        if !self.setpoint.is_finite() {
            return Err(SimError::InvalidParameter { name: "run.setpoint", value: self.setpoint });
        }
        for d in &self.disturbances {
            error::non_negative("run.disturbances.time", d.time)?;
            if !d.magnitude.is_finite() {
                return Err(SimError::InvalidParameter {
                    name: "run.disturbances.magnitude",
                    value: d.magnitude,
                });
            }
        }
        Ok(())
    }

    pub fn steps(&self) -> usize {
        (self.duration / self.dt).round() as usize
    }
}

// ---------------------------------------------------------------------------
// Trajectory record
// ---------------------------------------------------------------------------

/// State after one tick, plus what the controller did to get there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickRecord {
    pub time: f64,
    pub state: StateSnapshot,
    pub output: f64,
    pub error: f64,
    pub disturbance: f64,
}

impl TickRecord {
    fn capture(physics: &PhysicsModel, output: f64, error: f64) -> Self {
        Self {
            time: physics.time(),
            state: physics.snapshot(),
            output,
            error,
            disturbance: physics.state().disturbance_force,
        }
    }
}

// ---------------------------------------------------------------------------
// Batch runner
// ---------------------------------------------------------------------------

/// Drive `physics` with any [`Controller`] for `run.duration` at a fixed `dt`.
///
/// The first record is the initial state. Scheduled disturbances fire on the
/// first tick whose start time has reached them.
pub fn simulate_with(
    physics: &mut PhysicsModel,
    controller: &mut dyn Controller,
    run: &RunConfig,
) -> Vec<TickRecord> {
    let steps = run.steps();
    let mut trajectory = Vec::with_capacity(steps.min(1_000_000) + 1);
    trajectory.push(TickRecord::capture(physics, 0.0, run.setpoint - physics.snapshot().angle_degrees));

    let mut pending: Vec<ScheduledDisturbance> = run.disturbances.clone();
    pending.sort_by(|a, b| a.time.total_cmp(&b.time));
    let mut pending = pending.into_iter().peekable();

    for _ in 0..steps {
        let now = physics.time() + run.dt * 1e-6;
        while let Some(d) = pending.next_if(|d| d.time <= now) {
            physics.apply_disturbance(d.magnitude);
        }

        let measurement = physics.snapshot().angle_degrees;
        let output = controller.control(run.setpoint, measurement, run.dt);
        physics.apply_torque(output);
        physics.step(run.dt);

        trajectory.push(TickRecord::capture(physics, output, run.setpoint - measurement));
    }

    debug!(controller = controller.name(), ticks = steps, "batch run complete");
    trajectory
}

// ---------------------------------------------------------------------------
// Interactive simulation
// ---------------------------------------------------------------------------

/// Owns and wires the pendulum and its PID controller.
///
/// Renderers read [`state`](Self::state) and [`metrics`](Self::metrics);
/// UI input goes through the setters. Every call completes synchronously, so
/// changes between ticks never observe a half-finished step.
#[derive(Debug)]
pub struct Simulation {
    physics: PhysicsModel,
    controller: PidController,
    setpoint: f64,
    ticks: u64,
}

impl Simulation {
    pub fn new(physics: PhysicsModel, controller: PidController) -> Self {
        let setpoint = controller.setpoint();
        Self { physics, controller, setpoint, ticks: 0 }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, SimError> {
        config.run.validate()?;
        let physics = PhysicsModel::with_params(config.physics.clone())?;
        let mut controller = PidController::from_config(config.controller.clone())?;
        controller.set_setpoint(config.run.setpoint);
        Ok(Self::new(physics, controller))
    }

    /// One control tick: measure, compute, actuate, integrate.
    pub fn tick(&mut self, dt: f64) -> PidOutput {
        let measurement = self.physics.snapshot().angle_degrees;
        let out = self.controller.calculate(self.setpoint, measurement, dt);
        self.physics.apply_torque(out.output);
        self.physics.step(dt);
        self.ticks += 1;
        out
    }

    /// Batch-run the PID loop with this simulation's components.
    pub fn run(&mut self, run: &RunConfig) -> Vec<TickRecord> {
        self.set_setpoint(run.setpoint);
        let trajectory = simulate_with(&mut self.physics, &mut self.controller, run);
        self.ticks += run.steps() as u64;
        trajectory
    }

    pub fn state(&self) -> StateSnapshot {
        self.physics.snapshot()
    }

    pub fn metrics(&self) -> PerformanceMetrics {
        self.controller.performance_metrics()
    }

    pub fn set_gains(&mut self, kp: f64, ki: f64, kd: f64) {
        self.controller.set_gains(kp, ki, kd);
    }

    pub fn set_setpoint(&mut self, value: f64) {
        if value.is_finite() {
            self.setpoint = value;
        }
        self.controller.set_setpoint(value);
    }

    pub fn apply_disturbance(&mut self, magnitude: f64) {
        self.physics.apply_disturbance(magnitude);
    }

    /// Both components back to their initial condition; histories cleared.
    pub fn reset(&mut self) {
        self.physics.reset();
        self.controller.reset();
        self.ticks = 0;
    }

    /// Tune the controller against a copy of the current physics.
    pub fn auto_tune(&mut self) -> Result<TunedGains, TuneError> {
        let scratch = self.physics.clone();
        let result = self.controller.auto_tune(self.setpoint, scratch);
        if let Ok(tuned) = &result {
            info!(kp = tuned.kp, ki = tuned.ki, kd = tuned.kd, "simulation gains retuned");
        }
        result
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn time(&self) -> f64 {
        self.physics.time()
    }

    pub fn physics(&self) -> &PhysicsModel {
        &self.physics
    }

    pub fn controller(&self) -> &PidController {
        &self.controller
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
