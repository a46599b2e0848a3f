use pendulum_pid::control::Controller;
use pendulum_pid::physics::{InitialTilt, PhysicsBuilder, PhysicsModel};
use pendulum_pid::sim::{simulate_with, RunConfig};
use pendulum_pid::PidController;

/// Bang-bang balancing with a deadband and a rate lead: full torque towards
/// upright whenever the predicted error leaves the band, nothing otherwise.
struct BangBangController {
    torque: f64,
    deadband: f64, // deg
    lead: f64,     // s
    prev_measurement: Option<f64>,
}

impl Controller for BangBangController {
    fn control(&mut self, setpoint: f64, measurement: f64, dt: f64) -> f64 {
        let rate = match self.prev_measurement {
            Some(prev) if dt > 0.0 => (measurement - prev) / dt,
            _ => 0.0,
        };
        self.prev_measurement = Some(measurement);

        let predicted = setpoint - (measurement + self.lead * rate);
        if predicted.abs() < self.deadband {
            0.0
        } else {
            self.torque * predicted.signum()
        }
    }

    fn reset(&mut self) {
        self.prev_measurement = None;
    }

    fn name(&self) -> &str {
        "BangBang"
    }
}

fn pendulum() -> PhysicsModel {
    let params = PhysicsBuilder::new()
        .initial_tilt(InitialTilt::Fixed { angle: 0.1 })
        .build()
        .expect("valid parameters");
    PhysicsModel::with_params(params).expect("valid parameters")
}

fn report(name: &str, trajectory: &[pendulum_pid::TickRecord]) {
    let tail = &trajectory[trajectory.len().saturating_sub(100)..];
    let peak = tail.iter().map(|r| r.state.angle_degrees.abs()).fold(0.0_f64, f64::max);
    let effort: f64 = trajectory.iter().map(|r| r.output.abs()).sum::<f64>() / trajectory.len() as f64;
    println!("  {name:<14} final peak |angle| {peak:>7.3}°   mean |torque| {effort:>7.3}");
}

fn main() {
    let run = RunConfig { duration: 8.0, ..RunConfig::default() };

    let mut bang = BangBangController { torque: 15.0, deadband: 0.2, lead: 0.15, prev_measurement: None };
    println!("Simulating with {} controller...", bang.name());
    let bang_traj = simulate_with(&mut pendulum(), &mut bang, &run);

    let mut pid = PidController::new(2.0, 0.1, 0.5).expect("valid gains");
    println!("Simulating with {} controller...", Controller::name(&pid));
    let pid_traj = simulate_with(&mut pendulum(), &mut pid, &run);

    println!();
    report("BangBang", &bang_traj);
    report("PID", &pid_traj);
}
