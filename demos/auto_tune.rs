use pendulum_pid::control::Plant;
use pendulum_pid::physics::{InitialTilt, PhysicsBuilder, PhysicsModel};
use pendulum_pid::sim::{RunConfig, Simulation};
use pendulum_pid::PidController;

fn main() {
    let params = PhysicsBuilder::new()
        .mass(1.5)
        .length(0.8)
        .initial_tilt(InitialTilt::Fixed { angle: 0.08 })
        .build()
        .expect("valid parameters");
    let physics = PhysicsModel::with_params(params).expect("valid parameters");

    // A proportional-only loop rings around upright, which is what the
    // experiment needs to read off the ultimate gain and period.
    let pid = PidController::new(3.0, 0.0, 0.0).expect("valid gains");
    let mut sim = Simulation::new(physics, pid);

    println!("Plant measurement before tuning: {:.3}°", sim.physics().measure());
    let tuned = match sim.auto_tune() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("auto-tune failed: {e}");
            return;
        }
    };
    println!(
        "Ku = {:.3}, Pu = {:.3} s ({} crossings)",
        tuned.ultimate_gain, tuned.ultimate_period, tuned.crossings
    );
    println!("Tuned gains: kp = {:.3}, ki = {:.3}, kd = {:.3}", tuned.kp, tuned.ki, tuned.kd);

    let trajectory = sim.run(&RunConfig { duration: 10.0, ..RunConfig::default() });
    let tail = &trajectory[trajectory.len() - 50..];
    let mean_tail = tail.iter().map(|r| r.error.abs()).sum::<f64>() / tail.len() as f64;
    println!("Mean |error| over the last second: {mean_tail:.4}°");
    println!("Stability: {}", sim.metrics().stability);
}
