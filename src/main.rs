//! # pendulum-sim
//!
//! Headless batch run of the PID-balanced inverted pendulum. Loads an
//! optional TOML configuration, applies command-line overrides, runs the
//! loop at a fixed timestep and prints a flight-style report.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use pendulum_pid::control::GainPreset;
use pendulum_pid::io::{csv, json, RunSummary};
use pendulum_pid::sim::{
    detect_events, DisturbanceDetector, EventDetector, EventKind, FallDetector, ScheduledDisturbance,
    SettleDetector, SimEvent, Simulation, TickRecord,
};
use pendulum_pid::AppConfig;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

/// Inverted-pendulum PID simulator
#[derive(Parser, Debug)]
#[command(name = "pendulum-sim")]
#[command(version)]
#[command(about = "Balance an inverted pendulum with a PID loop and report how it went")]
struct Args {
    /// TOML configuration with [physics], [controller] and [run] sections.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Start from a named gain preset.
    #[arg(long, value_enum)]
    preset: Option<GainPreset>,

    /// Proportional gain override.
    #[arg(long)]
    kp: Option<f64>,

    /// Integral gain override.
    #[arg(long)]
    ki: Option<f64>,

    /// Derivative gain override.
    #[arg(long)]
    kd: Option<f64>,

    /// Simulated duration, s.
    #[arg(long)]
    duration: Option<f64>,

    /// Fixed timestep, s.
    #[arg(long)]
    dt: Option<f64>,

    /// Disturbance magnitude to inject (see --disturb-at).
    #[arg(long, allow_hyphen_values = true)]
    disturbance: Option<f64>,

    /// Time at which --disturbance fires, s.
    #[arg(long, default_value_t = 2.0)]
    disturb_at: f64,

    /// Auto-tune the gains against the configured pendulum before running.
    #[arg(long)]
    autotune: bool,

    /// Write the trajectory as CSV.
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,

    /// Write a JSON run summary.
    #[arg(long, value_name = "FILE")]
    summary: Option<PathBuf>,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    setup_tracing(&args);

    if let Err(e) = run(&args) {
        error!("{e}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => {
            info!("loading configuration from {}", path.display());
            AppConfig::load(path)?
        }
        None => AppConfig::default(),
    };
    apply_overrides(&mut config, args);
    config.validate()?;

    let mut sim = Simulation::from_config(&config)?;

    if args.autotune {
        let tuned = sim.auto_tune()?;
        println!(
            "  Auto-tune: Ku={:.3} Pu={:.3}s -> kp={:.3} ki={:.3} kd={:.3}",
            tuned.ultimate_gain, tuned.ultimate_period, tuned.kp, tuned.ki, tuned.kd
        );
    }

    let trajectory = sim.run(&config.run);
    let gains = sim.controller().gains();

    let mut detectors: Vec<Box<dyn EventDetector>> = vec![
        Box::new(FallDetector),
        Box::new(SettleDetector::new(0.5, 1.0)),
        Box::new(DisturbanceDetector),
    ];
    let events = detect_events(&trajectory, &mut detectors);

    let summary = RunSummary::from_trajectory(gains, &trajectory).with_metrics(sim.metrics());
    print_report(&config, &sim, &trajectory, &events, &summary);

    if let Some(path) = &args.csv {
        csv::write_trajectory_file(path, &trajectory)?;
        info!("trajectory written to {}", path.display());
    }
    if let Some(path) = &args.summary {
        json::write_summary_file(path, &summary)?;
        info!("summary written to {}", path.display());
    }

    Ok(())
}

fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if let Some(preset) = args.preset {
        config.controller = config.controller.clone().with_gains(preset.gains());
    }
    let c = &mut config.controller;
    if let Some(kp) = args.kp {
        c.kp = kp;
    }
    if let Some(ki) = args.ki {
        c.ki = ki;
    }
    if let Some(kd) = args.kd {
        c.kd = kd;
    }
    if let Some(duration) = args.duration {
        config.run.duration = duration;
    }
    if let Some(dt) = args.dt {
        config.run.dt = dt;
    }
    if let Some(magnitude) = args.disturbance {
        config.run.disturbances.push(ScheduledDisturbance { time: args.disturb_at, magnitude });
    }
}

fn print_report(
    config: &AppConfig,
    sim: &Simulation,
    trajectory: &[TickRecord],
    events: &[SimEvent],
    summary: &RunSummary,
) {
    let p = &config.physics;
    let g = summary.gains;

    println!();
    println!("====================================================================");
    println!("  INVERTED PENDULUM PID SIMULATION");
    println!("====================================================================");
    println!();
    println!("  Plant");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!("  Mass:          {:>8.2} kg    Length:       {:>8.2} m", p.mass, p.length);
    println!("  Gravity:       {:>8.2} m/s^2 Friction:     {:>8.3}", p.gravity, p.friction);
    println!("  Inertia:       {:>8.3} kg·m^2", p.inertia());
    println!();

    println!("  Controller");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!("  kp={:.3}  ki={:.3}  kd={:.3}", g.kp, g.ki, g.kd);
    let c = sim.controller().config();
    println!(
        "  Output: [{:.0}, {:.0}]   Slew: {:.0}/s   Filter α: {:.2}",
        c.output_min, c.output_max, c.max_rate, c.derivative_filter
    );
    println!();

    println!("  Events");
    println!("  ──────────────────────────────────────────────────────────────────");
    if events.is_empty() {
        println!("  (none)");
    }
    for ev in events {
        let label = match &ev.kind {
            EventKind::Fell => "FELL".to_string(),
            EventKind::Settled => "SETTLED".to_string(),
            EventKind::Disturbance { magnitude } => format!("KICK {magnitude:+.1}"),
        };
        println!(
            "  {:<10} t={:>6.2}s   angle={:>8.3}°   ω={:>7.3} rad/s",
            label, ev.time, ev.state.angle_degrees, ev.state.angular_velocity
        );
    }
    println!();

    println!("  Performance Summary");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!("  Final angle:   {:>8.3}°", summary.final_angle_deg);
    println!(
        "  Peak angle:    {:>8.3}°  at t={:.2}s",
        summary.peak_angle_deg, summary.peak_angle_time_s
    );
    println!("  RMS error:     {:>8.3}°", summary.rms_error_deg);
    println!("  Peak output:   {:>8.2}", summary.peak_output);
    println!("  Settled for:   {:>8.2} s", summary.settled_for_s);
    println!("  Stability:     {}", sim.controller().stability_status());
    println!();

    println!("  Trajectory");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  {:>7}  {:>9}  {:>9}  {:>9}  {:>9}",
        "t (s)", "angle (°)", "ω (rad/s)", "output", "x (m)"
    );
    println!("  {}", "─".repeat(52));

    let sample_interval = (trajectory.len() / 25).max(1);
    for (i, r) in trajectory.iter().enumerate() {
        if i % sample_interval != 0 && i != trajectory.len() - 1 {
            continue;
        }
        println!(
            "  {:>7.2}  {:>9.3}  {:>9.3}  {:>9.2}  {:>9.3}",
            r.time, r.state.angle_degrees, r.state.angular_velocity, r.output, r.state.position
        );
    }

    println!();
    println!("  Simulation: {} ticks, dt={} s", summary.ticks, config.run.dt);
    println!("====================================================================");
    println!();
}

fn setup_tracing(args: &Args) {
    let level = if args.verbose { Level::DEBUG } else { Level::WARN };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
