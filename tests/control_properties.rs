//! Invariants of the PID law and its tuning experiment.

use pendulum_pid::clock::ManualClock;
use pendulum_pid::control::{Gains, PidConfig, StabilityStatus, TuneError};
use pendulum_pid::physics::{InitialTilt, PhysicsBuilder, PhysicsModel};
use pendulum_pid::PidController;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn output_respects_bounds_and_slew_rate() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut pid = PidController::new(8.0, 2.0, 3.0).unwrap();
    let cfg = pid.config().clone();
    let mut prev = 0.0;

    for _ in 0..5_000 {
        let dt = rng.gen_range(1e-3..0.1);
        let measured = rng.gen_range(-90.0..90.0);
        let out = pid.calculate(rng.gen_range(-10.0..10.0), measured, dt).output;

        assert!(out >= cfg.output_min && out <= cfg.output_max, "output {out} out of band");
        let step = (out - prev).abs();
        assert!(step <= cfg.max_rate * dt + 1e-9, "step {step} exceeds {}", cfg.max_rate * dt);
        prev = out;
    }
}

#[test]
fn integral_never_leaves_its_band() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut pid = PidController::new(1.0, 5.0, 0.0).unwrap();
    for _ in 0..5_000 {
        pid.calculate(0.0, rng.gen_range(-1e4..1e4), rng.gen_range(1e-3..1.0));
        let i = pid.integral();
        assert!((-50.0..=50.0).contains(&i), "integral {i}");
    }
}

#[test]
fn windup_saturates_at_integral_max() {
    let mut pid = PidController::new(1.0, 10.0, 0.0).unwrap();
    // error 30 at dt 0.02 adds 0.6 per tick: the band is hit after 84 ticks.
    for tick in 0..300 {
        pid.calculate(30.0, 0.0, 0.02);
        if tick >= 90 {
            assert_eq!(pid.integral(), 50.0, "tick {tick}");
        }
    }
    assert_eq!(pid.integral(), pid.config().integral_max);
}

#[test]
fn reset_twice_equals_reset_once() {
    let mut pid = PidController::new(2.0, 0.1, 0.5).unwrap();
    pid.set_setpoint(1.0);
    for k in 0..40 {
        pid.calculate(1.0, k as f64 * 0.3, 0.02);
    }

    pid.reset();
    let once = (pid.integral(), pid.previous_error(), pid.filtered_derivative(), pid.last_output(), pid.history().len());
    pid.reset();
    let twice = (pid.integral(), pid.previous_error(), pid.filtered_derivative(), pid.last_output(), pid.history().len());
    assert_eq!(once, twice);
    assert_eq!(once, (0.0, 0.0, 0.0, 0.0, 0));
    assert_eq!(pid.gains(), Gains::new(2.0, 0.1, 0.5));
    assert_eq!(pid.setpoint(), 1.0);
}

#[test]
fn non_finite_measurement_holds_output() {
    let mut pid = PidController::new(2.0, 0.1, 0.5).unwrap();
    let held = pid.calculate(0.0, 3.0, 0.02).output;
    let integral = pid.integral();

    let out = pid.calculate(0.0, f64::NAN, 0.02);
    assert_eq!(out.output, held);
    assert_eq!(pid.integral(), integral);
    assert_eq!(pid.history().len(), 1);
}

#[test]
fn degenerate_dt_is_replaced() {
    let mut pid = PidController::new(2.0, 1.0, 0.0).unwrap();
    for dt in [0.0, -0.5, f64::NAN, f64::INFINITY] {
        let out = pid.calculate(0.0, 1.0, dt);
        assert!(out.output.is_finite());
    }
    // four ticks of error -1 at the minimum timestep
    assert!((pid.integral() + 4.0 * pendulum_pid::control::MIN_DT).abs() < 1e-12);
}

#[test]
fn clock_driven_ticks_use_elapsed_time() {
    let clock = ManualClock::new(10.0);
    let mut pid = PidController::new(0.0, 1.0, 0.0).unwrap().with_clock(clock.clone());

    pid.calculate_now(1.0, 0.0); // first call falls back to the minimum timestep
    clock.advance(0.25);
    pid.calculate_now(1.0, 0.0);
    let expected = pendulum_pid::control::MIN_DT + 0.25;
    assert!((pid.integral() - expected).abs() < 1e-12, "integral {}", pid.integral());
}

#[test]
fn stability_improves_as_the_loop_converges() {
    let mut pid = PidController::new(2.0, 0.1, 0.5).unwrap();
    assert_eq!(pid.stability_status(), StabilityStatus::Initializing);
    for _ in 0..100 {
        pid.calculate(0.0, 0.01, 0.02);
    }
    assert_eq!(pid.stability_status(), StabilityStatus::VeryStable);
    let m = pid.performance_metrics();
    assert!((m.rms_error - 0.01).abs() < 1e-12);
    assert!((m.avg_error - 0.01).abs() < 1e-12);
}

#[test]
fn auto_tune_on_still_pendulum_fails_without_touching_gains() {
    let params = PhysicsBuilder::new().initial_tilt(InitialTilt::Upright).build().unwrap();
    let physics = PhysicsModel::with_params(params).unwrap();
    let mut pid = PidController::from_config(PidConfig::default()).unwrap();
    let before = pid.gains();

    let res = pid.auto_tune(0.0, physics);
    assert!(matches!(res, Err(TuneError::InsufficientOscillation { crossings: 0, .. })));
    assert_eq!(pid.gains(), before);
}
