use pendulum_pid::control::GainPreset;
use pendulum_pid::sim::{
    detect_events, DisturbanceDetector, EventDetector, EventKind, FallDetector, ScheduledDisturbance,
    SettleDetector, Simulation,
};
use pendulum_pid::AppConfig;

fn main() {
    let mut config = AppConfig::default();
    config.run.duration = 12.0;
    config.run.disturbances = vec![
        ScheduledDisturbance { time: 2.0, magnitude: 5.0 },
        ScheduledDisturbance { time: 6.0, magnitude: -8.0 },
        ScheduledDisturbance { time: 9.0, magnitude: 3.0 },
    ];

    for preset in GainPreset::ALL {
        config.controller = config.controller.clone().with_gains(preset.gains());
        let mut sim = Simulation::from_config(&config).expect("valid configuration");
        let trajectory = sim.run(&config.run);

        let mut detectors: Vec<Box<dyn EventDetector>> = vec![
            Box::new(FallDetector),
            Box::new(SettleDetector::new(0.5, 1.0)),
            Box::new(DisturbanceDetector),
        ];
        let events = detect_events(&trajectory, &mut detectors);

        println!("{} ({})", preset.label(), sim.metrics().stability);
        for ev in &events {
            let what = match &ev.kind {
                EventKind::Fell => "fell".to_string(),
                EventKind::Settled => "settled".to_string(),
                EventKind::Disturbance { magnitude } => format!("kicked {magnitude:+.1}"),
            };
            println!("  t={:>6.2}s  {:<12} angle {:>8.3}°", ev.time, what, ev.state.angle_degrees);
        }
    }
}
