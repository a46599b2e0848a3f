use super::runner::TickRecord;
use crate::physics::{StateSnapshot, ANGLE_LIMIT};

// ---------------------------------------------------------------------------
// Simulation events
// ---------------------------------------------------------------------------

/// Kinds of simulation events.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// The lean reached the safety stop.
    Fell,
    /// The lean stayed inside the settle band for the hold time.
    Settled,
    /// A new disturbance was injected.
    Disturbance { magnitude: f64 },
}

/// A discrete event that occurred during simulation.
#[derive(Debug, Clone)]
pub struct SimEvent {
    pub time: f64,
    pub kind: EventKind,
    pub state: StateSnapshot,
}

/// Trait for passive event detectors.
/// Implementations inspect consecutive records and report events.
pub trait EventDetector {
    fn check(&mut self, prev: &TickRecord, current: &TickRecord) -> Option<EventKind>;
}

/// Detects the pendulum arriving at the safety stop.
pub struct FallDetector;

impl EventDetector for FallDetector {
    fn check(&mut self, prev: &TickRecord, current: &TickRecord) -> Option<EventKind> {
        let at_stop = |r: &TickRecord| r.state.angle.abs() >= ANGLE_LIMIT;
        if !at_stop(prev) && at_stop(current) {
            Some(EventKind::Fell)
        } else {
            None
        }
    }
}

/// Fires once the lean has stayed within `band` degrees of upright for
/// `hold` seconds. Re-arms when the lean leaves the band.
pub struct SettleDetector {
    pub band: f64, // deg
    pub hold: f64, // s
    inside_since: Option<f64>,
    fired: bool,
}

impl SettleDetector {
    pub fn new(band: f64, hold: f64) -> Self {
        Self { band, hold, inside_since: None, fired: false }
    }
}

impl EventDetector for SettleDetector {
    fn check(&mut self, _prev: &TickRecord, current: &TickRecord) -> Option<EventKind> {
        if current.state.angle_degrees.abs() > self.band {
            self.inside_since = None;
            self.fired = false;
            return None;
        }
        let since = *self.inside_since.get_or_insert(current.time);
        if !self.fired && current.time - since >= self.hold {
            self.fired = true;
            Some(EventKind::Settled)
        } else {
            None
        }
    }
}

/// Detects fresh injections: between injections the disturbance only decays.
pub struct DisturbanceDetector;

impl EventDetector for DisturbanceDetector {
    fn check(&mut self, prev: &TickRecord, current: &TickRecord) -> Option<EventKind> {
        if current.disturbance.abs() > prev.disturbance.abs() + 1e-12 {
            Some(EventKind::Disturbance { magnitude: current.disturbance })
        } else {
            None
        }
    }
}

/// Run every detector over consecutive pairs of a trajectory.
pub fn detect_events(
    trajectory: &[TickRecord],
    detectors: &mut [Box<dyn EventDetector>],
) -> Vec<SimEvent> {
    let mut events = Vec::new();
    for pair in trajectory.windows(2) {
        for detector in detectors.iter_mut() {
            if let Some(kind) = detector.check(&pair[0], &pair[1]) {
                events.push(SimEvent { time: pair[1].time, kind, state: pair[1].state });
            }
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::RobotState;

    fn record(time: f64, angle: f64, disturbance: f64) -> TickRecord {
        TickRecord {
            time,
            state: RobotState::tilted(angle).snapshot(),
            output: 0.0,
            error: -angle.to_degrees(),
            disturbance,
        }
    }

    #[test]
    fn fall_detected_once() {
        let mut det = FallDetector;
        let prev = record(0.0, 1.2, 0.0);
        let curr = record(0.02, ANGLE_LIMIT, 0.0);
        assert_eq!(det.check(&prev, &curr), Some(EventKind::Fell));
        assert_eq!(det.check(&curr, &curr), None);
    }

    #[test]
    fn settle_requires_hold_time() {
        let mut det = SettleDetector::new(1.0, 0.5);
        let r = |t| record(t, 0.001, 0.0);
        assert_eq!(det.check(&r(0.0), &r(0.0)), None);
        assert_eq!(det.check(&r(0.0), &r(0.3)), None);
        assert_eq!(det.check(&r(0.3), &r(0.6)), Some(EventKind::Settled));
        assert_eq!(det.check(&r(0.6), &r(0.9)), None, "fires once per entry");
    }

    #[test]
    fn disturbance_only_on_increase() {
        let mut det = DisturbanceDetector;
        assert_eq!(det.check(&record(0.0, 0.0, 4.5), &record(0.02, 0.0, 4.05)), None);
        assert_eq!(
            det.check(&record(0.0, 0.0, 0.1), &record(0.02, 0.0, 4.5)),
            Some(EventKind::Disturbance { magnitude: 4.5 })
        );
    }

    #[test]
    fn detect_events_scans_pairs() {
        let traj = vec![record(0.0, 1.0, 0.0), record(0.02, ANGLE_LIMIT, 3.0)];
        let mut detectors: Vec<Box<dyn EventDetector>> =
            vec![Box::new(FallDetector), Box::new(DisturbanceDetector)];
        let events = detect_events(&traj, &mut detectors);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| (e.time - 0.02).abs() < 1e-12));
    }
}
