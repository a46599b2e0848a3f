use serde::Serialize;

// ---------------------------------------------------------------------------
// Pendulum state
// ---------------------------------------------------------------------------

/// Full physical state of the robot at a single point in time.
/// Angle is measured from upright, positive leaning towards +x.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RobotState {
    pub angle: f64,                // rad, within the safety stop
    pub angular_velocity: f64,     // rad/s
    pub angular_acceleration: f64, // rad/s^2
    pub position: f64,             // m, lateral
    pub velocity: f64,             // m/s, lateral
    pub torque: f64,               // last commanded control input
    pub disturbance_force: f64,    // decaying impulse
}

impl RobotState {
    /// At rest with the given lean.
    pub fn tilted(angle: f64) -> Self {
        Self { angle, ..Self::default() }
    }

    pub fn angle_degrees(&self) -> f64 {
        self.angle.to_degrees()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            angle: self.angle,
            angle_degrees: self.angle_degrees(),
            angular_velocity: self.angular_velocity,
            angular_acceleration: self.angular_acceleration,
            torque: self.torque,
            position: self.position,
            velocity: self.velocity,
        }
    }
}

/// Read-only view handed to renderers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StateSnapshot {
    pub angle: f64,
    pub angle_degrees: f64,
    pub angular_velocity: f64,
    pub angular_acceleration: f64,
    pub torque: f64,
    pub position: f64,
    pub velocity: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reports_degrees() {
        let s = RobotState::tilted(std::f64::consts::FRAC_PI_4);
        let snap = s.snapshot();
        assert!((snap.angle_degrees - 45.0).abs() < 1e-9);
        assert_eq!(snap.angular_velocity, 0.0);
    }
}
