pub mod params;
pub mod pendulum;
pub mod state;
pub mod trail;

pub use params::{InitialTilt, PhysicsBuilder, PhysicsParams, ANGLE_LIMIT, STANDARD_GRAVITY};
pub use pendulum::PhysicsModel;
pub use state::{RobotState, StateSnapshot};
pub use trail::{Trail, TrailPoint};
