pub mod driver;
pub mod event;
pub mod runner;

pub use driver::FrameTimer;
pub use event::{detect_events, DisturbanceDetector, EventDetector, EventKind, FallDetector, SettleDetector, SimEvent};
pub use runner::{simulate_with, RunConfig, ScheduledDisturbance, Simulation, TickRecord};
