pub mod analytics;
pub mod autotune;
pub mod config;
pub mod controller;
pub mod history;
pub mod pid;
pub mod presets;

pub use analytics::{PerformanceMetrics, StabilityStatus};
pub use autotune::{Plant, TuneError, TunedGains};
pub use config::{Gains, PidConfig};
pub use controller::Controller;
pub use history::{History, Sample};
pub use pid::{PidController, PidOutput, MIN_DT};
pub use presets::GainPreset;
