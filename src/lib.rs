//! Inverted-pendulum balancing robot driven by a PID control loop.
//!
//! [`physics`] integrates the pendulum, [`control`] closes the loop around it,
//! and [`sim`] wires the two together for batch runs and real-time drivers.

pub mod clock;
pub mod config;
pub mod control;
pub mod error;
pub mod io;
pub mod physics;
pub mod sim;

pub use config::{AppConfig, ConfigError};
pub use control::{Controller, GainPreset, PidConfig, PidController, StabilityStatus};
pub use error::SimError;
pub use physics::{InitialTilt, PhysicsModel, PhysicsParams};
pub use sim::{RunConfig, Simulation, TickRecord};
