//! TOML configuration for a simulation run.
//!
//! Every section and field is optional; anything missing takes its default.
//!
//! ```toml
//! [physics]
//! mass = 1.2
//! initial_tilt = { mode = "random", max_angle = 0.1, seed = 7 }
//!
//! [controller]
//! kp = 2.5
//! max_rate = 150.0
//!
//! [run]
//! dt = 0.01
//! duration = 20.0
//! disturbances = [{ time = 5.0, magnitude = 5.0 }]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::control::PidConfig;
use crate::error::SimError;
use crate::physics::PhysicsParams;
use crate::sim::RunConfig;

/// Error type for configuration loading.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at the given path.
    #[error("configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// The file exists but could not be read.
    #[error("failed to read configuration: {0}")]
    Read(String),

    /// TOML parsing failed.
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// The configuration could not be written out as TOML.
    #[error("failed to serialize configuration: {0}")]
    Serialize(String),

    /// Values parsed but describe an invalid simulation.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] SimError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub physics: PhysicsParams,
    pub controller: PidConfig,
    pub run: RunConfig,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound(path.to_path_buf())
            } else {
                ConfigError::Read(e.to_string())
            }
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        self.physics.validate()?;
        self.controller.validate()?;
        self.run.validate()
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}
