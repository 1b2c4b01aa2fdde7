//! Simulation configuration
//!
//! Configuration structures for setting up a simulation, loadable from
//! TOML. Every section has defaults matching the reference tuning, so a
//! partial (or empty) file is valid.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::control::CascadeGains;
use crate::dynamics::{CartPoleParams, DEFAULT_INITIAL_ANGLE};
use crate::GRAVITY;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed timestep [s]
    pub dt: f64,
    /// Total duration for batch runs [s]
    pub duration: f64,
    /// Command increment applied per queued manual thrust
    pub nudge_increment: f64,
    /// Snapshot history bound; the oldest samples are dropped beyond it
    pub max_history_samples: usize,
    /// Physical parameters
    pub physics: PhysicsConfig,
    /// Initial state configuration
    pub initial_state: InitialStateConfig,
    /// Controller gains
    pub gains: CascadeGains,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: 0.03,
            duration: 10.0,
            nudge_increment: 50.0,
            max_history_samples: 170,
            physics: PhysicsConfig::default(),
            initial_state: InitialStateConfig::default(),
            gains: CascadeGains::default(),
        }
    }
}

impl SimConfig {
    /// Load a configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the few values the dynamics cannot tolerate.
    ///
    /// Everything else (gains, dampings, references) is an unconstrained
    /// real by contract.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "timestep must be finite and positive, got {}",
                self.dt
            )));
        }
        if !self.physics.pendulum_length.is_finite() || self.physics.pendulum_length <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "pendulum length must be finite and positive, got {}",
                self.physics.pendulum_length
            )));
        }
        Ok(())
    }

    /// Build the dynamics parameters from this configuration
    pub fn to_params(&self) -> CartPoleParams {
        CartPoleParams {
            timestep: self.dt,
            gravity: self.physics.gravity,
            pendulum_length: self.physics.pendulum_length,
            angular_damping: self.physics.angular_damping,
            cart_damping: self.physics.cart_damping,
            initial_angle: self.initial_state.angle,
            angle_reference: 0.0,
            cart_velocity_reference: 0.0,
        }
    }
}

/// Physical parameters configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity magnitude [m/s²]
    pub gravity: f64,
    /// Pendulum length
    pub pendulum_length: f64,
    /// Angular damping coefficient
    pub angular_damping: f64,
    /// Cart damping coefficient
    pub cart_damping: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            pendulum_length: 15.0,
            angular_damping: 0.1,
            cart_damping: 0.5,
        }
    }
}

/// Initial state configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialStateConfig {
    /// Initial pendulum angle [rad], also restored by a reset
    pub angle: f64,
}

impl Default for InitialStateConfig {
    fn default() -> Self {
        Self {
            angle: DEFAULT_INITIAL_ANGLE,
        }
    }
}
