//! Robot configuration, loaded from JSON.
//!
//! Every section falls back to its defaults, so a config file only needs the
//! values it overrides.

use crate::commands::tank_drive::MAX_CHASSIS_SPEED_MPS;
use crate::commands::{MoveIntegralConfig, UnjamIntegralConfig};
use crate::pid::PidConfig;
use crate::subsystems::{AgitatorConfig, ChassisConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default control loop period: 2 ms (500 Hz).
pub const DEFAULT_LOOP_PERIOD_MS: u32 = 2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub loop_period_ms: u32,
    pub agitator: AgitatorConfig,
    pub move_integral: MoveIntegralConfig,
    pub unjam: UnjamIntegralConfig,
    pub chassis: ChassisConfig,
    pub max_chassis_speed_mps: f32,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            loop_period_ms: DEFAULT_LOOP_PERIOD_MS,
            agitator: AgitatorConfig::default(),
            move_integral: MoveIntegralConfig::default(),
            unjam: UnjamIntegralConfig::default(),
            chassis: ChassisConfig::default(),
            max_chassis_speed_mps: MAX_CHASSIS_SPEED_MPS,
        }
    }
}

impl RobotConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: RobotConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.loop_period_ms == 0 {
            return Err(ConfigError::Invalid("loop_period_ms must be positive"));
        }
        if self.agitator.gear_ratio <= 0.0 {
            return Err(ConfigError::Invalid("agitator.gear_ratio must be positive"));
        }
        if self.chassis.gear_ratio <= 0.0 || self.chassis.wheel_radius_m <= 0.0 {
            return Err(ConfigError::Invalid(
                "chassis.gear_ratio and chassis.wheel_radius_m must be positive",
            ));
        }
        if self.move_integral.target_integral_change * self.move_integral.velocity <= 0.0 {
            return Err(ConfigError::Invalid(
                "move_integral.velocity must be non-zero and share the sign of target_integral_change",
            ));
        }
        if self.unjam.target_cycle_count == 0 {
            return Err(ConfigError::Invalid("unjam.target_cycle_count must be at least 1"));
        }
        if self.max_chassis_speed_mps <= 0.0 {
            return Err(ConfigError::Invalid("max_chassis_speed_mps must be positive"));
        }
        if !limits_valid(&self.agitator.velocity_pid) {
            return Err(ConfigError::Invalid(
                "agitator.velocity_pid limits must be finite and non-negative",
            ));
        }
        if !limits_valid(&self.chassis.wheel_velocity_pid) {
            return Err(ConfigError::Invalid(
                "chassis.wheel_velocity_pid limits must be finite and non-negative",
            ));
        }
        if !non_negative(self.chassis.max_wheel_speed_rpm) {
            return Err(ConfigError::Invalid(
                "chassis.max_wheel_speed_rpm must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

// Used as symmetric clamp bounds, so a negative or NaN limit would panic mid-tick.
fn limits_valid(pid: &PidConfig) -> bool {
    non_negative(pid.max_output) && non_negative(pid.max_i_cumulative)
}

fn non_negative(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}
