//! Fixed-gain PID controller driven by error and elapsed time.
//!
//! One instance per controlled axis, owned by the subsystem that runs it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidConfig {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    /// Clamp on the accumulated integral term.
    pub max_i_cumulative: f32,
    /// Clamp on the controller output.
    pub max_output: f32,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            kp: 0.0,
            ki: 0.0,
            kd: 0.0,
            max_i_cumulative: 0.0,
            max_output: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Pid {
    config: PidConfig,
    integral: f32,
    prev_error: f32,
    output: f32,
}

impl Pid {
    pub fn new(config: PidConfig) -> Self {
        Self {
            config,
            integral: 0.0,
            prev_error: 0.0,
            output: 0.0,
        }
    }

    /// Runs one control step. The derivative term is computed from the change
    /// in error since the previous step. A `dt_ms` of zero skips the step.
    pub fn run_controller_derivate_error(&mut self, error: f32, dt_ms: u32) -> f32 {
        if dt_ms == 0 {
            return self.output;
        }
        let dt = dt_ms as f32;

        let p_term = self.config.kp * error;

        self.integral = (self.integral + self.config.ki * error * dt)
            .clamp(-self.config.max_i_cumulative, self.config.max_i_cumulative);

        let d_term = self.config.kd * (error - self.prev_error) / dt;
        self.prev_error = error;

        self.output = (p_term + self.integral + d_term)
            .clamp(-self.config.max_output, self.config.max_output);
        self.output
    }

    pub fn output(&self) -> f32 {
        self.output
    }

    pub fn config(&self) -> &PidConfig {
        &self.config
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
        self.output = 0.0;
    }
}
