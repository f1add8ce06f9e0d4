use super::{SetpointSubsystem, Subsystem};
use crate::hal::{MotorDriver, SharedClock};
use crate::pid::{Pid, PidConfig};
use crate::wrapped::WrappedFloat;
use core::f32::consts::TAU;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Gear ratio of the M2006 gearbox fitted to the agitator.
pub const AGITATOR_GEAR_RATIO_M2006: f32 = 36.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgitatorConfig {
    pub velocity_pid: PidConfig,
    pub gear_ratio: f32,
    /// Output-side travel (rad) that counts as progress for jam detection.
    pub jam_distance_tolerance: f32,
    /// How long (ms) the agitator may be commanded without progress.
    pub jam_temporal_tolerance_ms: u32,
}

impl Default for AgitatorConfig {
    fn default() -> Self {
        Self {
            velocity_pid: PidConfig {
                kp: 600.0,
                ki: 0.5,
                kd: 0.0,
                max_i_cumulative: 3000.0,
                max_output: 10000.0,
            },
            gear_ratio: AGITATOR_GEAR_RATIO_M2006,
            jam_distance_tolerance: 0.1,
            jam_temporal_tolerance_ms: 200,
        }
    }
}

/// Velocity-controlled feeder wheel.
pub struct VelocityAgitatorSubsystem {
    motor: Box<dyn MotorDriver>,
    clock: SharedClock,
    config: AgitatorConfig,
    velocity_pid: Pid,

    /// Output velocity setpoint, rad/s.
    velocity_setpoint: f32,
    calibrated: bool,
    calibrated_zero_angle: f32,

    // Shaft angle tracking across revolutions
    last_encoder: Option<WrappedFloat>,
    unwrapped_shaft_angle: f32,

    // Persistent across ticks so dt is measured refresh-to-refresh
    prev_time_ms: u32,
    last_dt_ms: u32,

    jammed: bool,
    jam_reference_angle: f32,
    jam_timer_start_ms: Option<u32>,
}

impl VelocityAgitatorSubsystem {
    pub fn new(motor: Box<dyn MotorDriver>, clock: SharedClock, config: AgitatorConfig) -> Self {
        Self {
            motor,
            clock,
            velocity_pid: Pid::new(config.velocity_pid),
            config,
            velocity_setpoint: 0.0,
            calibrated: false,
            calibrated_zero_angle: 0.0,
            last_encoder: None,
            unwrapped_shaft_angle: 0.0,
            prev_time_ms: 0,
            last_dt_ms: 0,
            jammed: false,
            jam_reference_angle: 0.0,
            jam_timer_start_ms: None,
        }
    }

    /// Milliseconds between the two most recent refreshes.
    pub fn last_dt_ms(&self) -> u32 {
        self.last_dt_ms
    }

    pub fn config(&self) -> &AgitatorConfig {
        &self.config
    }

    fn uncalibrated_angle(&self) -> f32 {
        self.unwrapped_shaft_angle / self.config.gear_ratio
    }

    fn track_encoder(&mut self) {
        let angle = self.motor.encoder_angle();
        match self.last_encoder.as_mut() {
            Some(prev) => {
                self.unwrapped_shaft_angle += prev.difference(angle);
                prev.set_value(angle);
            }
            None => {
                self.last_encoder = Some(WrappedFloat::new(angle, 0.0, TAU));
            }
        }
    }

    fn update_jam_checker(&mut self, now_ms: u32) {
        if self.jammed {
            return;
        }
        let position = self.uncalibrated_angle();
        if self.velocity_setpoint == 0.0
            || (position - self.jam_reference_angle).abs() > self.config.jam_distance_tolerance
        {
            self.jam_reference_angle = position;
            self.jam_timer_start_ms = (self.velocity_setpoint != 0.0).then_some(now_ms);
            return;
        }
        match self.jam_timer_start_ms {
            None => self.jam_timer_start_ms = Some(now_ms),
            Some(start) if now_ms.wrapping_sub(start) >= self.config.jam_temporal_tolerance_ms => {
                debug!(position, "agitator jam detected");
                self.jammed = true;
            }
            Some(_) => {}
        }
    }

    fn go_offline(&mut self) {
        if self.calibrated {
            info!("agitator offline, calibration invalidated");
        }
        self.calibrated = false;
        self.motor.set_desired_output(0.0);
        self.last_encoder = None;
        self.velocity_pid.reset();
        self.jam_timer_start_ms = None;
    }
}

impl Subsystem for VelocityAgitatorSubsystem {
    fn name(&self) -> &'static str {
        "agitator"
    }

    fn initialize(&mut self) {
        self.motor.initialize();
        self.prev_time_ms = self.clock.now_ms();
    }

    fn refresh(&mut self) {
        let now = self.clock.now_ms();
        self.last_dt_ms = now.wrapping_sub(self.prev_time_ms);
        self.prev_time_ms = now;

        if !self.is_online() {
            self.go_offline();
            return;
        }

        self.track_encoder();
        if !self.calibrated {
            self.calibrate_here();
        }

        let error = self.velocity_setpoint - self.current_value();
        let output = self
            .velocity_pid
            .run_controller_derivate_error(error, self.last_dt_ms);
        self.motor.set_desired_output(output);

        self.update_jam_checker(now);
    }

    fn is_online(&self) -> bool {
        self.motor.is_online()
    }

    fn is_calibrated(&self) -> bool {
        self.calibrated && self.is_online()
    }
}

impl SetpointSubsystem for VelocityAgitatorSubsystem {
    fn setpoint(&self) -> f32 {
        self.velocity_setpoint
    }

    fn set_setpoint(&mut self, setpoint: f32) {
        self.velocity_setpoint = setpoint;
    }

    /// Output velocity in rad/s.
    fn current_value(&self) -> f32 {
        self.motor.shaft_rpm() / self.config.gear_ratio * TAU / 60.0
    }

    fn current_value_integral(&self) -> f32 {
        self.uncalibrated_angle() - self.calibrated_zero_angle
    }

    fn calibrate_here(&mut self) -> bool {
        if !self.is_online() {
            return false;
        }
        self.calibrated_zero_angle = self.uncalibrated_angle();
        self.calibrated = true;
        self.velocity_setpoint = 0.0;
        true
    }

    fn is_jammed(&self) -> bool {
        self.jammed
    }

    fn clear_jam(&mut self) {
        self.jammed = false;
        self.jam_timer_start_ms = None;
        self.jam_reference_angle = self.uncalibrated_angle();
    }
}
