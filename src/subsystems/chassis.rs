use super::Subsystem;
use crate::hal::{MotorDriver, SharedClock};
use crate::pid::{Pid, PidConfig};
use core::f32::consts::TAU;
use serde::{Deserialize, Serialize};

pub const WHEEL_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WheelId {
    LeftFront = 0,
    LeftBack = 1,
    RightBack = 2,
    RightFront = 3,
}

impl WheelId {
    pub const ALL: [WheelId; WHEEL_COUNT] = [
        WheelId::LeftFront,
        WheelId::LeftBack,
        WheelId::RightBack,
        WheelId::RightFront,
    ];

    fn is_right(self) -> bool {
        matches!(self, WheelId::RightBack | WheelId::RightFront)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChassisConfig {
    pub wheel_velocity_pid: PidConfig,
    pub max_wheel_speed_rpm: f32,
    pub wheel_radius_m: f32,
    pub gear_ratio: f32,
}

impl Default for ChassisConfig {
    fn default() -> Self {
        Self {
            wheel_velocity_pid: PidConfig {
                kp: 20.0,
                ki: 0.0,
                kd: 0.0,
                max_i_cumulative: 0.0,
                max_output: 16000.0,
            },
            max_wheel_speed_rpm: 7000.0,
            wheel_radius_m: 0.076,
            gear_ratio: 19.0,
        }
    }
}

/// Four-wheel tank-drive base. Right-side motors are mounted mirrored, so
/// their measured speed and output are sign-flipped.
pub struct ChassisSubsystem {
    motors: [Box<dyn MotorDriver>; WHEEL_COUNT],
    pids: [Pid; WHEEL_COUNT],
    desired_rpm: [f32; WHEEL_COUNT],
    clock: SharedClock,
    config: ChassisConfig,
    prev_time_ms: u32,
}

impl ChassisSubsystem {
    /// `motors` are given in [`WheelId::ALL`] order.
    pub fn new(
        motors: [Box<dyn MotorDriver>; WHEEL_COUNT],
        clock: SharedClock,
        config: ChassisConfig,
    ) -> Self {
        let pid = Pid::new(config.wheel_velocity_pid);
        Self {
            motors,
            pids: [pid.clone(), pid.clone(), pid.clone(), pid],
            desired_rpm: [0.0; WHEEL_COUNT],
            clock,
            config,
            prev_time_ms: 0,
        }
    }

    /// Sets left and right side speeds in m/s.
    pub fn set_velocity_tank_drive(&mut self, left_mps: f32, right_mps: f32) {
        let max = self.config.max_wheel_speed_rpm;
        let left = self.mps_to_rpm(left_mps).clamp(-max, max);
        let right = self.mps_to_rpm(right_mps).clamp(-max, max);
        for wheel in WheelId::ALL {
            self.desired_rpm[wheel as usize] = if wheel.is_right() { right } else { left };
        }
    }

    pub fn desired_rpm(&self, wheel: WheelId) -> f32 {
        self.desired_rpm[wheel as usize]
    }

    fn mps_to_rpm(&self, mps: f32) -> f32 {
        mps / (TAU * self.config.wheel_radius_m) * 60.0 * self.config.gear_ratio
    }

    fn wheel_sign(wheel: WheelId) -> f32 {
        if wheel.is_right() {
            -1.0
        } else {
            1.0
        }
    }
}

impl Subsystem for ChassisSubsystem {
    fn name(&self) -> &'static str {
        "chassis"
    }

    fn initialize(&mut self) {
        for motor in &mut self.motors {
            motor.initialize();
        }
        self.prev_time_ms = self.clock.now_ms();
    }

    fn refresh(&mut self) {
        let now = self.clock.now_ms();
        let dt_ms = now.wrapping_sub(self.prev_time_ms);
        self.prev_time_ms = now;

        for wheel in WheelId::ALL {
            let i = wheel as usize;
            let sign = Self::wheel_sign(wheel);
            let measured = sign * self.motors[i].shaft_rpm();
            let output = self.pids[i].run_controller_derivate_error(self.desired_rpm[i] - measured, dt_ms);
            self.motors[i].set_desired_output(sign * output);
        }
    }

    fn is_online(&self) -> bool {
        self.motors.iter().all(|m| m.is_online())
    }
}
