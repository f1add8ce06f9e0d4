//! Hardware collaborators consumed by subsystems and commands.
//!
//! Every driver is injected at construction time. Drivers are shared handles:
//! the subsystem that receives one drives it, while the driver layer (or a
//! simulation harness) keeps its own clone to observe and script the device.

pub mod sim;

pub use sim::{SimMotor, SimOperator};

use core::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Actuator with an attached encoder.
pub trait MotorDriver {
    fn initialize(&mut self);
    /// True if the motor answered within the last poll window.
    fn is_online(&self) -> bool;
    fn shaft_rpm(&self) -> f32;
    /// Shaft angle in radians, wrapped to `[0, 2π)`.
    fn encoder_angle(&self) -> f32;
    fn set_desired_output(&mut self, output: f32);
}

/// Millisecond time source.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

pub type SharedClock = Rc<dyn Clock>;

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }
}

/// Clock advanced by hand. Used by the simulator to step in fixed periods.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: Cell<u32>,
}

impl ManualClock {
    pub fn new(start_ms: u32) -> Self {
        Self { now_ms: Cell::new(start_ms) }
    }

    pub fn advance(&self, dt_ms: u32) {
        self.now_ms.set(self.now_ms.get().wrapping_add(dt_ms));
    }

    pub fn set(&self, now_ms: u32) {
        self.now_ms.set(now_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u32 {
        self.now_ms.get()
    }
}

/// Driver-station inputs, each normalized to `[-1, 1]`.
pub trait OperatorInterface {
    fn chassis_tank_left_input(&self) -> f32;
    fn chassis_tank_right_input(&self) -> f32;
}
