//! Simulated drivers for desktop runs and tests.

use super::{MotorDriver, OperatorInterface};
use core::cell::{Cell, RefCell};
use core::f32::consts::TAU;
use std::rc::Rc;

/// Fraction of the gap between commanded and actual rpm closed per step.
const RESPONSE_FACTOR: f32 = 0.2;
/// Default rpm produced per unit of desired output at steady state.
const RPM_PER_OUTPUT: f32 = 1.0;

#[derive(Debug, Clone)]
struct SimMotorState {
    initialized: bool,
    online: bool,
    jammed: bool,
    rpm: f32,
    angle: f32,
    desired_output: f32,
    rpm_per_output: f32,
}

/// Cloneable handle to one simulated motor. All clones share state.
#[derive(Debug, Clone)]
pub struct SimMotor {
    state: Rc<RefCell<SimMotorState>>,
}

impl SimMotor {
    pub fn new() -> Self {
        Self::with_gain(RPM_PER_OUTPUT)
    }

    /// Motor whose steady-state speed is `rpm_per_output` times its output.
    pub fn with_gain(rpm_per_output: f32) -> Self {
        Self {
            state: Rc::new(RefCell::new(SimMotorState {
                initialized: false,
                online: true,
                jammed: false,
                rpm: 0.0,
                angle: 0.0,
                desired_output: 0.0,
                rpm_per_output,
            })),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.state.borrow_mut().online = online;
    }

    /// A jammed motor keeps drawing output but the shaft stops turning.
    pub fn set_jammed(&self, jammed: bool) {
        self.state.borrow_mut().jammed = jammed;
    }

    pub fn set_rpm(&self, rpm: f32) {
        self.state.borrow_mut().rpm = rpm;
    }

    pub fn set_angle(&self, angle: f32) {
        self.state.borrow_mut().angle = angle.rem_euclid(TAU);
    }

    pub fn desired_output(&self) -> f32 {
        self.state.borrow().desired_output
    }

    pub fn is_initialized(&self) -> bool {
        self.state.borrow().initialized
    }

    /// Advances the plant model by `dt_ms`.
    pub fn step(&self, dt_ms: u32) {
        let mut state = self.state.borrow_mut();
        if !state.online {
            return;
        }
        if state.jammed {
            state.rpm = 0.0;
            return;
        }
        let target = state.desired_output * state.rpm_per_output;
        state.rpm += (target - state.rpm) * RESPONSE_FACTOR;
        let dt_s = dt_ms as f32 / 1000.0;
        let delta = state.rpm / 60.0 * TAU * dt_s;
        state.angle = (state.angle + delta).rem_euclid(TAU);
    }
}

impl Default for SimMotor {
    fn default() -> Self {
        Self::new()
    }
}

impl MotorDriver for SimMotor {
    fn initialize(&mut self) {
        self.state.borrow_mut().initialized = true;
    }

    fn is_online(&self) -> bool {
        self.state.borrow().online
    }

    fn shaft_rpm(&self) -> f32 {
        let state = self.state.borrow();
        if state.online {
            state.rpm
        } else {
            0.0
        }
    }

    fn encoder_angle(&self) -> f32 {
        self.state.borrow().angle
    }

    fn set_desired_output(&mut self, output: f32) {
        self.state.borrow_mut().desired_output = output;
    }
}

/// Scriptable joystick pair.
#[derive(Debug, Clone, Default)]
pub struct SimOperator {
    left: Rc<Cell<f32>>,
    right: Rc<Cell<f32>>,
}

impl SimOperator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_tank_inputs(&self, left: f32, right: f32) {
        self.left.set(left);
        self.right.set(right);
    }
}

impl OperatorInterface for SimOperator {
    fn chassis_tank_left_input(&self) -> f32 {
        self.left.get()
    }

    fn chassis_tank_right_input(&self) -> f32 {
        self.right.get()
    }
}
