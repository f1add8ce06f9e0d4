use crate::command::Command;
use crate::requirements::SubsystemSet;
use crate::subsystems::{SetpointSubsystem, SubsystemHandle};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveIntegralConfig {
    /// Displacement to travel per run, in the subsystem's integral units.
    pub target_integral_change: f32,
    /// Setpoint held while moving. Its sign must match the displacement.
    pub velocity: f32,
    /// The move counts as done once within this distance of the target.
    pub integral_setpoint_tolerance: f32,
}

impl Default for MoveIntegralConfig {
    fn default() -> Self {
        Self {
            // One of ten agitator pockets
            target_integral_change: core::f32::consts::TAU / 10.0,
            velocity: 10.0,
            integral_setpoint_tolerance: 0.02,
        }
    }
}

/// Drives a setpoint subsystem forward until its integral has advanced by a
/// fixed amount.
pub struct MoveIntegralCommand<S: SetpointSubsystem> {
    subsystem: SubsystemHandle<S>,
    requirements: SubsystemSet,
    config: MoveIntegralConfig,
    target_integral: f32,
}

impl<S: SetpointSubsystem> MoveIntegralCommand<S> {
    pub fn new(subsystem: SubsystemHandle<S>, config: MoveIntegralConfig) -> Self {
        Self {
            requirements: subsystem.requirement(),
            subsystem,
            config,
            target_integral: 0.0,
        }
    }

    pub fn target_integral(&self) -> f32 {
        self.target_integral
    }

    fn remaining(&self) -> f32 {
        let direction = self.config.target_integral_change.signum();
        (self.target_integral - self.subsystem.borrow().current_value_integral()) * direction
    }
}

impl<S: SetpointSubsystem> Command for MoveIntegralCommand<S> {
    fn name(&self) -> &'static str {
        "move integral"
    }

    fn requirements(&self) -> &SubsystemSet {
        &self.requirements
    }

    fn is_ready(&self) -> bool {
        self.subsystem.borrow().is_calibrated()
    }

    fn initialize(&mut self) {
        let mut subsystem = self.subsystem.borrow_mut();
        self.target_integral = subsystem.current_value_integral() + self.config.target_integral_change;
        subsystem.set_setpoint(self.config.velocity);
    }

    fn execute(&mut self) {
        self.subsystem.borrow_mut().set_setpoint(self.config.velocity);
    }

    fn is_finished(&self) -> bool {
        !self.subsystem.borrow().is_online()
            || self.remaining() <= self.config.integral_setpoint_tolerance
    }

    fn end(&mut self, _interrupted: bool) {
        self.subsystem.borrow_mut().set_setpoint(0.0);
    }
}
