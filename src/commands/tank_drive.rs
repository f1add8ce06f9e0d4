use crate::command::Command;
use crate::hal::OperatorInterface;
use crate::requirements::SubsystemSet;
use crate::subsystems::{ChassisSubsystem, SubsystemHandle};
use std::rc::Rc;

/// Top chassis speed the operator sticks map to, m/s.
pub const MAX_CHASSIS_SPEED_MPS: f32 = 3.0;

/// Maps the operator's left and right sticks onto the chassis sides.
/// Never finishes on its own; usually the chassis default command.
pub struct TankDriveCommand {
    chassis: SubsystemHandle<ChassisSubsystem>,
    operator: Rc<dyn OperatorInterface>,
    requirements: SubsystemSet,
    max_speed_mps: f32,
}

impl TankDriveCommand {
    pub fn new(chassis: SubsystemHandle<ChassisSubsystem>, operator: Rc<dyn OperatorInterface>) -> Self {
        Self::with_max_speed(chassis, operator, MAX_CHASSIS_SPEED_MPS)
    }

    pub fn with_max_speed(
        chassis: SubsystemHandle<ChassisSubsystem>,
        operator: Rc<dyn OperatorInterface>,
        max_speed_mps: f32,
    ) -> Self {
        Self {
            requirements: chassis.requirement(),
            chassis,
            operator,
            max_speed_mps,
        }
    }
}

impl Command for TankDriveCommand {
    fn name(&self) -> &'static str {
        "chassis tank drive"
    }

    fn requirements(&self) -> &SubsystemSet {
        &self.requirements
    }

    fn execute(&mut self) {
        let max = self.max_speed_mps;
        let left = (self.operator.chassis_tank_left_input() * max).clamp(-max, max);
        let right = (self.operator.chassis_tank_right_input() * max).clamp(-max, max);
        self.chassis.borrow_mut().set_velocity_tank_drive(left, right);
    }

    fn end(&mut self, _interrupted: bool) {
        self.chassis.borrow_mut().set_velocity_tank_drive(0.0, 0.0);
    }
}
