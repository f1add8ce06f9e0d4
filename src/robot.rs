//! Top-level robot wiring.
//!
//! Builds the subsystems and commands from a [`RobotConfig`], registers them
//! with one [`Scheduler`], and exposes the operator-level actions.

use crate::command::CommandId;
use crate::commands::{
    move_unjam_comprised_command, MoveIntegralCommand, TankDriveCommand, UnjamIntegralCommand,
};
use crate::comprised::CompositionError;
use crate::config::{ConfigError, RobotConfig};
use crate::hal::{MotorDriver, OperatorInterface, SharedClock};
use crate::scheduler::{AdmissionError, Scheduler, SchedulerError, SchedulerStats};
use crate::subsystems::chassis::WHEEL_COUNT;
use crate::subsystems::{ChassisSubsystem, SetpointSubsystem, Subsystem, SubsystemHandle, VelocityAgitatorSubsystem};
use core::cell::RefCell;
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum RobotError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
    #[error("composition error: {0}")]
    Composition(#[from] CompositionError),
}

/// Hardware the robot is built on. Each driver is shared with whoever
/// created it.
pub struct RobotDrivers {
    pub clock: SharedClock,
    pub agitator_motor: Box<dyn MotorDriver>,
    /// In [`crate::subsystems::WheelId::ALL`] order.
    pub chassis_motors: [Box<dyn MotorDriver>; WHEEL_COUNT],
    pub operator: Rc<dyn OperatorInterface>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RobotState {
    pub running: bool,
    pub shots_requested: u32,
    pub shots_rejected: u32,
    pub agitator_online: bool,
    pub agitator_calibrated: bool,
    pub agitator_jammed: bool,
    pub agitator_integral: f32,
    pub shooting: bool,
}

pub struct Robot {
    scheduler: Scheduler,
    agitator: SubsystemHandle<VelocityAgitatorSubsystem>,
    chassis: SubsystemHandle<ChassisSubsystem>,
    shoot_command: CommandId,
    tank_drive_command: CommandId,
    state: RobotState,
}

impl Robot {
    pub fn new(config: &RobotConfig, drivers: RobotDrivers) -> Result<Self, RobotError> {
        config.validate()?;
        let RobotDrivers {
            clock,
            agitator_motor,
            chassis_motors,
            operator,
        } = drivers;

        let mut scheduler = Scheduler::new();

        let agitator = scheduler.register_subsystem(Rc::new(RefCell::new(
            VelocityAgitatorSubsystem::new(agitator_motor, Rc::clone(&clock), config.agitator),
        )))?;
        let chassis = scheduler.register_subsystem(Rc::new(RefCell::new(ChassisSubsystem::new(
            chassis_motors,
            Rc::clone(&clock),
            config.chassis,
        ))))?;

        let shoot = move_unjam_comprised_command(
            agitator.clone(),
            MoveIntegralCommand::new(agitator.clone(), config.move_integral),
            UnjamIntegralCommand::new(agitator.clone(), Rc::clone(&clock), config.unjam),
        )?;
        let shoot_command = scheduler.register_command(Box::new(shoot))?;

        let tank_drive = TankDriveCommand::with_max_speed(chassis.clone(), operator, config.max_chassis_speed_mps);
        let tank_drive_command = scheduler.register_command(Box::new(tank_drive))?;
        scheduler.set_default_command(chassis.id(), tank_drive_command)?;

        Ok(Self {
            scheduler,
            agitator,
            chassis,
            shoot_command,
            tank_drive_command,
            state: RobotState::default(),
        })
    }

    pub fn start(&mut self) {
        self.state.running = true;
        info!(
            subsystems = self.scheduler.subsystem_count(),
            commands = self.scheduler.command_count(),
            "robot control loop starting"
        );
    }

    pub fn stop(&mut self) {
        self.scheduler.cancel_all();
        self.state.running = false;
        info!("robot control loop stopped");
    }

    /// Runs one scheduler tick. Does nothing while stopped.
    pub fn update(&mut self) -> bool {
        if !self.state.running {
            return false;
        }
        self.scheduler.run();
        self.refresh_state();
        true
    }

    /// Queues one agitator move. Rejected while the agitator is uncalibrated.
    pub fn request_shot(&mut self) -> Result<(), AdmissionError> {
        self.state.shots_requested += 1;
        let result = self.scheduler.add_command(self.shoot_command);
        if let Err(e) = &result {
            self.state.shots_rejected += 1;
            warn!(error = %e, "shot rejected");
        }
        self.refresh_state();
        result
    }

    pub fn cancel_shot(&mut self) -> bool {
        let cancelled = self.scheduler.remove_command(self.shoot_command);
        self.refresh_state();
        cancelled
    }

    /// Interrupts everything. The chassis default resumes on the next tick.
    pub fn emergency_stop(&mut self) {
        warn!("emergency stop");
        self.scheduler.cancel_all();
        self.refresh_state();
    }

    pub fn is_shooting(&self) -> bool {
        self.scheduler.is_scheduled(self.shoot_command)
    }

    pub fn is_driving(&self) -> bool {
        self.scheduler.is_scheduled(self.tank_drive_command)
    }

    pub fn shoot_command(&self) -> CommandId {
        self.shoot_command
    }

    pub fn tank_drive_command(&self) -> CommandId {
        self.tank_drive_command
    }

    pub fn agitator(&self) -> &SubsystemHandle<VelocityAgitatorSubsystem> {
        &self.agitator
    }

    pub fn chassis(&self) -> &SubsystemHandle<ChassisSubsystem> {
        &self.chassis
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn stats(&self) -> &SchedulerStats {
        self.scheduler.stats()
    }

    pub fn get_state(&self) -> &RobotState {
        &self.state
    }

    fn refresh_state(&mut self) {
        let shooting = self.is_shooting();
        let agitator = self.agitator.borrow();
        self.state.agitator_online = agitator.is_online();
        self.state.agitator_calibrated = agitator.is_calibrated();
        self.state.agitator_jammed = agitator.is_jammed();
        self.state.agitator_integral = agitator.current_value_integral();
        self.state.shooting = shooting;
    }
}
