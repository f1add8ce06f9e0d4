//! # Robot Command Framework
//!
//! A cooperative, fixed-period command scheduler for embedded robot control,
//! plus the robot application built on it.
//!
//! ## Features
//!
//! - **Exclusive subsystem access**: at most one command holds a subsystem at a time
//! - **Atomic admission**: a command claims all of its subsystems or none
//! - **Deterministic ticks**: refresh, then execute, then retire and re-admit defaults
//! - **Composition**: comprised commands switch between child behaviors at runtime
//! - **Embedded-friendly**: no allocation in the tick loop
//!
//! ## Quick Start
//!
//! ```rust
//! use robocmd::hal::{ManualClock, SimMotor};
//! use robocmd::subsystems::{AgitatorConfig, VelocityAgitatorSubsystem};
//! use robocmd::Scheduler;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let clock = Rc::new(ManualClock::new(0));
//! let mut scheduler = Scheduler::new();
//! let agitator = scheduler
//!     .register_subsystem(Rc::new(RefCell::new(VelocityAgitatorSubsystem::new(
//!         Box::new(SimMotor::new()),
//!         clock.clone(),
//!         AgitatorConfig::default(),
//!     ))))
//!     .unwrap();
//!
//! clock.advance(2);
//! scheduler.run();
//! assert_eq!(scheduler.bound_command(agitator.id()), None);
//! ```
//!
//! ## Architecture
//!
//! - [`scheduler`] - Registry, admission, and the tick loop
//! - [`command`] - The command contract
//! - [`comprised`] - Commands built from switchable children
//! - [`subsystems`] - Subsystem contract and the agitator and chassis
//! - [`commands`] - Move, unjam, and tank-drive behaviors
//! - [`requirements`] - Subsystem identities and requirement sets
//! - [`wrapped`] - Wrap-around arithmetic for periodic quantities
//! - [`pid`] - Fixed-gain feedback controller
//! - [`hal`] - Driver traits and simulated drivers
//! - [`robot`] - Robot wiring and operator actions
//! - [`config`] - JSON configuration

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::float_cmp)]

pub mod command;
pub mod commands;
pub mod comprised;
pub mod config;
pub mod hal;
pub mod pid;
pub mod requirements;
pub mod robot;
pub mod scheduler;
pub mod subsystems;
pub mod wrapped;

// Re-export main public types for convenience
pub use command::{Command, CommandId, CommandPhase};
pub use comprised::{ComprisedCommand, CompositionError, SwitchPolicy};
pub use config::RobotConfig;
pub use requirements::{SubsystemId, SubsystemSet};
pub use robot::Robot;
pub use scheduler::{AdmissionError, Scheduler, SchedulerError};
pub use subsystems::{Subsystem, SubsystemHandle};
pub use wrapped::WrappedFloat;
