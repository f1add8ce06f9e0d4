//! Fixed-period command scheduler.
//!
//! The scheduler owns the subsystem registry, the command arena, and the
//! slot-to-command binding table. It is the only place bindings change.
//! Each call to [`Scheduler::run`] is one tick:
//!
//! 1. refresh every subsystem, in registration order;
//! 2. execute every bound command, once each;
//! 3. retire finished commands with `end(false)` and immediately re-admit the
//!    freed subsystems' default commands;
//! 4. admit default commands to any subsystem still idle.

use crate::command::{Command, CommandId, CommandPhase};
use crate::requirements::{SubsystemId, SubsystemSet};
use crate::subsystems::{Subsystem, SubsystemHandle};
use core::cell::RefCell;
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Tick stamp meaning "not this run".
const NEVER: u64 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("subsystem `{0}` is already registered")]
    DuplicateSubsystem(&'static str),
    #[error("command `{0}` has no subsystem requirements")]
    EmptyRequirements(&'static str),
    #[error("unknown {0}")]
    UnknownSubsystem(SubsystemId),
    #[error("unknown {0}")]
    UnknownCommand(CommandId),
    #[error("default command `{command}` does not require {subsystem}")]
    DefaultMissingRequirement {
        command: &'static str,
        subsystem: SubsystemId,
    },
}

/// Why [`Scheduler::add_command`] left the bindings untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("unknown {0}")]
    UnknownCommand(CommandId),
    #[error("{command} requires unregistered {subsystem}")]
    UnregisteredRequirement {
        command: CommandId,
        subsystem: SubsystemId,
    },
    #[error("{0} is not ready")]
    NotReady(CommandId),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SchedulerStats {
    pub ticks: u64,
    pub total_admitted: u32,
    /// Failed `add_command` calls. Default-command retries are not counted.
    pub total_rejected: u32,
    pub total_interrupted: u32,
    pub total_completed: u32,
    pub total_default_admissions: u32,
    pub currently_scheduled: u16,
}

struct SubsystemEntry {
    subsystem: Rc<RefCell<dyn Subsystem>>,
    name: &'static str,
    default_command: Option<CommandId>,
}

struct CommandEntry {
    command: Box<dyn Command>,
    phase: CommandPhase,
    last_executed_tick: u64,
    last_checked_tick: u64,
}

pub struct Scheduler {
    subsystems: Vec<SubsystemEntry>,
    /// Slot-indexed binding table, same length as `subsystems`.
    bindings: Vec<Option<CommandId>>,
    commands: Vec<CommandEntry>,
    tick: u64,
    stats: SchedulerStats,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            subsystems: Vec::new(),
            bindings: Vec::new(),
            commands: Vec::new(),
            tick: 0,
            stats: SchedulerStats::default(),
        }
    }

    /// Registers a subsystem, calls its `initialize`, and assigns it the next
    /// free slot. Registering the same instance twice is an error.
    pub fn register_subsystem<S>(
        &mut self,
        subsystem: Rc<RefCell<S>>,
    ) -> Result<SubsystemHandle<S>, SchedulerError>
    where
        S: Subsystem + 'static,
    {
        let address = Rc::as_ptr(&subsystem).cast::<()>();
        let name = subsystem.borrow().name();
        if self
            .subsystems
            .iter()
            .any(|e| Rc::as_ptr(&e.subsystem).cast::<()>() == address)
        {
            return Err(SchedulerError::DuplicateSubsystem(name));
        }

        subsystem.borrow_mut().initialize();

        let id = SubsystemId(self.subsystems.len());
        let erased: Rc<RefCell<dyn Subsystem>> = subsystem.clone();
        self.subsystems.push(SubsystemEntry {
            subsystem: erased,
            name,
            default_command: None,
        });
        self.bindings.push(None);

        info!(subsystem = name, slot = id.index(), "registered subsystem");
        Ok(SubsystemHandle::new(id, subsystem))
    }

    /// Moves a command into the arena. It stays there for the scheduler's
    /// lifetime and may be admitted and retired any number of times.
    pub fn register_command(&mut self, command: Box<dyn Command>) -> Result<CommandId, SchedulerError> {
        if command.requirements().is_empty() {
            return Err(SchedulerError::EmptyRequirements(command.name()));
        }
        let id = CommandId(self.commands.len());
        debug!(command = command.name(), id = id.index(), "registered command");
        self.commands.push(CommandEntry {
            command,
            phase: CommandPhase::NotScheduled,
            last_executed_tick: NEVER,
            last_checked_tick: NEVER,
        });
        Ok(id)
    }

    /// Sets the command auto-admitted whenever `subsystem` is idle.
    pub fn set_default_command(
        &mut self,
        subsystem: SubsystemId,
        command: CommandId,
    ) -> Result<(), SchedulerError> {
        let entry = self
            .commands
            .get(command.index())
            .ok_or(SchedulerError::UnknownCommand(command))?;
        if subsystem.index() >= self.subsystems.len() {
            return Err(SchedulerError::UnknownSubsystem(subsystem));
        }
        if !entry.command.requirements().contains(subsystem) {
            return Err(SchedulerError::DefaultMissingRequirement {
                command: entry.command.name(),
                subsystem,
            });
        }
        self.subsystems[subsystem.index()].default_command = Some(command);
        Ok(())
    }

    /// Admission request.
    ///
    /// If the command is ready and all its subsystems are registered, every
    /// command currently holding one of those subsystems is ended as
    /// interrupted, then this command is initialized and bound to all of
    /// them. Otherwise nothing changes. Re-adding a scheduled command is a
    /// no-op.
    pub fn add_command(&mut self, id: CommandId) -> Result<(), AdmissionError> {
        let result = self.admit(id);
        if result.is_err() {
            self.stats.total_rejected += 1;
        }
        result
    }

    /// Forced cancellation. Returns whether the command was scheduled.
    pub fn remove_command(&mut self, id: CommandId) -> bool {
        match self.commands.get(id.index()) {
            Some(entry) if entry.phase == CommandPhase::Scheduled => {
                self.interrupt(id);
                true
            }
            _ => false,
        }
    }

    /// Interrupts every scheduled command. Defaults come back on the next tick.
    pub fn cancel_all(&mut self) {
        for index in 0..self.commands.len() {
            if self.commands[index].phase == CommandPhase::Scheduled {
                self.interrupt(CommandId(index));
            }
        }
        info!("all commands cancelled");
    }

    /// Advances the system by one tick.
    pub fn run(&mut self) {
        self.tick += 1;
        self.stats.ticks = self.tick;
        let tick = self.tick;

        for entry in &self.subsystems {
            entry.subsystem.borrow_mut().refresh();
        }

        for slot in 0..self.bindings.len() {
            if let Some(id) = self.bindings[slot] {
                let entry = &mut self.commands[id.index()];
                if entry.last_executed_tick != tick {
                    entry.last_executed_tick = tick;
                    entry.command.execute();
                }
            }
        }

        for slot in 0..self.bindings.len() {
            let Some(id) = self.bindings[slot] else {
                continue;
            };
            let entry = &mut self.commands[id.index()];
            // Commands admitted during this tick have not executed yet.
            if entry.last_executed_tick != tick || entry.last_checked_tick == tick {
                continue;
            }
            entry.last_checked_tick = tick;
            if entry.command.is_finished() {
                self.retire(id);
            }
        }

        for slot in 0..self.bindings.len() {
            if self.bindings[slot].is_none() {
                self.admit_default(SubsystemId(slot));
            }
        }

        // NASA Rule 5: Safety assertion for binding consistency
        debug_assert!(self.bindings_consistent(), "binding table out of sync with command phases");
    }

    pub fn is_scheduled(&self, id: CommandId) -> bool {
        self.commands
            .get(id.index())
            .map_or(false, |e| e.phase == CommandPhase::Scheduled)
    }

    pub fn phase(&self, id: CommandId) -> Option<CommandPhase> {
        self.commands.get(id.index()).map(|e| e.phase)
    }

    /// Command currently holding `subsystem`, if any.
    pub fn bound_command(&self, subsystem: SubsystemId) -> Option<CommandId> {
        self.bindings.get(subsystem.index()).copied().flatten()
    }

    pub fn default_command(&self, subsystem: SubsystemId) -> Option<CommandId> {
        self.subsystems
            .get(subsystem.index())
            .and_then(|e| e.default_command)
    }

    pub fn command(&self, id: CommandId) -> Option<&dyn Command> {
        self.commands.get(id.index()).map(|e| e.command.as_ref())
    }

    pub fn subsystem_name(&self, subsystem: SubsystemId) -> Option<&'static str> {
        self.subsystems.get(subsystem.index()).map(|e| e.name)
    }

    pub fn subsystem_count(&self) -> usize {
        self.subsystems.len()
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    fn admit(&mut self, id: CommandId) -> Result<(), AdmissionError> {
        let registered = self.subsystems.len();
        let entry = self
            .commands
            .get(id.index())
            .ok_or(AdmissionError::UnknownCommand(id))?;
        if entry.phase == CommandPhase::Scheduled {
            return Ok(());
        }

        let requirements = entry.command.requirements().clone();
        if let Some(missing) = requirements.iter().find(|s| s.index() >= registered) {
            warn!(command = entry.command.name(), %missing, "command requires unregistered subsystem");
            return Err(AdmissionError::UnregisteredRequirement {
                command: id,
                subsystem: missing,
            });
        }
        if !entry.command.is_ready() {
            debug!(command = entry.command.name(), "admission rejected, not ready");
            return Err(AdmissionError::NotReady(id));
        }

        for slot in requirements.iter() {
            if let Some(occupant) = self.bindings[slot.index()] {
                self.interrupt(occupant);
            }
        }

        let entry = &mut self.commands[id.index()];
        entry.command.initialize();
        entry.phase = CommandPhase::Scheduled;
        entry.last_executed_tick = NEVER;
        for slot in requirements.iter() {
            debug_assert!(self.bindings[slot.index()].is_none());
            self.bindings[slot.index()] = Some(id);
        }

        debug!(command = entry.command.name(), ?requirements, "admitted");
        self.stats.total_admitted += 1;
        self.stats.currently_scheduled += 1;
        Ok(())
    }

    fn admit_default(&mut self, subsystem: SubsystemId) {
        let Some(default) = self.subsystems[subsystem.index()].default_command else {
            return;
        };
        if self.is_scheduled(default) {
            return;
        }
        if self.admit(default).is_ok() {
            self.stats.total_default_admissions += 1;
        }
    }

    /// Natural completion: `end(false)`, unbind, and hand each freed slot to
    /// its default command.
    fn retire(&mut self, id: CommandId) {
        let requirements = self.end_and_unbind(id, false);
        self.stats.total_completed += 1;
        for slot in requirements.iter() {
            if self.bindings[slot.index()].is_none() {
                self.admit_default(slot);
            }
        }
    }

    fn interrupt(&mut self, id: CommandId) {
        self.end_and_unbind(id, true);
        self.stats.total_interrupted += 1;
    }

    fn end_and_unbind(&mut self, id: CommandId, interrupted: bool) -> SubsystemSet {
        let entry = &mut self.commands[id.index()];
        entry.command.end(interrupted);
        entry.phase = CommandPhase::NotScheduled;
        debug!(command = entry.command.name(), interrupted, "ended");

        let requirements = entry.command.requirements().clone();
        for slot in requirements.iter() {
            if self.bindings[slot.index()] == Some(id) {
                self.bindings[slot.index()] = None;
            }
        }
        self.stats.currently_scheduled = self.stats.currently_scheduled.saturating_sub(1);
        requirements
    }

    fn bindings_consistent(&self) -> bool {
        self.bindings
            .iter()
            .flatten()
            .all(|id| self.commands[id.index()].phase == CommandPhase::Scheduled)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
