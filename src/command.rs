//! The command contract.
//!
//! A command is any type that can report readiness, run once per tick, and
//! report completion. Lifecycle transitions are driven solely by the
//! [`Scheduler`](crate::scheduler::Scheduler):
//!
//! ```text
//! NotScheduled --admit (is_ready)--> initialize() --> Scheduled
//! Scheduled    --is_finished()-----> end(false)   --> NotScheduled
//! Scheduled    --displaced/removed-> end(true)    --> NotScheduled
//! ```

use crate::requirements::SubsystemSet;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Index of a command in the scheduler's command arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CommandId(pub(crate) usize);

impl CommandId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "command#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandPhase {
    NotScheduled,
    Scheduled,
}

pub trait Command {
    fn name(&self) -> &'static str;

    /// Subsystems this command needs exclusive use of. Must be non-empty and
    /// must not change after construction.
    fn requirements(&self) -> &SubsystemSet;

    /// Checked before admission. Must not have side effects.
    fn is_ready(&self) -> bool {
        true
    }

    /// Called once on admission, before the first `execute`.
    fn initialize(&mut self) {}

    /// Called once per tick while scheduled.
    fn execute(&mut self);

    /// Checked once per tick after `execute`.
    fn is_finished(&self) -> bool {
        false
    }

    /// Called once when leaving the scheduled state. `interrupted` is true
    /// when the command was displaced or cancelled. Implementations must
    /// return their outputs to a safe value.
    fn end(&mut self, _interrupted: bool) {}
}
