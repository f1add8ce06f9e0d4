use super::{MoveIntegralCommand, UnjamIntegralCommand};
use crate::command::Command;
use crate::comprised::{ComprisedCommand, CompositionError, SwitchPolicy};
use crate::subsystems::{SetpointSubsystem, SubsystemHandle};

pub const MOVE_CHILD: usize = 0;
pub const UNJAM_CHILD: usize = 1;

/// Moves normally; switches to unjamming while the subsystem reports a jam
/// and back once the jam is cleared.
pub struct JamSwitchPolicy<S: SetpointSubsystem> {
    subsystem: SubsystemHandle<S>,
}

impl<S: SetpointSubsystem> JamSwitchPolicy<S> {
    pub fn new(subsystem: SubsystemHandle<S>) -> Self {
        Self { subsystem }
    }
}

impl<S: SetpointSubsystem> SwitchPolicy for JamSwitchPolicy<S> {
    fn initial_child(&self) -> usize {
        MOVE_CHILD
    }

    fn select_child(&mut self, _active: usize) -> usize {
        if self.subsystem.borrow().is_jammed() {
            UNJAM_CHILD
        } else {
            MOVE_CHILD
        }
    }

    fn is_finished(&self, active: usize, child_finished: bool) -> bool {
        let subsystem = self.subsystem.borrow();
        if !subsystem.is_online() {
            return true;
        }
        match active {
            // An unjam that gave up leaves the jam flagged; stop there.
            UNJAM_CHILD => child_finished && subsystem.is_jammed(),
            _ => child_finished,
        }
    }
}

pub type MoveUnjamComprisedCommand<S> = ComprisedCommand<JamSwitchPolicy<S>>;

pub fn move_unjam_comprised_command<S>(
    subsystem: SubsystemHandle<S>,
    move_command: MoveIntegralCommand<S>,
    unjam_command: UnjamIntegralCommand<S>,
) -> Result<MoveUnjamComprisedCommand<S>, CompositionError>
where
    S: SetpointSubsystem + 'static,
{
    let children: [Box<dyn Command>; 2] = [Box::new(move_command), Box::new(unjam_command)];
    ComprisedCommand::new("move unjam integral", children, JamSwitchPolicy::new(subsystem))
}
