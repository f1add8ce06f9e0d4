use crate::command::Command;
use crate::hal::SharedClock;
use crate::requirements::SubsystemSet;
use crate::subsystems::{SetpointSubsystem, SubsystemHandle};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnjamIntegralConfig {
    /// How far to back off from the jam position each cycle.
    pub unjam_displacement: f32,
    /// Magnitude of the setpoint used in both directions.
    pub unjam_velocity: f32,
    /// Longest a single direction is held before reversing anyway.
    pub max_wait_time_ms: u32,
    /// Clean back-and-forth cycles needed to declare the jam cleared.
    pub target_cycle_count: u8,
}

impl Default for UnjamIntegralConfig {
    fn default() -> Self {
        Self {
            unjam_displacement: 0.3,
            unjam_velocity: 6.0,
            max_wait_time_ms: 300,
            target_cycle_count: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnjamState {
    Backward,
    Forward,
}

/// Rocks a jammed subsystem back and forth.
///
/// A cycle is clean when the subsystem reaches the backed-off position and
/// then returns to where it jammed, each within `max_wait_time_ms`. After
/// `target_cycle_count` clean cycles the jam flag is cleared and the command
/// finishes. It gives up (finishes with the jam still flagged) after four
/// times that many direction changes.
pub struct UnjamIntegralCommand<S: SetpointSubsystem> {
    subsystem: SubsystemHandle<S>,
    clock: SharedClock,
    requirements: SubsystemSet,
    config: UnjamIntegralConfig,

    state: UnjamState,
    origin: f32,
    phase_start_ms: u32,
    backward_reached: bool,
    clean_cycles: u8,
    reversals: u16,
    cleared: bool,
}

impl<S: SetpointSubsystem> UnjamIntegralCommand<S> {
    pub fn new(subsystem: SubsystemHandle<S>, clock: SharedClock, config: UnjamIntegralConfig) -> Self {
        Self {
            requirements: subsystem.requirement(),
            subsystem,
            clock,
            config,
            state: UnjamState::Backward,
            origin: 0.0,
            phase_start_ms: 0,
            backward_reached: false,
            clean_cycles: 0,
            reversals: 0,
            cleared: false,
        }
    }

    pub fn clean_cycles(&self) -> u8 {
        self.clean_cycles
    }

    fn max_reversals(&self) -> u16 {
        u16::from(self.config.target_cycle_count) * 4
    }

    fn begin_phase(&mut self, state: UnjamState, now_ms: u32) {
        self.state = state;
        self.phase_start_ms = now_ms;
        let velocity = match state {
            UnjamState::Backward => -self.config.unjam_velocity,
            UnjamState::Forward => self.config.unjam_velocity,
        };
        self.subsystem.borrow_mut().set_setpoint(velocity);
    }
}

impl<S: SetpointSubsystem> Command for UnjamIntegralCommand<S> {
    fn name(&self) -> &'static str {
        "unjam integral"
    }

    fn requirements(&self) -> &SubsystemSet {
        &self.requirements
    }

    fn is_ready(&self) -> bool {
        self.subsystem.borrow().is_online()
    }

    fn initialize(&mut self) {
        self.origin = self.subsystem.borrow().current_value_integral();
        self.backward_reached = false;
        self.clean_cycles = 0;
        self.reversals = 0;
        self.cleared = false;
        self.begin_phase(UnjamState::Backward, self.clock.now_ms());
    }

    fn execute(&mut self) {
        if self.cleared || self.reversals >= self.max_reversals() {
            return;
        }
        let now = self.clock.now_ms();
        let position = self.subsystem.borrow().current_value_integral();
        let timed_out = now.wrapping_sub(self.phase_start_ms) >= self.config.max_wait_time_ms;

        match self.state {
            UnjamState::Backward => {
                let reached = position <= self.origin - self.config.unjam_displacement;
                if reached || timed_out {
                    self.backward_reached = reached;
                    self.reversals += 1;
                    self.begin_phase(UnjamState::Forward, now);
                }
            }
            UnjamState::Forward => {
                let reached = position >= self.origin;
                if reached || timed_out {
                    if reached && self.backward_reached {
                        self.clean_cycles += 1;
                        debug!(cycles = self.clean_cycles, "unjam cycle complete");
                    }
                    if self.clean_cycles >= self.config.target_cycle_count {
                        self.cleared = true;
                        let mut subsystem = self.subsystem.borrow_mut();
                        subsystem.set_setpoint(0.0);
                        subsystem.clear_jam();
                        return;
                    }
                    self.reversals += 1;
                    self.begin_phase(UnjamState::Backward, now);
                }
            }
        }

        if self.reversals == self.max_reversals() {
            warn!(reversals = self.reversals, "unjam attempts exhausted");
        }
    }

    fn is_finished(&self) -> bool {
        self.cleared
            || self.reversals >= self.max_reversals()
            || !self.subsystem.borrow().is_online()
    }

    fn end(&mut self, _interrupted: bool) {
        self.subsystem.borrow_mut().set_setpoint(0.0);
    }
}
