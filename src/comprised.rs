//! Commands composed of a closed set of child commands.
//!
//! A [`ComprisedCommand`] looks like a single command to the scheduler. It
//! requires the union of its children's requirements (which must all be the
//! same set) and forwards the lifecycle to whichever child is active. Each
//! tick, before delegating `execute`, its [`SwitchPolicy`] may pick a
//! different child; the outgoing child is ended as interrupted and the
//! incoming one initialized.

use crate::command::Command;
use crate::requirements::SubsystemSet;
use heapless::Vec;
use static_assertions::const_assert;
use thiserror::Error;
use tracing::debug;

pub const MAX_COMPRISED_CHILDREN: usize = 4;

const_assert!(MAX_COMPRISED_CHILDREN >= 2);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionError {
    #[error("comprised command `{0}` has no children")]
    NoChildren(&'static str),
    #[error("comprised command `{parent}` has more than {limit} children")]
    TooManyChildren { parent: &'static str, limit: usize },
    #[error("child `{child}` of `{parent}` requires {found:?}, expected {expected:?}")]
    RequirementMismatch {
        parent: &'static str,
        child: &'static str,
        expected: SubsystemSet,
        found: SubsystemSet,
    },
    #[error("initial child {index} of `{parent}` is out of range")]
    InvalidInitialChild { parent: &'static str, index: usize },
}

/// The domain-specific decision logic of a comprised command.
pub trait SwitchPolicy {
    /// Child activated by `initialize`.
    fn initial_child(&self) -> usize;

    /// Child that should be active this tick. Evaluated once per tick,
    /// before the active child executes.
    fn select_child(&mut self, active: usize) -> usize;

    /// Whether the comprised command as a whole is finished, given the
    /// active child and its own completion state.
    fn is_finished(&self, _active: usize, child_finished: bool) -> bool {
        child_finished
    }

    /// Clears transient selection state. Called on every `initialize`.
    fn reset(&mut self) {}
}

pub struct ComprisedCommand<P: SwitchPolicy> {
    name: &'static str,
    requirements: SubsystemSet,
    children: Vec<Box<dyn Command>, MAX_COMPRISED_CHILDREN>,
    active: Option<usize>,
    policy: P,
}

impl<P: SwitchPolicy> ComprisedCommand<P> {
    /// Validates the composition once. Every child must require exactly the
    /// same subsystem set.
    pub fn new<I>(name: &'static str, children: I, policy: P) -> Result<Self, CompositionError>
    where
        I: IntoIterator<Item = Box<dyn Command>>,
    {
        let mut owned: Vec<Box<dyn Command>, MAX_COMPRISED_CHILDREN> = Vec::new();
        for child in children {
            owned.push(child).map_err(|_| CompositionError::TooManyChildren {
                parent: name,
                limit: MAX_COMPRISED_CHILDREN,
            })?;
        }

        let expected = match owned.first() {
            Some(first) => first.requirements().clone(),
            None => return Err(CompositionError::NoChildren(name)),
        };
        let mut requirements = SubsystemSet::new();
        for child in &owned {
            if *child.requirements() != expected {
                return Err(CompositionError::RequirementMismatch {
                    parent: name,
                    child: child.name(),
                    expected,
                    found: child.requirements().clone(),
                });
            }
            requirements = requirements.union(child.requirements());
        }

        let initial = policy.initial_child();
        if initial >= owned.len() {
            return Err(CompositionError::InvalidInitialChild { parent: name, index: initial });
        }

        Ok(Self {
            name,
            requirements,
            children: owned,
            active: None,
            policy,
        })
    }

    /// Index of the active child, `None` while not scheduled.
    pub fn active_child(&self) -> Option<usize> {
        self.active
    }

    pub fn child(&self, index: usize) -> Option<&dyn Command> {
        self.children.get(index).map(|c| c.as_ref())
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }
}

impl<P: SwitchPolicy> Command for ComprisedCommand<P> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn requirements(&self) -> &SubsystemSet {
        &self.requirements
    }

    fn is_ready(&self) -> bool {
        let index = self.active.unwrap_or_else(|| self.policy.initial_child());
        self.children[index].is_ready()
    }

    fn initialize(&mut self) {
        self.policy.reset();
        let initial = self.policy.initial_child();
        self.children[initial].initialize();
        self.active = Some(initial);
    }

    fn execute(&mut self) {
        let Some(mut active) = self.active else {
            return;
        };
        let next = self.policy.select_child(active);
        if next != active {
            assert!(
                next < self.children.len(),
                "switch policy of `{}` chose child {next} of {}",
                self.name,
                self.children.len()
            );
            debug!(
                command = self.name,
                from = self.children[active].name(),
                to = self.children[next].name(),
                "switching child"
            );
            self.children[active].end(true);
            self.children[next].initialize();
            self.active = Some(next);
            active = next;
        }
        self.children[active].execute();
    }

    fn is_finished(&self) -> bool {
        match self.active {
            Some(active) => self
                .policy
                .is_finished(active, self.children[active].is_finished()),
            None => false,
        }
    }

    fn end(&mut self, interrupted: bool) {
        if let Some(active) = self.active.take() {
            self.children[active].end(interrupted);
        }
    }
}
