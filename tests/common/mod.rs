#![allow(dead_code)]

use robocmd::{Command, Subsystem, SubsystemId, SubsystemSet};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    SubsystemInit(&'static str),
    Refresh(&'static str),
    Initialize(&'static str),
    Execute(&'static str),
    End(&'static str, bool),
}

#[derive(Debug, Clone, Default)]
pub struct EventLog(Rc<RefCell<Vec<Event>>>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn since(&self, mark: usize) -> Vec<Event> {
        self.0.borrow()[mark..].to_vec()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub fn count(&self, event: Event) -> usize {
        self.0.borrow().iter().filter(|e| **e == event).count()
    }
}

pub struct MockSubsystem {
    name: &'static str,
    log: EventLog,
    online: Rc<Cell<bool>>,
}

impl MockSubsystem {
    pub fn new(name: &'static str, log: &EventLog) -> Self {
        Self {
            name,
            log: log.clone(),
            online: Rc::new(Cell::new(true)),
        }
    }
}

impl Subsystem for MockSubsystem {
    fn name(&self) -> &'static str {
        self.name
    }

    fn initialize(&mut self) {
        self.log.push(Event::SubsystemInit(self.name));
    }

    fn refresh(&mut self) {
        self.log.push(Event::Refresh(self.name));
    }

    fn is_online(&self) -> bool {
        self.online.get()
    }
}

/// Knobs a test flips to steer a [`MockCommand`].
#[derive(Debug, Clone)]
pub struct CommandControl {
    pub ready: Rc<Cell<bool>>,
    pub finished: Rc<Cell<bool>>,
}

impl CommandControl {
    pub fn set_ready(&self, ready: bool) {
        self.ready.set(ready);
    }

    pub fn set_finished(&self, finished: bool) {
        self.finished.set(finished);
    }
}

pub struct MockCommand {
    name: &'static str,
    requirements: SubsystemSet,
    log: EventLog,
    control: CommandControl,
}

impl MockCommand {
    pub fn new(name: &'static str, requirements: &[SubsystemId], log: &EventLog) -> (Self, CommandControl) {
        let control = CommandControl {
            ready: Rc::new(Cell::new(true)),
            finished: Rc::new(Cell::new(false)),
        };
        let command = Self {
            name,
            requirements: requirements.iter().copied().collect(),
            log: log.clone(),
            control: control.clone(),
        };
        (command, control)
    }

    pub fn boxed(name: &'static str, requirements: &[SubsystemId], log: &EventLog) -> (Box<dyn Command>, CommandControl) {
        let (command, control) = Self::new(name, requirements, log);
        (Box::new(command), control)
    }
}

impl Command for MockCommand {
    fn name(&self) -> &'static str {
        self.name
    }

    fn requirements(&self) -> &SubsystemSet {
        &self.requirements
    }

    fn is_ready(&self) -> bool {
        self.control.ready.get()
    }

    fn initialize(&mut self) {
        self.log.push(Event::Initialize(self.name));
    }

    fn execute(&mut self) {
        self.log.push(Event::Execute(self.name));
    }

    fn is_finished(&self) -> bool {
        self.control.finished.get()
    }

    fn end(&mut self, interrupted: bool) {
        self.log.push(Event::End(self.name, interrupted));
    }
}
