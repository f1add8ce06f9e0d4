mod common;

use common::{Event, EventLog, MockCommand, MockSubsystem};
use robocmd::comprised::MAX_COMPRISED_CHILDREN;
use robocmd::{Command, ComprisedCommand, CompositionError, Scheduler, SubsystemId, SwitchPolicy};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Switches to whatever child the test asks for.
#[derive(Clone, Default)]
struct ScriptedPolicy {
    wanted: Rc<Cell<usize>>,
    finish_when_child_finishes: bool,
}

impl SwitchPolicy for ScriptedPolicy {
    fn initial_child(&self) -> usize {
        0
    }

    fn select_child(&mut self, _active: usize) -> usize {
        self.wanted.get()
    }

    fn is_finished(&self, _active: usize, child_finished: bool) -> bool {
        self.finish_when_child_finishes && child_finished
    }

    fn reset(&mut self) {
        self.wanted.set(0);
    }
}

fn setup(count: usize) -> (Scheduler, Vec<SubsystemId>, EventLog) {
    let log = EventLog::new();
    let mut scheduler = Scheduler::new();
    let ids = ["a", "b", "c"][..count]
        .iter()
        .map(|&name| {
            scheduler
                .register_subsystem(Rc::new(RefCell::new(MockSubsystem::new(name, &log))))
                .unwrap()
                .id()
        })
        .collect();
    log.clear();
    (scheduler, ids, log)
}

#[test]
fn test_no_children_is_rejected() {
    let children: Vec<Box<dyn Command>> = Vec::new();
    let result = ComprisedCommand::new("empty", children, ScriptedPolicy::default());
    assert!(matches!(result, Err(CompositionError::NoChildren("empty"))));
}

#[test]
fn test_too_many_children_is_rejected() {
    let (_, ids, log) = setup(1);
    let names = ["c0", "c1", "c2", "c3", "c4"];
    assert!(names.len() > MAX_COMPRISED_CHILDREN);
    let children = names.iter().map(|&n| MockCommand::boxed(n, &ids, &log).0);

    let result = ComprisedCommand::new("crowded", children, ScriptedPolicy::default());
    assert!(matches!(
        result,
        Err(CompositionError::TooManyChildren {
            parent: "crowded",
            limit: MAX_COMPRISED_CHILDREN,
        })
    ));
}

#[test]
fn test_mismatched_requirements_are_rejected() {
    let (_, ids, log) = setup(2);
    let (wide, _) = MockCommand::boxed("wide", &ids, &log);
    let (narrow, _) = MockCommand::boxed("narrow", &ids[..1], &log);

    let result = ComprisedCommand::new("mixed", [wide, narrow], ScriptedPolicy::default());
    match result {
        Err(CompositionError::RequirementMismatch { parent, child, expected, found }) => {
            assert_eq!(parent, "mixed");
            assert_eq!(child, "narrow");
            assert_eq!(expected.len(), 2);
            assert_eq!(found.len(), 1);
        }
        _ => panic!("expected a requirement mismatch"),
    }
}

#[test]
fn test_invalid_initial_child_is_rejected() {
    struct StartsAtThree;
    impl SwitchPolicy for StartsAtThree {
        fn initial_child(&self) -> usize {
            3
        }
        fn select_child(&mut self, active: usize) -> usize {
            active
        }
    }

    let (_, ids, log) = setup(1);
    let (only, _) = MockCommand::boxed("only", &ids, &log);
    let result = ComprisedCommand::new("bad start", [only], StartsAtThree);
    assert!(matches!(
        result,
        Err(CompositionError::InvalidInitialChild { index: 3, .. })
    ));
}

#[test]
fn test_comprised_requires_shared_set() {
    let (_, ids, log) = setup(2);
    let (first, _) = MockCommand::boxed("first", &ids, &log);
    let (second, _) = MockCommand::boxed("second", &ids, &log);
    let comprised = ComprisedCommand::new("pair", [first, second], ScriptedPolicy::default()).unwrap();

    assert_eq!(comprised.child_count(), 2);
    assert_eq!(comprised.active_child(), None);
    assert!(comprised.requirements().contains(ids[0]));
    assert!(comprised.requirements().contains(ids[1]));
    assert_eq!(comprised.requirements().len(), 2);
}

#[test]
fn test_scripted_switching_under_scheduler() {
    let (mut scheduler, ids, log) = setup(1);
    let (normal, _) = MockCommand::boxed("normal", &ids, &log);
    let (recover, _) = MockCommand::boxed("recover", &ids, &log);
    let policy = ScriptedPolicy::default();
    let wanted = Rc::clone(&policy.wanted);
    let comprised = ComprisedCommand::new("switcher", [normal, recover], policy).unwrap();
    let id = scheduler.register_command(Box::new(comprised)).unwrap();

    scheduler.add_command(id).unwrap();
    assert_eq!(log.events(), vec![Event::Initialize("normal")]);

    let mut per_tick = Vec::new();
    for tick in 1..=9 {
        match tick {
            3 => wanted.set(1),
            7 => wanted.set(0),
            _ => {}
        }
        let mark = log.len();
        scheduler.run();
        per_tick.push(log.since(mark));
    }

    for (i, events) in per_tick.iter().enumerate() {
        let tick = i + 1;
        let expected = match tick {
            3 => vec![
                Event::Refresh("a"),
                Event::End("normal", true),
                Event::Initialize("recover"),
                Event::Execute("recover"),
            ],
            4..=6 => vec![Event::Refresh("a"), Event::Execute("recover")],
            7 => vec![
                Event::Refresh("a"),
                Event::End("recover", true),
                Event::Initialize("normal"),
                Event::Execute("normal"),
            ],
            _ => vec![Event::Refresh("a"), Event::Execute("normal")],
        };
        assert_eq!(events, &expected, "tick {tick}");
    }
    assert!(scheduler.is_scheduled(id));
}

#[test]
#[should_panic(expected = "chose child 5 of 2")]
fn test_out_of_range_switch_panics() {
    let (_, ids, log) = setup(1);
    let (normal, _) = MockCommand::boxed("normal", &ids, &log);
    let (recover, _) = MockCommand::boxed("recover", &ids, &log);
    let policy = ScriptedPolicy::default();
    let wanted = Rc::clone(&policy.wanted);
    let mut comprised = ComprisedCommand::new("switcher", [normal, recover], policy).unwrap();

    comprised.initialize();
    comprised.execute();
    wanted.set(5);
    comprised.execute();
}

#[test]
fn test_switch_happens_before_finish_check() {
    let (mut scheduler, ids, log) = setup(1);
    let (normal, normal_control) = MockCommand::boxed("normal", &ids, &log);
    let (recover, _) = MockCommand::boxed("recover", &ids, &log);
    let policy = ScriptedPolicy {
        wanted: Rc::new(Cell::new(0)),
        finish_when_child_finishes: true,
    };
    let wanted = Rc::clone(&policy.wanted);
    let comprised = ComprisedCommand::new("switcher", [normal, recover], policy).unwrap();
    let id = scheduler.register_command(Box::new(comprised)).unwrap();
    scheduler.add_command(id).unwrap();

    // The old child would report finished, but the switch wins.
    normal_control.set_finished(true);
    wanted.set(1);
    scheduler.run();

    assert!(scheduler.is_scheduled(id));
    assert_eq!(log.count(Event::Execute("normal")), 0);
    assert_eq!(log.count(Event::Execute("recover")), 1);
}

#[test]
fn test_finish_follows_active_child() {
    let (mut scheduler, ids, log) = setup(1);
    let (normal, control) = MockCommand::boxed("normal", &ids, &log);
    let policy = ScriptedPolicy {
        wanted: Rc::new(Cell::new(0)),
        finish_when_child_finishes: true,
    };
    let comprised = ComprisedCommand::new("single", [normal], policy).unwrap();
    let id = scheduler.register_command(Box::new(comprised)).unwrap();
    scheduler.add_command(id).unwrap();

    scheduler.run();
    assert!(scheduler.is_scheduled(id));

    control.set_finished(true);
    scheduler.run();
    assert!(!scheduler.is_scheduled(id));
    assert_eq!(log.events().last(), Some(&Event::End("normal", false)));
}

#[test]
fn test_interrupt_reaches_active_child_only() {
    let (mut scheduler, ids, log) = setup(1);
    let (normal, _) = MockCommand::boxed("normal", &ids, &log);
    let (recover, _) = MockCommand::boxed("recover", &ids, &log);
    let (other, _) = MockCommand::boxed("other", &ids, &log);
    let policy = ScriptedPolicy::default();
    let wanted = Rc::clone(&policy.wanted);
    let comprised = ComprisedCommand::new("switcher", [normal, recover], policy).unwrap();
    let id = scheduler.register_command(Box::new(comprised)).unwrap();
    let other = scheduler.register_command(other).unwrap();

    scheduler.add_command(id).unwrap();
    wanted.set(1);
    scheduler.run();
    let mark = log.len();

    scheduler.add_command(other).unwrap();
    assert_eq!(
        log.since(mark),
        vec![Event::End("recover", true), Event::Initialize("other")]
    );

    // Re-admission starts from the initial child again.
    let mark = log.len();
    scheduler.add_command(id).unwrap();
    assert_eq!(
        log.since(mark),
        vec![Event::End("other", true), Event::Initialize("normal")]
    );
}

#[test]
fn test_readiness_delegates_to_initial_child() {
    let (_, ids, log) = setup(1);
    let (normal, normal_control) = MockCommand::boxed("normal", &ids, &log);
    let (recover, recover_control) = MockCommand::boxed("recover", &ids, &log);
    let comprised = ComprisedCommand::new("switcher", [normal, recover], ScriptedPolicy::default()).unwrap();

    recover_control.set_ready(false);
    assert!(comprised.is_ready());

    normal_control.set_ready(false);
    recover_control.set_ready(true);
    assert!(!comprised.is_ready());
}
