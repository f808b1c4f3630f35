use std::cell::RefCell;
use std::rc::Rc;

use anyhow::bail;
use crafter::kernel::brain::ModularBrain;
use crafter::kernel::error::{BrainError, ModuleError};
use crafter::kernel::event::EntityId;
use crafter::kernel::host::sim::SimHost;
use crafter::kernel::host::{Host, Vec2};
use crafter::kernel::module::{FrameContext, Module, ModuleState};
use crafter::kernel::pool::Resources;
use crafter::kernel::scheduler::Phase;
use crafter::kernel::time::Tick;

type Log = Rc<RefCell<Vec<String>>>;

/// Instrumented module: records every hook call and counts updates.
struct Recorder {
    state: ModuleState,
    log: Log,
    updates: u32,
    fail_on_update: bool,
    fail_on_init: bool,
}

impl Recorder {
    fn new(name: &str, log: &Log) -> Self {
        Self { state: ModuleState::new(name), log: Rc::clone(log), updates: 0, fail_on_update: false, fail_on_init: false }
    }

    fn failing(name: &str, log: &Log) -> Self {
        Self { fail_on_update: true, ..Self::new(name, log) }
    }

    fn failing_init(name: &str, log: &Log) -> Self {
        Self { fail_on_init: true, ..Self::new(name, log) }
    }

    fn record(&self, hook: &str) {
        self.log.borrow_mut().push(format!("{}:{hook}", self.state.name()));
    }
}

impl Module for Recorder {
    fn state(&self) -> &ModuleState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ModuleState {
        &mut self.state
    }

    fn on_initialize(&mut self, _host: &mut dyn Host) -> anyhow::Result<()> {
        self.record("init");
        if self.fail_on_init {
            bail!("setup refused");
        }
        Ok(())
    }

    fn on_update(&mut self, _ctx: &mut FrameContext<'_>) -> anyhow::Result<()> {
        self.record("update");
        if self.fail_on_update {
            bail!("update refused");
        }
        self.updates += 1;
        Ok(())
    }

    fn on_fixed_update(&mut self, _ctx: &mut FrameContext<'_>) -> anyhow::Result<()> {
        self.record("fixed");
        Ok(())
    }

    fn on_late_update(&mut self, _ctx: &mut FrameContext<'_>) -> anyhow::Result<()> {
        self.record("late");
        Ok(())
    }
}

struct Marker {
    state: ModuleState,
}

impl Module for Marker {
    fn state(&self) -> &ModuleState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ModuleState {
        &mut self.state
    }
}

fn setup() -> (SimHost, Resources) {
    (SimHost::new(EntityId(1), Vec2::ZERO), Resources::new(4))
}

fn abc_brain(log: &Log) -> ModularBrain {
    let mut brain = ModularBrain::new(EntityId(1));
    for name in ["A", "B", "C"] {
        brain.register_module(Recorder::new(name, log)).unwrap();
    }
    brain
}

#[test]
fn test_dispatch_order_matches_registration_for_every_phase() {
    let log: Log = Rc::default();
    let mut brain = abc_brain(&log);
    let (mut host, mut resources) = setup();

    brain.initialize_all(&mut host).unwrap();
    let mut ctx = FrameContext { tick: Tick::new(), dt: 0.016, host: &mut host, resources: &mut resources };
    brain.dispatch_update(&mut ctx).unwrap();
    brain.dispatch_fixed_update(&mut ctx).unwrap();
    brain.dispatch_late_update(&mut ctx).unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            "A:init", "B:init", "C:init", "A:update", "B:update", "C:update", "A:fixed", "B:fixed", "C:fixed",
            "A:late", "B:late", "C:late",
        ]
    );
    assert_eq!(brain.module_names().collect::<Vec<_>>(), vec!["A", "B", "C"]);
}

#[test]
fn test_inactive_module_has_no_effect() {
    let log: Log = Rc::default();
    let mut brain = ModularBrain::new(EntityId(1));
    let a = brain.register_module(Recorder::new("A", &log)).unwrap();
    let b = brain.register_module(Recorder::new("B", &log)).unwrap();
    let c = brain.register_module(Recorder::new("C", &log)).unwrap();
    let (mut host, mut resources) = setup();
    brain.initialize_all(&mut host).unwrap();

    {
        let mut ctx = FrameContext { tick: Tick::new(), dt: 0.016, host: &mut host, resources: &mut resources };
        brain.dispatch_update(&mut ctx).unwrap();
    }
    log.borrow_mut().clear();

    brain.set_module_active("B", false).unwrap();
    {
        let mut ctx = FrameContext { tick: Tick::new(), dt: 0.016, host: &mut host, resources: &mut resources };
        brain.dispatch_update(&mut ctx).unwrap();
    }

    assert_eq!(*log.borrow(), vec!["A:update", "C:update"]);
    assert_eq!(brain.module(a).unwrap().updates, 2);
    assert_eq!(brain.module(b).unwrap().updates, 1, "inactive module must not count");
    assert_eq!(brain.module(c).unwrap().updates, 2);
    assert!(!brain.find_module_by_name("B").unwrap().is_active());

    brain.set_module_active("B", true).unwrap();
    let mut ctx = FrameContext { tick: Tick::new(), dt: 0.016, host: &mut host, resources: &mut resources };
    brain.dispatch_update(&mut ctx).unwrap();
    assert_eq!(brain.module(b).unwrap().updates, 2);
}

#[test]
fn test_find_module_by_name_round_trip() {
    let log: Log = Rc::default();
    let mut brain = ModularBrain::new(EntityId(1));
    assert!(brain.find_module_by_name("X").is_none());

    brain.register_module(Recorder::new("X", &log)).unwrap();

    let found = brain.find_module_by_name("X").expect("registered module");
    assert_eq!(found.name(), "X");
    assert!(brain.find_module_by_name("Y").is_none());
    assert!(brain.find_named::<Recorder>("X").is_some());
    assert!(brain.find_named::<Marker>("X").is_none(), "wrong concrete type is not found");
}

#[test]
fn test_find_module_by_type() {
    let log: Log = Rc::default();
    let mut brain = ModularBrain::new(EntityId(1));
    assert!(brain.find_module::<Marker>().is_none());

    brain.register_module(Recorder::new("first", &log)).unwrap();
    brain.register_module(Marker { state: ModuleState::new("marker") }).unwrap();
    brain.register_module(Recorder::new("second", &log)).unwrap();

    assert_eq!(brain.find_module::<Recorder>().unwrap().state().name(), "first");
    assert_eq!(brain.find_module::<Marker>().unwrap().name(), "marker");

    brain.find_module_mut::<Recorder>().unwrap().updates = 9;
    assert_eq!(brain.find_named::<Recorder>("first").unwrap().updates, 9);
}

#[test]
fn test_lifecycle_misuse_is_an_error() {
    let log: Log = Rc::default();
    let mut brain = abc_brain(&log);
    let (mut host, mut resources) = setup();

    {
        let mut ctx = FrameContext { tick: Tick::new(), dt: 0.016, host: &mut host, resources: &mut resources };
        assert!(matches!(brain.dispatch_update(&mut ctx), Err(BrainError::NotInitialized(_))));
    }

    brain.initialize_all(&mut host).unwrap();
    assert!(matches!(brain.initialize_all(&mut host), Err(BrainError::AlreadyInitialized(_))));
    assert!(matches!(
        brain.register_module(Recorder::new("D", &log)),
        Err(BrainError::RegistrationClosed(name)) if name == "D"
    ));
    assert!(matches!(brain.set_module_active("nope", false), Err(BrainError::UnknownModule(_))));
}

#[test]
fn test_module_initialize_twice_fails() {
    let log: Log = Rc::default();
    let mut solo = Recorder::new("solo", &log);
    let (mut host, mut resources) = setup();

    {
        let mut ctx = FrameContext { tick: Tick::new(), dt: 0.016, host: &mut host, resources: &mut resources };
        assert!(matches!(solo.update_module(&mut ctx), Err(ModuleError::NotInitialized(_))));
    }

    solo.initialize(&mut host).unwrap();
    assert_eq!(solo.state().host(), Some(EntityId(1)));
    assert!(matches!(solo.initialize(&mut host), Err(ModuleError::AlreadyInitialized(_))));
}

#[test]
fn test_duplicate_name_rejected() {
    let log: Log = Rc::default();
    let mut brain = ModularBrain::new(EntityId(1));
    brain.register_module(Recorder::new("A", &log)).unwrap();

    assert!(matches!(brain.register_module(Recorder::new("A", &log)), Err(BrainError::DuplicateModule(_))));
    assert_eq!(brain.len(), 1);
}

#[test]
fn test_host_mismatch_rejected() {
    let log: Log = Rc::default();
    let mut brain = abc_brain(&log);
    let mut stranger = SimHost::new(EntityId(99), Vec2::ZERO);

    assert!(matches!(brain.initialize_all(&mut stranger), Err(BrainError::HostMismatch { .. })));
    assert!(!brain.is_initialized());
}

#[test]
fn test_failing_module_aborts_rest_of_phase() {
    let log: Log = Rc::default();
    let mut brain = ModularBrain::new(EntityId(1));
    brain.register_module(Recorder::new("A", &log)).unwrap();
    brain.register_module(Recorder::failing("B", &log)).unwrap();
    brain.register_module(Recorder::new("C", &log)).unwrap();
    let (mut host, mut resources) = setup();
    brain.initialize_all(&mut host).unwrap();
    log.borrow_mut().clear();

    let mut ctx = FrameContext { tick: Tick::new(), dt: 0.016, host: &mut host, resources: &mut resources };
    let err = brain.dispatch_update(&mut ctx).unwrap_err();

    match err {
        BrainError::Phase { module, phase, source } => {
            assert_eq!(module, "B");
            assert_eq!(phase, Phase::Update);
            assert!(source.to_string().contains("update refused"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(*log.borrow(), vec!["A:update", "B:update"], "C must not run after B failed");
}

#[test]
fn test_modules_bind_host_identity_only() {
    let log: Log = Rc::default();
    let mut brain = abc_brain(&log);
    let (mut host, _) = setup();
    brain.initialize_all(&mut host).unwrap();

    for name in ["A", "B", "C"] {
        assert_eq!(brain.find_module_by_name(name).unwrap().state().host(), Some(EntityId(1)));
    }
    assert_eq!(brain.entity(), EntityId(1));
}

#[test]
fn test_failed_initialize_closes_brain() {
    let log: Log = Rc::default();
    let mut brain = ModularBrain::new(EntityId(1));
    brain.register_module(Recorder::new("A", &log)).unwrap();
    brain.register_module(Recorder::failing_init("B", &log)).unwrap();
    brain.register_module(Recorder::new("C", &log)).unwrap();
    let (mut host, mut resources) = setup();

    let err = brain.initialize_all(&mut host).unwrap_err();
    assert!(matches!(err, BrainError::Phase { ref module, phase: Phase::Initialize, .. } if module == "B"));
    assert_eq!(*log.borrow(), vec!["A:init", "B:init"], "C is never initialized");

    assert!(brain.is_failed());
    assert!(!brain.is_initialized());
    assert_eq!(brain.find_module_by_name("A").unwrap().state().host(), Some(EntityId(1)));
    assert_eq!(brain.find_module_by_name("B").unwrap().state().host(), None, "failed setup does not bind");

    assert!(matches!(brain.initialize_all(&mut host), Err(BrainError::Failed(_))));
    assert!(matches!(brain.register_module(Recorder::new("D", &log)), Err(BrainError::Failed(_))));
    let mut ctx = FrameContext { tick: Tick::new(), dt: 0.016, host: &mut host, resources: &mut resources };
    assert!(matches!(brain.dispatch_update(&mut ctx), Err(BrainError::Failed(_))));
}

#[test]
fn test_initialize_is_not_a_frame_phase() {
    let mut brain = ModularBrain::new(EntityId(1));
    let (mut host, mut resources) = setup();
    brain.initialize_all(&mut host).unwrap();

    let mut ctx = FrameContext { tick: Tick::new(), dt: 0.016, host: &mut host, resources: &mut resources };
    assert!(matches!(
        brain.dispatch(Phase::Initialize, &mut ctx),
        Err(BrainError::NotDispatchable(Phase::Initialize))
    ));
}
