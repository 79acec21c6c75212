use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use bootkit::{
    Bind, Component, Definition, DefinitionSet, Format, Inject, InjectionError, NoConfig, OrchestratorBuilder, Registry,
    SlotError, StartupError, State,
};
use parking_lot::Mutex;

#[derive(Debug, Clone, Default, Bind)]
struct AlphaConfig {
    greeting: String,
    retries: u32,
}

#[bootkit::module(id = "alpha", config = AlphaConfig, ctor = Alpha::new)]
#[derive(Inject)]
#[inject(setter(name = "observer", with = Alpha::set_observer))]
struct Alpha {
    config: Arc<AlphaConfig>,
    #[inject]
    sibling: Inject<Beta>,
    observer: Mutex<Option<Arc<Beta>>>,
    saw_sibling: AtomicBool,
    saw_sibling_running: AtomicBool,
}

impl Alpha {
    #[allow(clippy::unnecessary_wraps)]
    fn new(config: Arc<AlphaConfig>) -> anyhow::Result<Self> {
        Ok(Self {
            config,
            sibling: Inject::new(),
            observer: Mutex::new(None),
            saw_sibling: AtomicBool::new(false),
            saw_sibling_running: AtomicBool::new(false),
        })
    }

    fn set_observer(&self, beta: Arc<Beta>) {
        *self.observer.lock() = Some(beta);
    }
}

impl Component for Alpha {
    fn start(&self) -> anyhow::Result<()> {
        self.saw_sibling.store(self.sibling.get().is_some(), Ordering::SeqCst);
        if let Some(sibling) = self.sibling.get() {
            self.saw_sibling_running
                .store(sibling.started.load(Ordering::SeqCst) > 0, Ordering::SeqCst);
        }
        Ok(())
    }
}

#[bootkit::module(id = "beta")]
#[derive(Inject)]
struct Beta {
    _config: Arc<NoConfig>,
    #[inject(name = "partner")]
    alpha: Inject<Alpha>,
    started: AtomicUsize,
    stopped: AtomicUsize,
}

impl Beta {
    #[allow(clippy::unnecessary_wraps)]
    fn new(config: Arc<NoConfig>) -> anyhow::Result<Self> {
        Ok(Self {
            _config: config,
            alpha: Inject::new(),
            started: AtomicUsize::new(0),
            stopped: AtomicUsize::new(0),
        })
    }
}

impl Component for Beta {
    fn start(&self) -> anyhow::Result<()> {
        self.started.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) -> anyhow::Result<()> {
        self.stopped.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn registry() -> Arc<Registry> {
    Arc::new(Registry::discover().unwrap())
}

#[test]
fn discovery_finds_attribute_registered_modules() {
    let registry = registry();
    assert!(registry.contains(Alpha::MODULE_ID));
    assert!(registry.contains(Beta::MODULE_ID));
    assert_eq!(registry.get("alpha").unwrap().id(), "alpha");
}

// Beta has the higher priority number but is referenced by Alpha: the start
// order still follows priority, and wiring happens before any start.
#[test]
fn injects_sibling_before_start() {
    let yaml = r"
modules:
  - id: beta
    priority: 200
  - id: alpha
    priority: 100
    config:
      greeting: hi
      retries: 3
    inject:
      - target: beta
        slot: sibling
";
    let mut orchestrator = OrchestratorBuilder::new(registry())
        .build_from_str(yaml, Format::Yaml)
        .unwrap();
    orchestrator.startup().unwrap();

    assert_eq!(orchestrator.components().ids(), ["alpha", "beta"]);
    let alpha = orchestrator.component::<Alpha>("alpha").unwrap();
    let beta = orchestrator.component::<Beta>("beta").unwrap();
    assert!(Arc::ptr_eq(&alpha.sibling.get().unwrap(), &beta));
    assert!(alpha.saw_sibling.load(Ordering::SeqCst), "sibling is wired before alpha starts");
    assert!(!alpha.saw_sibling_running.load(Ordering::SeqCst), "beta starts after alpha");
    assert_eq!(alpha.config.greeting, "hi");
    assert_eq!(alpha.config.retries, 3);

    let config = orchestrator.bound_config::<AlphaConfig>("alpha").unwrap();
    assert!(Arc::ptr_eq(&config, &alpha.config));

    orchestrator.shutdown();
    assert_eq!(beta.stopped.load(Ordering::SeqCst), 1);
}

#[test]
fn start_handler_sees_an_already_running_sibling() {
    let definitions = DefinitionSet::new(vec![
        Definition::new("alpha").with_priority(2).inject("beta", "sibling"),
        Definition::new("beta").with_priority(1),
    ]);
    let mut orchestrator = OrchestratorBuilder::new(registry()).build(definitions);
    orchestrator.startup().unwrap();

    let alpha = orchestrator.component::<Alpha>("alpha").unwrap();
    assert!(alpha.saw_sibling_running.load(Ordering::SeqCst));
    orchestrator.shutdown();
}

#[test]
fn field_and_setter_slots_receive_the_same_instance() {
    let definitions = DefinitionSet::new(vec![
        Definition::new("alpha")
            .inject("beta", "sibling")
            .inject("beta", "observer"),
        Definition::new("beta"),
    ]);
    let mut orchestrator = OrchestratorBuilder::new(registry()).build(definitions);
    orchestrator.startup().unwrap();

    let alpha = orchestrator.component::<Alpha>("alpha").unwrap();
    let from_field = alpha.sibling.get().unwrap();
    let from_setter = alpha.observer.lock().clone().unwrap();
    assert!(Arc::ptr_eq(&from_field, &from_setter));
    orchestrator.shutdown();
}

#[test]
fn renamed_field_slot_and_mutual_references() {
    let definitions = DefinitionSet::new(vec![
        Definition::new("alpha").inject("beta", "sibling"),
        Definition::new("beta").inject("alpha", "partner"),
    ]);
    let mut orchestrator = OrchestratorBuilder::new(registry()).build(definitions);
    orchestrator.startup().unwrap();

    let alpha = orchestrator.component::<Alpha>("alpha").unwrap();
    let beta = orchestrator.component::<Beta>("beta").unwrap();
    assert!(Arc::ptr_eq(&beta.alpha.get().unwrap(), &alpha));
    assert!(Arc::ptr_eq(&alpha.sibling.get().unwrap(), &beta));
    orchestrator.shutdown();
}

#[test]
fn targets_match_names_and_the_first_definition_wins() {
    let definitions = DefinitionSet::new(vec![
        Definition::new("alpha")
            .with_priority(1)
            .inject("backup", "sibling")
            .inject("beta", "observer"),
        Definition::new("beta").with_priority(2).with_name("primary"),
        Definition::new("beta").with_priority(3).with_name("backup"),
    ]);
    let mut orchestrator = OrchestratorBuilder::new(registry()).build(definitions);
    orchestrator.startup().unwrap();

    let alpha = orchestrator.component::<Alpha>("alpha").unwrap();
    let wired = alpha.sibling.get().unwrap();
    let backup = orchestrator
        .components()
        .iter()
        .find(|w| w.definition().name.as_deref() == Some("backup"))
        .unwrap()
        .instance()
        .downcast::<Beta>()
        .unwrap();
    assert!(Arc::ptr_eq(&wired, &backup));

    let primary = orchestrator.component::<Beta>("beta").unwrap();
    let observed = alpha.observer.lock().clone().unwrap();
    assert!(Arc::ptr_eq(&observed, &primary), "id shared by two definitions resolves to the first");
    assert!(!Arc::ptr_eq(&primary, &backup));
    orchestrator.shutdown();
}

#[test]
fn unknown_config_key_aborts_before_anything_starts() {
    let definitions = DefinitionSet::new(vec![
        Definition::new("beta").with_priority(1),
        Definition::new("alpha")
            .with_priority(2)
            .with_config(bootkit::Value::map().with("greetng", "typo")),
    ]);
    let mut orchestrator = OrchestratorBuilder::new(registry()).build(definitions);

    let err = orchestrator.startup().unwrap_err();
    let StartupError::ConfigBind { module, source } = &err else {
        panic!("expected a config error, got {err}");
    };
    assert_eq!(module, "alpha");
    assert!(matches!(source, bootkit::BindError::UnknownField { key, .. } if key == "greetng"));
    assert_eq!(err.module(), Some("alpha"));
    assert!(orchestrator.components().iter().all(|w| w.state() == State::None));
}

#[test]
fn disabled_definitions_are_skipped() {
    let definitions = DefinitionSet::new(vec![Definition::new("alpha"), Definition::new("beta").disabled()]);
    let mut orchestrator = OrchestratorBuilder::new(registry()).build(definitions);
    orchestrator.startup().unwrap();

    assert!(orchestrator.get_definition("beta").is_some());
    assert!(orchestrator.get_component_instance("beta").is_none());
    assert_eq!(orchestrator.components().len(), 1);
    orchestrator.shutdown();
}

#[test]
fn reference_to_a_disabled_module_is_not_found() {
    let definitions = DefinitionSet::new(vec![
        Definition::new("alpha").inject("beta", "sibling"),
        Definition::new("beta").disabled(),
    ]);
    let mut orchestrator = OrchestratorBuilder::new(registry()).build(definitions);

    let err = orchestrator.startup().unwrap_err();
    assert!(matches!(
        err,
        StartupError::Injection(InjectionError::ReferenceNotFound { ref requester, ref target })
            if requester == "alpha" && target == "beta"
    ));
}

#[test]
fn unknown_slot_is_not_accessible() {
    let definitions = DefinitionSet::new(vec![
        Definition::new("alpha").inject("beta", "no-such-slot"),
        Definition::new("beta"),
    ]);
    let mut orchestrator = OrchestratorBuilder::new(registry()).build(definitions);

    let err = orchestrator.startup().unwrap_err();
    assert!(matches!(
        err,
        StartupError::Injection(InjectionError::SlotNotAccessible { ref slot, .. }) if slot == "no-such-slot"
    ));
    let beta = orchestrator.component::<Beta>("beta").unwrap();
    assert_eq!(beta.started.load(Ordering::SeqCst), 0);

    orchestrator.shutdown();
    assert_eq!(beta.stopped.load(Ordering::SeqCst), 1, "stopped even though it never started");
}

#[test]
fn wrong_target_type_is_a_slot_mismatch() {
    let definitions = DefinitionSet::new(vec![
        Definition::new("alpha").inject("alpha", "sibling"),
    ]);
    let mut orchestrator = OrchestratorBuilder::new(registry()).build(definitions);

    let err = orchestrator.startup().unwrap_err();
    let StartupError::Injection(InjectionError::SlotTypeMismatch { slot, source, .. }) = err else {
        panic!("expected a slot type mismatch");
    };
    assert_eq!(slot, "sibling");
    assert!(matches!(source, SlotError::TypeMismatch { .. }));
}

#[test]
fn hooks_observe_pre_start_and_stopping() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let on_start = seen.clone();
    let on_stop = seen.clone();
    let mut orchestrator = OrchestratorBuilder::new(registry())
        .with_startup_hook(move |set| {
            on_start
                .lock()
                .extend(set.iter().map(|w| format!("start:{}:{}", w.id(), w.state())));
        })
        .with_shutdown_hook(move |set| {
            on_stop
                .lock()
                .extend(set.iter().map(|w| format!("stop:{}:{}", w.id(), w.state())));
        })
        .build(DefinitionSet::new(vec![Definition::new("beta")]));

    orchestrator.startup().unwrap();
    orchestrator.shutdown();
    orchestrator.shutdown();

    assert_eq!(*seen.lock(), ["start:beta:pre-start", "stop:beta:stopping"]);
}

#[test]
fn termination_released_from_another_thread() {
    let mut orchestrator = OrchestratorBuilder::new(registry()).build(DefinitionSet::new(vec![Definition::new("beta")]));
    orchestrator.startup().unwrap();

    let handle = orchestrator.termination();
    let notifier = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        handle.notify();
    });
    orchestrator.wait_for_termination_signal();
    notifier.join().unwrap();

    assert!(orchestrator.shutdown().is_clean());
    assert_eq!(orchestrator.state("beta"), Some(State::Stopped));
}

#[test]
fn second_startup_is_rejected() {
    let mut orchestrator = OrchestratorBuilder::new(registry()).build(DefinitionSet::new(vec![Definition::new("beta")]));
    orchestrator.startup().unwrap();
    assert!(matches!(orchestrator.startup(), Err(StartupError::AlreadyStarted)));

    let beta = orchestrator.component::<Beta>("beta").unwrap();
    assert_eq!(beta.started.load(Ordering::SeqCst), 1);
    orchestrator.shutdown();
}
