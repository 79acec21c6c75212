//! Ordered module lifecycle.
//!
//! Startup constructs every enabled definition in priority order, resolves
//! references, runs startup hooks, then starts components one by one. The first
//! failure aborts startup and leaves the rest untouched. Shutdown walks the
//! components in reverse and stops those whose start was attempted.
//!
//! State machine per component:
//! `None -> PreStart -> Starting -> Running -> Stopping -> Stopped`.
//! A component that was never started goes from `PreStart` (or `Stopping`)
//! straight to `Stopped` without its `stop` being called.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Once};

use tracing::{debug, info, warn};

use crate::binding::bind_value;
use crate::component::{Component, Instance};
use crate::definition::{Definition, DefinitionSet};
use crate::error::StartupError;
use crate::hooks::Hooks;
use crate::inject::{self, Slots};
use crate::registry::{Constructed, Registry};
use crate::termination::Termination;

/// Lifecycle state of one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum State {
    #[default]
    None,
    PreStart,
    Starting,
    Running,
    Stopping,
    Stopped,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::PreStart => "pre-start",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        })
    }
}

/// A constructed component together with its definition, bound config and
/// lifecycle state.
pub struct ComponentWrapper {
    definition: Definition,
    instance: Instance,
    config: Arc<dyn Any + Send + Sync>,
    slots: Arc<dyn Slots>,
    state: State,
}

impl ComponentWrapper {
    fn new(definition: Definition, constructed: Constructed) -> Self {
        Self {
            definition,
            instance: constructed.instance,
            config: constructed.config,
            slots: constructed.slots,
            state: State::None,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.definition.id
    }

    #[must_use]
    pub fn definition(&self) -> &Definition {
        &self.definition
    }

    #[must_use]
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    #[must_use]
    pub fn config(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    pub(crate) fn slots(&self) -> &dyn Slots {
        self.slots.as_ref()
    }

    pub(crate) fn answers_to(&self, target: &str) -> bool {
        self.definition.answers_to(target)
    }

    fn advance(&mut self, next: State) {
        debug!(module = %self.id(), from = %self.state, to = %next, "state change");
        self.state = next;
    }
}

impl fmt::Debug for ComponentWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentWrapper")
            .field("id", &self.definition.id)
            .field("type", &self.instance.type_name())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Enabled components in start order.
#[derive(Debug, Default)]
pub struct ComponentSet {
    wrappers: Vec<ComponentWrapper>,
}

impl ComponentSet {
    pub fn iter(&self) -> std::slice::Iter<'_, ComponentWrapper> {
        self.wrappers.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.wrappers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.wrappers.is_empty()
    }

    /// First component whose id equals `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ComponentWrapper> {
        self.wrappers.iter().find(|w| w.id() == id)
    }

    /// Concrete component registered under `id`, if it is a `C`.
    #[must_use]
    pub fn component<C: Component>(&self, id: &str) -> Option<Arc<C>> {
        self.get(id)?.instance.downcast::<C>()
    }

    /// Bound configuration of `id`, if it is a `Cfg`.
    #[must_use]
    pub fn config<Cfg: Any + Send + Sync>(&self, id: &str) -> Option<Arc<Cfg>> {
        self.get(id)?.config.clone().downcast::<Cfg>().ok()
    }

    /// Ids in start order.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.wrappers.iter().map(ComponentWrapper::id).collect()
    }
}

impl<'a> IntoIterator for &'a ComponentSet {
    type Item = &'a ComponentWrapper;
    type IntoIter = std::slice::Iter<'a, ComponentWrapper>;

    fn into_iter(self) -> Self::IntoIter {
        self.wrappers.iter()
    }
}

/// A `stop` that returned an error.
#[derive(Debug)]
pub struct StopFailure {
    pub module: String,
    pub error: anyhow::Error,
}

/// Outcome of [`Orchestrator::shutdown`].
#[derive(Debug, Default)]
pub struct ShutdownReport {
    stopped: Vec<String>,
    failures: Vec<StopFailure>,
}

impl ShutdownReport {
    /// Ids whose `stop` was called, in call order.
    #[must_use]
    pub fn stopped(&self) -> &[String] {
        &self.stopped
    }

    #[must_use]
    pub fn failures(&self) -> &[StopFailure] {
        &self.failures
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Owns the definitions, the constructed components and their lifecycle.
///
/// Built by [`OrchestratorBuilder`](crate::OrchestratorBuilder). Startup and
/// shutdown are each performed at most once.
pub struct Orchestrator {
    registry: Arc<Registry>,
    definitions: DefinitionSet,
    components: ComponentSet,
    hooks: Hooks,
    termination: Termination,
    forward_os_signals: bool,
    signals: Once,
    started: bool,
    shut_down: bool,
}

impl Orchestrator {
    pub(crate) fn new(registry: Arc<Registry>, definitions: DefinitionSet, hooks: Hooks, forward_os_signals: bool) -> Self {
        Self {
            registry,
            definitions,
            components: ComponentSet::default(),
            hooks,
            termination: Termination::new(),
            forward_os_signals,
            signals: Once::new(),
            started: false,
            shut_down: false,
        }
    }

    /// Constructs, wires and starts every enabled module.
    ///
    /// # Errors
    /// The first failure, in this order of phases: factory lookup, config
    /// binding, construction, reference resolution, start. Nothing is started
    /// unless every module was constructed and wired. On a start failure the
    /// components already started stay running until [`shutdown`](Self::shutdown).
    pub fn startup(&mut self) -> Result<(), StartupError> {
        if self.started {
            return Err(StartupError::AlreadyStarted);
        }
        self.started = true;

        self.construct_all()?;
        inject::resolve(&self.components.wrappers)?;

        for wrapper in &mut self.components.wrappers {
            wrapper.advance(State::PreStart);
        }
        self.hooks.run_startup(&self.components);

        for wrapper in &mut self.components.wrappers {
            wrapper.advance(State::Starting);
            info!(module = %wrapper.id(), "starting module");
            wrapper
                .instance
                .component()
                .start()
                .map_err(|cause| StartupError::ModuleStart {
                    module: wrapper.id().to_owned(),
                    cause,
                })?;
            wrapper.advance(State::Running);
        }

        info!(modules = self.components.len(), "startup complete");
        Ok(())
    }

    fn construct_all(&mut self) -> Result<(), StartupError> {
        info!(
            definitions = self.definitions.len(),
            enabled = self.definitions.enabled().count(),
            "constructing modules"
        );
        for definition in &self.definitions {
            info!(
                module = %definition.id,
                name = definition.name.as_deref().unwrap_or(""),
                priority = definition.priority,
                enabled = !definition.disabled,
                "module definition"
            );
            if definition.disabled {
                continue;
            }

            let factory = self
                .registry
                .get(&definition.id)
                .ok_or_else(|| StartupError::ModuleNotFound {
                    module: definition.id.clone(),
                })?;

            let mut config = factory.new_config();
            // An absent config block keeps the factory defaults.
            if !definition.config.is_null() {
                bind_value(config.as_mut(), &definition.config).map_err(|source| StartupError::ConfigBind {
                    module: definition.id.clone(),
                    source,
                })?;
            }

            let constructed = factory.construct(config).map_err(|cause| StartupError::Construction {
                module: definition.id.clone(),
                cause,
            })?;
            self.components
                .wrappers
                .push(ComponentWrapper::new(definition.clone(), constructed));
        }
        info!(components = self.components.len(), "modules constructed");
        Ok(())
    }

    /// Stops the components in reverse start order.
    ///
    /// Every component is first marked `Stopping`, then the shutdown hooks run,
    /// then `stop` is called on every constructed component, started or not. A
    /// failing `stop` is logged and recorded; the remaining components are
    /// still stopped. Calling this again is a no-op.
    pub fn shutdown(&mut self) -> ShutdownReport {
        let mut report = ShutdownReport::default();
        if self.shut_down {
            return report;
        }
        self.shut_down = true;

        info!(modules = self.components.len(), "shutting down");
        for wrapper in &mut self.components.wrappers {
            wrapper.advance(State::Stopping);
        }
        self.hooks.run_shutdown(&self.components);

        for wrapper in self.components.wrappers.iter_mut().rev() {
            info!(module = %wrapper.id(), "stopping module");
            report.stopped.push(wrapper.id().to_owned());
            if let Err(error) = wrapper.instance.component().stop() {
                warn!(module = %wrapper.id(), error = %format!("{error:#}"), "module failed to stop");
                report.failures.push(StopFailure {
                    module: wrapper.id().to_owned(),
                    error,
                });
            }
            wrapper.advance(State::Stopped);
        }

        info!(failures = report.failures.len(), "shutdown complete");
        report
    }

    /// Shuts down and terminates the process with `code`, whatever the
    /// shutdown outcome. Stop failures are logged by [`shutdown`](Self::shutdown).
    pub fn shutdown_and_exit(&mut self, code: i32) -> ! {
        std::process::exit(self.shutdown_for_exit(code))
    }

    fn shutdown_for_exit(&mut self, code: i32) -> i32 {
        let report = self.shutdown();
        info!(code, stop_failures = report.failures().len(), "exiting");
        code
    }

    /// Appends a shutdown hook; it runs after the hooks added earlier,
    /// including those given to the builder.
    pub fn add_shutdown_hook(&mut self, hook: impl Fn(&ComponentSet) + Send + Sync + 'static) {
        self.hooks.add_shutdown(hook);
    }

    /// Blocks until termination is requested.
    ///
    /// When signal forwarding is enabled, the first call installs the OS
    /// signal listener.
    pub fn wait_for_termination_signal(&self) {
        self.install_signal_forwarding();
        self.termination.wait();
    }

    /// Releases a pending or future [`wait_for_termination_signal`](Self::wait_for_termination_signal).
    pub fn notify_termination(&self) {
        self.termination.notify();
    }

    /// Handle that other threads can use to request termination.
    #[must_use]
    pub fn termination(&self) -> Termination {
        self.termination.clone()
    }

    #[cfg(feature = "signals")]
    fn install_signal_forwarding(&self) {
        if !self.forward_os_signals {
            return;
        }
        self.signals.call_once(|| {
            if let Err(e) = crate::termination::forward_os_signals(self.termination.clone()) {
                warn!(error = %e, "cannot install OS signal forwarding");
            }
        });
    }

    #[cfg(not(feature = "signals"))]
    fn install_signal_forwarding(&self) {
        if self.forward_os_signals {
            self.signals.call_once(|| warn!("OS signal forwarding requested but the `signals` feature is disabled"));
        }
    }

    #[must_use]
    pub fn definitions(&self) -> &DefinitionSet {
        &self.definitions
    }

    #[must_use]
    pub fn components(&self) -> &ComponentSet {
        &self.components
    }

    /// Definition with `id`, enabled or not.
    #[must_use]
    pub fn get_definition(&self, id: &str) -> Option<&Definition> {
        self.definitions.get(id)
    }

    #[must_use]
    pub fn get_component_instance(&self, id: &str) -> Option<&Instance> {
        self.components.get(id).map(ComponentWrapper::instance)
    }

    #[must_use]
    pub fn get_bound_config(&self, id: &str) -> Option<Arc<dyn Any + Send + Sync>> {
        self.components.get(id).map(|w| w.config.clone())
    }

    #[must_use]
    pub fn component<C: Component>(&self, id: &str) -> Option<Arc<C>> {
        self.components.component(id)
    }

    #[must_use]
    pub fn bound_config<Cfg: Any + Send + Sync>(&self, id: &str) -> Option<Arc<Cfg>> {
        self.components.config(id)
    }

    #[must_use]
    pub fn state(&self, id: &str) -> Option<State> {
        self.components.get(id).map(ComponentWrapper::state)
    }
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("definitions", &self.definitions.len())
            .field("components", &self.components)
            .field("hooks", &self.hooks)
            .field("started", &self.started)
            .field("shut_down", &self.shut_down)
            .finish_non_exhaustive()
    }
}
