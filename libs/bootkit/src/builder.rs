use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::Path;
use std::sync::Arc;

use crate::definition::DefinitionSet;
use crate::error::LoadError;
use crate::hooks::Hooks;
use crate::lifecycle::{ComponentSet, Orchestrator};
use crate::loader::{Format, Loader};
use crate::registry::Registry;

/// Assembles an [`Orchestrator`] from a registry, hooks and definitions.
///
/// Definitions come either ready-made ([`build`](Self::build)) or from
/// documents whose `${NAME}` placeholders are expanded from the builder's
/// variables, then from the environment.
///
/// ```no_run
/// use std::sync::Arc;
/// use bootkit::{OrchestratorBuilder, Registry};
///
/// # fn main() -> anyhow::Result<()> {
/// let mut orchestrator = OrchestratorBuilder::new(Arc::new(Registry::discover()?))
///     .with_variable("pname", "booter")
///     .forward_os_signals(true)
///     .build_from_dir("config")?;
/// orchestrator.startup()?;
/// orchestrator.wait_for_termination_signal();
/// orchestrator.shutdown();
/// # Ok(())
/// # }
/// ```
pub struct OrchestratorBuilder {
    registry: Arc<Registry>,
    hooks: Hooks,
    variables: BTreeMap<String, String>,
    forward_os_signals: bool,
}

impl OrchestratorBuilder {
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            hooks: Hooks::default(),
            variables: BTreeMap::new(),
            forward_os_signals: false,
        }
    }

    /// Runs after every module is constructed and wired, before any starts.
    #[must_use]
    pub fn with_startup_hook(mut self, hook: impl Fn(&ComponentSet) + Send + Sync + 'static) -> Self {
        self.hooks.add_startup(hook);
        self
    }

    /// Runs after every module is marked stopping, before any stops.
    #[must_use]
    pub fn with_shutdown_hook(mut self, hook: impl Fn(&ComponentSet) + Send + Sync + 'static) -> Self {
        self.hooks.add_shutdown(hook);
        self
    }

    /// Makes `${name}` expand to `value` in loaded documents. Later values
    /// replace earlier ones.
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.variables.insert(name.into(), value.to_string());
        self
    }

    /// Whether waiting for termination also listens for SIGINT and SIGTERM.
    #[must_use]
    pub fn forward_os_signals(mut self, enabled: bool) -> Self {
        self.forward_os_signals = enabled;
        self
    }

    #[must_use]
    pub fn build(self, definitions: DefinitionSet) -> Orchestrator {
        Orchestrator::new(self.registry, definitions, self.hooks, self.forward_os_signals)
    }

    /// # Errors
    /// See [`Loader::parse_str`].
    pub fn build_from_str(self, content: &str, format: Format) -> Result<Orchestrator, LoadError> {
        let definitions = self.loader().parse_str(content, format, "<inline>")?;
        Ok(self.build(DefinitionSet::new(definitions)))
    }

    /// # Errors
    /// See [`Loader::load_files`].
    pub fn build_from_files<P: AsRef<Path>>(self, paths: &[P]) -> Result<Orchestrator, LoadError> {
        let definitions = self.loader().load_files(paths)?;
        Ok(self.build(definitions))
    }

    /// # Errors
    /// See [`Loader::load_dir`].
    pub fn build_from_dir(self, dir: impl AsRef<Path>) -> Result<Orchestrator, LoadError> {
        let definitions = self.loader().load_dir(dir.as_ref())?;
        Ok(self.build(definitions))
    }

    fn loader(&self) -> Loader {
        Loader::new().with_variables(self.variables.clone())
    }
}

impl std::fmt::Debug for OrchestratorBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestratorBuilder")
            .field("modules", &self.registry.len())
            .field("hooks", &self.hooks)
            .field("variables", &self.variables)
            .field("forward_os_signals", &self.forward_os_signals)
            .finish()
    }
}
