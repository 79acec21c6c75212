use tracing::debug;

use crate::lifecycle::ComponentSet;

/// Callback run with every enabled component, in start order.
pub type Hook = Box<dyn Fn(&ComponentSet) + Send + Sync>;

/// Startup and shutdown hooks, each run once in registration order.
#[derive(Default)]
pub struct Hooks {
    startup: Vec<Hook>,
    shutdown: Vec<Hook>,
}

impl Hooks {
    pub fn add_startup(&mut self, hook: impl Fn(&ComponentSet) + Send + Sync + 'static) {
        self.startup.push(Box::new(hook));
    }

    pub fn add_shutdown(&mut self, hook: impl Fn(&ComponentSet) + Send + Sync + 'static) {
        self.shutdown.push(Box::new(hook));
    }

    /// Runs and drops the startup hooks.
    pub(crate) fn run_startup(&mut self, components: &ComponentSet) {
        run("startup", std::mem::take(&mut self.startup), components);
    }

    /// Runs and drops the shutdown hooks.
    pub(crate) fn run_shutdown(&mut self, components: &ComponentSet) {
        run("shutdown", std::mem::take(&mut self.shutdown), components);
    }
}

fn run(phase: &str, hooks: Vec<Hook>, components: &ComponentSet) {
    if hooks.is_empty() {
        return;
    }
    debug!(phase, count = hooks.len(), "running hooks");
    for hook in hooks {
        hook(components);
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("startup", &self.startup.len())
            .field("shutdown", &self.shutdown.len())
            .finish()
    }
}
