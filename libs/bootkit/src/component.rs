use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

/// A unit managed by the orchestrator.
///
/// Instances are shared behind `Arc` and may be referenced by other
/// components, so all lifecycle methods take `&self`. Components that mutate
/// state on start or stop use interior mutability.
pub trait Component: Any + Send + Sync {
    /// Called once, after every reference has been injected and the startup
    /// hooks have run.
    ///
    /// # Errors
    /// Any error aborts startup; components after this one are never started.
    fn start(&self) -> anyhow::Result<()>;

    /// Called once during shutdown, in reverse start order, and only if
    /// [`start`](Self::start) was attempted.
    ///
    /// # Errors
    /// Failures are logged and reported; they do not stop the remaining
    /// components from being stopped.
    fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Type-erased handle to a constructed component.
///
/// Keeps the concrete type reachable so injection slots and host code can
/// recover `Arc<C>` pointing at the very same allocation.
#[derive(Clone)]
pub struct Instance {
    component: Arc<dyn Component>,
    any: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Instance {
    #[must_use]
    pub fn new<C: Component>(component: Arc<C>) -> Self {
        Self {
            component: component.clone(),
            any: component,
            type_name: type_name::<C>(),
        }
    }

    #[must_use]
    pub fn component(&self) -> &dyn Component {
        self.component.as_ref()
    }

    /// Concrete component, if it is a `C`.
    #[must_use]
    pub fn downcast<C: Component>(&self) -> Option<Arc<C>> {
        self.any.clone().downcast::<C>().ok()
    }

    #[must_use]
    pub fn is<C: Component>(&self) -> bool {
        self.any.is::<C>()
    }

    /// Rust type name of the concrete component.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether both handles point at the same component.
    #[must_use]
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.any, &other.any)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance").field("type", &self.type_name).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe;

    impl Component for Probe {
        fn start(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct Other;

    impl Component for Other {
        fn start(&self) -> anyhow::Result<()> {
            anyhow::bail!("never started")
        }
    }

    #[test]
    fn downcast_returns_the_same_allocation() {
        let probe = Arc::new(Probe);
        let instance = Instance::new(probe.clone());

        let back = instance.downcast::<Probe>().unwrap();
        assert!(Arc::ptr_eq(&probe, &back));
        assert!(instance.is::<Probe>());
        assert!(instance.downcast::<Other>().is_none());
        assert!(instance.type_name().ends_with("Probe"));
    }

    #[test]
    fn ptr_eq_tracks_identity_not_type() {
        let a = Instance::new(Arc::new(Probe));
        let b = a.clone();
        let c = Instance::new(Arc::new(Probe));
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }

    #[test]
    fn stop_defaults_to_ok() {
        let instance = Instance::new(Arc::new(Other));
        assert!(instance.component().stop().is_ok());
        assert!(instance.component().start().is_err());
    }
}
