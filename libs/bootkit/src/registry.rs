//! Process-wide table of component factories, keyed by module id.
//!
//! Modules normally register through `#[bootkit::module]`, which submits a
//! [`Registrator`] to `inventory`; [`Registry::discover`] collects them. Manual
//! registration through [`Registry::register`] is equally valid.

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::binding::Bind;
use crate::component::{Component, Instance};
use crate::error::RegistryError;
use crate::inject::{Injectable, Slots};

/// Configuration object as the runtime sees it: bindable and shareable.
pub trait ConfigObject: Bind + Any + Send + Sync {
    /// Freezes the bound configuration so the component and the orchestrator
    /// can share it.
    fn into_shared(self: Box<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Bind + Any + Send + Sync> ConfigObject for T {
    fn into_shared(self: Box<Self>) -> Arc<dyn Any + Send + Sync> {
        Arc::new(*self)
    }
}

/// What a factory hands back to the orchestrator.
pub(crate) struct Constructed {
    pub(crate) instance: Instance,
    pub(crate) config: Arc<dyn Any + Send + Sync>,
    pub(crate) slots: Arc<dyn Slots>,
}

type NewConfigFn = Box<dyn Fn() -> Box<dyn ConfigObject> + Send + Sync>;
type NewInstanceFn = Box<dyn Fn(Box<dyn ConfigObject>) -> anyhow::Result<Constructed> + Send + Sync>;

/// Produces a fresh empty configuration and, from a bound one, a component.
pub struct Factory {
    id: String,
    config_type: &'static str,
    component_type: &'static str,
    new_config: NewConfigFn,
    new_instance: NewInstanceFn,
}

impl Factory {
    fn new<Cfg, C, NC, NI>(id: &str, new_config: NC, new_instance: NI) -> Self
    where
        Cfg: Bind + Any + Send + Sync,
        C: Injectable,
        NC: Fn() -> Cfg + Send + Sync + 'static,
        NI: Fn(Arc<Cfg>) -> anyhow::Result<C> + Send + Sync + 'static,
    {
        Self {
            id: id.to_owned(),
            config_type: type_name::<Cfg>(),
            component_type: type_name::<C>(),
            new_config: Box::new(move || Box::new(new_config())),
            new_instance: Box::new(move |config| {
                let shared = config.into_shared();
                let Ok(typed) = shared.clone().downcast::<Cfg>() else {
                    anyhow::bail!("configuration is not a {}", type_name::<Cfg>());
                };
                let component = Arc::new(new_instance(typed)?);
                Ok(Constructed {
                    instance: Instance::new(component),
                    config: shared,
                    slots: Arc::new(C::slot_table()),
                })
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn config_type(&self) -> &'static str {
        self.config_type
    }

    #[must_use]
    pub fn component_type(&self) -> &'static str {
        self.component_type
    }

    /// Fresh configuration holding the module's defaults.
    #[must_use]
    pub fn new_config(&self) -> Box<dyn ConfigObject> {
        (self.new_config)()
    }

    pub(crate) fn construct(&self, config: Box<dyn ConfigObject>) -> anyhow::Result<Constructed> {
        (self.new_instance)(config)
    }
}

impl std::fmt::Debug for Factory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Factory")
            .field("id", &self.id)
            .field("config", &self.config_type)
            .field("component", &self.component_type)
            .finish_non_exhaustive()
    }
}

/// Link-time registration entry submitted by `#[bootkit::module]`.
pub struct Registrator(pub fn(&Registry) -> Result<(), RegistryError>);

inventory::collect!(Registrator);

/// Module id to factory table. First registration wins.
#[derive(Default)]
pub struct Registry {
    factories: RwLock<HashMap<String, Arc<Factory>>>,
}

fn validate_id(id: &str) -> Result<(), RegistryError> {
    if id.is_empty() {
        return Err(RegistryError::invalid_id(id, "must not be empty"));
    }
    if id.chars().any(char::is_whitespace) {
        return Err(RegistryError::invalid_id(id, "must not contain whitespace"));
    }
    Ok(())
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every module linked into the binary.
    ///
    /// # Errors
    /// Propagates the first registration that fails.
    pub fn discover() -> Result<Self, RegistryError> {
        let registry = Self::new();
        registry.register_discovered()?;
        Ok(registry)
    }

    /// Runs every linked [`Registrator`] against this registry.
    ///
    /// # Errors
    /// Propagates the first registration that fails.
    pub fn register_discovered(&self) -> Result<(), RegistryError> {
        for registrator in inventory::iter::<Registrator> {
            (registrator.0)(self)?;
        }
        Ok(())
    }

    /// Associates `id` with a config factory and a component factory.
    ///
    /// Returns `false` and keeps the existing entry if `id` is already taken.
    ///
    /// # Errors
    /// [`RegistryError::InvalidId`] for an empty id or one containing whitespace.
    pub fn register<Cfg, C, NC, NI>(&self, id: &str, new_config: NC, new_instance: NI) -> Result<bool, RegistryError>
    where
        Cfg: Bind + Any + Send + Sync,
        C: Injectable,
        NC: Fn() -> Cfg + Send + Sync + 'static,
        NI: Fn(Arc<Cfg>) -> anyhow::Result<C> + Send + Sync + 'static,
    {
        validate_id(id)?;
        let mut factories = self.factories.write();
        if factories.contains_key(id) {
            debug!(module = %id, "module already registered; keeping the first factory");
            return Ok(false);
        }
        let factory = Factory::new(id, new_config, new_instance);
        debug!(module = %id, component = factory.component_type, "module registered");
        factories.insert(id.to_owned(), Arc::new(factory));
        Ok(true)
    }

    /// Removes `id`; returns whether it was present.
    pub fn unregister(&self, id: &str) -> bool {
        self.factories.write().remove(id).is_some()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<Factory>> {
        self.factories.read().get(id).cloned()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.factories.read().contains_key(id)
    }

    /// Registered ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.factories.read().keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.read().is_empty()
    }
}
