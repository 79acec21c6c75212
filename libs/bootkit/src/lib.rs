//! Bootkit: declarative module bootstrapping.
//!
//! A host declares which modules to run in YAML or JSON definitions. Bootkit
//! binds each module's configuration into its typed config record, constructs
//! the module through its registered factory, injects references between
//! modules by name, and drives them through an ordered start / stop lifecycle.
//!
//! ```ignore
//! use std::sync::Arc;
//! use bootkit::{Bind, Component, Inject};
//!
//! #[derive(Debug, Default, Bind)]
//! pub struct GreeterConfig {
//!     pub greeting: String,
//!     pub interval: std::time::Duration,
//! }
//!
//! #[bootkit::module(id = "greeter", config = GreeterConfig)]
//! #[derive(Inject)]
//! pub struct Greeter {
//!     config: Arc<GreeterConfig>,
//!     #[inject]
//!     clock: Inject<Clock>,
//! }
//!
//! impl Greeter {
//!     fn new(config: Arc<GreeterConfig>) -> anyhow::Result<Self> {
//!         Ok(Self { config, clock: Inject::new() })
//!     }
//! }
//!
//! impl Component for Greeter {
//!     fn start(&self) -> anyhow::Result<()> {
//!         tracing::info!(greeting = %self.config.greeting, "hello");
//!         Ok(())
//!     }
//! }
//! ```

// Lets the generated code refer to `::bootkit` from inside this crate too.
extern crate self as bootkit;

pub mod binding;
pub mod builder;
pub mod component;
pub mod definition;
pub mod error;
pub mod hooks;
pub mod inject;
pub mod lifecycle;
pub mod loader;
pub mod registry;
pub mod termination;
pub mod value;

#[cfg(feature = "bootstrap")]
pub mod bootstrap;

pub use binding::{Bind, BindError, FieldPath, NoConfig, bind_value};
pub use builder::OrchestratorBuilder;
pub use component::{Component, Instance};
pub use definition::{DEFAULT_PRIORITY, Definition, DefinitionSet, InjectionRequest};
pub use error::{InjectionError, LoadError, RegistryError, SlotError, StartupError};
pub use hooks::Hook;
pub use inject::{Inject, Injectable, SlotTable};
pub use lifecycle::{ComponentSet, ComponentWrapper, Orchestrator, ShutdownReport, State, StopFailure};
pub use loader::{Format, Loader};
pub use registry::{Factory, Registrator, Registry};
pub use termination::Termination;
pub use value::Value;

#[cfg(feature = "signals")]
pub use termination::forward_os_signals;

// Derives and the module attribute share names with the traits they implement.
pub use bootkit_macros::{Bind, Inject, module};

// Re-exported so `#[bootkit::module]` expansions need no direct dependency.
pub use inventory;
