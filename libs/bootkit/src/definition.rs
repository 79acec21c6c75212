//! Module definitions: what to construct, in which order, with which config
//! and references.

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Priority given to definitions that do not set one.
pub const DEFAULT_PRIORITY: i64 = 999;

fn default_priority() -> i64 {
    DEFAULT_PRIORITY
}

/// Request to place a reference to `target` into the requester's `slot`.
///
/// `target` matches another definition's name or id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InjectionRequest {
    pub target: String,
    pub slot: String,
}

/// One module to be constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Definition {
    /// Registry key of the module's factory.
    pub id: String,
    /// Alternative name other definitions may reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Lower starts earlier and stops later.
    #[serde(default = "default_priority")]
    pub priority: i64,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub config: Value,
    #[serde(default, alias = "inject", skip_serializing_if = "Vec::is_empty")]
    pub injections: Vec<InjectionRequest>,
}

impl Definition {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            priority: DEFAULT_PRIORITY,
            disabled: false,
            config: Value::Null,
            injections: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: impl Into<Value>) -> Self {
        self.config = config.into();
        self
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Adds a `{ target, slot }` injection request.
    #[must_use]
    pub fn inject(mut self, target: impl Into<String>, slot: impl Into<String>) -> Self {
        self.injections.push(InjectionRequest {
            target: target.into(),
            slot: slot.into(),
        });
        self
    }

    /// Whether a reference to `target` designates this definition.
    #[must_use]
    pub fn answers_to(&self, target: &str) -> bool {
        self.name.as_deref() == Some(target) || self.id == target
    }
}

/// Definitions in start order: ascending priority, ties kept in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefinitionSet {
    definitions: Vec<Definition>,
}

impl DefinitionSet {
    #[must_use]
    pub fn new(mut definitions: Vec<Definition>) -> Self {
        definitions.sort_by_key(|d| d.priority);
        Self { definitions }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Definition> {
        self.definitions.iter()
    }

    /// First definition whose id equals `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Definition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    /// Definitions that are not disabled, in start order.
    pub fn enabled(&self) -> impl Iterator<Item = &Definition> {
        self.definitions.iter().filter(|d| !d.disabled)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Definition> {
        self.definitions
    }
}

impl FromIterator<Definition> for DefinitionSet {
    fn from_iter<I: IntoIterator<Item = Definition>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a DefinitionSet {
    type Item = &'a Definition;
    type IntoIter = std::slice::Iter<'a, Definition>;

    fn into_iter(self) -> Self::IntoIter {
        self.definitions.iter()
    }
}
