//! Error types for registration, injection, startup and definition loading.

use std::path::PathBuf;

use crate::binding::BindError;

/// Factory registration failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid module id '{id}': {reason}")]
    InvalidId { id: String, reason: &'static str },
}

impl RegistryError {
    #[must_use]
    pub fn invalid_id(id: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidId { id: id.into(), reason }
    }
}

/// Why an instance could not receive a reference.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotError {
    #[error("slot expects {expected}, target is {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

/// Reference-resolution failures. Fatal to startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InjectionError {
    #[error("module '{requester}' references '{target}', which matches no enabled module")]
    ReferenceNotFound { requester: String, target: String },

    #[error("module '{requester}' has no injection slot named '{slot}'")]
    SlotNotAccessible { requester: String, slot: String },

    #[error("module '{requester}' slot '{slot}' cannot hold '{target}': {source}")]
    SlotTypeMismatch {
        requester: String,
        slot: String,
        target: String,
        #[source]
        source: SlotError,
    },
}

/// Failures of [`Orchestrator::startup`](crate::Orchestrator::startup).
///
/// Construction and start failures carry the component's own error; it is
/// rendered with its full context chain.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("startup has already been performed")]
    AlreadyStarted,

    #[error("module '{module}' is not registered")]
    ModuleNotFound { module: String },

    #[error("cannot bind config of module '{module}': {source}")]
    ConfigBind {
        module: String,
        #[source]
        source: BindError,
    },

    #[error("cannot construct module '{module}': {cause:#}")]
    Construction { module: String, cause: anyhow::Error },

    #[error(transparent)]
    Injection(#[from] InjectionError),

    #[error("module '{module}' failed to start: {cause:#}")]
    ModuleStart { module: String, cause: anyhow::Error },
}

impl StartupError {
    /// Module the failure is attributed to, if any.
    #[must_use]
    pub fn module(&self) -> Option<&str> {
        match self {
            Self::AlreadyStarted => None,
            Self::ModuleNotFound { module }
            | Self::ConfigBind { module, .. }
            | Self::Construction { module, .. }
            | Self::ModuleStart { module, .. } => Some(module),
            Self::Injection(
                InjectionError::ReferenceNotFound { requester, .. }
                | InjectionError::SlotNotAccessible { requester, .. }
                | InjectionError::SlotTypeMismatch { requester, .. },
            ) => Some(requester),
        }
    }
}

/// Definition-document loading failures.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{}' has no supported extension (yaml, yml, json)", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("invalid YAML in {origin}: {message}")]
    Yaml { origin: String, message: String },

    #[error("invalid JSON in {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{origin}: variable '{name}' is not set and has no default")]
    UnresolvedVariable { origin: String, name: String },

    #[error("{origin}: module definition has an empty id")]
    EmptyId { origin: String },
}
