//! Host-process bootstrap helpers
//!
//! Everything a binary needs around the orchestrator itself.
//!
//! ## Modules
//!
//! - [`config`]: layered boot settings (defaults, YAML file, `BOOTKIT_*` env, CLI)
//! - [`logging`]: console and boot-log `tracing` subscriber
//! - [`host`]: pid file and the boot / wait / shutdown run loop

use std::path::PathBuf;

pub mod config;
pub mod host;
pub mod logging;

pub use config::{BOOTKIT_ENV_PREFIX, BootConfig, CliArgs};
pub use host::{run, write_pid_file};
pub use logging::{LoggingGuard, init_logging};

/// Host bootstrap failures.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("settings file '{}' does not exist", .0.display())]
    SettingsNotFound(PathBuf),

    #[error("invalid boot settings: {0}")]
    Settings(#[source] Box<figment::Error>),

    #[error("no module definition directory configured (use --config-dir or BOOTKIT_CONFIG_DIR)")]
    MissingConfigDir,

    #[error("cannot initialise logging: {0}")]
    Logging(String),

    #[error("cannot write pid file '{}': {source}", path.display())]
    PidFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
