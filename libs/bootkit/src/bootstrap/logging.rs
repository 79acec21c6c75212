use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt};

use super::{BootConfig, BootstrapError};

/// Keeps the boot log writer alive; dropping it flushes the file.
#[must_use = "dropping the guard stops the boot log writer"]
pub struct LoggingGuard {
    _bootlog: Option<WorkerGuard>,
}

/// Installs the global subscriber: console output filtered by `RUST_LOG` or
/// the configured level, plus the boot log file when one is configured.
///
/// # Errors
/// An invalid filter directive, or a subscriber already installed.
pub fn init_logging(config: &BootConfig) -> Result<LoggingGuard, BootstrapError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level).map_err(|e| BootstrapError::Logging(e.to_string()))?,
    };
    let console = fmt::layer().with_target(true).with_thread_names(true);
    let registry = Registry::default().with(filter).with(console);

    let Some(path) = &config.bootlog else {
        registry.try_init().map_err(|e| BootstrapError::Logging(e.to_string()))?;
        return Ok(LoggingGuard { _bootlog: None });
    };

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| BootstrapError::Logging(format!("boot log path '{}' has no file name", path.display())))?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    let file = fmt::layer().with_writer(writer).with_ansi(false).with_target(true);

    registry
        .with(file)
        .try_init()
        .map_err(|e| BootstrapError::Logging(e.to_string()))?;
    Ok(LoggingGuard { _bootlog: Some(guard) })
}
