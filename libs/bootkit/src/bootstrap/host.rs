use std::path::Path;

use tracing::{error, info, warn};

use super::{BootConfig, BootstrapError};
use crate::builder::OrchestratorBuilder;

/// Writes the current process id to `path`.
///
/// # Errors
/// Any I/O failure writing the file.
pub fn write_pid_file(path: &Path) -> Result<(), BootstrapError> {
    std::fs::write(path, format!("{}\n", std::process::id())).map_err(|source| BootstrapError::PidFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Runs the host: loads the definitions, starts every module, blocks until a
/// termination request, then shuts down.
///
/// The builder receives the `pname` variable and signal forwarding before the
/// definitions are loaded.
///
/// # Errors
/// Loading or startup failures. Modules constructed before a startup failure
/// are stopped before returning.
pub fn run(builder: OrchestratorBuilder, config: &BootConfig) -> anyhow::Result<()> {
    let dir = config.require_config_dir()?;
    let mut orchestrator = builder
        .with_variable("pname", &config.pname)
        .forward_os_signals(true)
        .build_from_dir(dir)?;

    info!(pname = %config.pname, dir = %dir.display(), "booting");
    if let Err(e) = orchestrator.startup() {
        error!(error = %e, "startup failed");
        let report = orchestrator.shutdown();
        if !report.is_clean() {
            warn!(failures = report.failures().len(), "modules failed to stop after startup failure");
        }
        return Err(e.into());
    }

    orchestrator.wait_for_termination_signal();
    let report = orchestrator.shutdown();
    for failure in report.failures() {
        warn!(module = %failure.module, error = %format!("{:#}", failure.error), "stop failure");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pid_file_holds_the_process_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("booter.pid");

        write_pid_file(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.trim(), std::process::id().to_string());
    }

    #[test]
    fn pid_file_in_missing_dir_fails() {
        let err = write_pid_file(Path::new("/definitely/not/here/booter.pid")).unwrap_err();
        assert!(matches!(err, BootstrapError::PidFile { .. }));
    }
}
