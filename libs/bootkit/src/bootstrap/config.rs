//! Boot settings of the host process.
//!
//! Sources are merged in this order, later ones winning:
//! 1. [`BootConfig::default`]
//! 2. the YAML settings file given with `--settings`
//! 3. `BOOTKIT_*` environment variables (e.g. `BOOTKIT_LOG_LEVEL`)
//! 4. explicit command-line values in [`CliArgs`]

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format as _, Serialized, Yaml};
use serde::{Deserialize, Serialize};

use super::BootstrapError;

/// Prefix of environment variables that override boot settings.
pub const BOOTKIT_ENV_PREFIX: &str = "BOOTKIT_";

const ENV_KEYS: [&str; 5] = ["config_dir", "pname", "pid_file", "bootlog", "log_level"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BootConfig {
    /// Directory holding the module definition documents.
    pub config_dir: Option<PathBuf>,
    /// Process name, exposed to definitions as `${pname}`.
    pub pname: String,
    /// File receiving the process id.
    pub pid_file: Option<PathBuf>,
    /// Extra plain-text log file.
    pub bootlog: Option<PathBuf>,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            config_dir: None,
            pname: "booter".to_owned(),
            pid_file: None,
            bootlog: None,
            log_level: "info".to_owned(),
        }
    }
}

/// Command-line overrides. `None` leaves the layered value untouched.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub settings: Option<PathBuf>,
    pub config_dir: Option<PathBuf>,
    pub pname: Option<String>,
    pub pid_file: Option<PathBuf>,
    pub bootlog: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl BootConfig {
    /// Merges every source into the effective settings.
    ///
    /// # Errors
    /// A settings file that is missing or malformed, or values of the wrong
    /// type in the environment.
    pub fn load(cli: &CliArgs) -> Result<Self, BootstrapError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        if let Some(path) = &cli.settings {
            if !path.is_file() {
                return Err(BootstrapError::SettingsNotFound(path.clone()));
            }
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(Env::prefixed(BOOTKIT_ENV_PREFIX).only(&ENV_KEYS));

        let mut config: Self = figment.extract().map_err(|e| BootstrapError::Settings(Box::new(e)))?;
        config.apply_cli(cli);
        Ok(config)
    }

    fn apply_cli(&mut self, cli: &CliArgs) {
        if let Some(dir) = &cli.config_dir {
            self.config_dir = Some(dir.clone());
        }
        if let Some(pname) = &cli.pname {
            self.pname.clone_from(pname);
        }
        if let Some(pid_file) = &cli.pid_file {
            self.pid_file = Some(pid_file.clone());
        }
        if let Some(bootlog) = &cli.bootlog {
            self.bootlog = Some(bootlog.clone());
        }
        if let Some(level) = &cli.log_level {
            self.log_level.clone_from(level);
        }
    }

    /// Definition directory, required to boot.
    ///
    /// # Errors
    /// [`BootstrapError::MissingConfigDir`] when no source set it.
    pub fn require_config_dir(&self) -> Result<&Path, BootstrapError> {
        self.config_dir.as_deref().ok_or(BootstrapError::MissingConfigDir)
    }
}
