//! Booter server: loads module definitions from a directory, starts them in
//! priority order and stops them on SIGINT/SIGTERM.

// Linked for their `#[bootkit::module]` registrations
extern crate bootkit_heartbeat;
extern crate bootkit_greeter;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use bootkit::bootstrap::{self, BootConfig, CliArgs};
use bootkit::{OrchestratorBuilder, Registry};
use clap::Parser;
use tracing::info;

/// Command line interface of the booter server
#[derive(Parser, Debug)]
#[command(name = "booter-server")]
#[command(about = "Starts the modules described in a definition directory")]
#[command(version)]
struct Cli {
    /// Directory with the module definition files (*.yaml, *.yml, *.json)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Process name, available to definitions as `${pname}`
    #[arg(long)]
    pname: Option<String>,

    /// Write the process id to this file
    #[arg(long = "pid")]
    pid_file: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long)]
    bootlog: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is unset
    #[arg(long)]
    log_level: Option<String>,

    /// YAML file with boot settings
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Print the registered module ids and exit
    #[arg(long)]
    list_modules: bool,
}

impl Cli {
    fn boot_args(&self) -> CliArgs {
        CliArgs {
            settings: self.settings.clone(),
            config_dir: self.config_dir.clone(),
            pname: self.pname.clone(),
            pid_file: self.pid_file.clone(),
            bootlog: self.bootlog.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = BootConfig::load(&cli.boot_args()).context("loading boot settings")?;
    let _logging = bootstrap::init_logging(&config)?;

    let registry = Registry::discover().context("registering modules")?;
    if cli.list_modules {
        for id in registry.ids() {
            println!("{id}");
        }
        return Ok(());
    }

    if let Some(pid_file) = &config.pid_file {
        bootstrap::write_pid_file(pid_file)?;
    }
    info!(
        version = env!("CARGO_PKG_VERSION"),
        modules = registry.len(),
        "booter-server starting"
    );

    let builder = OrchestratorBuilder::new(Arc::new(registry)).with_variable("version", env!("CARGO_PKG_VERSION"));
    bootstrap::run(builder, &config)
}
