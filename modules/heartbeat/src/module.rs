use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;

use bootkit::{Component, Inject, Termination};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::HeartbeatConfig;

/// Heartbeat module: counts beats on a background thread while running.
#[bootkit::module(id = "heartbeat", config = HeartbeatConfig, ctor = HeartbeatModule::new)]
#[derive(Inject)]
pub struct HeartbeatModule {
    config: Arc<HeartbeatConfig>,
    beats: Arc<AtomicU64>,
    halt: Termination,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl HeartbeatModule {
    /// # Errors
    /// A zero interval.
    pub fn new(config: Arc<HeartbeatConfig>) -> anyhow::Result<Self> {
        if config.interval.is_zero() {
            anyhow::bail!("heartbeat interval must be positive");
        }
        Ok(Self {
            config,
            beats: Arc::new(AtomicU64::new(0)),
            halt: Termination::new(),
            worker: Mutex::new(None),
        })
    }

    /// Beats counted so far.
    #[must_use]
    pub fn beats(&self) -> u64 {
        self.beats.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.config.label
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.worker.lock().is_some()
    }
}

impl Component for HeartbeatModule {
    fn start(&self) -> anyhow::Result<()> {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            anyhow::bail!("heartbeat '{}' is already running", self.config.label);
        }

        let interval = self.config.interval;
        let label = self.config.label.clone();
        let beats = self.beats.clone();
        let halt = self.halt.clone();
        let handle = std::thread::Builder::new()
            .name(format!("heartbeat-{label}"))
            .spawn(move || {
                while !halt.wait_timeout(interval) {
                    let beat = beats.fetch_add(1, Ordering::Relaxed) + 1;
                    debug!(label = %label, beat, "beat");
                }
            })?;
        *worker = Some(handle);

        info!(label = %self.config.label, interval = ?self.config.interval, "heartbeat started");
        Ok(())
    }

    fn stop(&self) -> anyhow::Result<()> {
        let Some(handle) = self.worker.lock().take() else {
            return Ok(());
        };
        self.halt.notify();
        handle
            .join()
            .map_err(|_| anyhow::anyhow!("heartbeat '{}' worker panicked", self.config.label))?;
        info!(label = %self.config.label, beats = self.beats(), "heartbeat stopped");
        Ok(())
    }
}
