//! Termination latch: lets the host block until something asks it to stop.
//!
//! Notifications are coalesced. Any number of [`Termination::notify`] calls
//! before a wait release exactly one [`Termination::wait`]; the wait consumes
//! the pending notification.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

#[derive(Default)]
struct Latch {
    pending: Mutex<bool>,
    wake: Condvar,
}

/// Cloneable handle to a shared termination latch.
#[derive(Clone, Default)]
pub struct Termination {
    latch: Arc<Latch>,
}

impl Termination {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks termination as requested and wakes the waiters.
    pub fn notify(&self) {
        let mut pending = self.latch.pending.lock();
        *pending = true;
        self.latch.wake.notify_all();
    }

    /// Blocks until a notification is pending, then consumes it.
    pub fn wait(&self) {
        let mut pending = self.latch.pending.lock();
        while !*pending {
            self.latch.wake.wait(&mut pending);
        }
        *pending = false;
    }

    /// Like [`wait`](Self::wait), bounded by `timeout`. Returns whether a
    /// notification was consumed.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut pending = self.latch.pending.lock();
        if !*pending {
            let _ = self.latch.wake.wait_while_for(&mut pending, |p| !*p, timeout);
        }
        std::mem::replace(&mut *pending, false)
    }

    /// Whether a notification is waiting to be consumed.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        *self.latch.pending.lock()
    }
}

impl std::fmt::Debug for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Termination").field("pending", &self.is_pending()).finish()
    }
}

/// Forwards SIGINT and SIGTERM (Ctrl-C elsewhere) into `termination`.
///
/// Spawns a named thread driving a current-thread tokio runtime. Every signal
/// received notifies the latch; the thread lives until the process exits.
///
/// # Errors
/// Fails if the runtime or the thread cannot be created.
#[cfg(feature = "signals")]
pub fn forward_os_signals(termination: Termination) -> std::io::Result<std::thread::JoinHandle<()>> {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    std::thread::Builder::new()
        .name("bootkit-signals".to_owned())
        .spawn(move || {
            runtime.block_on(async move {
                loop {
                    match next_signal().await {
                        Ok(signal) => {
                            tracing::info!(signal, "termination signal received");
                            termination.notify();
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "signal listener stopped");
                            break;
                        }
                    }
                }
            });
        })
}

#[cfg(all(feature = "signals", unix))]
async fn next_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|()| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(all(feature = "signals", not(unix)))]
async fn next_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|()| "ctrl-c")
}
