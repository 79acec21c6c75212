use std::sync::Arc;

use arc_swap::ArcSwapOption;
use bootkit::{Component, Inject};
use bootkit_heartbeat::HeartbeatModule;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::config::GreeterConfig;

/// Greeter module: greets every audience member on start.
///
/// Slots:
/// - `heartbeat` (field): heartbeat whose beat count is reported on start
/// - `pulse` (setter): another heartbeat reference, typically the same one
#[bootkit::module(id = "greeter", config = GreeterConfig, ctor = GreeterModule::new)]
#[derive(Inject)]
#[inject(setter(name = "pulse", with = GreeterModule::set_pulse))]
pub struct GreeterModule {
    config: Arc<GreeterConfig>,
    #[inject]
    heartbeat: Inject<HeartbeatModule>,
    pulse: ArcSwapOption<HeartbeatModule>,
    delivered: Mutex<Vec<String>>,
}

impl GreeterModule {
    /// # Errors
    /// A blank greeting.
    pub fn new(config: Arc<GreeterConfig>) -> anyhow::Result<Self> {
        if config.greeting.trim().is_empty() {
            anyhow::bail!("greeting must not be blank");
        }
        Ok(Self {
            config,
            heartbeat: Inject::new(),
            pulse: ArcSwapOption::empty(),
            delivered: Mutex::new(Vec::new()),
        })
    }

    fn set_pulse(&self, heartbeat: Arc<HeartbeatModule>) {
        if self.pulse.swap(Some(heartbeat)).is_some() {
            warn!("pulse re-wired; previous heartbeat reference dropped");
        }
    }

    #[must_use]
    pub fn config(&self) -> &GreeterConfig {
        &self.config
    }

    #[must_use]
    pub fn heartbeat(&self) -> Option<Arc<HeartbeatModule>> {
        self.heartbeat.get()
    }

    #[must_use]
    pub fn pulse(&self) -> Option<Arc<HeartbeatModule>> {
        self.pulse.load_full()
    }

    /// Greetings delivered so far, in order.
    #[must_use]
    pub fn delivered(&self) -> Vec<String> {
        self.delivered.lock().clone()
    }

    /// Renders the greeting for `name`.
    #[must_use]
    pub fn render(&self, name: &str) -> String {
        let format = &self.config.format;
        let mut text = format!("{}, {name}{}", self.config.greeting, format.punctuation);
        if format.shout {
            text = text.to_uppercase();
        }
        if let Some(width) = format.max_width
            && text.chars().count() > width
        {
            text = text.chars().take(width).collect();
        }
        text
    }
}

impl Component for GreeterModule {
    fn start(&self) -> anyhow::Result<()> {
        if self.config.audience.is_empty() {
            anyhow::bail!("greeter has nobody to greet");
        }

        match self.heartbeat.get() {
            Some(hb) => info!(label = %hb.label(), beats = hb.beats(), "greeter sees a heartbeat"),
            None => info!("greeter runs without a heartbeat"),
        }

        for (i, name) in self.config.audience.iter().enumerate() {
            if i > 0 && !self.config.pause.is_zero() {
                std::thread::sleep(self.config.pause);
            }
            let text = self.render(name);
            info!(
                to = %name,
                handshake = self.config.handshakes.contains_key(name),
                greeting = %text,
                "greeting delivered"
            );
            self.delivered.lock().push(text);
        }
        Ok(())
    }

    fn stop(&self) -> anyhow::Result<()> {
        info!(delivered = self.delivered.lock().len(), "greeter stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormatConfig;
    use tracing_test::traced_test;

    fn greeter(config: GreeterConfig) -> GreeterModule {
        GreeterModule::new(Arc::new(config)).unwrap()
    }

    #[test]
    fn blank_greeting_is_rejected() {
        let config = GreeterConfig {
            greeting: "  ".to_owned(),
            ..GreeterConfig::default()
        };
        assert!(GreeterModule::new(Arc::new(config)).is_err());
    }

    #[test]
    fn renders_with_format() {
        let g = greeter(GreeterConfig {
            format: FormatConfig {
                shout: true,
                punctuation: "?".to_owned(),
                max_width: Some(8),
            },
            ..GreeterConfig::default()
        });
        assert_eq!(g.render("bob"), "HELLO, B");
    }

    #[test]
    fn start_delivers_to_every_member() {
        let g = greeter(GreeterConfig {
            audience: vec!["ada".to_owned(), "linus".to_owned()],
            ..GreeterConfig::default()
        });
        g.start().unwrap();
        assert_eq!(g.delivered(), ["Hello, ada!", "Hello, linus!"]);
    }

    #[test]
    fn empty_audience_fails_to_start() {
        let g = greeter(GreeterConfig {
            audience: Vec::new(),
            ..GreeterConfig::default()
        });
        assert!(g.start().is_err());
        assert!(g.delivered().is_empty());
    }

    #[test]
    #[traced_test]
    fn rewiring_the_pulse_is_logged() {
        let g = greeter(GreeterConfig::default());
        let hb = || {
            Arc::new(HeartbeatModule::new(Arc::new(bootkit_heartbeat::HeartbeatConfig::default())).unwrap())
        };
        g.set_pulse(hb());
        assert!(!logs_contain("pulse re-wired"));
        g.set_pulse(hb());
        assert!(logs_contain("pulse re-wired"));
    }
}
