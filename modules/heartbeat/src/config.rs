use std::time::Duration;

use bootkit::Bind;

/// Configuration for the heartbeat module.
///
/// ```yaml
/// config:
///   interval: 500ms
///   label: api
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Bind)]
pub struct HeartbeatConfig {
    /// Time between beats. Accepts `ms`, `s`, `m`, `h` and `d` suffixes, or
    /// plain nanoseconds.
    pub interval: Duration,
    /// Tag attached to every beat in the logs.
    pub label: String,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            label: "heartbeat".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bootkit::{BindError, Value, bind_value};

    #[test]
    fn binds_suffixed_interval() {
        let mut config = HeartbeatConfig::default();
        bind_value(&mut config, &Value::map().with("interval", "250ms").with("Label", "api")).unwrap();

        assert_eq!(config.interval, Duration::from_millis(250));
        assert_eq!(config.label, "api");
    }

    #[test]
    fn keeps_defaults_for_absent_keys() {
        let mut config = HeartbeatConfig::default();
        bind_value(&mut config, &Value::map().with("label", "db")).unwrap();
        assert_eq!(config.interval, Duration::from_secs(5));
    }

    #[test]
    fn rejects_unknown_keys() {
        let mut config = HeartbeatConfig::default();
        let err = bind_value(&mut config, &Value::map().with("period", "1s")).unwrap_err();
        assert!(matches!(err, BindError::UnknownField { ref key, .. } if key == "period"));
    }
}
