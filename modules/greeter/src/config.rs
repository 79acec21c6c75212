use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use bootkit::Bind;

/// Configuration for the greeter module.
#[derive(Clone, Bind)]
pub struct GreeterConfig {
    pub greeting: String,
    pub audience: Vec<String>,
    pub format: FormatConfig,
    /// Pause between two greetings.
    pub pause: Duration,
    /// Secret handshake per audience member. Never logged.
    pub handshakes: HashMap<String, String>,
}

/// How a greeting is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Bind)]
pub struct FormatConfig {
    pub shout: bool,
    pub punctuation: String,
    /// Greetings longer than this are truncated.
    pub max_width: Option<usize>,
}

impl Default for GreeterConfig {
    fn default() -> Self {
        Self {
            greeting: "Hello".to_owned(),
            audience: vec!["world".to_owned()],
            format: FormatConfig::default(),
            pause: Duration::ZERO,
            handshakes: HashMap::new(),
        }
    }
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            shout: false,
            punctuation: "!".to_owned(),
            max_width: None,
        }
    }
}

impl fmt::Debug for GreeterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreeterConfig")
            .field("greeting", &self.greeting)
            .field("audience", &self.audience)
            .field("format", &self.format)
            .field("pause", &self.pause)
            .field(
                "handshakes",
                &self
                    .handshakes
                    .keys()
                    .map(|k| (k.as_str(), "[REDACTED]"))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
