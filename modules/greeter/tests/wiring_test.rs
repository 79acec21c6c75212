use std::sync::Arc;
use std::time::Duration;

use bootkit::{Format, OrchestratorBuilder, Registry, State};
use bootkit_heartbeat::HeartbeatModule;
use bootkit_greeter::{GreeterConfig, GreeterModule};

const DEFINITIONS: &str = r#"
modules:
  - id: greeter
    priority: 20
    config:
      greeting: Howdy
      audience: [ada, grace]
      format:
        punctuation: "."
      handshakes:
        ada: secret
    inject:
      - target: heartbeat
        slot: heartbeat
      - target: pulse-source
        slot: pulse
  - id: heartbeat
    name: pulse-source
    priority: 10
    config:
      interval: 20ms
      label: wiring
"#;

// Greeter references the heartbeat both by id and by name; both slots must
// receive the very same instance.
#[test]
fn greeter_receives_the_running_heartbeat() {
    let registry = Arc::new(Registry::discover().unwrap());
    assert!(registry.contains(GreeterModule::MODULE_ID));
    assert!(registry.contains(HeartbeatModule::MODULE_ID));

    let mut orchestrator = OrchestratorBuilder::new(registry)
        .build_from_str(DEFINITIONS, Format::Yaml)
        .unwrap();
    orchestrator.startup().unwrap();

    let ids: Vec<&str> = orchestrator.components().ids();
    assert_eq!(ids, ["heartbeat", "greeter"], "lower priority starts first");

    let heartbeat = orchestrator.component::<HeartbeatModule>("heartbeat").unwrap();
    let greeter = orchestrator.component::<GreeterModule>("greeter").unwrap();
    assert!(heartbeat.is_running());
    assert!(Arc::ptr_eq(&greeter.heartbeat().unwrap(), &heartbeat));
    assert!(Arc::ptr_eq(&greeter.pulse().unwrap(), &heartbeat));

    assert_eq!(greeter.delivered(), ["Howdy, ada.", "Howdy, grace."]);
    let config = orchestrator.bound_config::<GreeterConfig>("greeter").unwrap();
    assert_eq!(config.handshakes.get("ada").map(String::as_str), Some("secret"));

    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while heartbeat.beats() == 0 && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(heartbeat.beats() > 0);

    let report = orchestrator.shutdown();
    assert!(report.is_clean());
    assert_eq!(report.stopped(), ["greeter", "heartbeat"]);
    assert!(!heartbeat.is_running());
    assert_eq!(orchestrator.state("greeter"), Some(State::Stopped));
}

#[test]
fn greeter_without_references_still_starts() {
    let registry = Arc::new(Registry::discover().unwrap());
    let mut orchestrator = OrchestratorBuilder::new(registry)
        .build_from_str(r#"{"modules": [{"id": "greeter"}]}"#, Format::Json)
        .unwrap();
    orchestrator.startup().unwrap();

    let greeter = orchestrator.component::<GreeterModule>("greeter").unwrap();
    assert!(greeter.heartbeat().is_none());
    assert!(greeter.pulse().is_none());
    assert_eq!(greeter.delivered(), ["Hello, world!"]);

    assert!(orchestrator.shutdown().is_clean());
}
