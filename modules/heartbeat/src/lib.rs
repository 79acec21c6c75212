// === MODULE DEFINITION ===
pub mod module;
pub use module::HeartbeatModule;

// === CONFIGURATION ===
pub mod config;
pub use config::HeartbeatConfig;
