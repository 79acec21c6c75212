// === MODULE DEFINITION ===
pub mod module;
pub use module::GreeterModule;

// === CONFIGURATION ===
#[doc(hidden)]
pub mod config;
pub use config::{FormatConfig, GreeterConfig};
