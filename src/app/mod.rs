//! Applications: named commands, configuration, and interface introspection

#[allow(clippy::module_inception)]
mod app;
pub mod config;
pub mod interface;

pub use app::App;
pub use config::{AppConfig, ConfigError};
pub use interface::{describe, InterfaceCommand, InterfaceDoc};
