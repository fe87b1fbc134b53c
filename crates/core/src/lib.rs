#![deny(rust_2018_idioms)]

pub mod config;
mod listeners;
mod plugin;
mod registry;

pub use config::PluginConfig;
pub use listeners::{parse_debug_command, DebugCommand};
pub use plugin::{DebugToggle, CONFIG_FILE};
pub use registry::SessionFlagRegistry;
