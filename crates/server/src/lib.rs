#![deny(rust_2018_idioms)]

pub mod console;
pub mod plugin;

pub use console::{Console, ConsoleCommand};
pub use plugin::{HostError, PluginManager, PluginState};
