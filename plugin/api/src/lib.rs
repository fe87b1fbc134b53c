//! The plugin api for the debugtoggle host.
//!
//! A plugin implements [`Plugin`]. When the host enables it, the plugin receives a
//! [`PluginServer`] through which it subscribes its listeners to player and block
//! events. Subscriptions are tied to the plugin instance and are dropped by the host
//! when the plugin is disabled, so plugins never have to unregister them by hand.

pub mod event;
mod player_id;

pub use player_id::PlayerId;

use event::{BlockListener, PlayerListener};
use std::error::Error as StdError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Name, version and authorship of a plugin, used by the host for logging and for
/// naming the plugin's data folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginDescription {
    pub name: &'static str,
    pub version: &'static str,
    pub authors: &'static str,
    pub description: &'static str,
}

/// Handle for a single event subscription, issued by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u32);

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Failed to register {listener} listener: {reason}")]
    Registration {
        listener: &'static str,
        reason: String,
    },
    #[error("Failed to load config from {}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    #[error("{0}")]
    Message(String),
}

impl PluginError {
    pub fn registration(listener: &'static str, reason: impl Into<String>) -> Self {
        PluginError::Registration {
            listener,
            reason: reason.into(),
        }
    }
}

/// The part of the host a plugin can talk to while it is being enabled.
pub trait PluginServer {
    /// The folder where this plugin keeps its config. The host creates it before
    /// enabling the plugin.
    fn data_folder(&self) -> &Path;

    fn register_player_listener(
        &mut self,
        listener: Arc<dyn PlayerListener>,
    ) -> Result<ListenerId, PluginError>;

    fn register_block_listener(
        &mut self,
        listener: Arc<dyn BlockListener>,
    ) -> Result<ListenerId, PluginError>;
}

pub trait Plugin: Send + Sync + 'static {
    fn description(&self) -> &PluginDescription;

    /// Called by the host once per load cycle, before any event is dispatched to the
    /// plugin. An error here is fatal: the plugin stays disabled and every listener it
    /// registered during this call is dropped.
    fn on_enable(self: Arc<Self>, server: &mut dyn PluginServer) -> Result<(), PluginError>;

    /// Called by the host once per load cycle, after which no more events reach the
    /// plugin's listeners.
    fn on_disable(&self);
}

/// Builds a [`PluginDescription`]. Without arguments it reads the calling crate's
/// cargo metadata.
#[macro_export]
macro_rules! plugin_description {
    () => {
        $crate::PluginDescription {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            authors: env!("CARGO_PKG_AUTHORS"),
            description: env!("CARGO_PKG_DESCRIPTION"),
        }
    };
    ($( $detail_key:ident: $detail_val:expr ),* $(,)?) => {
        $crate::PluginDescription {
            $( $detail_key: $detail_val, )*
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_from_cargo_metadata() {
        let description = plugin_description!();
        assert_eq!(description.name, "debugtoggle_plugin");
        assert_eq!(description.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn description_from_fields() {
        let description = plugin_description!(
            name: "example",
            version: "0.1",
            authors: "",
            description: "An example plugin",
        );
        assert_eq!(description.name, "example");
        assert_eq!(description.version, "0.1");
    }

    #[test]
    fn registration_error_message() {
        let err = PluginError::registration("player", "host is shutting down");
        assert_eq!(
            err.to_string(),
            "Failed to register player listener: host is shutting down"
        );
    }
}
