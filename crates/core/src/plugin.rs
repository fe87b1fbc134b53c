use crate::config::PluginConfig;
use crate::listeners::{DebugBlockListener, DebugPlayerListener};
use crate::registry::SessionFlagRegistry;
use debugtoggle_plugin::{
    plugin_description, ListenerId, PlayerId, Plugin, PluginDescription, PluginError,
    PluginServer,
};
use std::mem;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

pub const CONFIG_FILE: &str = "config.toml";

struct Registered<L> {
    id: ListenerId,
    // Kept so the listener lives exactly as long as the enable cycle that created it.
    _listener: Arc<L>,
}

/// Everything acquired by `on_enable`. Dropping it releases all of it.
struct EnabledState {
    config: Arc<PluginConfig>,
    flags: SessionFlagRegistry,
    player_listener: Registered<DebugPlayerListener>,
    block_listener: Registered<DebugBlockListener>,
}

enum Lifecycle {
    Disabled,
    Enabled(EnabledState),
}

/// The plugin. Tracks which players have debugging turned on for as long as it stays
/// enabled; flags do not survive a disable.
pub struct DebugToggle {
    description: PluginDescription,
    state: RwLock<Lifecycle>,
}

impl DebugToggle {
    pub fn new() -> Arc<DebugToggle> {
        Arc::new(DebugToggle {
            description: plugin_description!(
                name: "DebugToggle",
                version: env!("CARGO_PKG_VERSION"),
                authors: env!("CARGO_PKG_AUTHORS"),
                description: env!("CARGO_PKG_DESCRIPTION"),
            ),
            state: RwLock::new(Lifecycle::Disabled),
        })
    }

    fn read_state(&self) -> RwLockReadGuard<'_, Lifecycle> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, Lifecycle> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_enabled(&self) -> bool {
        matches!(*self.read_state(), Lifecycle::Enabled(_))
    }

    /// Whether `player` has debugging turned on. Always `false` while disabled.
    pub fn is_debugging(&self, player: PlayerId) -> bool {
        match &*self.read_state() {
            Lifecycle::Enabled(state) => state.flags.is_debugging(player),
            Lifecycle::Disabled => false,
        }
    }

    pub fn set_debugging(&self, player: PlayerId, value: bool) {
        match &*self.read_state() {
            Lifecycle::Enabled(state) => state.flags.set_debugging(player, value),
            Lifecycle::Disabled => {
                warn!("Dropped debugging flag for {} while disabled", player)
            }
        }
    }

    /// Flips the flag for `player` and returns the new value.
    pub fn toggle_debugging(&self, player: PlayerId) -> bool {
        match &*self.read_state() {
            Lifecycle::Enabled(state) => state.flags.toggle_debugging(player),
            Lifecycle::Disabled => {
                warn!("Dropped debugging toggle for {} while disabled", player);
                false
            }
        }
    }

    pub(crate) fn forget(&self, player: PlayerId) {
        if let Lifecycle::Enabled(state) = &*self.read_state() {
            if state.flags.forget(player) {
                debug!("Forgot debugging flag for {}", player);
            }
        }
    }

    /// The number of players with a stored flag in the current enable cycle.
    pub fn tracked_players(&self) -> usize {
        match &*self.read_state() {
            Lifecycle::Enabled(state) => state.flags.len(),
            Lifecycle::Disabled => 0,
        }
    }

    /// The config loaded by the current enable cycle.
    pub fn config(&self) -> Option<Arc<PluginConfig>> {
        match &*self.read_state() {
            Lifecycle::Enabled(state) => Some(Arc::clone(&state.config)),
            Lifecycle::Disabled => None,
        }
    }

    /// The subscriptions made by the current enable cycle, player listener first.
    pub fn listener_ids(&self) -> Option<(ListenerId, ListenerId)> {
        match &*self.read_state() {
            Lifecycle::Enabled(state) => {
                Some((state.player_listener.id, state.block_listener.id))
            }
            Lifecycle::Disabled => None,
        }
    }
}

impl Plugin for DebugToggle {
    fn description(&self) -> &PluginDescription {
        &self.description
    }

    fn on_enable(self: Arc<Self>, server: &mut dyn PluginServer) -> Result<(), PluginError> {
        let config = Arc::new(PluginConfig::load(&server.data_folder().join(CONFIG_FILE))?);

        let player_listener = Arc::new(DebugPlayerListener::new(
            Arc::downgrade(&self),
            Arc::clone(&config),
        ));
        let player_listener = Registered {
            id: server.register_player_listener(player_listener.clone())?,
            _listener: player_listener,
        };

        let block_listener = Arc::new(DebugBlockListener::new(
            Arc::downgrade(&self),
            Arc::clone(&config),
        ));
        let block_listener = Registered {
            id: server.register_block_listener(block_listener.clone())?,
            _listener: block_listener,
        };

        *self.write_state() = Lifecycle::Enabled(EnabledState {
            config,
            flags: SessionFlagRegistry::new(),
            player_listener,
            block_listener,
        });

        info!(
            "{} version {} is enabled!",
            self.description.name, self.description.version
        );
        Ok(())
    }

    fn on_disable(&self) {
        let previous = mem::replace(&mut *self.write_state(), Lifecycle::Disabled);
        match previous {
            Lifecycle::Enabled(state) => {
                debug!("Discarding {} debugging flags", state.flags.len());
                drop(state);
                info!("{} is disabled. Goodbye world!", self.description.name);
            }
            Lifecycle::Disabled => warn!("{} was disabled twice", self.description.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use debugtoggle_plugin::event::{BlockListener, PlayerListener};
    use std::path::{Path, PathBuf};

    struct FakeServer {
        data_folder: PathBuf,
        player_listeners: Vec<Arc<dyn PlayerListener>>,
        block_listeners: Vec<Arc<dyn BlockListener>>,
        fail_block_registration: bool,
    }

    impl FakeServer {
        fn new(name: &str) -> FakeServer {
            let data_folder = std::env::temp_dir()
                .join(format!("debugtoggle-plugin-{}-{}", name, std::process::id()));
            std::fs::create_dir_all(&data_folder).unwrap();
            FakeServer {
                data_folder,
                player_listeners: Vec::new(),
                block_listeners: Vec::new(),
                fail_block_registration: false,
            }
        }
    }

    impl Drop for FakeServer {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.data_folder);
        }
    }

    impl PluginServer for FakeServer {
        fn data_folder(&self) -> &Path {
            &self.data_folder
        }

        fn register_player_listener(
            &mut self,
            listener: Arc<dyn PlayerListener>,
        ) -> Result<ListenerId, PluginError> {
            self.player_listeners.push(listener);
            Ok(ListenerId(self.player_listeners.len() as u32))
        }

        fn register_block_listener(
            &mut self,
            listener: Arc<dyn BlockListener>,
        ) -> Result<ListenerId, PluginError> {
            if self.fail_block_registration {
                return Err(PluginError::registration("block", "refused"));
            }
            self.block_listeners.push(listener);
            Ok(ListenerId(100 + self.block_listeners.len() as u32))
        }
    }

    #[test]
    fn starts_disabled() {
        let plugin = DebugToggle::new();
        assert!(!plugin.is_enabled());
        assert!(!plugin.is_debugging(PlayerId(1)));
        assert!(plugin.config().is_none());
    }

    #[test]
    fn enable_registers_both_listeners() {
        let mut server = FakeServer::new("register");
        let plugin = DebugToggle::new();
        Arc::clone(&plugin).on_enable(&mut server).unwrap();

        assert!(plugin.is_enabled());
        assert_eq!(server.player_listeners.len(), 1);
        assert_eq!(server.block_listeners.len(), 1);
        assert_eq!(plugin.listener_ids(), Some((ListenerId(1), ListenerId(101))));
        assert!(server.data_folder.join(CONFIG_FILE).exists());
    }

    #[test]
    fn flags_reset_across_cycles() {
        let mut server = FakeServer::new("cycle");
        let plugin = DebugToggle::new();
        let a = PlayerId(1);
        let b = PlayerId(2);

        Arc::clone(&plugin).on_enable(&mut server).unwrap();
        plugin.set_debugging(a, true);
        assert!(plugin.is_debugging(a));
        assert!(!plugin.is_debugging(b));

        plugin.on_disable();
        assert!(!plugin.is_enabled());
        assert!(!plugin.is_debugging(a));

        Arc::clone(&plugin).on_enable(&mut server).unwrap();
        assert!(!plugin.is_debugging(a));
        assert_eq!(plugin.tracked_players(), 0);
    }

    #[test]
    fn writes_while_disabled_are_dropped() {
        let plugin = DebugToggle::new();
        plugin.set_debugging(PlayerId(1), true);
        assert!(!plugin.toggle_debugging(PlayerId(1)));
        assert!(!plugin.is_debugging(PlayerId(1)));
    }

    #[test]
    fn failed_registration_leaves_plugin_disabled() {
        let mut server = FakeServer::new("fail");
        server.fail_block_registration = true;
        let plugin = DebugToggle::new();

        let err = Arc::clone(&plugin).on_enable(&mut server).unwrap_err();
        assert!(matches!(err, PluginError::Registration { listener: "block", .. }));
        assert!(!plugin.is_enabled());
    }

    #[test]
    fn listeners_do_not_keep_plugin_alive() {
        let mut server = FakeServer::new("weak");
        let plugin = DebugToggle::new();
        Arc::clone(&plugin).on_enable(&mut server).unwrap();
        plugin.on_disable();

        assert_eq!(Arc::strong_count(&plugin), 1);
    }
}
