use debugtoggle_plugin::event::{
    BlockBreakEvent, BlockListener, BlockPlaceEvent, PlayerChatEvent, PlayerJoinEvent,
    PlayerListener, PlayerMoveEvent, PlayerQuitEvent,
};
use debugtoggle_plugin::{ListenerId, Plugin, PluginDescription, PluginError, PluginServer};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum HostError {
    #[error("No plugin named {0} is loaded")]
    UnknownPlugin(String),
    #[error("A plugin named {0} is already loaded")]
    DuplicatePlugin(String),
    #[error("Plugin {0} is already enabled")]
    AlreadyEnabled(String),
    #[error("Plugin {0} is not enabled")]
    NotEnabled(String),
    #[error("Could not create the data folder for {name}")]
    DataFolder {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("Plugin {name} failed to enable")]
    Enable {
        name: String,
        #[source]
        source: PluginError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    Disabled,
    Enabled,
}

struct LoadedPlugin {
    plugin: Arc<dyn Plugin>,
    state: PluginState,
}

impl LoadedPlugin {
    fn description(&self) -> &PluginDescription {
        self.plugin.description()
    }
}

struct Subscription<L: ?Sized> {
    id: ListenerId,
    /// Index of the plugin that registered this listener
    owner: usize,
    listener: Arc<L>,
}

/// The [`PluginServer`] handed to a plugin while it is being enabled. Registrations are
/// only committed to the manager once `on_enable` returns successfully.
struct EnableContext {
    data_folder: PathBuf,
    owner: usize,
    next_listener_id: u32,
    player_listeners: Vec<Subscription<dyn PlayerListener>>,
    block_listeners: Vec<Subscription<dyn BlockListener>>,
}

impl EnableContext {
    fn next_id(&mut self) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        id
    }
}

impl PluginServer for EnableContext {
    fn data_folder(&self) -> &Path {
        &self.data_folder
    }

    fn register_player_listener(
        &mut self,
        listener: Arc<dyn PlayerListener>,
    ) -> Result<ListenerId, PluginError> {
        let id = self.next_id();
        self.player_listeners.push(Subscription {
            id,
            owner: self.owner,
            listener,
        });
        Ok(id)
    }

    fn register_block_listener(
        &mut self,
        listener: Arc<dyn BlockListener>,
    ) -> Result<ListenerId, PluginError> {
        let id = self.next_id();
        self.block_listeners.push(Subscription {
            id,
            owner: self.owner,
            listener,
        });
        Ok(id)
    }
}

/// Owns the loaded plugins and every listener they subscribed. Events are dispatched
/// synchronously, in registration order, and only to listeners of enabled plugins.
pub struct PluginManager {
    plugins_dir: PathBuf,
    plugins: Vec<LoadedPlugin>,
    player_listeners: Vec<Subscription<dyn PlayerListener>>,
    block_listeners: Vec<Subscription<dyn BlockListener>>,
    next_listener_id: u32,
}

impl PluginManager {
    pub fn new(plugins_dir: impl Into<PathBuf>) -> PluginManager {
        PluginManager {
            plugins_dir: plugins_dir.into(),
            plugins: Vec::new(),
            player_listeners: Vec::new(),
            block_listeners: Vec::new(),
            next_listener_id: 0,
        }
    }

    fn find(&self, name: &str) -> Result<usize, HostError> {
        self.plugins
            .iter()
            .position(|p| p.description().name == name)
            .ok_or_else(|| HostError::UnknownPlugin(name.to_owned()))
    }

    /// Adds a plugin in the disabled state.
    pub fn load(&mut self, plugin: Arc<dyn Plugin>) -> Result<(), HostError> {
        let description = *plugin.description();
        if self.find(description.name).is_ok() {
            return Err(HostError::DuplicatePlugin(description.name.to_owned()));
        }
        info!(
            "Loading plugin {}, version {}",
            description.name, description.version
        );
        self.plugins.push(LoadedPlugin {
            plugin,
            state: PluginState::Disabled,
        });
        Ok(())
    }

    pub fn enable(&mut self, name: &str) -> Result<(), HostError> {
        let idx = self.find(name)?;
        let entry = &self.plugins[idx];
        if entry.state == PluginState::Enabled {
            return Err(HostError::AlreadyEnabled(name.to_owned()));
        }

        let data_folder = self.plugins_dir.join(name);
        fs::create_dir_all(&data_folder).map_err(|source| HostError::DataFolder {
            name: name.to_owned(),
            source,
        })?;

        let mut ctx = EnableContext {
            data_folder,
            owner: idx,
            next_listener_id: self.next_listener_id,
            player_listeners: Vec::new(),
            block_listeners: Vec::new(),
        };
        if let Err(source) = Arc::clone(&entry.plugin).on_enable(&mut ctx) {
            error!("Could not enable {}: {}", name, source);
            return Err(HostError::Enable {
                name: name.to_owned(),
                source,
            });
        }

        debug!(
            "{} registered {} player and {} block listeners",
            name,
            ctx.player_listeners.len(),
            ctx.block_listeners.len()
        );
        self.next_listener_id = ctx.next_listener_id;
        self.player_listeners.append(&mut ctx.player_listeners);
        self.block_listeners.append(&mut ctx.block_listeners);
        self.plugins[idx].state = PluginState::Enabled;
        Ok(())
    }

    /// Disables the plugin and drops every listener it registered.
    pub fn disable(&mut self, name: &str) -> Result<(), HostError> {
        let idx = self.find(name)?;
        if self.plugins[idx].state != PluginState::Enabled {
            return Err(HostError::NotEnabled(name.to_owned()));
        }
        self.disable_idx(idx);
        Ok(())
    }

    fn disable_idx(&mut self, idx: usize) {
        let entry = &mut self.plugins[idx];
        entry.plugin.on_disable();
        entry.state = PluginState::Disabled;
        self.player_listeners.retain(|s| s.owner != idx);
        self.block_listeners.retain(|s| s.owner != idx);
    }

    pub fn reload(&mut self, name: &str) -> Result<(), HostError> {
        self.disable(name)?;
        self.enable(name)
    }

    /// Enables every loaded plugin that is not enabled yet. Plugins that fail to enable
    /// are logged and left disabled.
    pub fn enable_all(&mut self) -> usize {
        let names: Vec<&'static str> = self
            .plugins
            .iter()
            .filter(|p| p.state == PluginState::Disabled)
            .map(|p| p.description().name)
            .collect();
        names
            .into_iter()
            .filter(|name| self.enable(name).is_ok())
            .count()
    }

    /// Disables plugins in the reverse order they were loaded.
    pub fn disable_all(&mut self) {
        for idx in (0..self.plugins.len()).rev() {
            if self.plugins[idx].state == PluginState::Enabled {
                self.disable_idx(idx);
            }
        }
    }

    pub fn state(&self, name: &str) -> Option<PluginState> {
        self.find(name).ok().map(|idx| self.plugins[idx].state)
    }

    pub fn plugins(&self) -> impl Iterator<Item = (&PluginDescription, PluginState)> {
        self.plugins.iter().map(|p| (p.description(), p.state))
    }

    /// Ids of every live subscription, player listeners first.
    pub fn listener_ids(&self) -> Vec<ListenerId> {
        self.player_listeners
            .iter()
            .map(|s| s.id)
            .chain(self.block_listeners.iter().map(|s| s.id))
            .collect()
    }

    pub fn player_join(&self, event: &mut PlayerJoinEvent) {
        for s in &self.player_listeners {
            s.listener.on_player_join(event);
        }
    }

    pub fn player_quit(&self, event: &PlayerQuitEvent) {
        for s in &self.player_listeners {
            s.listener.on_player_quit(event);
        }
    }

    pub fn player_move(&self, event: &PlayerMoveEvent) {
        for s in &self.player_listeners {
            s.listener.on_player_move(event);
        }
    }

    pub fn player_chat(&self, event: &mut PlayerChatEvent) {
        for s in &self.player_listeners {
            s.listener.on_player_chat(event);
        }
    }

    pub fn block_place(&self, event: &mut BlockPlaceEvent) {
        for s in &self.block_listeners {
            s.listener.on_block_place(event);
        }
    }

    pub fn block_break(&self, event: &mut BlockBreakEvent) {
        for s in &self.block_listeners {
            s.listener.on_block_break(event);
        }
    }
}

impl Drop for PluginManager {
    fn drop(&mut self) {
        self.disable_all();
    }
}
