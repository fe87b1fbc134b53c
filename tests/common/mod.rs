#![allow(dead_code)]

use debugtoggle_core::DebugToggle;
use debugtoggle_plugin::event::{
    BlockBreakEvent, BlockListener, BlockPlaceEvent, PlayerChatEvent, PlayerJoinEvent,
    PlayerListener, PlayerQuitEvent,
};
use debugtoggle_plugin::{
    plugin_description, ListenerId, Plugin, PluginDescription, PluginError, PluginServer,
};
use debugtoggle_server::{Console, ConsoleCommand, PluginManager};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A plugins folder under the system temp dir, removed on drop.
pub struct PluginsDir(PathBuf);

impl PluginsDir {
    pub fn new() -> PluginsDir {
        let path = std::env::temp_dir().join(format!(
            "debugtoggle-test-{}-{}",
            std::process::id(),
            DIR_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        fs::create_dir_all(&path).unwrap();
        PluginsDir(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Writes the config file a plugin will read the next time it is enabled.
    pub fn write_config(&self, plugin: &str, contents: &str) {
        let folder = self.0.join(plugin);
        fs::create_dir_all(&folder).unwrap();
        fs::write(folder.join(debugtoggle_core::CONFIG_FILE), contents).unwrap();
    }
}

impl Drop for PluginsDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

/// A console with the debug toggle plugin loaded but not yet enabled.
pub struct TestHost {
    pub console: Console,
    pub plugin: Arc<DebugToggle>,
    // Declared last so the manager is dropped before the folder is removed.
    pub dir: PluginsDir,
}

impl TestHost {
    pub fn new() -> TestHost {
        let dir = PluginsDir::new();
        let plugin = DebugToggle::new();
        let mut plugins = PluginManager::new(dir.path());
        plugins.load(plugin.clone()).unwrap();
        TestHost {
            console: Console::new(plugins),
            plugin,
            dir,
        }
    }

    pub fn enabled() -> TestHost {
        let mut host = TestHost::new();
        host.enable();
        host
    }

    pub fn enable(&mut self) {
        self.console.plugins_mut().enable("DebugToggle").unwrap();
    }

    pub fn disable(&mut self) {
        self.console.plugins_mut().disable("DebugToggle").unwrap();
    }

    /// Parses and runs a console line, panicking on failure.
    pub fn run(&mut self, line: &str) -> Vec<String> {
        let command: ConsoleCommand = line.parse().unwrap();
        self.console.execute(command).unwrap()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Join(String),
    Quit(String),
    Chat(String),
    Place(String),
    Break(String),
}

/// A plugin that records every event its listeners see.
pub struct RecordingPlugin {
    description: PluginDescription,
    pub events: Mutex<Vec<Recorded>>,
    pub enables: AtomicUsize,
    pub disables: AtomicUsize,
    pub fail_enable: bool,
}

impl RecordingPlugin {
    pub fn new(name: &'static str) -> Arc<RecordingPlugin> {
        Self::with_failure(name, false)
    }

    pub fn with_failure(name: &'static str, fail_enable: bool) -> Arc<RecordingPlugin> {
        Arc::new(RecordingPlugin {
            description: plugin_description!(
                name: name,
                version: "0.0.1",
                authors: "",
                description: "records events",
            ),
            events: Mutex::new(Vec::new()),
            enables: AtomicUsize::new(0),
            disables: AtomicUsize::new(0),
            fail_enable,
        })
    }

    pub fn take_events(&self) -> Vec<Recorded> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    fn record(&self, event: Recorded) {
        self.events.lock().unwrap().push(event);
    }
}

struct RecordingListener(Arc<RecordingPlugin>);

impl PlayerListener for RecordingListener {
    fn on_player_join(&self, event: &mut PlayerJoinEvent) {
        self.0.record(Recorded::Join(event.username.clone()));
    }

    fn on_player_quit(&self, event: &PlayerQuitEvent) {
        self.0.record(Recorded::Quit(event.username.clone()));
    }

    fn on_player_chat(&self, event: &mut PlayerChatEvent) {
        self.0.record(Recorded::Chat(event.message.clone()));
    }
}

impl BlockListener for RecordingListener {
    fn on_block_place(&self, event: &mut BlockPlaceEvent) {
        self.0.record(Recorded::Place(event.block.clone()));
    }

    fn on_block_break(&self, event: &mut BlockBreakEvent) {
        self.0.record(Recorded::Break(event.block.clone()));
    }
}

impl Plugin for RecordingPlugin {
    fn description(&self) -> &PluginDescription {
        &self.description
    }

    fn on_enable(self: Arc<Self>, server: &mut dyn PluginServer) -> Result<(), PluginError> {
        self.enables.fetch_add(1, Ordering::SeqCst);
        let listener = Arc::new(RecordingListener(Arc::clone(&self)));
        let _: ListenerId = server.register_player_listener(listener.clone())?;
        if self.fail_enable {
            return Err(PluginError::Message("refusing to enable".to_string()));
        }
        server.register_block_listener(listener)?;
        Ok(())
    }

    fn on_disable(&self) {
        self.disables.fetch_add(1, Ordering::SeqCst);
    }
}
