use crate::config::PluginConfig;
use crate::plugin::DebugToggle;
use debugtoggle_plugin::event::{BlockBreakEvent, BlockListener, BlockPlaceEvent};
use debugtoggle_plugin::PlayerId;
use std::sync::{Arc, Weak};
use tracing::debug;

pub struct DebugBlockListener {
    plugin: Weak<DebugToggle>,
    config: Arc<PluginConfig>,
}

impl DebugBlockListener {
    pub fn new(plugin: Weak<DebugToggle>, config: Arc<PluginConfig>) -> DebugBlockListener {
        DebugBlockListener { plugin, config }
    }

    fn should_trace(&self, player: PlayerId) -> bool {
        self.config.log_block_events
            && self
                .plugin
                .upgrade()
                .is_some_and(|plugin| plugin.is_debugging(player))
    }
}

impl BlockListener for DebugBlockListener {
    fn on_block_place(&self, event: &mut BlockPlaceEvent) {
        if self.should_trace(event.player) {
            debug!(player = %event.player, "Placed {} at {}", event.block, event.pos);
        }
    }

    fn on_block_break(&self, event: &mut BlockBreakEvent) {
        if self.should_trace(event.player) {
            debug!(player = %event.player, "Broke {} at {}", event.block, event.pos);
        }
    }
}
