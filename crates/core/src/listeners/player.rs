use crate::config::PluginConfig;
use crate::plugin::DebugToggle;
use debugtoggle_plugin::event::{
    PlayerChatEvent, PlayerJoinEvent, PlayerListener, PlayerMoveEvent, PlayerQuitEvent,
};
use std::sync::{Arc, Weak};
use tracing::{info, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugCommand {
    Toggle,
    Set(bool),
}

/// Parses a chat message as the debug command. Returns `None` if the message is not
/// the command at all and `Some(Err(usage))` if the arguments are wrong.
pub fn parse_debug_command(message: &str, command: &str) -> Option<Result<DebugCommand, String>> {
    let mut args = message.split_whitespace();
    if args.next()? != command {
        return None;
    }
    let parsed = match (args.next(), args.next()) {
        (None, _) => Ok(DebugCommand::Toggle),
        (Some("on" | "true"), None) => Ok(DebugCommand::Set(true)),
        (Some("off" | "false"), None) => Ok(DebugCommand::Set(false)),
        _ => Err(format!("Usage: {} [on|off]", command)),
    };
    Some(parsed)
}

pub struct DebugPlayerListener {
    plugin: Weak<DebugToggle>,
    config: Arc<PluginConfig>,
}

impl DebugPlayerListener {
    pub fn new(plugin: Weak<DebugToggle>, config: Arc<PluginConfig>) -> DebugPlayerListener {
        DebugPlayerListener { plugin, config }
    }
}

impl PlayerListener for DebugPlayerListener {
    fn on_player_join(&self, event: &mut PlayerJoinEvent) {
        if !self.config.announce_on_join {
            return;
        }
        let Some(plugin) = self.plugin.upgrade() else {
            return;
        };
        if plugin.is_debugging(event.player) {
            event.send_message(format!(
                "Debugging is still on. Use {} off to turn it off.",
                self.config.debug_command
            ));
        }
    }

    fn on_player_quit(&self, event: &PlayerQuitEvent) {
        if !self.config.forget_on_quit {
            return;
        }
        if let Some(plugin) = self.plugin.upgrade() {
            plugin.forget(event.player);
        }
    }

    fn on_player_move(&self, event: &PlayerMoveEvent) {
        let Some(plugin) = self.plugin.upgrade() else {
            return;
        };
        if plugin.is_debugging(event.player) {
            trace!(player = %event.player, "Moved from {:?} to {:?}", event.from, event.to);
        }
    }

    fn on_player_chat(&self, event: &mut PlayerChatEvent) {
        let Some(command) = parse_debug_command(&event.message, &self.config.debug_command) else {
            return;
        };
        event.set_cancelled(true);
        let command = match command {
            Ok(command) => command,
            Err(usage) => {
                event.reply(usage);
                return;
            }
        };
        let Some(plugin) = self.plugin.upgrade() else {
            return;
        };

        let value = match command {
            DebugCommand::Toggle => plugin.toggle_debugging(event.player),
            DebugCommand::Set(value) => {
                plugin.set_debugging(event.player, value);
                value
            }
        };
        let state = if value { "on" } else { "off" };
        info!("{} turned debugging {}", event.username, state);
        event.reply(format!("Debugging is now {}.", state));
    }
}
