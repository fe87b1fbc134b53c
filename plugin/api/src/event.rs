//! Events the host dispatches to plugin listeners.
//!
//! Events that a listener may react to with feedback for the player carry an outbox
//! of chat messages; the host delivers those after every listener has run.

use crate::PlayerId;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerPos {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl PlayerPos {
    pub fn new(x: f64, y: f64, z: f64) -> PlayerPos {
        PlayerPos { x, y, z }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> BlockPos {
        BlockPos { x, y, z }
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone)]
pub struct PlayerJoinEvent {
    pub player: PlayerId,
    pub username: String,
    messages: Vec<String>,
}

impl PlayerJoinEvent {
    pub fn new(player: PlayerId, username: impl Into<String>) -> Self {
        Self {
            player,
            username: username.into(),
            messages: Vec::new(),
        }
    }

    /// Queues a chat message for the joining player.
    pub fn send_message(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

#[derive(Debug, Clone)]
pub struct PlayerQuitEvent {
    pub player: PlayerId,
    pub username: String,
}

impl PlayerQuitEvent {
    pub fn new(player: PlayerId, username: impl Into<String>) -> Self {
        Self {
            player,
            username: username.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlayerMoveEvent {
    pub player: PlayerId,
    pub from: PlayerPos,
    pub to: PlayerPos,
}

#[derive(Debug, Clone)]
pub struct PlayerChatEvent {
    pub player: PlayerId,
    pub username: String,
    pub message: String,
    cancelled: bool,
    replies: Vec<String>,
}

impl PlayerChatEvent {
    pub fn new(player: PlayerId, username: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            player,
            username: username.into(),
            message: message.into(),
            cancelled: false,
            replies: Vec::new(),
        }
    }

    /// A cancelled chat message is not broadcast.
    pub fn set_cancelled(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Queues a chat message visible only to the sender.
    pub fn reply(&mut self, message: impl Into<String>) {
        self.replies.push(message.into());
    }

    pub fn replies(&self) -> &[String] {
        &self.replies
    }
}

#[derive(Debug, Clone)]
pub struct BlockPlaceEvent {
    pub player: PlayerId,
    pub pos: BlockPos,
    /// Namespaced block id, e.g. `minecraft:stone`
    pub block: String,
    cancelled: bool,
}

impl BlockPlaceEvent {
    pub fn new(player: PlayerId, pos: BlockPos, block: impl Into<String>) -> Self {
        Self {
            player,
            pos,
            block: block.into(),
            cancelled: false,
        }
    }

    pub fn set_cancelled(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

#[derive(Debug, Clone)]
pub struct BlockBreakEvent {
    pub player: PlayerId,
    pub pos: BlockPos,
    pub block: String,
    cancelled: bool,
}

impl BlockBreakEvent {
    pub fn new(player: PlayerId, pos: BlockPos, block: impl Into<String>) -> Self {
        Self {
            player,
            pos,
            block: block.into(),
            cancelled: false,
        }
    }

    pub fn set_cancelled(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Receives player events. Every handler defaults to doing nothing.
pub trait PlayerListener: Send + Sync {
    fn on_player_join(&self, _event: &mut PlayerJoinEvent) {}

    fn on_player_quit(&self, _event: &PlayerQuitEvent) {}

    fn on_player_move(&self, _event: &PlayerMoveEvent) {}

    fn on_player_chat(&self, _event: &mut PlayerChatEvent) {}
}

/// Receives block events. Every handler defaults to doing nothing.
pub trait BlockListener: Send + Sync {
    fn on_block_place(&self, _event: &mut BlockPlaceEvent) {}

    fn on_block_break(&self, _event: &mut BlockBreakEvent) {}
}
