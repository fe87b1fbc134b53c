mod block;
mod player;

pub use block::DebugBlockListener;
pub use player::{parse_debug_command, DebugCommand, DebugPlayerListener};
