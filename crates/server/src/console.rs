//! A line based console that plays the part of the game server: it keeps track of who
//! is online and turns commands into plugin events.

use crate::plugin::{PluginManager, PluginState};
use anyhow::{anyhow, bail, Context, Result};
use debugtoggle_plugin::event::{
    BlockBreakEvent, BlockPlaceEvent, BlockPos, PlayerChatEvent, PlayerJoinEvent,
    PlayerMoveEvent, PlayerPos, PlayerQuitEvent,
};
use debugtoggle_plugin::PlayerId;
use rustc_hash::FxHashMap;
use std::io::{self, BufRead, Write};
use std::str::FromStr;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Join(String),
    Quit(String),
    Move(String, PlayerPos),
    Chat(String, String),
    Place(String, BlockPos, String),
    Break(String, BlockPos, String),
    Enable(String),
    Disable(String),
    Reload(String),
    Status,
    Stop,
}

fn parse_num<T: FromStr>(arg: Option<&str>, what: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let arg = arg.ok_or_else(|| anyhow!("Missing {}", what))?;
    arg.parse()
        .with_context(|| format!("Invalid {}: {}", what, arg))
}

fn parse_block_args<'a>(
    mut args: impl Iterator<Item = &'a str>,
) -> Result<(String, BlockPos, String)> {
    let name = args.next().context("Missing player name")?.to_owned();
    let pos = BlockPos::new(
        parse_num(args.next(), "x")?,
        parse_num(args.next(), "y")?,
        parse_num(args.next(), "z")?,
    );
    let block = args.next().context("Missing block")?;
    let block = if block.contains(':') {
        block.to_owned()
    } else {
        format!("minecraft:{}", block)
    };
    Ok((name, pos, block))
}

impl FromStr for ConsoleCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let mut args = rest.split_whitespace();
        let name = || {
            rest.split_whitespace()
                .next()
                .map(str::to_owned)
                .ok_or_else(|| anyhow!("Usage: {} <name>", command))
        };

        Ok(match command {
            "join" => ConsoleCommand::Join(name()?),
            "quit" => ConsoleCommand::Quit(name()?),
            "enable" => ConsoleCommand::Enable(name()?),
            "disable" => ConsoleCommand::Disable(name()?),
            "reload" => ConsoleCommand::Reload(name()?),
            "move" => {
                let player = args.next().context("Missing player name")?.to_owned();
                let pos = PlayerPos::new(
                    parse_num(args.next(), "x")?,
                    parse_num(args.next(), "y")?,
                    parse_num(args.next(), "z")?,
                );
                ConsoleCommand::Move(player, pos)
            }
            "chat" => {
                let (player, message) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| anyhow!("Usage: chat <name> <message>"))?;
                ConsoleCommand::Chat(player.to_owned(), message.trim().to_owned())
            }
            "place" => {
                let (player, pos, block) = parse_block_args(args)?;
                ConsoleCommand::Place(player, pos, block)
            }
            "break" => {
                let (player, pos, block) = parse_block_args(args)?;
                ConsoleCommand::Break(player, pos, block)
            }
            "status" => ConsoleCommand::Status,
            "stop" => ConsoleCommand::Stop,
            "" => bail!("Empty command"),
            _ => bail!("Unknown command: {}", command),
        })
    }
}

struct OnlinePlayer {
    id: PlayerId,
    pos: PlayerPos,
}

pub struct Console {
    plugins: PluginManager,
    online_players: FxHashMap<String, OnlinePlayer>,
}

impl Console {
    pub fn new(plugins: PluginManager) -> Console {
        Console {
            plugins,
            online_players: FxHashMap::default(),
        }
    }

    pub fn plugins(&self) -> &PluginManager {
        &self.plugins
    }

    pub fn plugins_mut(&mut self) -> &mut PluginManager {
        &mut self.plugins
    }

    fn online(&self, username: &str) -> Result<&OnlinePlayer> {
        self.online_players
            .get(username)
            .ok_or_else(|| anyhow!("{} is not online", username))
    }

    /// Runs commands read from `input`, one per line, until `stop` or the end of input.
    /// Lines that are not valid UTF-8 or not a command are logged and skipped.
    pub fn run(&mut self, input: impl BufRead, mut output: impl Write) -> io::Result<()> {
        for line in input.lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                    warn!("Skipping unreadable line: {}", err);
                    continue;
                }
                Err(err) => return Err(err),
            };
            if line.trim().is_empty() {
                continue;
            }
            let command = match line.parse::<ConsoleCommand>() {
                Ok(command) => command,
                Err(err) => {
                    warn!("{:#}", err);
                    continue;
                }
            };
            let stop = command == ConsoleCommand::Stop;
            match self.execute(command) {
                Ok(lines) => {
                    for line in lines {
                        writeln!(output, "{}", line)?;
                    }
                }
                Err(err) => error!("{:#}", err),
            }
            if stop {
                break;
            }
        }
        Ok(())
    }

    /// Runs a single command and returns the lines a player or operator would see.
    pub fn execute(&mut self, command: ConsoleCommand) -> Result<Vec<String>> {
        let mut output = Vec::new();
        match command {
            ConsoleCommand::Join(username) => {
                if self.online_players.contains_key(&username) {
                    bail!("{} is already online", username);
                }
                let id = PlayerId::offline(&username);
                self.online_players.insert(
                    username.clone(),
                    OnlinePlayer {
                        id,
                        pos: PlayerPos::new(0.0, 64.0, 0.0),
                    },
                );
                info!("{} joined the game", username);
                let mut event = PlayerJoinEvent::new(id, &username);
                self.plugins.player_join(&mut event);
                output.push(format!("{} joined the game", username));
                for message in event.messages() {
                    output.push(format!("[to {}] {}", username, message));
                }
            }
            ConsoleCommand::Quit(username) => {
                let player = self
                    .online_players
                    .remove(&username)
                    .ok_or_else(|| anyhow!("{} is not online", username))?;
                info!("{} left the game", username);
                self.plugins
                    .player_quit(&PlayerQuitEvent::new(player.id, &username));
                output.push(format!("{} left the game", username));
            }
            ConsoleCommand::Move(username, to) => {
                let player = self
                    .online_players
                    .get_mut(&username)
                    .ok_or_else(|| anyhow!("{} is not online", username))?;
                let event = PlayerMoveEvent {
                    player: player.id,
                    from: player.pos,
                    to,
                };
                player.pos = to;
                self.plugins.player_move(&event);
            }
            ConsoleCommand::Chat(username, message) => {
                let id = self.online(&username)?.id;
                let mut event = PlayerChatEvent::new(id, &username, message);
                self.plugins.player_chat(&mut event);
                if !event.is_cancelled() {
                    info!("<{}> {}", username, event.message);
                    output.push(format!("<{}> {}", username, event.message));
                }
                for reply in event.replies() {
                    output.push(format!("[to {}] {}", username, reply));
                }
            }
            ConsoleCommand::Place(username, pos, block) => {
                let id = self.online(&username)?.id;
                let mut event = BlockPlaceEvent::new(id, pos, block);
                self.plugins.block_place(&mut event);
                if event.is_cancelled() {
                    output.push(format!("[to {}] You can't place that here", username));
                } else {
                    output.push(format!("{} placed {} at {}", username, event.block, pos));
                }
            }
            ConsoleCommand::Break(username, pos, block) => {
                let id = self.online(&username)?.id;
                let mut event = BlockBreakEvent::new(id, pos, block);
                self.plugins.block_break(&mut event);
                if event.is_cancelled() {
                    output.push(format!("[to {}] You can't break that", username));
                } else {
                    output.push(format!("{} broke {} at {}", username, event.block, pos));
                }
            }
            ConsoleCommand::Enable(name) => {
                self.plugins.enable(&name)?;
                output.push(format!("Enabled {}", name));
            }
            ConsoleCommand::Disable(name) => {
                self.plugins.disable(&name)?;
                output.push(format!("Disabled {}", name));
            }
            ConsoleCommand::Reload(name) => {
                self.plugins.reload(&name)?;
                output.push(format!("Reloaded {}", name));
            }
            ConsoleCommand::Status => {
                for (description, state) in self.plugins.plugins() {
                    let state = match state {
                        PluginState::Enabled => "enabled",
                        PluginState::Disabled => "disabled",
                    };
                    output.push(format!(
                        "{} {} ({})",
                        description.name, description.version, state
                    ));
                }
                let mut online: Vec<&str> =
                    self.online_players.keys().map(String::as_str).collect();
                online.sort_unstable();
                output.push(format!(
                    "{} online: {}",
                    online.len(),
                    online.join(", ")
                ));
            }
            ConsoleCommand::Stop => {
                self.plugins.disable_all();
            }
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> ConsoleCommand {
        line.parse().unwrap()
    }

    #[test]
    fn parse_player_commands() {
        assert_eq!(parse("join alice"), ConsoleCommand::Join("alice".into()));
        assert_eq!(parse("  quit bob "), ConsoleCommand::Quit("bob".into()));
        assert_eq!(
            parse("move alice 1 2.5 -3"),
            ConsoleCommand::Move("alice".into(), PlayerPos::new(1.0, 2.5, -3.0))
        );
        assert_eq!(
            parse("chat alice hello  world"),
            ConsoleCommand::Chat("alice".into(), "hello  world".into())
        );
    }

    #[test]
    fn tabs_separate_arguments() {
        assert_eq!(
            parse("chat alice\thi there"),
            ConsoleCommand::Chat("alice".into(), "hi there".into())
        );
        assert_eq!(parse("join\tbob"), ConsoleCommand::Join("bob".into()));
    }

    #[test]
    fn parse_block_commands() {
        assert_eq!(
            parse("place alice 1 2 3 stone"),
            ConsoleCommand::Place(
                "alice".into(),
                BlockPos::new(1, 2, 3),
                "minecraft:stone".into()
            )
        );
        assert_eq!(
            parse("break alice 0 -1 0 custom:thing"),
            ConsoleCommand::Break(
                "alice".into(),
                BlockPos::new(0, -1, 0),
                "custom:thing".into()
            )
        );
    }

    #[test]
    fn parse_errors() {
        assert!("".parse::<ConsoleCommand>().is_err());
        assert!("fly alice".parse::<ConsoleCommand>().is_err());
        assert!("join".parse::<ConsoleCommand>().is_err());
        assert!("move alice 1 two 3".parse::<ConsoleCommand>().is_err());
        assert!("place alice 1 2 3".parse::<ConsoleCommand>().is_err());
        assert!("chat alice".parse::<ConsoleCommand>().is_err());
    }

    #[test]
    fn player_must_be_online() {
        let mut console = Console::new(PluginManager::new(std::env::temp_dir()));
        assert!(console
            .execute(ConsoleCommand::Chat("alice".into(), "hi".into()))
            .is_err());

        console.execute(ConsoleCommand::Join("alice".into())).unwrap();
        assert!(console.execute(ConsoleCommand::Join("alice".into())).is_err());
        let output = console
            .execute(ConsoleCommand::Chat("alice".into(), "hi".into()))
            .unwrap();
        assert_eq!(output, ["<alice> hi"]);
    }

    #[test]
    fn run_skips_bad_lines_and_stops() {
        let mut console = Console::new(PluginManager::new(std::env::temp_dir()));
        let input: &[u8] = b"join alice\n\xff\xfe broken\nfly away\n\nchat alice hi\nstop\njoin bob\n";
        let mut output = Vec::new();

        console.run(input, &mut output).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_eq!(output, "alice joined the game\n<alice> hi\n");
    }
}
