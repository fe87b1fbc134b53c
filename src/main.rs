use anyhow::Result;
use clap::Parser;
use debugtoggle_core::DebugToggle;
use debugtoggle_server::{Console, PluginManager};
use std::io;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Runs the debug toggle plugin inside a console driven host.
///
/// Reads one command per line from stdin: `join <name>`, `quit <name>`,
/// `move <name> <x> <y> <z>`, `chat <name> <message>`, `place <name> <x> <y> <z> <block>`,
/// `break <name> <x> <y> <z> <block>`, `enable|disable|reload <plugin>`, `status`, `stop`.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Folder holding one data folder per plugin
    #[arg(long, default_value = "./plugins")]
    plugins_dir: PathBuf,
    /// Folder for the daily rolling log file
    #[arg(long, default_value = "./logs")]
    log_dir: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    let logfile = tracing_appender::rolling::daily(&args.log_dir, "debugtoggle.log");
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var("DEBUGTOGGLE_LOG")
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_writer(logfile.and(std::io::stdout))
        .with_env_filter(env_filter)
        .init();

    info!("Starting host...");
    let mut plugins = PluginManager::new(args.plugins_dir);
    plugins.load(DebugToggle::new())?;
    let enabled = plugins.enable_all();
    info!("Done! Enabled {} plugin(s)", enabled);

    let mut console = Console::new(plugins);
    if let Err(err) = console.run(io::stdin().lock(), io::stdout()) {
        error!("Console input failed: {}", err);
    }

    info!("Commencing graceful shutdown...");
    console.plugins_mut().disable_all();
    Ok(())
}
