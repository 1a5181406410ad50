//! Board Relay Telegram bot binary.
//!
//! Start the bot with:
//! ```bash
//! board-relay --config config.json
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use relay_core::{config, AppConfig};
use relay_telegram::{version, RelayBot};
use tracing_subscriber::EnvFilter;

/// Board Relay - post Trello board activity to Telegram chats
#[derive(Parser, Debug)]
#[command(name = "board-relay")]
#[command(about = "Relays Trello board activity to Telegram chats")]
struct Args {
    /// Config file (default: $BOARD_RELAY_CONFIG, ./config.json, then the user config dir)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print version and build information
    Version,
}

/// Tracing targets of this workspace.
const RELAY_TARGETS: &[&str] = &[
    "board_relay",
    "relay_telegram",
    "relay_hub",
    "relay_channels",
    "relay_trello",
    "relay_persistence",
    "relay_core",
    "relay_models",
];

/// Filter directives for a `-v` count.
fn log_filter(verbose: u8) -> String {
    let (relay, teloxide) = match verbose {
        0 => ("info", "warn"),
        1 => ("debug", "info"),
        2 => ("trace", "debug"),
        _ => return "trace".to_string(),
    };

    let mut directives = vec!["warn".to_string(), format!("teloxide={}", teloxide)];
    directives.extend(RELAY_TARGETS.iter().map(|t| format!("{}={}", t, relay)));
    directives.join(",")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Some(Cmd::Version) = args.command {
        println!("{}", version::version_report());
        return Ok(());
    }

    config::load_env_files();

    // RUST_LOG wins over -v
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_filter(args.verbose)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config_path = config::resolve_config_path(args.config.as_deref());
    tracing::info!(path = %config_path.display(), "using config file");

    let app_config = AppConfig::load(&config_path)?;
    if let Err(e) = app_config.validate() {
        tracing::error!(error = %e, "invalid configuration");
        return Err(e.into());
    }

    let bot = RelayBot::new(app_config, &config_path)?;

    match bot.get_me().await {
        Ok(username) => {
            tracing::info!(username = %username, "Bot initialized successfully");
            println!("\n[board-relay] Bot: @{}", username);
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to get bot info");
            return Err(e.into());
        }
    }

    println!("   Send /subscribe <board> in a chat to start relaying");
    println!("   Press Ctrl+C to stop\n");

    bot.run().await?;

    Ok(())
}
