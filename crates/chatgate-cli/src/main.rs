//! Chatgate operator CLI
//!
//! Offline tools around the chatgate core:
//!
//! - `chatgate config show|validate` inspects the merged configuration
//! - `chatgate replay <capture>` pushes a recorded backend stream through
//!   the streaming pipeline and writes the wire events to stdout
//! - `chatgate probe` exercises the configured rate-limit tiers
//!
//! Set `RUST_LOG=debug` for verbose logging. Logs go to stderr so replayed
//! wire output stays clean.

mod args;
mod commands;
mod console;
mod logging;
mod router;

use args::Cli;
use chatgate_core::config::load_config;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // A broken config is reported by the command itself; log with defaults meanwhile
    let logging = load_config(cli.config_path().as_deref())
        .map(|config| config.logging)
        .unwrap_or_default();
    logging::init(&logging, cli.verbose);

    router::route(cli).await
}
