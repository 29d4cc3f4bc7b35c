//! Command routing logic for CLI

use crate::args::{Cli, Commands, ConfigAction};
use crate::commands;

/// Route CLI commands to their respective handlers
pub async fn route(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config_path();
    let config_path = config_path.as_deref();
    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(config_path).await,
            ConfigAction::Validate => commands::config::validate(config_path).await,
        },
        Commands::Replay(args) => commands::replay::execute(config_path, &args, cli.verbose).await,
        Commands::Probe(args) => commands::probe::execute(config_path, &args).await,
    }
}
