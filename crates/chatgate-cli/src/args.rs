//! CLI argument definitions using clap
//!
//! - chatgate config show|validate
//! - chatgate replay <capture> --provider anthropic
//! - chatgate probe --addr 10.0.0.1 --count 5

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default configuration file name used across all CLI commands.
pub const DEFAULT_CONFIG_FILE: &str = "chatgate.toml";

#[derive(Parser, Debug)]
#[command(name = "chatgate")]
#[command(about = "Chatgate - admission control and streaming replies for LLM chats")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (TOML, YAML or JSON)
    #[arg(long, global = true, env = "CHATGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Explicit `--config`, else the default file when it exists
    pub fn config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(|| {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.exists().then_some(default)
        })
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run a recorded backend stream through the streaming pipeline
    Replay(ReplayArgs),

    /// Evaluate admissions against the configured rate-limit tiers
    Probe(ProbeArgs),
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
    /// Display the merged configuration
    Show,

    /// Validate the configuration and print a summary
    Validate,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ReplayArgs {
    /// Captured stream: raw SSE or one JSON event per line
    pub capture: PathBuf,

    /// Event dialect of the capture (anthropic, openai, parts)
    #[arg(long, short)]
    pub provider: String,

    /// Chat the reply is persisted under
    #[arg(long, default_value = "replay")]
    pub chat_id: String,

    /// Message store directory (defaults to ~/.chatgate/chats)
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Wire framing written to stdout (sse, ndjson); defaults to the configured one
    #[arg(long)]
    pub format: Option<String>,

    /// Milliseconds to wait between captured events
    #[arg(long)]
    pub delay: Option<u64>,

    /// User message recorded before the replayed reply
    #[arg(long, default_value = "(replayed capture)")]
    pub prompt: String,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ProbeArgs {
    /// Caller address
    #[arg(long)]
    pub addr: String,

    /// Authenticated identity
    #[arg(long)]
    pub identity: Option<String>,

    /// Route pattern
    #[arg(long, default_value = "POST /chats/:id/messages")]
    pub route: String,

    /// Number of admissions to evaluate
    #[arg(long, short = 'n', default_value_t = 1)]
    pub count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_show_with_path() {
        let cli = Cli::try_parse_from(["chatgate", "config", "show", "--config", "gate.yaml"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("gate.yaml")));
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Show
            }
        ));
    }

    #[test]
    fn test_replay_args() {
        let cli = Cli::try_parse_from([
            "chatgate",
            "replay",
            "capture.sse",
            "--provider",
            "anthropic",
            "--chat-id",
            "c1",
            "--format",
            "ndjson",
            "--delay",
            "5",
        ])
        .unwrap();
        let Commands::Replay(args) = cli.command else {
            panic!("expected replay");
        };
        assert_eq!(args.capture, PathBuf::from("capture.sse"));
        assert_eq!(args.provider, "anthropic");
        assert_eq!(args.chat_id, "c1");
        assert_eq!(args.format.as_deref(), Some("ndjson"));
        assert_eq!(args.delay, Some(5));
        assert!(args.store.is_none());
    }

    #[test]
    fn test_replay_requires_provider() {
        assert!(Cli::try_parse_from(["chatgate", "replay", "capture.sse"]).is_err());
    }

    #[test]
    fn test_probe_defaults() {
        let cli = Cli::try_parse_from(["chatgate", "probe", "--addr", "10.0.0.1"]).unwrap();
        let Commands::Probe(args) = cli.command else {
            panic!("expected probe");
        };
        assert_eq!(args.addr, "10.0.0.1");
        assert_eq!(args.count, 1);
        assert!(args.identity.is_none());
        assert_eq!(args.route, "POST /chats/:id/messages");
    }

    #[test]
    fn test_missing_subcommand_rejected() {
        assert!(Cli::try_parse_from(["chatgate"]).is_err());
    }
}
