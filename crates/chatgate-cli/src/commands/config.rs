//! Configuration management commands

use crate::console::CliConsole;
use chatgate_core::config::{TierConfig, load_config};
use std::path::Path;

/// Show the merged configuration
pub async fn show(config_file: Option<&Path>) -> anyhow::Result<()> {
    let console = CliConsole::new(true);

    console.print_header("Configuration");
    describe_source(&console, config_file);

    let config = load_config(config_file)?;
    let rendered = serde_yaml::to_string(&config)?;
    println!("{}", rendered.trim_end());
    Ok(())
}

/// Validate configuration
pub async fn validate(config_file: Option<&Path>) -> anyhow::Result<()> {
    let console = CliConsole::new(true);

    console.print_header("Configuration Validation");
    describe_source(&console, config_file);

    let config = match load_config(config_file) {
        Ok(config) => config,
        Err(e) => {
            console.error(&format!("Configuration validation failed: {e}"));
            return Err(e.into());
        }
    };
    console.success("Configuration is valid");

    console.print_separator();
    let limits = &config.rate_limit;
    console.field("Rate limiting", if limits.enabled { "enabled" } else { "disabled" });
    console.field("Address tier", describe_tier(&limits.address));
    console.field("Identity tier", describe_tier(&limits.identity));
    console.field("Identity+route tier", describe_tier(&limits.identity_route));
    console.field("Route overrides", limits.routes.len());
    console.field(
        "Replies",
        if config.chat.streaming_enabled {
            "streaming"
        } else {
            "blocking"
        },
    );
    console.field("Provider", format!("{:?} ({})", config.provider.kind, config.provider.model));
    if config.provider.api_key.is_none() {
        console.warn(&format!(
            "No API key configured; set {}",
            config.provider.kind.api_key_env()
        ));
    }

    Ok(())
}

fn describe_source(console: &CliConsole, config_file: Option<&Path>) {
    match config_file {
        Some(path) if path.exists() => {
            console.success(&format!("Loaded configuration from: {}", path.display()))
        }
        Some(path) => {
            console.warn(&format!("Configuration file not found: {}", path.display()));
            console.info("Using default configuration");
        }
        None => console.info("No configuration file; using defaults and environment"),
    }
}

fn describe_tier(tier: &TierConfig) -> String {
    format!(
        "{} requests / {}",
        tier.max_requests,
        humanize(tier.window.as_secs())
    )
}

fn humanize(secs: u64) -> String {
    match secs {
        s if s >= 3600 && s % 3600 == 0 => format!("{}h", s / 3600),
        s if s >= 60 && s % 60 == 0 => format!("{}m", s / 60),
        s => format!("{}s", s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_humanize_windows() {
        assert_eq!(humanize(900), "15m");
        assert_eq!(humanize(7200), "2h");
        assert_eq!(humanize(90), "90s");
    }

    #[test]
    fn test_describe_tier() {
        let tier = TierConfig::new(60, Duration::from_secs(60));
        assert_eq!(describe_tier(&tier), "60 requests / 1m");
    }

    #[test]
    fn test_api_key_never_rendered() {
        let mut config = chatgate_core::Config::default();
        config.provider.api_key = Some("sk-live-secret".to_string());
        let rendered = serde_yaml::to_string(&config).unwrap();
        assert!(!rendered.contains("sk-live-secret"));
    }

    #[tokio::test]
    async fn test_validate_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chatgate.toml");
        std::fs::write(&path, "[chat]\nstreaming_enabled = false\n").unwrap();
        assert!(validate(Some(path.as_path())).await.is_ok());
    }

    #[tokio::test]
    async fn test_validate_rejects_zero_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chatgate.toml");
        std::fs::write(&path, "[rate_limit.address]\nmax_requests = 0\nwindow = \"1m\"\n").unwrap();
        assert!(validate(Some(path.as_path())).await.is_err());
    }
}
