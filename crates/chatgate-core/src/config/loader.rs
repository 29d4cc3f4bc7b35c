//! Configuration loading from layered sources
//!
//! Sources are applied in the order they were added. A file source replaces
//! the whole configuration with the file's contents (missing keys take their
//! defaults); the environment source overrides individual fields in place.

use super::{Config, ProviderKind, WireFormat};
use crate::error::{GatewayError, GatewayResult};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix for chatgate environment variables
pub const ENV_PREFIX: &str = "CHATGATE_";

/// Source of configuration data
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// Built-in defaults
    Default,
    /// Configuration from a TOML, YAML or JSON file
    File(PathBuf),
    /// Configuration from process environment variables
    Environment,
    /// Explicit variables, used the same way as the environment
    Vars(Vec<(String, String)>),
}

/// Configuration loader with support for multiple sources
#[derive(Debug, Default)]
pub struct ConfigLoader {
    sources: Vec<ConfigSource>,
}

impl ConfigLoader {
    /// Create a new config loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a configuration source
    pub fn add_source(mut self, source: ConfigSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Add default configuration source
    pub fn with_defaults(self) -> Self {
        self.add_source(ConfigSource::Default)
    }

    /// Add a file source
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Self {
        self.add_source(ConfigSource::File(path.as_ref().to_path_buf()))
    }

    /// Add environment variables source
    pub fn with_env(self) -> Self {
        self.add_source(ConfigSource::Environment)
    }

    /// Add explicit variables
    pub fn with_vars<I, K, V>(self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.add_source(ConfigSource::Vars(
            vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        ))
    }

    /// Load configuration from all sources and validate it
    pub fn load(self) -> GatewayResult<Config> {
        let mut config = Config::default();

        for source in &self.sources {
            match source {
                ConfigSource::Default => {
                    tracing::debug!("Loading default config");
                    config = Config::default();
                }
                ConfigSource::File(path) => {
                    tracing::debug!("Loading config from file: {}", path.display());
                    config = load_from_file(path)?;
                }
                ConfigSource::Environment => {
                    tracing::debug!("Loading config from environment");
                    apply_vars(&mut config, std::env::vars())?;
                }
                ConfigSource::Vars(vars) => {
                    apply_vars(&mut config, vars.iter().cloned())?;
                }
            }
        }

        config.validate()?;
        Ok(config)
    }
}

/// Defaults, then the optional file, then the environment
pub fn load_config(path: Option<&Path>) -> GatewayResult<Config> {
    let mut loader = ConfigLoader::new().with_defaults();
    if let Some(path) = path {
        loader = loader.with_file(path);
    }
    loader.with_env().load()
}

/// Load configuration from a file
///
/// Supports JSON, TOML, and YAML formats based on file extension.
/// Returns default config if the file doesn't exist.
fn load_from_file(path: &Path) -> GatewayResult<Config> {
    if !path.exists() {
        tracing::warn!("Config file {} not found, using defaults", path.display());
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        GatewayError::config_with_context(
            format!("Failed to read config file: {}", e),
            format!("Reading configuration from '{}'", path.display()),
        )
    })?;

    let config = match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => toml::from_str(&content)?,
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
        _ => serde_json::from_str(&content).map_err(|e| {
            GatewayError::config_with_context(
                format!("Failed to parse JSON config: {}", e),
                format!("Deserializing JSON configuration from '{}'", path.display()),
            )
        })?,
    };

    Ok(config)
}

fn apply_vars<I>(config: &mut Config, vars: I) -> GatewayResult<()>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut provider_keys = Vec::new();

    for (key, value) in vars {
        if key == "ANTHROPIC_API_KEY" || key == "OPENAI_API_KEY" {
            provider_keys.push((key, value));
            continue;
        }
        let Some(name) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };

        let rl = &mut config.rate_limit;
        match name {
            "STREAMING_ENABLED" => config.chat.streaming_enabled = parse_bool(&key, &value)?,
            "WIRE_FORMAT" => {
                config.chat.wire_format = value
                    .parse::<WireFormat>()
                    .map_err(|e| GatewayError::config_with_context(e, key.clone()))?
            }
            "RATE_LIMIT_ENABLED" => rl.enabled = parse_bool(&key, &value)?,
            "SWEEP_INTERVAL" => rl.sweep_interval = parse_duration(&key, &value)?,
            "RATE_LIMIT_ADDRESS_MAX" => rl.address.max_requests = parse_u32(&key, &value)?,
            "RATE_LIMIT_ADDRESS_WINDOW" => rl.address.window = parse_duration(&key, &value)?,
            "RATE_LIMIT_IDENTITY_MAX" => rl.identity.max_requests = parse_u32(&key, &value)?,
            "RATE_LIMIT_IDENTITY_WINDOW" => rl.identity.window = parse_duration(&key, &value)?,
            "RATE_LIMIT_IDENTITY_ROUTE_MAX" => {
                rl.identity_route.max_requests = parse_u32(&key, &value)?
            }
            "RATE_LIMIT_IDENTITY_ROUTE_WINDOW" => {
                rl.identity_route.window = parse_duration(&key, &value)?
            }
            "PROVIDER" => {
                config.provider.kind = value
                    .parse::<ProviderKind>()
                    .map_err(|e| GatewayError::config_with_context(e, key.clone()))?
            }
            "MODEL" => config.provider.model = value,
            "BASE_URL" => config.provider.base_url = Some(value),
            "API_KEY" => config.provider.api_key = Some(value),
            "MAX_TOKENS" => config.provider.max_tokens = parse_u32(&key, &value)?,
            "LOG_LEVEL" => config.logging.level = value,
            "LOG_FORMAT" => config.logging.format = value,
            _ => tracing::debug!("Ignoring unknown config variable {}", key),
        }
    }

    // Provider-native keys only fill the gap left by CHATGATE_API_KEY
    if config.provider.api_key.is_none() {
        let wanted = config.provider.kind.api_key_env();
        if let Some((_, value)) = provider_keys.into_iter().find(|(k, _)| k == wanted) {
            config.provider.api_key = Some(value);
        }
    }

    Ok(())
}

fn parse_bool(key: &str, value: &str) -> GatewayResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(GatewayError::config(format!(
            "Invalid {} value '{}'",
            key, value
        ))),
    }
}

fn parse_u32(key: &str, value: &str) -> GatewayResult<u32> {
    value
        .trim()
        .parse()
        .map_err(|_| GatewayError::config(format!("Invalid {} value '{}'", key, value)))
}

fn parse_duration(key: &str, value: &str) -> GatewayResult<Duration> {
    #[derive(Deserialize)]
    struct Human(#[serde(with = "humantime_serde")] Duration);

    serde_json::from_value::<Human>(serde_json::Value::String(value.trim().to_string()))
        .map(|h| h.0)
        .map_err(|_| GatewayError::config(format!("Invalid {} duration '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_toml_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("chatgate.toml");
        fs::write(
            &path,
            r#"
            [chat]
            streaming_enabled = false

            [rate_limit.identity_route]
            window = "30s"
            max_requests = 7

            [provider]
            kind = "openai"
            model = "gpt-4o-mini"
            "#,
        )
        .unwrap();

        let config = ConfigLoader::new()
            .with_defaults()
            .with_file(&path)
            .load()
            .unwrap();

        assert!(!config.chat.streaming_enabled);
        assert_eq!(config.rate_limit.identity_route.max_requests, 7);
        assert_eq!(config.rate_limit.identity_route.window, Duration::from_secs(30));
        assert_eq!(config.provider.kind, ProviderKind::OpenAi);
        assert_eq!(config.rate_limit.address.max_requests, 100);
    }

    #[test]
    fn test_load_from_json_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("chatgate.json");
        fs::write(
            &path,
            r#"{"rate_limit": {"address": {"window": "1m", "max_requests": 3}}}"#,
        )
        .unwrap();

        let config = ConfigLoader::new().with_file(&path).load().unwrap();
        assert_eq!(config.rate_limit.address.max_requests, 3);
        assert_eq!(config.rate_limit.address.window, Duration::from_secs(60));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = ConfigLoader::new()
            .with_file("/definitely/not/here.toml")
            .load()
            .unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_vars_override_file_values() {
        let config = ConfigLoader::new()
            .with_defaults()
            .with_vars([
                ("CHATGATE_STREAMING_ENABLED", "false"),
                ("CHATGATE_RATE_LIMIT_ADDRESS_MAX", "9"),
                ("CHATGATE_RATE_LIMIT_ADDRESS_WINDOW", "2m"),
                ("CHATGATE_WIRE_FORMAT", "ndjson"),
                ("UNRELATED", "x"),
            ])
            .load()
            .unwrap();

        assert!(!config.chat.streaming_enabled);
        assert_eq!(config.chat.wire_format, WireFormat::Ndjson);
        assert_eq!(config.rate_limit.address.max_requests, 9);
        assert_eq!(config.rate_limit.address.window, Duration::from_secs(120));
    }

    #[test]
    fn test_provider_api_key_follows_kind() {
        let config = ConfigLoader::new()
            .with_vars([
                ("CHATGATE_PROVIDER", "openai"),
                ("ANTHROPIC_API_KEY", "a-key"),
                ("OPENAI_API_KEY", "o-key"),
            ])
            .load()
            .unwrap();
        assert_eq!(config.provider.api_key.as_deref(), Some("o-key"));
    }

    #[test]
    fn test_invalid_values_are_errors() {
        let bad_bool = ConfigLoader::new()
            .with_vars([("CHATGATE_STREAMING_ENABLED", "maybe")])
            .load();
        assert!(bad_bool.is_err());

        let bad_duration = ConfigLoader::new()
            .with_vars([("CHATGATE_SWEEP_INTERVAL", "soon")])
            .load();
        assert!(bad_duration.is_err());

        let zero_limit = ConfigLoader::new()
            .with_vars([("CHATGATE_RATE_LIMIT_IDENTITY_MAX", "0")])
            .load();
        assert!(zero_limit.is_err());
    }
}
