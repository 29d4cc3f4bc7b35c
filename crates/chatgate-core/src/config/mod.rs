//! Configuration management for chatgate

#[allow(clippy::module_inception)] // config module in config directory is intentional
mod config;
mod chat;
mod logging_config;
mod provider;
mod rate_limit;

pub mod loader;

pub use chat::{ChatConfig, WireFormat};
pub use config::Config;
pub use loader::{ConfigLoader, ConfigSource, load_config};
pub use logging_config::LoggingConfig;
pub use provider::{ProviderConfig, ProviderKind};
pub use rate_limit::{RateLimitSettings, RouteOverride, TierConfig};
