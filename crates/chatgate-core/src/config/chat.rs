//! Chat response configuration

use serde::{Deserialize, Serialize};

/// Framing used for streamed chunks on the wire
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// `data: {json}\n\n`
    #[default]
    Sse,
    /// `{json}\n`
    Ndjson,
}

impl std::str::FromStr for WireFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sse" => Ok(Self::Sse),
            "ndjson" | "jsonl" => Ok(Self::Ndjson),
            other => Err(format!("unknown wire format '{}'", other)),
        }
    }
}

/// How assistant replies are produced and delivered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Stream chunks to the client instead of a single blocking reply
    pub streaming_enabled: bool,
    pub wire_format: WireFormat,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            streaming_enabled: true,
            wire_format: WireFormat::Sse,
        }
    }
}
