// DEX API response types
//
// Models for the Cloudflare v4 JSON API as used by the DEX fleet-status
// endpoints. Every response is wrapped in `ApiEnvelope<T>`. Record fields
// decode an absent or `null` attribute as an empty string, which is a valid
// metric label value.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Decode `null` as the empty string.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ── Response Envelope ────────────────────────────────────────────────

/// Standard Cloudflare v4 response envelope.
///
/// ```json
/// { "success": true, "errors": [], "messages": [], "result": [...], "result_info": {...} }
/// ```
///
/// Only `result` and `result_info` are read; a `null` or missing `result`
/// is treated as an empty page.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub result: Option<Vec<T>>,
    #[serde(default)]
    pub result_info: Option<ResultInfo>,
}

impl<T> ApiEnvelope<T> {
    /// The records in this page (empty if the API sent none).
    pub fn into_records(self) -> Vec<T> {
        self.result.unwrap_or_default()
    }
}

/// Pagination metadata from the envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultInfo {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub total_count: Option<u32>,
}

// ── Device status ────────────────────────────────────────────────────

/// Connection state reported for a device.
///
/// Unknown states are preserved verbatim in [`Other`](Self::Other) so they
/// round-trip back to the same string. `null` decodes as [`Unknown`](Self::Unknown).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    #[default]
    Unknown,
    Other(String),
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Unknown => "",
            Self::Other(raw) => raw.as_str(),
        }
    }
}

impl From<String> for ConnectionStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "connected" => Self::Connected,
            "disconnected" => Self::Disconnected,
            "" => Self::Unknown,
            _ => Self::Other(raw),
        }
    }
}

impl From<Option<String>> for ConnectionStatus {
    fn from(raw: Option<String>) -> Self {
        raw.map_or(Self::Unknown, Self::from)
    }
}

impl From<ConnectionStatus> for String {
    fn from(status: ConnectionStatus) -> Self {
        match status {
            ConnectionStatus::Other(raw) => raw,
            other => other.as_str().to_owned(),
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One device's snapshot from `dex/fleet-status/devices`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceStatus {
    #[serde(deserialize_with = "null_as_empty")]
    pub device_id: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub device_name: String,
    /// Owning user; empty for devices not enrolled to a person.
    #[serde(deserialize_with = "null_as_empty")]
    pub person_email: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub colo: String,
    /// WARP client mode (e.g. `warp+doh`, `proxy`).
    #[serde(deserialize_with = "null_as_empty")]
    pub mode: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub platform: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub version: String,
    pub status: ConnectionStatus,
    /// Point-in-time the status was observed, as sent by the API.
    #[serde(deserialize_with = "null_as_empty")]
    pub timestamp: String,
}

impl DeviceStatus {
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }
}
