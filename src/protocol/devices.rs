//! Registered devices and account configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

/// A device registered to the account.
///
/// Streaming requires presenting the ID of a registered mobile device;
/// accounts are limited in how many devices they may register, so stale
/// ones are deauthorized through the management endpoint.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    /// Device ID. Android IDs are hex prefixed with `0x`; iOS IDs are
    /// prefixed `ios:`.
    #[serde(default)]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,

    /// `ANDROID`, `IOS`, or `DESKTOP_APP`.
    #[serde(default, rename = "type")]
    pub kind: String,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed_time_ms: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smart_phone: Option<bool>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl DeviceInfo {
    /// Whether this device's ID can be presented for streaming.
    #[must_use]
    pub fn is_mobile(&self) -> bool {
        self.kind == "ANDROID" || self.kind == "IOS"
    }

    /// The ID in the form the streaming endpoint expects: Android IDs are
    /// stripped of their `0x` prefix, other IDs pass through unchanged.
    #[must_use]
    pub fn stream_id(&self) -> &str {
        self.id.strip_prefix("0x").unwrap_or(&self.id)
    }
}

/// Response envelope of the configuration endpoint. Entries arrive under
/// `data.entries`, not the usual `data.items`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ConfigList {
    #[serde(default)]
    pub data: ConfigListData,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ConfigListData {
    #[serde(default)]
    pub entries: Vec<ConfigEntry>,
}

/// One key-value entry of the account configuration listing.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigEntry {
    #[serde(default)]
    pub key: String,

    /// All values are transmitted as strings, booleans included.
    #[serde(default)]
    pub value: String,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}
