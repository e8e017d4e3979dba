//! Radio stations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use super::tracks::Track;

/// A radio station in the user's library.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<StationSeed>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,

    /// Track listing, populated on station feed responses that were asked
    /// for tracks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tracks: Vec<Track>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_timestamp: Option<i64>,

    #[serde(default)]
    pub deleted: bool,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// What a station is generated from. Exactly one of the ID fields is set.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationSeed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_lock_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curated_station_id: Option<String>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Request body for the station feed endpoint.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationFeedRequest {
    pub content_filter: u8,
    pub stations: Vec<StationFeedStation>,
}

/// One station's worth of the station feed request.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationFeedStation {
    pub num_entries: u32,

    pub radio_id: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recently_played: Vec<RecentlyPlayed>,
}

/// A recently played track, reported so the service avoids repeats.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentlyPlayed {
    pub id: String,

    /// 1 for library tracks, 2 for store tracks.
    #[serde(rename = "type")]
    pub kind: u8,
}

impl RecentlyPlayed {
    #[must_use]
    pub fn new(track_id: String) -> Self {
        let kind = if track_id.starts_with('T') { 2 } else { 1 };
        Self { id: track_id, kind }
    }
}

/// Response envelope of the station feed endpoint. Unlike the item feeds,
/// stations arrive under `data.stations`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct StationFeedResponse {
    #[serde(default)]
    pub data: StationFeedData,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct StationFeedData {
    #[serde(default)]
    pub stations: Vec<Station>,
}
