//! Podcast series and episodes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

/// A podcast series the user is subscribed to.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodcastSeries {
    #[serde(default)]
    pub series_id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_num_episodes: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_preferences: Option<SeriesUserPreferences>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Per-user subscription state attached to a series.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesUserPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscribed: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_download: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify_on_new_episode: Option<bool>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A single podcast episode.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodcastEpisode {
    #[serde(default)]
    pub episode_id: String,

    #[serde(default)]
    pub series_id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_millis: Option<u64>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_timestamp_millis: Option<i64>,

    #[serde(default)]
    pub deleted: bool,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}
