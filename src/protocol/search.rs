//! Search results and suggestions.

use std::collections::HashMap;

use serde::Deserialize;

use super::{
    playlists::Playlist,
    podcasts::{PodcastEpisode, PodcastSeries},
    stations::Station,
    tracks::{Album, Artist, Track},
};

/// Raw search response: one cluster per result type.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub cluster_detail: Vec<SearchCluster>,
}

/// One result cluster, e.g. all matching albums.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCluster {
    #[serde(default)]
    pub cluster: Option<ClusterInfo>,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub entries: Vec<SearchEntry>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterInfo {
    #[serde(default)]
    pub category: Option<String>,

    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// One search hit. The populated field depends on the entry's `type`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEntry {
    /// `1` track, `2` artist, `3` album, `4` playlist, `6` station,
    /// `8` podcast series.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    #[serde(default)]
    pub track: Option<Track>,

    #[serde(default)]
    pub artist: Option<Artist>,

    #[serde(default)]
    pub album: Option<Album>,

    #[serde(default)]
    pub playlist: Option<Playlist>,

    #[serde(default)]
    pub station: Option<Station>,

    #[serde(default)]
    pub series: Option<PodcastSeries>,

    #[serde(default)]
    pub episode: Option<PodcastEpisode>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Search results fanned out by type, so callers need not pick apart
/// clusters themselves.
#[derive(Clone, Debug, Default)]
pub struct SearchResults {
    pub tracks: Vec<Track>,
    pub artists: Vec<Artist>,
    pub albums: Vec<Album>,
    pub playlists: Vec<Playlist>,
    pub stations: Vec<Station>,
    pub podcast_series: Vec<PodcastSeries>,
    pub podcast_episodes: Vec<PodcastEpisode>,
}

impl From<SearchResponse> for SearchResults {
    fn from(response: SearchResponse) -> Self {
        let mut results = Self::default();

        for cluster in response.cluster_detail {
            for entry in cluster.entries {
                if let Some(track) = entry.track {
                    results.tracks.push(track);
                } else if let Some(artist) = entry.artist {
                    results.artists.push(artist);
                } else if let Some(album) = entry.album {
                    results.albums.push(album);
                } else if let Some(playlist) = entry.playlist {
                    results.playlists.push(playlist);
                } else if let Some(station) = entry.station {
                    results.stations.push(station);
                } else if let Some(series) = entry.series {
                    results.podcast_series.push(series);
                } else if let Some(episode) = entry.episode {
                    results.podcast_episodes.push(episode);
                }
            }
        }

        results
    }
}

/// Response of the suggestion endpoint.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestResponse {
    #[serde(default)]
    pub suggested_queries: Vec<SuggestedQuery>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedQuery {
    #[serde(default)]
    pub suggestion_string: String,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}
