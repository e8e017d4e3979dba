//! Playlists and playlist entries.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use super::tracks::Track;

/// A playlist in the user's library.
///
/// Entries are not inlined; they arrive on their own feed keyed by
/// `playlist_id` (see [`PlaylistEntry`]) or, for shared playlists, through
/// the shared-entry endpoint addressed by [`Playlist::share_token`].
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// `USER_GENERATED` for owned playlists, `SHARED` for subscriptions.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_controlled: Option<bool>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_timestamp: Option<i64>,

    #[serde(default)]
    pub deleted: bool,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// One position in a playlist.
///
/// Ordering between entries is by the lexicographic `absolute_position`
/// string, not by feed order.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistEntry {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub playlist_id: String,

    /// The track this entry refers to. Library IDs and store IDs both
    /// occur here.
    #[serde(default)]
    pub track_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absolute_position: Option<String>,

    /// Inlined track metadata, present for store tracks on shared feeds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<Box<Track>>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_timestamp: Option<i64>,

    #[serde(default)]
    pub deleted: bool,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Body of a playlist create mutation.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistCreate {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// `PUBLIC` or `PRIVATE`.
    pub share_state: String,

    #[serde(rename = "type")]
    pub kind: &'static str,

    pub creation_timestamp: &'static str,

    pub last_modified_timestamp: &'static str,
}

impl PlaylistCreate {
    #[must_use]
    pub fn new(name: String, description: Option<String>, public: bool) -> Self {
        Self {
            name,
            description,
            share_state: if public { "PUBLIC" } else { "PRIVATE" }.to_owned(),
            kind: "USER_GENERATED",
            // The service fills these in; `-1` means "now".
            creation_timestamp: "-1",
            last_modified_timestamp: "0",
        }
    }
}

/// Body of a playlist update mutation. Only the provided fields change.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistUpdate {
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_state: Option<String>,
}

/// Body of a playlist entry create mutation.
///
/// `preceding_entry_id` and `following_entry_id` position the new entry;
/// both absent appends to the end of the playlist.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistEntryCreate {
    /// Client-chosen UUID, echoed back in the mutation response.
    pub client_id: String,

    pub creation_timestamp: &'static str,

    pub deleted: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub following_entry_id: Option<String>,

    pub last_modified_timestamp: &'static str,

    pub playlist_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub preceding_entry_id: Option<String>,

    pub source: &'static str,

    pub track_id: String,
}

impl PlaylistEntryCreate {
    #[must_use]
    pub fn new(client_id: String, playlist_id: String, track_id: String) -> Self {
        // Store track IDs start with `T`; source 2 marks a store track.
        let source = if track_id.starts_with('T') { "2" } else { "1" };

        Self {
            client_id,
            creation_timestamp: "-1",
            deleted: false,
            following_entry_id: None,
            last_modified_timestamp: "0",
            playlist_id,
            preceding_entry_id: None,
            source,
            track_id,
        }
    }
}
