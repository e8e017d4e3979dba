//! Library and catalog tracks.

use std::{collections::HashMap, fmt};

use serde::{de, Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

/// A track in the user's library or the catalog.
///
/// Library tracks carry a server `id`; catalog tracks are addressed by
/// their `store_id` (prefixed `T`). Either may be absent depending on the
/// endpoint that produced the track.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Library ID, set for tracks in the user's library.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Catalog ID, set for store tracks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,

    /// Stable ID shared between library and catalog copies of a track.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nid: Option<String>,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub artist: String,

    #[serde(default)]
    pub album: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_artist: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artist_id: Vec<String>,

    #[serde_as(as = "DisplayFromStr")]
    #[serde(default)]
    pub duration_millis: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_number: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disc_number: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,

    /// Thumbs rating, if the user has rated the track.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub play_count: Option<u64>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_size: Option<u64>,

    /// True when the track has been removed from the library. Set on
    /// change feeds so a synchronizing client can drop it locally.
    #[serde(default)]
    pub deleted: bool,

    /// Fields this crate does not model, preserved verbatim.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Track {
    /// The ID to address this track by: the library ID when present, the
    /// catalog ID otherwise.
    #[must_use]
    pub fn any_id(&self) -> Option<&str> {
        self.id.as_deref().or(self.store_id.as_deref())
    }
}

/// Thumbs rating values as transmitted on the wire.
///
/// The service encodes ratings as the strings `"0"`, `"1"` and `"5"`; the
/// intermediate star values were never used by the mobile clients. Decoding
/// also accepts bare numbers, which occur in some responses.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Rating {
    #[default]
    NotRated,
    ThumbsDown,
    ThumbsUp,
}

impl Rating {
    /// The wire representation of this rating.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotRated => "0",
            Self::ThumbsDown => "1",
            Self::ThumbsUp => "5",
        }
    }

    fn from_number(value: u64) -> Option<Self> {
        match value {
            0 => Some(Self::NotRated),
            1 => Some(Self::ThumbsDown),
            5 => Some(Self::ThumbsUp),
            _ => None,
        }
    }
}

impl Serialize for Rating {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct RatingVisitor;

        impl de::Visitor<'_> for RatingVisitor {
            type Value = Rating;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a rating of \"0\", \"1\" or \"5\"")
            }

            fn visit_str<E>(self, value: &str) -> Result<Rating, E>
            where
                E: de::Error,
            {
                value
                    .parse()
                    .ok()
                    .and_then(Rating::from_number)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Str(value), &self))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Rating, E>
            where
                E: de::Error,
            {
                Rating::from_number(value)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Unsigned(value), &self))
            }
        }

        deserializer.deserialize_any(RatingVisitor)
    }
}

/// An album as returned by the catalog lookup endpoint, optionally with
/// its track listing inlined.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub album_id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub artist: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_artist: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artist_id: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tracks: Vec<Track>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// An artist as returned by the catalog lookup endpoint.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    pub artist_id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_bio: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub top_tracks: Vec<Track>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub albums: Vec<Album>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_artists: Vec<Artist>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}
