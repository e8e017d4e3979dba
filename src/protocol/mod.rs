//! Wire types for the mobile API.
//!
//! This module provides type-safe interfaces to the service's JSON
//! endpoints, handling:
//! * Paginated feed envelopes ([`Feed`])
//! * Batch mutation requests and responses ([`Mutations`], [`MutateResponses`])
//! * Library content ([`tracks`], [`playlists`], [`podcasts`], [`stations`])
//! * Search clusters ([`search`])
//! * Account devices and configuration ([`devices`])
//!
//! # Number Handling
//!
//! The protocol transmits most numbers as strings (`"durationMillis":
//! "198000"`). Fields use `serde_with::DisplayFromStr` where that applies.
//!
//! # Unknown Fields
//!
//! Entity types carry a flattened `extra` map so fields this crate does not
//! model survive a decode/re-encode round trip instead of being dropped.

pub mod devices;
pub mod playlists;
pub mod podcasts;
pub mod search;
pub mod stations;
pub mod tracks;

pub use devices::{ConfigEntry, DeviceInfo};
pub use playlists::{Playlist, PlaylistEntry};
pub use podcasts::{PodcastEpisode, PodcastSeries};
pub use search::SearchResults;
pub use stations::Station;
pub use tracks::Track;

use serde::{Deserialize, Serialize};

use crate::feed::{Page, PageToken};

/// Paginated feed envelope.
///
/// Wire format:
/// ```json
/// {
///     "kind": "sj#trackList",
///     "nextPageToken": "CpkQARjAxPHh...",
///     "data": { "items": [ ... ] }
/// }
/// ```
///
/// `nextPageToken` is absent on the final page. Unpaginated listings
/// (devices, configuration) use the same envelope without a token.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
// The derive would infer a `T: Default` bound from the defaulted fields;
// only the `FeedData<T>` container itself needs a default.
#[serde(bound(deserialize = "T: serde::Deserialize<'de>"))]
pub struct Feed<T> {
    /// Protocol kind marker, e.g. `sj#trackList`.
    #[serde(default)]
    pub kind: Option<String>,

    /// Continuation token for the next page, absent when exhausted.
    #[serde(default)]
    pub next_page_token: Option<String>,

    #[serde(default)]
    pub data: FeedData<T>,
}

/// Item container inside a [`Feed`].
#[derive(Clone, Debug, Deserialize)]
#[serde(bound(deserialize = "T: serde::Deserialize<'de>"))]
pub struct FeedData<T> {
    #[serde(default)]
    pub items: Vec<T>,
}

// Manual impl: `#[derive(Default)]` would needlessly bound `T: Default`.
impl<T> Default for FeedData<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Feed<T> {
    /// Converts the envelope into a [`Page`] for the feed iterator.
    ///
    /// The terminal flag is set when no continuation token is present.
    #[must_use]
    pub fn into_page(self) -> Page<T> {
        let next = self.next_page_token.map(PageToken::from);
        let last = next.is_none();

        Page {
            items: self.data.items,
            next,
            last,
        }
    }
}

/// Batch mutation request envelope.
///
/// Wire format:
/// ```json
/// { "mutations": [ { "create": { ... } }, { "delete": "id" } ] }
/// ```
#[derive(Clone, Debug, Serialize)]
pub struct Mutations<M> {
    pub mutations: Vec<M>,
}

impl<M> Mutations<M> {
    #[must_use]
    pub fn new(mutations: Vec<M>) -> Self {
        Self { mutations }
    }
}

/// A single mutation. Externally tagged, matching the wire shape.
#[derive(Clone, Debug, Serialize)]
pub enum Mutation<C> {
    #[serde(rename = "create")]
    Create(C),

    #[serde(rename = "update")]
    Update(C),

    /// Deletes by server ID.
    #[serde(rename = "delete")]
    Delete(String),
}

/// Batch mutation response envelope. Field names are snake_case on the
/// wire, unlike the rest of the protocol.
#[derive(Clone, Debug, Deserialize)]
pub struct MutateResponses {
    #[serde(default)]
    pub mutate_response: Vec<MutateResponse>,
}

/// Outcome of one mutation in a batch.
#[derive(Clone, Debug, Deserialize)]
pub struct MutateResponse {
    /// Server ID of the affected item, when the mutation succeeded.
    #[serde(default)]
    pub id: Option<String>,

    /// Client-chosen ID echoed back for creates.
    #[serde(default)]
    pub client_id: Option<String>,

    /// `OK` on success; anything else is a per-item failure.
    pub response_code: String,
}

impl MutateResponse {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.response_code == "OK"
    }
}

impl MutateResponses {
    /// IDs of the mutations the service acknowledged with `OK`.
    #[must_use]
    pub fn acknowledged_ids(self) -> Vec<String> {
        self.mutate_response
            .into_iter()
            .filter(MutateResponse::is_ok)
            .filter_map(|response| response.id)
            .collect()
    }
}
