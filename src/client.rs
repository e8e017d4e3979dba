//! High-level mobile API client.
//!
//! [`MobileClient`] wraps a [`Session`] and exposes the service's endpoints
//! as typed methods. Collection endpoints come in pairs: an eager method
//! that realizes the whole collection, and an `_iter` method returning a
//! lazy [`Stream`] that fetches pages on demand. Both walk the same feeds;
//! the eager form is simply the lazy form drained.
//!
//! # Device registration
//!
//! Streaming requires the ID of a mobile device registered to the account.
//! The generated default works for metadata calls; call
//! [`MobileClient::configure_device`] once to adopt a real registered
//! device before streaming.

use futures_util::Stream;
use reqwest::{header::LOCATION, Method, Url};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{
    config::Config,
    error::{Error, Result},
    feed::{self, Page, PageToken},
    protocol::{
        devices::ConfigList,
        playlists::{PlaylistCreate, PlaylistEntryCreate, PlaylistUpdate},
        search::{SearchResponse, SuggestResponse},
        stations::{RecentlyPlayed, StationFeedRequest, StationFeedResponse, StationFeedStation},
        tracks::{Album, Artist, Rating},
        DeviceInfo, Feed, Mutation, MutateResponses, Mutations, Playlist, PlaylistEntry,
        PodcastEpisode, PodcastSeries, SearchResults, Station, Track,
    },
    session::Session,
};

/// Base URL of the mobile API.
const BASE_URL: &str = "https://mc.googleapis.com/sj/v2.5/";

/// Endpoint resolving a track to its audio location.
const STREAM_URL: &str = "https://mplay.google.com/music/mplay";

/// Endpoint resolving a podcast episode to its audio location.
const EPISODE_STREAM_URL: &str = "https://mplay.google.com/music/fplay";

/// Items requested per feed page.
const PAGE_SIZE: usize = 250;

/// Configuration key reporting an active subscription.
const SUBSCRIPTION_KEY: &str = "isNautilusUser";

/// Search result types requested from the query endpoint.
const SEARCH_TYPES: &str = "1,2,3,4,6,7,8,9";

/// Audio quality for streaming.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum StreamQuality {
    #[default]
    High,
    Medium,
    Low,
}

impl StreamQuality {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "hi",
            Self::Medium => "med",
            Self::Low => "low",
        }
    }
}

/// Client for the mobile API.
///
/// All methods take `&self`; independent feed iterations may run
/// concurrently over the same client.
pub struct MobileClient {
    session: Session,
    base: Url,
}

impl MobileClient {
    /// Creates a client for the configured account.
    ///
    /// A token stored by a previous session is picked up automatically;
    /// otherwise complete the flow of [`MobileClient::authorization_url`]
    /// and [`MobileClient::login`] first.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            session: Session::new(config)?,
            base: BASE_URL.parse()?,
        })
    }

    /// The URL to open in a browser to authorize this client.
    #[must_use]
    pub fn authorization_url(&self) -> Url {
        self.session.authorization_url()
    }

    /// Completes authorization with the code shown on the consent page.
    pub async fn login(&self, code: &str) -> Result<()> {
        self.session.fetch_token(code).await?;
        self.is_subscribed().await?;

        Ok(())
    }

    /// Whether a stored or fetched token is present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// The device ID presented on requests.
    #[must_use]
    pub fn device_id(&self) -> String {
        self.session.device_id()
    }

    /// Access to the underlying session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base.join(path).map_err(Into::into)
    }

    /// Fetches one page of a POST-style feed.
    ///
    /// The first page is requested without a token; later pages resume at
    /// the token of their predecessor.
    async fn feed_page<T>(&self, path: &'static str, token: Option<PageToken>) -> Result<Page<T>>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;

        let mut body = json!({ "max-results": PAGE_SIZE });
        if let Some(token) = token {
            body["start-token"] = json!(token.as_str());
        }

        let response: Feed<T> = self
            .session
            .request_json(Method::POST, url, Some(body))
            .await?;

        Ok(response.into_page())
    }

    /// Fetches one page of a GET-style podcast feed.
    ///
    /// The podcast endpoints keep returning the final continuation token
    /// instead of omitting it; a response echoing the token it was asked
    /// for is therefore terminal.
    async fn podcast_page<T>(&self, path: &'static str, token: Option<PageToken>) -> Result<Page<T>>
    where
        T: DeserializeOwned,
    {
        let mut url = self.endpoint(path)?;
        url.query_pairs_mut()
            .append_pair("num-results", &PAGE_SIZE.to_string());
        if let Some(token) = &token {
            url.query_pairs_mut()
                .append_pair("start-token", token.as_str());
        }

        let response: Feed<T> = self.session.request_json(Method::GET, url, None).await?;

        let mut page = response.into_page();
        if token.is_some() && page.next == token {
            page.next = None;
            page.last = true;
        }

        Ok(page)
    }

    async fn mutate<M>(&self, path: &'static str, mutations: Vec<M>) -> Result<MutateResponses>
    where
        M: Serialize,
    {
        let url = self.endpoint(path)?;
        let body = serde_json::to_value(Mutations::new(mutations))?;

        self.session
            .request_json(Method::POST, url, Some(body))
            .await
    }

    // ------------------------------------------------------------------
    // Library tracks
    // ------------------------------------------------------------------

    /// All tracks in the user's library.
    pub async fn songs(&self) -> Result<Vec<Track>> {
        feed::collect(|token| self.feed_page("trackfeed", token), None).await
    }

    /// Lazily iterates the tracks in the user's library.
    pub fn songs_iter(&self) -> impl Stream<Item = Result<Track>> + '_ {
        feed::items(move |token| self.feed_page("trackfeed", token), None)
    }

    /// Looks up a catalog track by its store ID.
    pub async fn song(&self, store_id: &str) -> Result<Track> {
        let mut url = self.endpoint("fetchtrack")?;
        url.query_pairs_mut().append_pair("nid", store_id);

        self.session.request_json(Method::GET, url, None).await
    }

    /// Adds catalog tracks to the library. Returns the library IDs
    /// assigned to the tracks the service accepted.
    pub async fn songs_add(&self, tracks: Vec<Track>) -> Result<Vec<String>> {
        let mutations = tracks.into_iter().map(Mutation::Create).collect();
        let responses = self.mutate("trackbatch", mutations).await?;

        Ok(responses.acknowledged_ids())
    }

    /// Removes tracks from the library by their library IDs.
    pub async fn songs_delete(&self, song_ids: &[&str]) -> Result<()> {
        let mutations = song_ids
            .iter()
            .map(|id| Mutation::<Track>::Delete((*id).to_owned()))
            .collect();
        self.mutate("trackbatch", mutations).await?;

        Ok(())
    }

    /// Rates a track.
    pub async fn song_rate(&self, track_id: &str, rating: Rating) -> Result<()> {
        let rating = match rating {
            Rating::NotRated => "NOT_RATED",
            Rating::ThumbsDown => "THUMBS_DOWN",
            Rating::ThumbsUp => "THUMBS_UP",
        };

        self.record_event(json!({
            "createdTimestampMillis": "-1",
            "details": { "rating": { "context": "MOBILE", "rating": rating } },
            "eventId": Uuid::new_v4().to_string(),
            "trackId": Self::track_key(track_id),
        }))
        .await
    }

    /// Reports a play of a track, incrementing its play count.
    pub async fn song_play(&self, track: &Track) -> Result<()> {
        let track_id = track
            .any_id()
            .ok_or_else(|| Error::invalid_argument("track has no ID"))?;

        self.record_event(json!({
            "createdTimestampMillis": "-1",
            "details": {
                "play": {
                    "context": "MOBILE",
                    "isExplicitTrackPlay": true,
                    "playTimeMillis": track.duration_millis.to_string(),
                    "trackDurationMillis": track.duration_millis.to_string(),
                }
            },
            "eventId": Uuid::new_v4().to_string(),
            "trackId": Self::track_key(track_id),
        }))
        .await
    }

    async fn record_event(&self, event: serde_json::Value) -> Result<()> {
        let url = self.endpoint("activity/recordrealtime")?;
        let body = json!({ "events": [event] });
        self.session.request(Method::POST, url, Some(body)).await?;

        Ok(())
    }

    /// Catalog track IDs start with `T`; everything else is a locker ID.
    fn track_key(track_id: &str) -> serde_json::Value {
        if track_id.starts_with('T') {
            json!({ "metajamCompactKey": track_id })
        } else {
            json!({ "lockerId": track_id })
        }
    }

    // ------------------------------------------------------------------
    // Catalog lookups
    // ------------------------------------------------------------------

    /// Looks up a catalog album, optionally with its track listing.
    pub async fn album(&self, album_id: &str, include_tracks: bool) -> Result<Album> {
        let mut url = self.endpoint("fetchalbum")?;
        url.query_pairs_mut()
            .append_pair("nid", album_id)
            .append_pair("include-tracks", &include_tracks.to_string());

        self.session.request_json(Method::GET, url, None).await
    }

    /// Looks up a catalog artist with their top tracks, albums, and
    /// related artists.
    pub async fn artist(
        &self,
        artist_id: &str,
        include_albums: bool,
        num_top_tracks: u32,
        num_related_artists: u32,
    ) -> Result<Artist> {
        let mut url = self.endpoint("fetchartist")?;
        url.query_pairs_mut()
            .append_pair("nid", artist_id)
            .append_pair("include-albums", &include_albums.to_string())
            .append_pair("num-top-tracks", &num_top_tracks.to_string())
            .append_pair("num-related-artists", &num_related_artists.to_string());

        self.session.request_json(Method::GET, url, None).await
    }

    // ------------------------------------------------------------------
    // Playlists
    // ------------------------------------------------------------------

    /// All playlists in the user's library.
    pub async fn playlists(&self) -> Result<Vec<Playlist>> {
        feed::collect(|token| self.feed_page("playlistfeed", token), None).await
    }

    /// Lazily iterates the playlists in the user's library.
    pub fn playlists_iter(&self) -> impl Stream<Item = Result<Playlist>> + '_ {
        feed::items(move |token| self.feed_page("playlistfeed", token), None)
    }

    /// All playlist entries across the user's playlists.
    pub async fn playlist_entries(&self) -> Result<Vec<PlaylistEntry>> {
        feed::collect(|token| self.feed_page("plentryfeed", token), None).await
    }

    /// Lazily iterates the entries across the user's playlists.
    pub fn playlist_entries_iter(&self) -> impl Stream<Item = Result<PlaylistEntry>> + '_ {
        feed::items(move |token| self.feed_page("plentryfeed", token), None)
    }

    /// Creates a playlist and returns its server ID.
    pub async fn playlist_create(
        &self,
        name: &str,
        description: Option<&str>,
        public: bool,
    ) -> Result<String> {
        let create = PlaylistCreate::new(
            name.to_owned(),
            description.map(str::to_owned),
            public,
        );
        let responses = self
            .mutate("playlistbatch", vec![Mutation::Create(create)])
            .await?;

        responses
            .acknowledged_ids()
            .into_iter()
            .next()
            .ok_or_else(|| Error::internal("playlist create was not acknowledged"))
    }

    /// Changes a playlist's name, description, or visibility. Fields left
    /// `None` are unchanged.
    pub async fn playlist_edit(
        &self,
        playlist_id: &str,
        name: Option<&str>,
        description: Option<&str>,
        public: Option<bool>,
    ) -> Result<()> {
        let update = PlaylistUpdate {
            id: playlist_id.to_owned(),
            name: name.map(str::to_owned),
            description: description.map(str::to_owned),
            share_state: public.map(|p| if p { "PUBLIC" } else { "PRIVATE" }.to_owned()),
        };
        self.mutate("playlistbatch", vec![Mutation::Update(update)])
            .await?;

        Ok(())
    }

    /// Deletes a playlist.
    pub async fn playlist_delete(&self, playlist_id: &str) -> Result<()> {
        let mutation = Mutation::<PlaylistCreate>::Delete(playlist_id.to_owned());
        self.mutate("playlistbatch", vec![mutation]).await?;

        Ok(())
    }

    /// Appends tracks to a playlist, preserving the given order.
    pub async fn playlist_songs_add(
        &self,
        playlist_id: &str,
        track_ids: &[&str],
    ) -> Result<Vec<String>> {
        let mut mutations = Vec::with_capacity(track_ids.len());
        let mut preceding: Option<String> = None;

        // Entries are ordered by chaining client IDs, so one batch can
        // append multiple tracks without knowing any server positions.
        for track_id in track_ids {
            let client_id = Uuid::new_v4().to_string();
            let mut create = PlaylistEntryCreate::new(
                client_id.clone(),
                playlist_id.to_owned(),
                (*track_id).to_owned(),
            );
            create.preceding_entry_id = preceding.take();
            preceding = Some(client_id);

            mutations.push(Mutation::Create(create));
        }

        let responses = self.mutate("plentriesbatch", mutations).await?;
        Ok(responses.acknowledged_ids())
    }

    /// Removes entries from their playlists by entry ID.
    pub async fn playlist_entries_delete(&self, entry_ids: &[&str]) -> Result<()> {
        let mutations = entry_ids
            .iter()
            .map(|id| Mutation::<PlaylistEntryCreate>::Delete((*id).to_owned()))
            .collect();
        self.mutate("plentriesbatch", mutations).await?;

        Ok(())
    }

    // ------------------------------------------------------------------
    // Podcasts
    // ------------------------------------------------------------------

    /// All podcast series the user is subscribed to.
    pub async fn podcasts(&self) -> Result<Vec<PodcastSeries>> {
        feed::collect(|token| self.podcast_page("podcastseries", token), None).await
    }

    /// Lazily iterates the user's podcast series.
    pub fn podcasts_iter(&self) -> impl Stream<Item = Result<PodcastSeries>> + '_ {
        feed::items(move |token| self.podcast_page("podcastseries", token), None)
    }

    /// All episodes of the user's podcast series.
    pub async fn podcast_episodes(&self) -> Result<Vec<PodcastEpisode>> {
        feed::collect(|token| self.podcast_page("podcastepisode", token), None).await
    }

    /// Lazily iterates the episodes of the user's podcast series.
    pub fn podcast_episodes_iter(&self) -> impl Stream<Item = Result<PodcastEpisode>> + '_ {
        feed::items(move |token| self.podcast_page("podcastepisode", token), None)
    }

    // ------------------------------------------------------------------
    // Stations
    // ------------------------------------------------------------------

    /// All radio stations in the user's library.
    pub async fn stations(&self) -> Result<Vec<Station>> {
        feed::collect(|token| self.feed_page("radio/station", token), None).await
    }

    /// Lazily iterates the user's radio stations.
    pub fn stations_iter(&self) -> impl Stream<Item = Result<Station>> + '_ {
        feed::items(move |token| self.feed_page("radio/station", token), None)
    }

    /// Requests tracks for a station.
    ///
    /// `recently_played` tells the service which tracks to avoid repeating.
    pub async fn station_tracks(
        &self,
        station_id: &str,
        num_tracks: u32,
        recently_played: Vec<RecentlyPlayed>,
    ) -> Result<Vec<Track>> {
        let url = self.endpoint("radio/stationfeed")?;
        let request = StationFeedRequest {
            content_filter: 1,
            stations: vec![StationFeedStation {
                num_entries: num_tracks,
                radio_id: station_id.to_owned(),
                recently_played,
            }],
        };
        let body = serde_json::to_value(&request)?;

        let response: StationFeedResponse = self
            .session
            .request_json(Method::POST, url, Some(body))
            .await?;

        Ok(response
            .data
            .stations
            .into_iter()
            .next()
            .map(|station| station.tracks)
            .unwrap_or_default())
    }

    // ------------------------------------------------------------------
    // Promoted tracks
    // ------------------------------------------------------------------

    /// Tracks the user has thumbed up, across library and catalog.
    pub async fn promoted_songs(&self) -> Result<Vec<Track>> {
        feed::collect(|token| self.feed_page("ephemeral/top", token), None).await
    }

    /// Lazily iterates the user's thumbed-up tracks.
    pub fn promoted_songs_iter(&self) -> impl Stream<Item = Result<Track>> + '_ {
        feed::items(move |token| self.feed_page("ephemeral/top", token), None)
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    /// Searches the catalog and the user's library.
    pub async fn search(&self, query: &str, max_results: u32) -> Result<SearchResults> {
        let mut url = self.endpoint("query")?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("ct", SEARCH_TYPES)
            .append_pair("max-results", &max_results.to_string());

        let response: SearchResponse = self.session.request_json(Method::GET, url, None).await?;
        Ok(response.into())
    }

    /// Query completions for a partial search string.
    pub async fn search_suggestion(&self, query: &str) -> Result<Vec<String>> {
        let url = self.endpoint("querysuggestion")?;
        let body = json!({ "query": query });

        let response: SuggestResponse = self
            .session
            .request_json(Method::POST, url, Some(body))
            .await?;

        Ok(response
            .suggested_queries
            .into_iter()
            .map(|suggestion| suggestion.suggestion_string)
            .collect())
    }

    // ------------------------------------------------------------------
    // Devices and account
    // ------------------------------------------------------------------

    /// Devices registered to the account.
    pub async fn devices(&self) -> Result<Vec<DeviceInfo>> {
        let url = self.endpoint("devicemanagementinfo")?;
        let response: Feed<DeviceInfo> = self.session.request_json(Method::GET, url, None).await?;

        Ok(response.data.items)
    }

    /// Deauthorizes a registered device, freeing one authorization slot.
    pub async fn device_deauthorize(&self, device: &DeviceInfo) -> Result<()> {
        let mut url = self.endpoint("devicemanagementinfo")?;
        url.query_pairs_mut().append_pair("delete-id", &device.id);

        self.session.request(Method::DELETE, url, None).await?;
        Ok(())
    }

    /// Adopts the first mobile device registered to the account for
    /// subsequent requests, returning it.
    pub async fn configure_device(&self) -> Result<DeviceInfo> {
        let device = self
            .devices()
            .await?
            .into_iter()
            .find(DeviceInfo::is_mobile)
            .ok_or_else(|| Error::not_found("no mobile device registered to this account"))?;

        info!(
            "using device {} ({})",
            device.stream_id(),
            device.friendly_name.as_deref().unwrap_or("unnamed")
        );
        self.session.set_device_id(device.stream_id());

        Ok(device)
    }

    /// The account configuration listing.
    pub async fn config(&self) -> Result<ConfigList> {
        let url = self.endpoint("config")?;
        self.session.request_json(Method::GET, url, None).await
    }

    /// Whether the account has an active subscription.
    ///
    /// Also records the matching tier on the session, which changes what
    /// catalog content later requests can see.
    pub async fn is_subscribed(&self) -> Result<bool> {
        let config = self.config().await?;
        let subscribed = config
            .data
            .entries
            .iter()
            .any(|entry| entry.key == SUBSCRIPTION_KEY && entry.value == "true");

        self.session.set_tier(if subscribed { "aa" } else { "fr" });
        Ok(subscribed)
    }

    // ------------------------------------------------------------------
    // Streaming
    // ------------------------------------------------------------------

    /// Resolves a track to a time-limited audio URL.
    ///
    /// The endpoint answers with a redirect; the audio location is its
    /// `Location` header. The URL expires after about a minute, so fetch it
    /// right before streaming.
    pub async fn stream_url(&self, track_id: &str, quality: StreamQuality) -> Result<Url> {
        let mut url = STREAM_URL.parse::<Url>()?;
        {
            let mut pairs = url.query_pairs_mut();
            let id_param = if track_id.starts_with('T') {
                "mjck"
            } else {
                "songid"
            };
            pairs
                .append_pair(id_param, track_id)
                .append_pair("opt", quality.as_str())
                .append_pair("net", "mob")
                .append_pair("pt", "e");
        }

        self.resolve_location(url, track_id).await
    }

    /// Resolves a podcast episode to a time-limited audio URL.
    pub async fn episode_stream_url(
        &self,
        episode_id: &str,
        quality: StreamQuality,
    ) -> Result<Url> {
        let mut url = EPISODE_STREAM_URL.parse::<Url>()?;
        url.query_pairs_mut()
            .append_pair("mjck", episode_id)
            .append_pair("opt", quality.as_str())
            .append_pair("net", "mob")
            .append_pair("pt", "e");

        self.resolve_location(url, episode_id).await
    }

    /// Issues a request expected to answer with a redirect and returns the
    /// target of its `Location` header.
    async fn resolve_location(&self, url: Url, item_id: &str) -> Result<Url> {
        let response = self.session.request(Method::GET, url, None).await?;
        let location = response
            .headers()
            .get(LOCATION)
            .ok_or_else(|| Error::not_found(format!("no stream location for {item_id}")))?;

        location
            .to_str()
            .map_err(|e| Error::data_loss(format!("malformed stream location: {e}")))?
            .parse()
            .map_err(Into::into)
    }

    /// Downloads a track's audio.
    pub async fn stream(&self, track_id: &str, quality: StreamQuality) -> Result<Vec<u8>> {
        let url = self.stream_url(track_id, quality).await?;

        let response = self
            .session
            .media_client()
            .get(url)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.bytes().await?.to_vec())
    }
}
