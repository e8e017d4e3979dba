use serde_json::json;

use playmusic::feed::PageToken;
use playmusic::protocol::{
    devices::ConfigList,
    playlists::PlaylistEntryCreate,
    search::SearchResponse,
    stations::StationFeedResponse,
    tracks::Rating,
    DeviceInfo, Feed, MutateResponses, Mutation, Mutations, SearchResults, Track,
};

#[test]
fn feed_with_token_becomes_a_continuing_page() {
    let body = json!({
        "kind": "sj#trackList",
        "nextPageToken": "CpkQARjAxPHh",
        "data": {
            "items": [
                { "id": "abc", "title": "One", "artist": "A", "album": "X",
                  "durationMillis": "198000" },
                { "id": "def", "title": "Two", "artist": "B", "album": "Y",
                  "durationMillis": "95500" }
            ]
        }
    });

    let feed: Feed<Track> = serde_json::from_value(body).unwrap();
    let page = feed.into_page();

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].duration_millis, 198_000);
    assert_eq!(page.next, Some(PageToken::from("CpkQARjAxPHh")));
    assert!(!page.last);
}

#[test]
fn feed_without_token_is_terminal() {
    let body = json!({
        "kind": "sj#trackList",
        "data": { "items": [] }
    });

    let feed: Feed<Track> = serde_json::from_value(body).unwrap();
    let page = feed.into_page();

    assert!(page.items.is_empty());
    assert!(page.next.is_none());
    assert!(page.last);
}

#[test]
fn feed_tolerates_a_missing_data_object() {
    let feed: Feed<Track> = serde_json::from_value(json!({ "kind": "sj#trackList" })).unwrap();
    assert!(feed.into_page().items.is_empty());
}

#[test]
fn feed_items_need_not_be_default_constructible() {
    #[derive(Debug, serde::Deserialize)]
    struct Bare {
        id: String,
    }

    let feed: Feed<Bare> = serde_json::from_value(json!({
        "data": { "items": [ { "id": "x" } ] }
    }))
    .unwrap();

    assert_eq!(feed.into_page().items[0].id, "x");
}

#[test]
fn unknown_track_fields_survive_a_round_trip() {
    let body = json!({
        "id": "abc",
        "title": "One",
        "artist": "A",
        "album": "X",
        "durationMillis": "198000",
        "composer": "C",
        "beatsPerMinute": 120
    });

    let track: Track = serde_json::from_value(body.clone()).unwrap();
    assert_eq!(track.extra.get("composer"), Some(&json!("C")));

    let reencoded = serde_json::to_value(&track).unwrap();
    assert_eq!(reencoded["beatsPerMinute"], json!(120));
    assert_eq!(reencoded["durationMillis"], json!("198000"));
}

#[test]
fn track_rating_decodes_from_wire_strings() {
    let track: Track = serde_json::from_value(json!({
        "id": "abc", "title": "t", "artist": "a", "album": "x",
        "durationMillis": "1000", "rating": "5"
    }))
    .unwrap();
    assert_eq!(track.rating, Some(Rating::ThumbsUp));

    let down: Track = serde_json::from_value(json!({
        "id": "abc", "title": "t", "artist": "a", "album": "x",
        "durationMillis": "1000", "rating": "1"
    }))
    .unwrap();
    assert_eq!(down.rating, Some(Rating::ThumbsDown));

    // Re-encoding keeps the wire's string form.
    let reencoded = serde_json::to_value(&track).unwrap();
    assert_eq!(reencoded["rating"], json!("5"));
}

#[test]
fn track_rating_tolerates_bare_numbers() {
    let track: Track = serde_json::from_value(json!({
        "id": "abc", "title": "t", "artist": "a", "album": "x",
        "durationMillis": "1000", "rating": 5
    }))
    .unwrap();

    assert_eq!(track.rating, Some(Rating::ThumbsUp));
}

#[test]
fn any_id_prefers_the_library_id() {
    let mut track = Track {
        id: Some("library".to_owned()),
        store_id: Some("Tstore".to_owned()),
        ..Track::default()
    };
    assert_eq!(track.any_id(), Some("library"));

    track.id = None;
    assert_eq!(track.any_id(), Some("Tstore"));
}

#[test]
fn mutations_serialize_externally_tagged() {
    let mutations = Mutations::new(vec![
        Mutation::Create(json!({ "name": "n" })),
        Mutation::Delete("some-id".to_owned()),
    ]);

    let body = serde_json::to_value(&mutations).unwrap();
    assert_eq!(
        body,
        json!({
            "mutations": [
                { "create": { "name": "n" } },
                { "delete": "some-id" }
            ]
        })
    );
}

#[test]
fn mutate_responses_filter_to_acknowledged_ids() {
    let body = json!({
        "mutate_response": [
            { "id": "kept", "client_id": "c1", "response_code": "OK" },
            { "client_id": "c2", "response_code": "ALREADY_EXISTS" },
            { "id": "also-kept", "response_code": "OK" }
        ]
    });

    let responses: MutateResponses = serde_json::from_value(body).unwrap();
    assert_eq!(responses.acknowledged_ids(), vec!["kept", "also-kept"]);
}

#[test]
fn playlist_entry_create_marks_store_tracks() {
    let store = PlaylistEntryCreate::new("c".to_owned(), "p".to_owned(), "Tabc".to_owned());
    assert_eq!(store.source, "2");

    let library = PlaylistEntryCreate::new("c".to_owned(), "p".to_owned(), "abc".to_owned());
    assert_eq!(library.source, "1");
}

#[test]
fn station_feed_stations_arrive_under_their_own_key() {
    let body = json!({
        "data": {
            "stations": [
                {
                    "id": "st1",
                    "name": "Focus",
                    "tracks": [
                        { "storeId": "Tabc", "title": "One", "artist": "A",
                          "album": "X", "durationMillis": "1000" }
                    ]
                }
            ]
        }
    });

    let response: StationFeedResponse = serde_json::from_value(body).unwrap();
    assert_eq!(response.data.stations.len(), 1);
    assert_eq!(response.data.stations[0].tracks[0].store_id.as_deref(), Some("Tabc"));
}

#[test]
fn search_clusters_fan_out_by_type() {
    let body = json!({
        "kind": "sj#searchresponse",
        "clusterDetail": [
            {
                "cluster": { "category": "SEARCH_RESPONSE", "type": "1" },
                "entries": [
                    { "type": "1", "track": { "storeId": "Tabc", "title": "One",
                      "artist": "A", "album": "X", "durationMillis": "1000" } }
                ]
            },
            {
                "cluster": { "category": "SEARCH_RESPONSE", "type": "3" },
                "entries": [
                    { "type": "3", "album": { "albumId": "Balbum", "name": "X",
                      "artist": "A" } }
                ]
            },
            {
                "cluster": { "category": "SEARCH_RESPONSE", "type": "4" },
                "entries": []
            }
        ]
    });

    let response: SearchResponse = serde_json::from_value(body).unwrap();
    let results = SearchResults::from(response);

    assert_eq!(results.tracks.len(), 1);
    assert_eq!(results.albums.len(), 1);
    assert!(results.playlists.is_empty());
    assert_eq!(results.albums[0].album_id, "Balbum");
}

#[test]
fn android_device_ids_are_stripped_for_streaming() {
    let device: DeviceInfo = serde_json::from_value(json!({
        "id": "0xabcdef0123456789",
        "type": "ANDROID",
        "friendlyName": "Phone"
    }))
    .unwrap();

    assert!(device.is_mobile());
    assert_eq!(device.stream_id(), "abcdef0123456789");

    let desktop: DeviceInfo = serde_json::from_value(json!({
        "id": "ios:ABCD-1234",
        "type": "IOS"
    }))
    .unwrap();
    assert_eq!(desktop.stream_id(), "ios:ABCD-1234");
}

#[test]
fn config_entries_arrive_under_data_entries() {
    let body = json!({
        "kind": "sj#configList",
        "data": {
            "entries": [
                { "kind": "sj#configEntry", "key": "isNautilusUser", "value": "true" }
            ]
        }
    });

    let config: ConfigList = serde_json::from_value(body).unwrap();
    assert_eq!(config.data.entries[0].key, "isNautilusUser");
    assert_eq!(config.data.entries[0].value, "true");
}
