use std::{
    fs,
    path::PathBuf,
    time::{Duration, SystemTime},
};

use playmusic::token::{FileTokenStore, Token, TokenStore};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("playmusic-test-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn sample_token(expires_at: SystemTime) -> Token {
    Token {
        access_token: "ya29.sample".to_owned(),
        refresh_token: Some("1//refresh".to_owned()),
        token_type: "Bearer".to_owned(),
        expires_at,
        scope: Some("https://www.googleapis.com/auth/skyjam".to_owned()),
    }
}

#[test]
fn dump_then_load_round_trips() {
    let dir = scratch_dir("roundtrip");
    let store = FileTokenStore::new(&dir, "user@example.com", "mobileclient");

    let token = sample_token(SystemTime::UNIX_EPOCH + Duration::from_secs(2_000_000_000));
    store.dump(&token).unwrap();

    let loaded = store.load().unwrap().expect("token was stored");
    assert_eq!(loaded, token);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn missing_file_loads_as_none() {
    let dir = scratch_dir("missing");
    let store = FileTokenStore::new(&dir, "user@example.com", "mobileclient");

    assert!(store.load().unwrap().is_none());
}

#[test]
fn malformed_file_loads_as_none() {
    let dir = scratch_dir("malformed");
    let store = FileTokenStore::new(&dir, "user@example.com", "mobileclient");

    fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    fs::write(store.path(), "not json at all").unwrap();

    assert!(store.load().unwrap().is_none());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn accounts_do_not_share_token_files() {
    let dir = scratch_dir("accounts");
    let first = FileTokenStore::new(&dir, "first@example.com", "mobileclient");
    let second = FileTokenStore::new(&dir, "second@example.com", "mobileclient");

    assert_ne!(first.path(), second.path());

    first
        .dump(&sample_token(SystemTime::now() + Duration::from_secs(3600)))
        .unwrap();
    assert!(second.load().unwrap().is_none());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn expiry_is_reported_with_a_margin() {
    let fresh = sample_token(SystemTime::now() + Duration::from_secs(3600));
    assert!(!fresh.is_expired());

    // Within the refresh margin counts as expired even though the wall
    // clock has not passed the recorded expiry yet.
    let closing = sample_token(SystemTime::now() + Duration::from_secs(30));
    assert!(closing.is_expired());

    let lapsed = sample_token(SystemTime::now() - Duration::from_secs(10));
    assert!(lapsed.is_expired());
    assert_eq!(lapsed.time_to_live(), Duration::ZERO);
}

#[test]
fn debug_output_redacts_credentials() {
    let token = sample_token(SystemTime::now());
    let debugged = format!("{token:?}");

    assert!(!debugged.contains("ya29.sample"));
    assert!(!debugged.contains("1//refresh"));
}
