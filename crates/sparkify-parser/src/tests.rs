use std::fs;
use std::path::PathBuf;

use crate::errors::ParserError;
use crate::jsonpaths::JsonPaths;
use crate::model::STAGING_EVENTS_COLUMNS;
use crate::{parse_event_log, parse_song_file};

fn fixture(path: &str) -> String {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let full_path = base.join("tests/data").join(path);
    fs::read_to_string(&full_path)
        .unwrap_or_else(|err| panic!("failed to read fixture {}: {}", full_path.display(), err))
}

#[test]
fn parses_event_log_and_skips_blank_lines() {
    let content = fixture("log_data/2018-11-12-events.json");
    let events = parse_event_log("events", &content, None).expect("event log parse failed");

    assert_eq!(events.len(), 7);
    let home = &events[0];
    assert_eq!(home.page, "Home");
    assert!(home.song.is_none());
    assert!(home.artist.is_none());
    assert!(home.length.is_none());
    assert!(!home.is_song_play());

    let play = &events[1];
    assert!(play.is_song_play());
    assert_eq!(play.song.as_deref(), Some("Setanta matins"));
    assert_eq!(play.ts, 1_541_990_258_796);
    assert_eq!(play.session_id, 139);
}

#[test]
fn numeric_user_id_is_read_as_string() {
    let content = fixture("log_data/2018-11-12-events.json");
    let events = parse_event_log("events", &content, None).expect("event log parse failed");

    assert_eq!(events[3].user_id, "39");
    assert_eq!(events[4].user_id, "39");
}

#[test]
fn jsonpaths_mapping_yields_same_records_as_direct_decode() {
    let content = fixture("log_data/2018-11-12-events.json");
    let paths = JsonPaths::parse(&fixture("log_json_path.json")).expect("jsonpaths parse failed");
    assert_eq!(paths.keys().len(), STAGING_EVENTS_COLUMNS.len());

    let mapped = parse_event_log("events", &content, Some(&paths)).expect("mapped parse failed");
    let direct = parse_event_log("events", &content, None).expect("direct parse failed");
    assert_eq!(mapped, direct);
}

#[test]
fn jsonpaths_mapping_is_positional() {
    // Swap the sources of `firstName` and `lastName`.
    let mut keys: Vec<String> = STAGING_EVENTS_COLUMNS
        .iter()
        .map(|column| format!("\"$['{column}']\""))
        .collect();
    keys.swap(2, 5);
    let paths = JsonPaths::parse(&format!("{{\"jsonpaths\": [{}]}}", keys.join(",")))
        .expect("jsonpaths parse failed");

    let content = fixture("log_data/2018-11-12-events.json");
    let events = parse_event_log("events", &content, Some(&paths)).expect("mapped parse failed");
    assert_eq!(events[0].first_name.as_deref(), Some("Summers"));
    assert_eq!(events[0].last_name.as_deref(), Some("Kaylee"));
}

#[test]
fn jsonpaths_accepts_dot_notation_and_rejects_nested_paths() {
    let paths = JsonPaths::parse(r#"{"jsonpaths": ["$.artist", "$['auth']"]}"#)
        .expect("jsonpaths parse failed");
    assert_eq!(paths.keys(), ["artist", "auth"]);

    let err = JsonPaths::parse(r#"{"jsonpaths": ["$.user.name"]}"#).unwrap_err();
    assert!(matches!(err, ParserError::UnsupportedPath(path) if path == "$.user.name"));
}

#[test]
fn short_jsonpaths_mapping_is_rejected_for_events() {
    let paths = JsonPaths::parse(r#"{"jsonpaths": ["$['artist']"]}"#).expect("parse");
    let err = parse_event_log("events", "{}", Some(&paths)).unwrap_err();
    assert!(matches!(
        err,
        ParserError::ColumnCountMismatch {
            expected: 18,
            found: 1
        }
    ));
}

#[test]
fn missing_required_event_field_reports_line() {
    let content = "\n{\"auth\":\"Logged In\",\"itemInSession\":0,\"level\":\"free\",\"method\":\"GET\",\"page\":\"Home\",\"sessionId\":1,\"status\":200,\"userId\":\"5\"}\n";
    let err = parse_event_log("broken.json", content, None).unwrap_err();
    match err {
        ParserError::Record {
            source_name, line, ..
        } => {
            assert_eq!(source_name, "broken.json");
            assert_eq!(line, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn parses_song_file_with_nullable_geography() {
    let content = fixture("song_data/A/B/C/TRABCEI128F424C983.json");
    let songs = parse_song_file("song", &content).expect("song parse failed");
    assert_eq!(songs.len(), 1);
    assert_eq!(songs[0].title, "Duplicate Title");
    assert_eq!(songs[0].artist_latitude, Some(35.14968));

    let content = fixture("song_data/A/A/A/TRAAAAW128F429D538.json");
    let songs = parse_song_file("song", &content).expect("song parse failed");
    assert!(songs[0].artist_latitude.is_none());
    assert_eq!(songs[0].year, 0);
}
