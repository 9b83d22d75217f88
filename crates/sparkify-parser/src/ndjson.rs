use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::{ParserError, Result};
use crate::jsonpaths::JsonPaths;
use crate::model::{EventRecord, SongRecord};

/// Parses a newline-delimited event log. With a path mapping, each object is
/// re-keyed onto the staging columns before it is decoded.
pub fn parse_event_log(
    source_name: &str,
    content: &str,
    paths: Option<&JsonPaths>,
) -> Result<Vec<EventRecord>> {
    let Some(paths) = paths else {
        return parse_lines(source_name, content);
    };
    paths.ensure_matches_staging_events()?;

    let mut records = Vec::new();
    for (line, value) in json_lines(source_name, content) {
        let value = value?;
        let Value::Object(object) = value else {
            return Err(ParserError::NotAnObject {
                source_name: source_name.to_string(),
                line,
            });
        };
        let remapped = Value::Object(paths.remap(&object));
        let record = serde_json::from_value(remapped).map_err(|source| ParserError::Record {
            source_name: source_name.to_string(),
            line,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Parses a song-metadata file. Files usually hold a single object but may
/// carry several, one per line.
pub fn parse_song_file(source_name: &str, content: &str) -> Result<Vec<SongRecord>> {
    parse_lines(source_name, content)
}

fn parse_lines<T: DeserializeOwned>(source_name: &str, content: &str) -> Result<Vec<T>> {
    let mut records = Vec::new();
    for (line, raw) in non_blank_lines(content) {
        let record = serde_json::from_str(raw).map_err(|source| ParserError::Record {
            source_name: source_name.to_string(),
            line,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

fn json_lines<'a>(
    source_name: &'a str,
    content: &'a str,
) -> impl Iterator<Item = (usize, Result<Value>)> + 'a {
    non_blank_lines(content).map(move |(line, raw)| {
        let value = serde_json::from_str(raw).map_err(|source| ParserError::Record {
            source_name: source_name.to_string(),
            line,
            source,
        });
        (line, value)
    })
}

fn non_blank_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .map(|(idx, raw)| (idx + 1, raw.trim()))
        .filter(|(_, raw)| !raw.is_empty())
}
