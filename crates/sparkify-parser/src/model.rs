use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

/// Column order of the `staging_events` table. JSON path-mapping files are
/// applied positionally against this list.
pub const STAGING_EVENTS_COLUMNS: [&str; 18] = [
    "artist",
    "auth",
    "firstName",
    "gender",
    "itemInSession",
    "lastName",
    "length",
    "level",
    "location",
    "method",
    "page",
    "registration",
    "sessionId",
    "song",
    "status",
    "ts",
    "userAgent",
    "userId",
];

/// One website/app interaction from the event log.
///
/// `artist`, `song` and `length` are absent for non-music pages such as
/// `Home` or `Settings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    #[serde(default)]
    pub artist: Option<String>,
    pub auth: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    pub item_in_session: i32,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub length: Option<f64>,
    pub level: String,
    #[serde(default)]
    pub location: Option<String>,
    pub method: String,
    pub page: String,
    #[serde(default)]
    pub registration: Option<f64>,
    pub session_id: i32,
    #[serde(default)]
    pub song: Option<String>,
    pub status: i16,
    /// Unix epoch in milliseconds.
    pub ts: i64,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: String,
}

impl EventRecord {
    pub fn is_song_play(&self) -> bool {
        self.page == "NextSong"
    }
}

/// One song-metadata record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongRecord {
    pub artist_id: String,
    #[serde(default)]
    pub artist_location: Option<String>,
    #[serde(default)]
    pub artist_latitude: Option<f64>,
    #[serde(default)]
    pub artist_longitude: Option<f64>,
    pub artist_name: String,
    pub duration: f64,
    pub num_songs: i32,
    pub song_id: String,
    pub title: String,
    pub year: i16,
}

// The event log stores `userId` as a string, but some exports emit a bare number.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrNumber;

    impl<'de> Visitor<'de> for StringOrNumber {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string or an integer")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_string<E: de::Error>(self, value: String) -> Result<String, E> {
            Ok(value)
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<String, E> {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(StringOrNumber)
}
