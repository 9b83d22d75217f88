//! `INSERT ... SELECT` statements that build the star schema from staging.

use crate::schema::{ARTISTS, SONGPLAYS, SONGS, TIMES, USERS};
use crate::statements::{Stage, Statement};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformOptions {
    /// Restrict fact rows to `page = 'NextSong'` events. Off by default,
    /// matching the plain title join.
    pub next_song_only: bool,
}

impl TransformOptions {
    /// Caveat worth logging once when a run or preview starts.
    pub fn songplay_caveat(&self) -> Option<&'static str> {
        if self.next_song_only {
            None
        } else {
            Some("songplays join has no page = 'NextSong' filter; any event whose song matches a title becomes a fact row")
        }
    }
}

// ts is epoch milliseconds; the integer division truncates to whole seconds.
// dayofweek counts Sunday as 0, so 1..5 is Monday to Friday.
const TIME_TABLE_INSERT: &str = r#"
INSERT INTO times (start_time, hour, day, week, month, year, weekday)
SELECT
    start_time,
    EXTRACT(hour FROM start_time) AS hour,
    EXTRACT(day FROM start_time) AS day,
    EXTRACT(week FROM start_time) AS week,
    EXTRACT(month FROM start_time) AS month,
    EXTRACT(year FROM start_time) AS year,
    CASE WHEN EXTRACT(dayofweek FROM start_time) IN (1, 2, 3, 4, 5) THEN true ELSE false END AS weekday
FROM (
    SELECT DISTINCT TIMESTAMP 'epoch' + ts / 1000 * INTERVAL '1 second' AS start_time
    FROM staging_events
) AS event_times"#;

// Most recent event per user wins, so `level` reflects the latest tier.
const USER_TABLE_INSERT: &str = r#"
INSERT INTO users (user_id, first_name, last_name, gender, level)
SELECT
    user_id,
    first_name,
    last_name,
    gender,
    level
FROM (
    SELECT
        userId AS user_id,
        firstName AS first_name,
        lastName AS last_name,
        gender,
        level,
        ROW_NUMBER() OVER (PARTITION BY userId ORDER BY ts DESC) AS recency
    FROM staging_events
) AS ranked_users
WHERE recency = 1"#;

const SONG_TABLE_INSERT: &str = r#"
INSERT INTO songs (song_id, title, artist_id, year, duration)
SELECT
    song_id,
    title,
    artist_id,
    year,
    duration
FROM staging_songs"#;

// An artist can carry different name or location spellings across songs;
// keep the row from the lowest song_id so artist_id stays unique.
const ARTIST_TABLE_INSERT: &str = r#"
INSERT INTO artists (artist_id, name, location, latitude, longitude)
SELECT
    artist_id,
    name,
    location,
    latitude,
    longitude
FROM (
    SELECT
        artist_id,
        artist_name AS name,
        artist_location AS location,
        artist_latitude AS latitude,
        artist_longitude AS longitude,
        ROW_NUMBER() OVER (PARTITION BY artist_id ORDER BY song_id) AS occurrence
    FROM staging_songs
) AS ranked_artists
WHERE occurrence = 1"#;

const SONGPLAY_TABLE_INSERT: &str = r#"
INSERT INTO songplays (start_time, user_id, song_id, artist_id, session_id, location, user_agent)
SELECT
    TIMESTAMP 'epoch' + e.ts / 1000 * INTERVAL '1 second' AS start_time,
    e.userId AS user_id,
    s.song_id AS song_id,
    s.artist_id AS artist_id,
    e.sessionId AS session_id,
    e.location AS location,
    e.userAgent AS user_agent
FROM staging_events e
JOIN staging_songs s ON (e.song = s.title)"#;

/// Dimensions first, then the fact table.
pub fn insert_table_queries(options: &TransformOptions) -> Vec<Statement> {
    let insert = |name: &'static str, stage: Stage, table: &'static str, sql: String| {
        Statement::new(name, stage, table, sql.trim().to_string())
    };

    vec![
        insert("time_table_insert", Stage::LoadDimensions, TIMES, TIME_TABLE_INSERT.into()),
        insert("user_table_insert", Stage::LoadDimensions, USERS, USER_TABLE_INSERT.into()),
        insert("song_table_insert", Stage::LoadDimensions, SONGS, SONG_TABLE_INSERT.into()),
        insert("artist_table_insert", Stage::LoadDimensions, ARTISTS, ARTIST_TABLE_INSERT.into()),
        insert("songplay_table_insert", Stage::LoadFact, SONGPLAYS, songplay_insert(options)),
    ]
}

fn songplay_insert(options: &TransformOptions) -> String {
    if options.next_song_only {
        format!("{}\nWHERE e.page = 'NextSong'", SONGPLAY_TABLE_INSERT.trim())
    } else {
        SONGPLAY_TABLE_INSERT.trim().to_string()
    }
}
