//! In-process rendition of the staging → star-schema transforms.
//!
//! Reads the raw JSON datasets from local directories and applies the same
//! rules as the warehouse statements in [`crate::transforms`], so row counts
//! and derived values can be checked without a cluster.

use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use serde::Serialize;
use sparkify_parser::{parse_event_log, parse_song_file, EventRecord, JsonPaths, SongRecord};
use tracing::{debug, info};

use crate::error::Result;
use crate::transforms::TransformOptions;

#[derive(Debug, Clone)]
pub struct StagingFrames {
    pub events: DataFrame,
    pub songs: DataFrame,
}

#[derive(Debug, Clone)]
pub struct StarSchema {
    pub songplays: DataFrame,
    pub users: DataFrame,
    pub songs: DataFrame,
    pub artists: DataFrame,
    pub times: DataFrame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RowCounts {
    pub staging_events: usize,
    pub staging_songs: usize,
    pub songplays: usize,
    pub users: usize,
    pub songs: usize,
    pub artists: usize,
    pub times: usize,
}

/// Reads every `*.json` file below the two directories. Event logs are
/// decoded through the path-mapping file when one is given.
pub fn load_staging(
    events_dir: &Path,
    songs_dir: &Path,
    jsonpaths: Option<&Path>,
) -> Result<StagingFrames> {
    let paths = match jsonpaths {
        Some(path) => Some(JsonPaths::parse(&fs::read_to_string(path)?)?),
        None => None,
    };

    let mut events = Vec::new();
    for file in json_files(events_dir)? {
        let content = fs::read_to_string(&file)?;
        let parsed = parse_event_log(&file.display().to_string(), &content, paths.as_ref())?;
        debug!(file = %file.display(), records = parsed.len(), "Read event log");
        events.extend(parsed);
    }

    let mut songs = Vec::new();
    for file in json_files(songs_dir)? {
        let content = fs::read_to_string(&file)?;
        songs.extend(parse_song_file(&file.display().to_string(), &content)?);
    }

    info!(
        events = events.len(),
        songs = songs.len(),
        "Loaded staging records"
    );

    Ok(StagingFrames {
        events: events_frame(&events)?,
        songs: songs_frame(&songs)?,
    })
}

fn json_files(root: &Path) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    let pattern = format!("{}/**/*.json", root.display());
    let mut files = Vec::new();
    for entry in glob::glob(&pattern)? {
        files.push(entry.map_err(std::io::Error::from)?);
    }
    files.sort();
    Ok(files)
}

/// `staging_events` as a dataframe, columns named as in the warehouse.
pub fn events_frame(events: &[EventRecord]) -> Result<DataFrame> {
    let df = df![
        "artist" => events.iter().map(|e| e.artist.clone()).collect::<Vec<_>>(),
        "auth" => events.iter().map(|e| e.auth.clone()).collect::<Vec<_>>(),
        "firstName" => events.iter().map(|e| e.first_name.clone()).collect::<Vec<_>>(),
        "gender" => events.iter().map(|e| e.gender.clone()).collect::<Vec<_>>(),
        "itemInSession" => events.iter().map(|e| e.item_in_session).collect::<Vec<_>>(),
        "lastName" => events.iter().map(|e| e.last_name.clone()).collect::<Vec<_>>(),
        "length" => events.iter().map(|e| e.length).collect::<Vec<_>>(),
        "level" => events.iter().map(|e| e.level.clone()).collect::<Vec<_>>(),
        "location" => events.iter().map(|e| e.location.clone()).collect::<Vec<_>>(),
        "method" => events.iter().map(|e| e.method.clone()).collect::<Vec<_>>(),
        "page" => events.iter().map(|e| e.page.clone()).collect::<Vec<_>>(),
        "registration" => events.iter().map(|e| e.registration).collect::<Vec<_>>(),
        "sessionId" => events.iter().map(|e| e.session_id).collect::<Vec<_>>(),
        "song" => events.iter().map(|e| e.song.clone()).collect::<Vec<_>>(),
        "status" => events.iter().map(|e| i32::from(e.status)).collect::<Vec<_>>(),
        "ts" => events.iter().map(|e| e.ts).collect::<Vec<_>>(),
        "userAgent" => events.iter().map(|e| e.user_agent.clone()).collect::<Vec<_>>(),
        "userId" => events.iter().map(|e| e.user_id.clone()).collect::<Vec<_>>(),
    ]?;
    Ok(df)
}

/// `staging_songs` as a dataframe.
pub fn songs_frame(songs: &[SongRecord]) -> Result<DataFrame> {
    let df = df![
        "artist_id" => songs.iter().map(|s| s.artist_id.clone()).collect::<Vec<_>>(),
        "artist_location" => songs.iter().map(|s| s.artist_location.clone()).collect::<Vec<_>>(),
        "artist_latitude" => songs.iter().map(|s| s.artist_latitude).collect::<Vec<_>>(),
        "artist_longitude" => songs.iter().map(|s| s.artist_longitude).collect::<Vec<_>>(),
        "artist_name" => songs.iter().map(|s| s.artist_name.clone()).collect::<Vec<_>>(),
        "duration" => songs.iter().map(|s| s.duration).collect::<Vec<_>>(),
        "num_songs" => songs.iter().map(|s| s.num_songs).collect::<Vec<_>>(),
        "song_id" => songs.iter().map(|s| s.song_id.clone()).collect::<Vec<_>>(),
        "title" => songs.iter().map(|s| s.title.clone()).collect::<Vec<_>>(),
        "year" => songs.iter().map(|s| i32::from(s.year)).collect::<Vec<_>>(),
    ]?;
    Ok(df)
}

// Epoch milliseconds truncated to whole seconds.
fn start_time(ts: &str) -> Expr {
    col(ts)
        .cast(DataType::Datetime(TimeUnit::Milliseconds, None))
        .dt()
        .truncate(lit("1s"))
        .alias("start_time")
}

pub fn build_star_schema(staging: &StagingFrames, options: &TransformOptions) -> Result<StarSchema> {
    Ok(StarSchema {
        times: times_table(&staging.events)?,
        users: users_table(&staging.events)?,
        songs: songs_table(&staging.songs)?,
        artists: artists_table(&staging.songs)?,
        songplays: songplays_table(staging, options)?,
    })
}

/// One row per distinct start time. `weekday` is Monday through Friday.
pub fn times_table(events: &DataFrame) -> Result<DataFrame> {
    let times = events
        .clone()
        .lazy()
        .select([start_time("ts")])
        .group_by([col("start_time")])
        .agg([])
        .with_columns([
            col("start_time").dt().hour().cast(DataType::Int32).alias("hour"),
            col("start_time").dt().day().cast(DataType::Int32).alias("day"),
            col("start_time").dt().week().cast(DataType::Int32).alias("week"),
            col("start_time").dt().month().cast(DataType::Int32).alias("month"),
            col("start_time").dt().year().cast(DataType::Int32).alias("year"),
            // ISO weekday, Monday = 1.
            col("start_time")
                .dt()
                .weekday()
                .cast(DataType::Float64)
                .lt_eq(lit(5.0))
                .alias("weekday"),
        ])
        .sort(["start_time"], SortMultipleOptions::default())
        .collect()?;
    Ok(times)
}

/// One row per user, taken from that user's most recent event.
pub fn users_table(events: &DataFrame) -> Result<DataFrame> {
    let users = events
        .clone()
        .lazy()
        .sort(
            ["ts"],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .group_by_stable([col("userId")])
        .agg([
            col("firstName").last().alias("first_name"),
            col("lastName").last().alias("last_name"),
            col("gender").last(),
            col("level").last(),
        ])
        .select([
            col("userId").alias("user_id"),
            col("first_name"),
            col("last_name"),
            col("gender"),
            col("level"),
        ])
        .sort(["user_id"], SortMultipleOptions::default())
        .collect()?;
    Ok(users)
}

pub fn songs_table(songs: &DataFrame) -> Result<DataFrame> {
    let table = songs
        .clone()
        .lazy()
        .select([
            col("song_id"),
            col("title"),
            col("artist_id"),
            col("year"),
            col("duration"),
        ])
        .collect()?;
    Ok(table)
}

/// One row per `artist_id`, taken from the artist's song with the lowest
/// `song_id`.
pub fn artists_table(songs: &DataFrame) -> Result<DataFrame> {
    let table = songs
        .clone()
        .lazy()
        .sort(
            ["song_id"],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .group_by_stable([col("artist_id")])
        .agg([
            col("artist_name").first().alias("name"),
            col("artist_location").first().alias("location"),
            col("artist_latitude").first().alias("latitude"),
            col("artist_longitude").first().alias("longitude"),
        ])
        .collect()?;
    Ok(table)
}

/// Inner join of events and songs on exact title. Null titles never match;
/// a title shared by several songs yields one row per song.
pub fn songplays_table(staging: &StagingFrames, options: &TransformOptions) -> Result<DataFrame> {
    let mut events = staging.events.clone().lazy();
    if options.next_song_only {
        events = events.filter(col("page").eq(lit("NextSong")));
    }

    let songplays = events
        .join(
            staging.songs.clone().lazy(),
            [col("song")],
            [col("title")],
            JoinArgs::new(JoinType::Inner),
        )
        .select([
            start_time("ts"),
            col("userId").alias("user_id"),
            col("song_id"),
            col("artist_id"),
            col("sessionId").alias("session_id"),
            col("location"),
            col("userAgent").alias("user_agent"),
        ])
        .with_row_index("songplay_id", None)
        .collect()?;
    Ok(songplays)
}

impl StarSchema {
    pub fn row_counts(&self, staging: &StagingFrames) -> RowCounts {
        RowCounts {
            staging_events: staging.events.height(),
            staging_songs: staging.songs.height(),
            songplays: self.songplays.height(),
            users: self.users.height(),
            songs: self.songs.height(),
            artists: self.artists.height(),
            times: self.times.height(),
        }
    }
}
