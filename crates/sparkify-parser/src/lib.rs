pub mod errors;
pub mod jsonpaths;
pub mod model;
mod ndjson;

pub use errors::ParserError;
pub use jsonpaths::JsonPaths;
pub use model::{EventRecord, SongRecord, STAGING_EVENTS_COLUMNS};
pub use ndjson::{parse_event_log, parse_song_file};

#[cfg(test)]
mod tests;
