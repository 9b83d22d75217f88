//! DDL for the staging tables and the star schema.
//!
//! The staging tables mirror the raw JSON shape with relaxed nullability. The
//! warehouse tables carry primary/foreign keys plus the layout hints the
//! columnar engine uses: `songs` and `songplays` are distributed on `song_id`
//! so fact rows sit on the node holding their song, `users` and `artists` are
//! replicated to every node, and `times`/`songplays` are sorted on
//! `start_time`.

use crate::statements::{Stage, Statement};

pub const STAGING_EVENTS: &str = "staging_events";
pub const STAGING_SONGS: &str = "staging_songs";
pub const SONGPLAYS: &str = "songplays";
pub const USERS: &str = "users";
pub const SONGS: &str = "songs";
pub const ARTISTS: &str = "artists";
pub const TIMES: &str = "times";

const DIMENSIONS: &[&str] = &[TIMES, USERS, SONGS, ARTISTS];
const FACT: &[&str] = &[SONGPLAYS];

// artist, length and song are null for page visits without a track
// (e.g. Home, Settings, Upgrade).
const STAGING_EVENTS_CREATE: &str = r#"
CREATE TABLE staging_events (
    artist          varchar(250),
    auth            varchar(20)     not null,
    firstName       varchar(15),
    gender          char(1),
    itemInSession   integer         not null,
    lastName        varchar(15),
    length          real,
    level           varchar(4)      not null,
    location        varchar(150),
    method          varchar(4)      not null,
    page            varchar(50)     not null,
    registration    real,
    sessionId       integer         not null,
    song            varchar(400),
    status          smallint        not null,
    ts              bigint          not null,
    userAgent       varchar(400),
    userId          varchar(18)     not null
)"#;

const STAGING_SONGS_CREATE: &str = r#"
CREATE TABLE staging_songs (
    artist_id           varchar(18)     not null,
    artist_location     varchar(300),
    artist_latitude     real,
    artist_longitude    real,
    artist_name         varchar(250)    not null,
    duration            real            not null,
    num_songs           int             not null,
    song_id             varchar(18)     not null,
    title               varchar(400)    not null,
    year                smallint        not null
)"#;

const USERS_CREATE: &str = r#"
CREATE TABLE users (
    user_id         varchar(18)     primary key,
    first_name      varchar(15),
    last_name       varchar(15),
    gender          char(1),
    level           varchar(4)      not null
)
diststyle all"#;

const SONGS_CREATE: &str = r#"
CREATE TABLE songs (
    song_id         varchar(18)     primary key distkey,
    title           varchar(400)    not null,
    artist_id       varchar(18)     not null,
    year            smallint        not null,
    duration        real            not null
)"#;

const ARTISTS_CREATE: &str = r#"
CREATE TABLE artists (
    artist_id       varchar(18)     primary key,
    name            varchar(250)    not null,
    location        varchar(300),
    latitude        real,
    longitude       real
)
diststyle all"#;

const TIMES_CREATE: &str = r#"
CREATE TABLE times (
    start_time      timestamp       primary key sortkey,
    hour            smallint        not null,
    day             smallint        not null,
    week            smallint        not null,
    month           smallint        not null,
    year            smallint        not null,
    weekday         boolean         not null
)
diststyle auto"#;

const SONGPLAYS_CREATE: &str = r#"
CREATE TABLE songplays (
    songplay_id     integer         IDENTITY(0,1) primary key,
    start_time      timestamp       not null sortkey references times (start_time),
    user_id         varchar(18)     not null references users (user_id),
    song_id         varchar(18)     not null distkey references songs (song_id),
    artist_id       varchar(18)     not null references artists (artist_id),
    session_id      integer         not null,
    location        varchar(150),
    user_agent      varchar(400)
)"#;

/// `DROP TABLE IF EXISTS` for every table. `songplays` goes before the
/// dimensions it references.
pub fn drop_table_queries() -> Vec<Statement> {
    let drop_table = |name: &'static str, table: &'static str| {
        Statement::new(
            name,
            Stage::DropTables,
            table,
            format!("DROP TABLE IF EXISTS {table}"),
        )
    };

    vec![
        drop_table("staging_events_table_drop", STAGING_EVENTS),
        drop_table("staging_songs_table_drop", STAGING_SONGS),
        Statement::new(
            "songplay_table_drop",
            Stage::DropTables,
            SONGPLAYS,
            "DROP TABLE IF EXISTS songplays CASCADE",
        ),
        drop_table("user_table_drop", USERS).depends_on(FACT),
        drop_table("song_table_drop", SONGS).depends_on(FACT),
        drop_table("artist_table_drop", ARTISTS).depends_on(FACT),
        drop_table("time_table_drop", TIMES).depends_on(FACT),
    ]
}

/// `CREATE TABLE` for every table. `songplays` comes last because the
/// warehouse checks its foreign-key targets at creation time.
pub fn create_table_queries() -> Vec<Statement> {
    let create = |name: &'static str, table: &'static str, sql: &'static str| {
        Statement::new(name, Stage::CreateTables, table, sql.trim())
    };

    vec![
        create("staging_events_table_create", STAGING_EVENTS, STAGING_EVENTS_CREATE),
        create("staging_songs_table_create", STAGING_SONGS, STAGING_SONGS_CREATE),
        create("user_table_create", USERS, USERS_CREATE),
        create("song_table_create", SONGS, SONGS_CREATE),
        create("artist_table_create", ARTISTS, ARTISTS_CREATE),
        create("time_table_create", TIMES, TIMES_CREATE),
        create("songplay_table_create", SONGPLAYS, SONGPLAYS_CREATE).depends_on(DIMENSIONS),
    ]
}
