use sparkify_core::{
    config::DwhConfig,
    copy_table_queries, create_table_queries, drop_table_queries, get_load_errors,
    insert_table_queries,
    statements::{render_script, Stage},
    CopyConfig, TransformOptions,
};

const CONFIG: &str = r#"
[iam_role]
arn = "arn:aws:iam::123456789012:role/dwhRole"
"#;

fn copy_config() -> CopyConfig {
    let config = DwhConfig::from_toml_str(CONFIG).expect("valid config");
    CopyConfig::from(&config)
}

fn targets(statements: &[sparkify_core::statements::Statement]) -> Vec<&str> {
    statements.iter().map(|s| s.target).collect()
}

#[test]
fn drop_order_removes_fact_before_dimensions() {
    let drops = drop_table_queries();
    assert_eq!(
        targets(&drops),
        ["staging_events", "staging_songs", "songplays", "users", "songs", "artists", "times"]
    );
    assert!(drops.iter().all(|s| s.stage == Stage::DropTables));
    assert!(drops
        .iter()
        .all(|s| s.sql.starts_with("DROP TABLE IF EXISTS")));
}

#[test]
fn songplays_is_created_after_every_table_it_references() {
    let creates = create_table_queries();
    assert_eq!(creates.len(), 7);
    let last = creates.last().unwrap();
    assert_eq!(last.target, "songplays");

    let position = |table: &str| creates.iter().position(|s| s.target == table).unwrap();
    for referenced in ["times", "users", "songs", "artists"] {
        assert!(position(referenced) < position("songplays"));
        assert!(last.sql.contains(&format!("references {referenced}")));
    }
}

#[test]
fn create_statements_carry_layout_hints() {
    let creates = create_table_queries();
    let sql = |table: &str| {
        creates
            .iter()
            .find(|s| s.target == table)
            .map(|s| s.sql.clone())
            .unwrap()
    };

    assert!(sql("songs").contains("primary key distkey"));
    assert!(sql("songplays").contains("distkey references songs (song_id)"));
    assert!(sql("songplays").contains("sortkey references times (start_time)"));
    assert!(sql("songplays").contains("IDENTITY(0,1)"));
    assert!(sql("times").contains("primary key sortkey"));
    assert!(sql("times").ends_with("diststyle auto"));
    assert!(sql("users").ends_with("diststyle all"));
    assert!(sql("artists").ends_with("diststyle all"));
}

#[test]
fn copy_statements_use_configured_role_and_region() {
    let copies = copy_table_queries(&copy_config());
    assert_eq!(targets(&copies), ["staging_events", "staging_songs"]);

    let events = &copies[0].sql;
    assert!(events.starts_with("COPY staging_events FROM 's3://udacity-dend/log_data'"));
    assert!(events.contains("CREDENTIALS 'aws_iam_role=arn:aws:iam::123456789012:role/dwhRole'"));
    assert!(events.contains("REGION 'us-west-2'"));
    assert!(events.contains("FORMAT AS JSON 's3://udacity-dend/log_json_path.json'"));

    let songs = &copies[1].sql;
    assert!(songs.starts_with("COPY staging_songs FROM 's3://udacity-dend/song_data'"));
    assert!(songs.contains("aws_iam_role=arn:aws:iam::123456789012:role/dwhRole"));
    assert!(songs.ends_with("FORMAT AS JSON 'auto'"));
}

#[test]
fn copy_statements_follow_overridden_sources() {
    let config = DwhConfig::from_toml_str(
        r#"
        [iam_role]
        arn = "arn:aws:iam::999999999999:role/other"

        [s3]
        region = "eu-central-1"
        log_data = "s3://my-bucket/events"
        log_jsonpath = "s3://my-bucket/paths.json"
        song_data = "s3://my-bucket/songs"
        "#,
    )
    .expect("valid config");
    let copies = copy_table_queries(&CopyConfig::from(&config));
    assert!(copies[0].sql.contains("'s3://my-bucket/events'"));
    assert!(copies[0].sql.contains("'s3://my-bucket/paths.json'"));
    assert!(copies[1].sql.contains("'s3://my-bucket/songs'"));
    assert!(copies.iter().all(|s| s.sql.contains("REGION 'eu-central-1'")));
}

#[test]
fn dimensions_load_before_fact() {
    let inserts = insert_table_queries(&TransformOptions::default());
    assert_eq!(
        targets(&inserts),
        ["times", "users", "songs", "artists", "songplays"]
    );
    assert!(inserts[..4].iter().all(|s| s.stage == Stage::LoadDimensions));
    assert_eq!(inserts[4].stage, Stage::LoadFact);
}

#[test]
fn time_insert_derives_calendar_fields_from_epoch_millis() {
    let inserts = insert_table_queries(&TransformOptions::default());
    let times = &inserts[0].sql;
    assert!(times.contains("TIMESTAMP 'epoch' + ts / 1000 * INTERVAL '1 second'"));
    assert!(times.contains("SELECT DISTINCT"));
    for field in ["hour", "day", "week", "month", "year"] {
        assert!(times.contains(&format!("EXTRACT({field} FROM start_time) AS {field}")));
    }
    assert!(times.contains("EXTRACT(dayofweek FROM start_time) IN (1, 2, 3, 4, 5)"));
}

#[test]
fn user_insert_keeps_latest_event_per_user() {
    let inserts = insert_table_queries(&TransformOptions::default());
    let users = &inserts[1].sql;
    assert!(users.contains("ROW_NUMBER() OVER (PARTITION BY userId ORDER BY ts DESC)"));
    assert!(users.ends_with("WHERE recency = 1"));
}

#[test]
fn artist_insert_keeps_one_row_per_artist_id() {
    let inserts = insert_table_queries(&TransformOptions::default());
    let artists = &inserts[3].sql;
    assert!(!artists.contains("DISTINCT"));
    assert!(artists.contains("ROW_NUMBER() OVER (PARTITION BY artist_id ORDER BY song_id)"));
    assert!(artists.ends_with("WHERE occurrence = 1"));
}

#[test]
fn songplay_caveat_only_without_next_song_filter() {
    assert!(TransformOptions::default().songplay_caveat().is_some());
    let filtered = TransformOptions {
        next_song_only: true,
    };
    assert_eq!(filtered.songplay_caveat(), None);
}

#[test]
fn songplay_join_filters_next_song_only_when_asked() {
    let plain = insert_table_queries(&TransformOptions::default());
    let songplays = &plain[4].sql;
    assert!(songplays.contains("JOIN staging_songs s ON (e.song = s.title)"));
    assert!(!songplays.contains("NextSong"));

    let filtered = insert_table_queries(&TransformOptions {
        next_song_only: true,
    });
    assert!(filtered[4].sql.ends_with("WHERE e.page = 'NextSong'"));
}

#[test]
fn load_errors_query_is_ordered_by_start_time() {
    assert_eq!(
        get_load_errors(),
        "SELECT * FROM stl_load_errors ORDER BY starttime"
    );
}

#[test]
fn rendered_script_terminates_each_statement() {
    let script = render_script(&drop_table_queries());
    assert_eq!(script.matches(";\n").count(), 7);
    assert!(script.starts_with("-- drop_tables / staging_events_table_drop\n"));
    assert!(script.contains("DROP TABLE IF EXISTS songplays CASCADE;"));
}
