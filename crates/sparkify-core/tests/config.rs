use sparkify_core::{
    config::{DwhConfig, SourcePaths, DEFAULT_PORT},
    db::cluster_connect_options,
    error::EtlError,
};

#[test]
fn minimal_config_uses_default_sources() {
    let config = DwhConfig::from_toml_str(
        r#"
        [iam_role]
        arn = "arn:aws:iam::123456789012:role/dwhRole"
        "#,
    )
    .expect("valid config");

    assert!(config.cluster.is_none());
    assert_eq!(config.s3, SourcePaths::default());
    assert_eq!(config.s3.region, "us-west-2");
    assert_eq!(config.s3.log_jsonpath, "s3://udacity-dend/log_json_path.json");
}

#[test]
fn cluster_section_builds_connect_options() {
    let config = DwhConfig::from_toml_str(
        r#"
        [cluster]
        host = "sparkify.abc123.us-west-2.redshift.amazonaws.com"
        db_name = "dev"
        db_user = "awsuser"
        db_password = "p@ss:word/with#symbols"

        [iam_role]
        arn = "arn:aws:iam::123456789012:role/dwhRole"
        "#,
    )
    .expect("valid config");

    let cluster = config.cluster.as_ref().expect("cluster section");
    assert_eq!(cluster.port, DEFAULT_PORT);

    let options = cluster_connect_options(cluster);
    assert_eq!(
        options.get_host(),
        "sparkify.abc123.us-west-2.redshift.amazonaws.com"
    );
    assert_eq!(options.get_port(), 5439);
    assert_eq!(options.get_database(), Some("dev"));
    assert_eq!(options.get_username(), "awsuser");

    // Credentials stay out of debug output.
    assert!(!format!("{cluster:?}").contains("p@ss"));
}

#[test]
fn missing_or_malformed_arn_is_rejected() {
    let err = DwhConfig::from_toml_str("[iam_role]\narn = \"\"\n").unwrap_err();
    assert!(matches!(err, EtlError::Config(_)));

    let err = DwhConfig::from_toml_str("[iam_role]\narn = \"dwhRole\"\n").unwrap_err();
    assert!(err.to_string().contains("is not an ARN"));

    let err = DwhConfig::from_toml_str("[cluster]\nhost = \"h\"\n").unwrap_err();
    assert!(matches!(err, EtlError::Toml(_)));
}

#[test]
fn values_that_would_break_sql_literals_are_rejected() {
    let err = DwhConfig::from_toml_str(
        r#"
        [iam_role]
        arn = "arn:aws:iam::1:role/x' ; DROP TABLE users; --"
        "#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("iam_role.arn"));
}

#[test]
fn non_s3_source_paths_are_rejected() {
    let err = DwhConfig::from_toml_str(
        r#"
        [iam_role]
        arn = "arn:aws:iam::123456789012:role/dwhRole"

        [s3]
        song_data = "https://example.com/song_data"
        "#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("s3.song_data"));
}
