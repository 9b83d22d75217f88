use crate::config::DwhConfig;
use crate::schema::{STAGING_EVENTS, STAGING_SONGS};
use crate::statements::{Stage, Statement};

/// Inputs of the bulk COPY statements. Built from a validated [`DwhConfig`];
/// nothing here is read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyConfig {
    pub iam_role_arn: String,
    pub region: String,
    pub log_data: String,
    pub log_jsonpath: String,
    pub song_data: String,
}

impl From<&DwhConfig> for CopyConfig {
    fn from(config: &DwhConfig) -> Self {
        Self {
            iam_role_arn: config.iam_role.arn.trim().to_string(),
            region: config.s3.region.clone(),
            log_data: config.s3.log_data.clone(),
            log_jsonpath: config.s3.log_jsonpath.clone(),
            song_data: config.s3.song_data.clone(),
        }
    }
}

/// Event logs go through the path-mapping file; song files already match
/// the staging columns and use `auto`.
pub fn copy_table_queries(config: &CopyConfig) -> Vec<Statement> {
    vec![
        Statement::new(
            "staging_events_copy",
            Stage::CopyStaging,
            STAGING_EVENTS,
            format!(
                "COPY staging_events FROM '{source}'\n\
                 CREDENTIALS 'aws_iam_role={arn}'\n\
                 REGION '{region}'\n\
                 FORMAT AS JSON '{jsonpath}'",
                source = config.log_data,
                arn = config.iam_role_arn,
                region = config.region,
                jsonpath = config.log_jsonpath,
            ),
        ),
        Statement::new(
            "staging_songs_copy",
            Stage::CopyStaging,
            STAGING_SONGS,
            format!(
                "COPY staging_songs FROM '{source}'\n\
                 CREDENTIALS 'aws_iam_role={arn}'\n\
                 REGION '{region}'\n\
                 FORMAT AS JSON 'auto'",
                source = config.song_data,
                arn = config.iam_role_arn,
                region = config.region,
            ),
        ),
    ]
}
