//! Warehouse configuration loaded from a TOML file (`dwh.toml` by default).
//!
//! ```toml
//! [cluster]
//! host = "sparkify.abc123.us-west-2.redshift.amazonaws.com"
//! db_name = "dev"
//! db_user = "awsuser"
//! db_password = "..."
//!
//! [iam_role]
//! arn = "arn:aws:iam::123456789012:role/dwhRole"
//! ```
//!
//! The `[s3]` section is optional and defaults to the public dataset paths.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{EtlError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "dwh.toml";
pub const DEFAULT_PORT: u16 = 5439;
pub const DEFAULT_REGION: &str = "us-west-2";
pub const DEFAULT_LOG_DATA: &str = "s3://udacity-dend/log_data";
pub const DEFAULT_LOG_JSONPATH: &str = "s3://udacity-dend/log_json_path.json";
pub const DEFAULT_SONG_DATA: &str = "s3://udacity-dend/song_data";

#[derive(Debug, Clone, Deserialize)]
pub struct DwhConfig {
    #[serde(default)]
    pub cluster: Option<ClusterConfig>,
    pub iam_role: IamRoleConfig,
    #[serde(default)]
    pub s3: SourcePaths,
}

#[derive(Clone, Deserialize)]
pub struct ClusterConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
}

impl std::fmt::Debug for ClusterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("db_name", &self.db_name)
            .field("db_user", &self.db_user)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IamRoleConfig {
    pub arn: String,
}

/// Object-store locations of the raw datasets, all in one region.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SourcePaths {
    pub region: String,
    pub log_data: String,
    pub log_jsonpath: String,
    pub song_data: String,
}

impl Default for SourcePaths {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            log_data: DEFAULT_LOG_DATA.to_string(),
            log_jsonpath: DEFAULT_LOG_JSONPATH.to_string(),
            song_data: DEFAULT_SONG_DATA.to_string(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl DwhConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|err| {
            EtlError::Config(format!("cannot read {}: {}", path.display(), err))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DwhConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let arn = self.iam_role.arn.trim();
        if arn.is_empty() {
            return Err(EtlError::Config("iam_role.arn must be set".into()));
        }
        if !arn.starts_with("arn:") {
            return Err(EtlError::Config(format!(
                "iam_role.arn '{}' is not an ARN",
                self.iam_role.arn
            )));
        }
        ensure_sql_literal_safe("iam_role.arn", &self.iam_role.arn)?;

        ensure_sql_literal_safe("s3.region", &self.s3.region)?;
        if self.s3.region.trim().is_empty() {
            return Err(EtlError::Config("s3.region must not be empty".into()));
        }
        for (key, uri) in [
            ("s3.log_data", &self.s3.log_data),
            ("s3.log_jsonpath", &self.s3.log_jsonpath),
            ("s3.song_data", &self.s3.song_data),
        ] {
            ensure_sql_literal_safe(key, uri)?;
            let bucket = uri.strip_prefix("s3://").unwrap_or_default();
            if !uri.starts_with("s3://") || bucket.is_empty() || bucket.starts_with('/') {
                return Err(EtlError::Config(format!(
                    "{key} '{uri}' must be an s3://bucket/prefix URI"
                )));
            }
        }
        Ok(())
    }
}

// Values are spliced into COPY statements as string literals.
fn ensure_sql_literal_safe(key: &str, value: &str) -> Result<()> {
    if value.contains('\'') || value.contains('\\') {
        return Err(EtlError::Config(format!(
            "{key} must not contain quotes or backslashes"
        )));
    }
    Ok(())
}
