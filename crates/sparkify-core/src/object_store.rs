use std::fmt;

use serde::Serialize;

use crate::config::SourcePaths;
use crate::error::{EtlError, Result};

/// An `s3://bucket/prefix` location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct S3Uri {
    pub bucket: String,
    pub prefix: String,
}

impl S3Uri {
    pub fn parse(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("s3://")
            .ok_or_else(|| EtlError::Config(format!("'{uri}' is not an s3:// URI")))?;
        let (bucket, prefix) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return Err(EtlError::Config(format!("'{uri}' has no bucket")));
        }
        Ok(Self {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
        })
    }
}

impl fmt::Display for S3Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.prefix)
    }
}

/// The three dataset locations the COPY statements read.
pub fn configured_sources(paths: &SourcePaths) -> Result<Vec<(&'static str, S3Uri)>> {
    Ok(vec![
        ("log_data", S3Uri::parse(&paths.log_data)?),
        ("log_jsonpath", S3Uri::parse(&paths.log_jsonpath)?),
        ("song_data", S3Uri::parse(&paths.song_data)?),
    ])
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceStatus {
    pub name: &'static str,
    pub uri: S3Uri,
    pub sample_keys: Vec<String>,
    pub truncated: bool,
}

impl SourceStatus {
    pub fn is_empty(&self) -> bool {
        self.sample_keys.is_empty()
    }
}

#[cfg(feature = "runtime")]
pub use probe::SourceProbe;

#[cfg(feature = "runtime")]
mod probe {
    use aws_config::BehaviorVersion;
    use aws_sdk_s3::config::Region;
    use aws_sdk_s3::Client;
    use tracing::info;

    use super::{S3Uri, SourceStatus};
    use crate::error::{EtlError, Result};

    const SAMPLE_KEYS: i32 = 5;

    /// Lists a handful of keys under each source so a missing prefix or a
    /// region mismatch shows up before a long COPY does.
    #[derive(Clone)]
    pub struct SourceProbe {
        client: Client,
    }

    impl SourceProbe {
        pub async fn new(region: &str) -> Self {
            let shared_config = aws_config::defaults(BehaviorVersion::latest())
                .region(Region::new(region.to_string()))
                .load()
                .await;
            Self {
                client: Client::new(&shared_config),
            }
        }

        pub async fn probe(&self, name: &'static str, uri: &S3Uri) -> Result<SourceStatus> {
            let output = self
                .client
                .list_objects_v2()
                .bucket(&uri.bucket)
                .prefix(&uri.prefix)
                .max_keys(SAMPLE_KEYS)
                .send()
                .await
                .map_err(|err| EtlError::Config(format!("cannot list {uri}: {err}")))?;

            let sample_keys: Vec<String> = output
                .contents()
                .iter()
                .filter_map(|object| object.key().map(str::to_string))
                .collect();
            let truncated = output.is_truncated().unwrap_or(false);

            info!(source = name, uri = %uri, keys = sample_keys.len(), truncated, "Probed source");

            Ok(SourceStatus {
                name,
                uri: uri.clone(),
                sample_keys,
                truncated,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bucket_and_prefix() {
        let uri = S3Uri::parse("s3://udacity-dend/log_data").unwrap();
        assert_eq!(uri.bucket, "udacity-dend");
        assert_eq!(uri.prefix, "log_data");
        assert_eq!(uri.to_string(), "s3://udacity-dend/log_data");
    }

    #[test]
    fn bucket_without_prefix_is_allowed() {
        let uri = S3Uri::parse("s3://udacity-dend").unwrap();
        assert_eq!(uri.bucket, "udacity-dend");
        assert!(uri.prefix.is_empty());
    }

    #[test]
    fn rejects_other_schemes_and_missing_bucket() {
        assert!(S3Uri::parse("https://udacity-dend/log_data").is_err());
        assert!(S3Uri::parse("s3:///log_data").is_err());
    }

    #[test]
    fn default_sources_cover_all_copy_inputs() {
        let sources = configured_sources(&SourcePaths::default()).unwrap();
        let names: Vec<_> = sources.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, ["log_data", "log_jsonpath", "song_data"]);
        assert!(sources.iter().all(|(_, uri)| uri.bucket == "udacity-dend"));
    }
}
