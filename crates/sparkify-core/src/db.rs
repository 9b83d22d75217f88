use std::env;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::postgres::PgConnectOptions;
use sqlx::{ConnectOptions, Connection, PgConnection};

use crate::config::{ClusterConfig, DwhConfig};
use crate::error::{EtlError, Result};

/// Runs one SQL statement and reports the rows it affected.
#[async_trait]
pub trait StatementExecutor: Send {
    async fn execute(&mut self, sql: &str) -> std::result::Result<u64, sqlx::Error>;
}

#[async_trait]
impl StatementExecutor for PgConnection {
    async fn execute(&mut self, sql: &str) -> std::result::Result<u64, sqlx::Error> {
        // Simple query protocol: DDL and COPY are not preparable on the warehouse.
        let result = sqlx::Executor::execute(self, sqlx::raw_sql(sql)).await?;
        Ok(result.rows_affected())
    }
}

/// Resolves connect options: `DATABASE_URL` / `SPARKIFY_DATABASE_URL` first,
/// then the `[cluster]` section.
pub fn connect_options(config: &DwhConfig) -> Result<PgConnectOptions> {
    if let Some(url) = database_url_from_env() {
        return Ok(PgConnectOptions::from_str(&url)?);
    }
    match &config.cluster {
        Some(cluster) => Ok(cluster_connect_options(cluster)),
        None => Err(EtlError::Config(
            "set DATABASE_URL (or SPARKIFY_DATABASE_URL) or add a [cluster] section".into(),
        )),
    }
}

pub fn cluster_connect_options(cluster: &ClusterConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&cluster.host)
        .port(cluster.port)
        .database(&cluster.db_name)
        .username(&cluster.db_user)
        .password(&cluster.db_password)
}

fn database_url_from_env() -> Option<String> {
    env::var("DATABASE_URL")
        .or_else(|_| env::var("SPARKIFY_DATABASE_URL"))
        .ok()
        .filter(|url| !url.trim().is_empty())
}

/// Opens the single session the pipeline runs on.
pub async fn connect(options: &PgConnectOptions) -> Result<PgConnection> {
    Ok(options.connect().await?)
}

pub async fn connect_url(database_url: &str) -> Result<PgConnection> {
    Ok(PgConnection::connect(database_url).await?)
}
