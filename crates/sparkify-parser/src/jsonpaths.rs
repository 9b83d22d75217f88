//! JSON path-mapping files as consumed by the warehouse's `COPY ... FORMAT AS JSON`.
//!
//! A mapping lists one expression per target column, in column order:
//!
//! ```json
//! {"jsonpaths": ["$['artist']", "$['auth']", "$.firstName"]}
//! ```

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::{ParserError, Result};
use crate::model::STAGING_EVENTS_COLUMNS;

#[derive(Debug, Deserialize)]
struct JsonPathsFile {
    jsonpaths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPaths {
    keys: Vec<String>,
}

impl JsonPaths {
    pub fn parse(content: &str) -> Result<Self> {
        let file: JsonPathsFile =
            serde_json::from_str(content).map_err(ParserError::JsonPathsFile)?;
        let keys = file
            .jsonpaths
            .iter()
            .map(|expr| parse_expression(expr))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { keys })
    }

    /// Source keys, one per target column.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Rejects mappings that do not cover every `staging_events` column.
    pub fn ensure_matches_staging_events(&self) -> Result<()> {
        if self.keys.len() != STAGING_EVENTS_COLUMNS.len() {
            return Err(ParserError::ColumnCountMismatch {
                expected: STAGING_EVENTS_COLUMNS.len(),
                found: self.keys.len(),
            });
        }
        Ok(())
    }

    /// Re-keys a raw object by staging column name. Keys missing in the source
    /// land as `null`, the way the warehouse loads them.
    pub fn remap(&self, source: &Map<String, Value>) -> Map<String, Value> {
        STAGING_EVENTS_COLUMNS
            .iter()
            .zip(&self.keys)
            .map(|(column, key)| {
                let value = source.get(key).cloned().unwrap_or(Value::Null);
                ((*column).to_string(), value)
            })
            .collect()
    }
}

fn parse_expression(expr: &str) -> Result<String> {
    let trimmed = expr.trim();
    if let Some(inner) = trimmed
        .strip_prefix("$['")
        .and_then(|rest| rest.strip_suffix("']"))
    {
        if !inner.is_empty() && !inner.contains('\'') {
            return Ok(inner.to_string());
        }
    }
    if let Some(inner) = trimmed.strip_prefix("$.") {
        if !inner.is_empty() && !inner.contains(['.', '[', ']']) {
            return Ok(inner.to_string());
        }
    }
    Err(ParserError::UnsupportedPath(expr.to_string()))
}
