use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("{source_name} line {line}: invalid JSON record: {source}")]
    Record {
        source_name: String,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("{source_name} line {line}: expected a JSON object")]
    NotAnObject { source_name: String, line: usize },

    #[error("invalid jsonpaths file: {0}")]
    JsonPathsFile(#[source] serde_json::Error),

    #[error("unsupported jsonpath expression '{0}'; expected $['key'] or $.key")]
    UnsupportedPath(String),

    #[error("jsonpaths file maps {found} columns but staging_events has {expected}")]
    ColumnCountMismatch { expected: usize, found: usize },
}

pub type Result<T> = std::result::Result<T, ParserError>;
