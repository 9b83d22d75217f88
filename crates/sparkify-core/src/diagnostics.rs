use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::{PgConnection, Row};

use crate::error::Result;

/// Raw dump of the warehouse load-error log, oldest first. Run by hand after
/// a failed COPY; not part of the automated pipeline.
pub const LOAD_ERRORS_QUERY: &str = "SELECT * FROM stl_load_errors ORDER BY starttime";

pub fn get_load_errors() -> &'static str {
    LOAD_ERRORS_QUERY
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadErrorRow {
    pub start_time: NaiveDateTime,
    pub file_name: String,
    pub line_number: i64,
    pub column_name: String,
    pub column_type: String,
    pub raw_field_value: String,
    pub error_code: i32,
    pub error_reason: String,
}

/// Typed view of the most recent `limit` load errors, oldest first.
pub async fn fetch_load_errors(conn: &mut PgConnection, limit: u32) -> Result<Vec<LoadErrorRow>> {
    let sql = format!(
        r#"
        SELECT starttime, filename, line_number, colname, type_name, raw_field_value, err_code, err_reason
        FROM (
            SELECT
                starttime,
                TRIM(filename) AS filename,
                line_number,
                TRIM(colname) AS colname,
                TRIM(type) AS type_name,
                TRIM(raw_field_value) AS raw_field_value,
                err_code,
                TRIM(err_reason) AS err_reason
            FROM stl_load_errors
            ORDER BY starttime DESC
            LIMIT {limit}
        ) AS recent
        ORDER BY starttime
        "#
    );

    let rows = sqlx::raw_sql(&sql).fetch_all(&mut *conn).await?;

    let mut errors = Vec::with_capacity(rows.len());
    for row in rows {
        errors.push(LoadErrorRow {
            start_time: row.try_get("starttime")?,
            file_name: row.try_get("filename")?,
            line_number: row.try_get("line_number")?,
            column_name: row.try_get("colname")?,
            column_type: row.try_get("type_name")?,
            raw_field_value: row.try_get("raw_field_value")?,
            error_code: row.try_get("err_code")?,
            error_reason: row.try_get("err_reason")?,
        });
    }
    Ok(errors)
}
