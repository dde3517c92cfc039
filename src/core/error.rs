//! Report Error Module
//!
//! This module defines the error types shared by every layer of the report
//! runner. Connection failures abort a run, query failures are scoped to the
//! step that raised them.
use thiserror::Error;

/// Comprehensive error type for the report runner.
///
/// - Connection failures (missing, unreadable, or non-database files)
/// - Query failures (malformed SQL, schema mismatch against the database)
/// - Configuration loading and output-format errors
/// - File system and JSON serialization errors
#[derive(Error, Debug)]
pub enum ReportError {
    /// The database file could not be opened or is not a database
    #[error("Connection error: could not open '{path}': {source}")]
    Connection {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    /// SQL query errors (syntax, execution, missing tables or columns)
    #[error("Query error: {0}")]
    Query(String),

    /// Database-related errors from SQLite operations outside a report step
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Type alias for Result to use ReportError as the error type.
pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let conn_err = ReportError::Connection {
            path: "missing.sqlite".to_string(),
            source: rusqlite::Error::InvalidQuery,
        };
        assert!(conn_err.to_string().contains("Connection error"));
        assert!(conn_err.to_string().contains("missing.sqlite"));

        let query_err = ReportError::Query("no such table: offices".to_string());
        assert!(query_err.to_string().contains("Query error"));

        let config_err = ReportError::Config("Invalid config".to_string());
        assert!(config_err.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let report_err: ReportError = io_err.into();
        match report_err {
            ReportError::Io(_) => {}
            _ => panic!("Expected IO error"),
        }

        let json_err: std::result::Result<serde_json::Value, serde_json::Error> =
            serde_json::from_str("{ invalid json }");
        let report_err: ReportError = json_err.unwrap_err().into();
        match report_err {
            ReportError::Json(_) => {}
            _ => panic!("Expected JSON error"),
        }
    }
}
