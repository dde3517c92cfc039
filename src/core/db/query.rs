//! Query Execution Module
//!
//! Runs a single SQL statement and collects its raw result set: the column
//! names from the select list plus the owned SQLite values of every row.
//! Typing the values for callers is left to the table materializer.

use crate::core::{ReportError, Result};
use rusqlite::{types::Value as SqlValue, Connection, Params};
use std::time::Instant;
use tracing::debug;

/// The untyped result of one statement, as SQLite returned it
#[derive(Debug, Clone, PartialEq)]
pub struct RawResultSet {
    /// Column names from the query's select list
    pub columns: Vec<String>,
    /// Rows of owned SQLite values, in the order the engine produced them
    pub rows: Vec<Vec<SqlValue>>,
}

impl RawResultSet {
    /// Number of rows returned
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Query execution service that operates on a database connection
pub struct QueryExecutor<'a> {
    connection: &'a Connection,
}

impl<'a> QueryExecutor<'a> {
    /// Creates a new QueryExecutor for the given connection
    pub fn new(connection: &'a Connection) -> Self {
        QueryExecutor { connection }
    }

    /// Executes a SQL query with bound parameters and returns its raw rows
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Query` if the statement cannot be prepared
    /// (syntax error, missing table or column) or fails while stepping.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<RawResultSet> {
        let started = Instant::now();
        let mut stmt = self
            .connection
            .prepare(sql)
            .map_err(|e| ReportError::Query(format!("Failed to prepare statement: {}", e)))?;

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let column_count = stmt.column_count();

        let rows = stmt
            .query_map(params, |row| {
                (0..column_count)
                    .map(|i| row.get::<_, SqlValue>(i))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })
            .map_err(|e| ReportError::Query(format!("Query execution failed: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| ReportError::Query(format!("Result processing failed: {}", e)))?;

        debug!(
            rows = rows.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Statement finished"
        );
        Ok(RawResultSet { columns, rows })
    }
}
