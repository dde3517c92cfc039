//! Core Module
//!
//! Shared infrastructure for the report runner: the database layer
//! (sessions, query execution, schema inspection) and the error types.

pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use error::{ReportError, Result};
