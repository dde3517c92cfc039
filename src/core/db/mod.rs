//! Database Module
//!
//! The database layer is split into three concerns:
//! - **Connection Management** (`connection.rs`): opens read-only sessions and guarantees they are released
//! - **Query Execution** (`query.rs`): runs one statement and collects its raw result set
//! - **Schema Inspection** (`schema.rs`): lists tables and checks the columns the reports depend on
//!
//! All operations return the crate-wide `ReportError`.
pub mod connection;
pub mod query;
pub mod schema;

pub use connection::*;
pub use query::*;
pub use schema::*;
