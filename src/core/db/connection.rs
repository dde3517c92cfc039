//! Connection Management Module
//!
//! Opens the report database read-only and hands out a `Session` that owns
//! the connection for the duration of one run. Dropping the session closes
//! the connection, so every exit path (including a failed step) releases the
//! file handle.

use crate::core::{ReportError, Result};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// An open, read-only connection to the report database
#[derive(Debug)]
pub struct Session {
    connection: Connection,
    path: PathBuf,
}

impl Session {
    /// Opens the database at `path` without write or create permissions.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Connection` if the file is missing, unreadable,
    /// or is not an SQLite database.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        debug!("Opening report database {}", shown);

        let connection = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| ReportError::Connection {
            path: shown.clone(),
            source,
        })?;

        // SQLite opens lazily; touching the catalog surfaces "file is not a database" here.
        connection
            .query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| {
                row.get::<_, i64>(0)
            })
            .map_err(|source| ReportError::Connection {
                path: shown.clone(),
                source,
            })?;

        Ok(Session {
            connection,
            path: path.to_path_buf(),
        })
    }

    /// The underlying connection, borrowed for the lifetime of the session
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Path of the database file this session was opened on
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Closes the connection, reporting any error SQLite raises while doing so.
    pub fn close(self) -> Result<()> {
        let path = self.path;
        self.connection.close().map_err(|(_, e)| {
            warn!("Failed to close {}: {}", path.display(), e);
            ReportError::Database(e)
        })?;
        debug!("Closed report database {}", path.display());
        Ok(())
    }
}

/// Opens a session, runs `f` against it, and closes the session afterwards.
///
/// The session is closed whether `f` succeeds or fails; an error from `f`
/// takes precedence over an error raised while closing.
pub fn with_session<P, T, F>(path: P, f: F) -> Result<T>
where
    P: AsRef<Path>,
    F: FnOnce(&Session) -> Result<T>,
{
    let session = Session::open(path)?;
    let outcome = f(&session);
    let closed = session.close();
    let value = outcome?;
    closed?;
    Ok(value)
}
