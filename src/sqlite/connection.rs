use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::driver::{DriverConnection, GeneratedKeys, PreparedStatement};
use crate::error::SqlSessionError;

use super::query::SqlitePreparedStatement;

/// A blocking `rusqlite` connection driving a [`Session`](crate::session::Session).
#[derive(Debug)]
pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl SqliteConnection {
    /// Open (or create) a database file.
    ///
    /// # Errors
    /// Returns `SqlSessionError::SqliteError` if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SqlSessionError> {
        Ok(Self::from_rusqlite(rusqlite::Connection::open(path)?))
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    /// Returns `SqlSessionError::SqliteError` if `SQLite` cannot allocate the database.
    pub fn open_in_memory() -> Result<Self, SqlSessionError> {
        Ok(Self::from_rusqlite(rusqlite::Connection::open_in_memory()?))
    }

    #[must_use]
    pub fn from_rusqlite(conn: rusqlite::Connection) -> Self {
        Self { conn }
    }

    #[must_use]
    pub fn as_rusqlite(&self) -> &rusqlite::Connection {
        &self.conn
    }

    #[must_use]
    pub fn into_rusqlite(self) -> rusqlite::Connection {
        self.conn
    }

    /// Run one or more `;`-separated statements without parameters, e.g. a schema script.
    ///
    /// # Errors
    /// Returns `SqlSessionError::SqliteError` if any statement fails.
    pub fn execute_batch(&self, sql: &str) -> Result<(), SqlSessionError> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Close the connection, surfacing errors that a plain drop would swallow.
    ///
    /// # Errors
    /// Returns `SqlSessionError::SqliteError` if `SQLite` refuses to close.
    pub fn close(self) -> Result<(), SqlSessionError> {
        self.conn.close().map_err(|(_, err)| err.into())
    }
}

impl DriverConnection for SqliteConnection {
    fn prepare(
        &mut self,
        sql: &str,
        keys: &GeneratedKeys,
    ) -> Result<Box<dyn PreparedStatement + '_>, SqlSessionError> {
        Ok(Box::new(SqlitePreparedStatement::new(&self.conn, sql, keys)?))
    }

    fn auto_commit(&self) -> bool {
        self.conn.is_autocommit()
    }

    fn set_auto_commit(&mut self, enabled: bool) -> Result<(), SqlSessionError> {
        match (enabled, self.conn.is_autocommit()) {
            (true, false) => self.conn.execute_batch("COMMIT")?,
            (false, true) => self.conn.execute_batch("BEGIN")?,
            _ => {}
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<(), SqlSessionError> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), SqlSessionError> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }

    fn set_read_only(&mut self, read_only: bool) -> Result<(), SqlSessionError> {
        let pragma = if read_only {
            "PRAGMA query_only = ON"
        } else {
            "PRAGMA query_only = OFF"
        };
        self.conn.execute_batch(pragma)?;
        Ok(())
    }

    fn query_timeout(&self) -> Result<Option<Duration>, SqlSessionError> {
        let millis: i64 = self
            .conn
            .pragma_query_value(None, "busy_timeout", |row| row.get(0))?;
        Ok(u64::try_from(millis)
            .ok()
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis))
    }

    fn set_query_timeout(&mut self, timeout: Option<Duration>) -> Result<(), SqlSessionError> {
        // lock waits are the only statement-level timeout SQLite exposes; zero disables them
        let timeout = timeout.unwrap_or(Duration::ZERO);
        debug!(?timeout, "sqlite busy timeout");
        self.conn.busy_timeout(timeout)?;
        Ok(())
    }
}
