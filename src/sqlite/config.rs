use std::future::Future;
use std::time::Duration;

use bb8::{ManageConnection, Pool, PooledConnection};
use tracing::debug;
use uuid::Uuid;

use crate::error::SqlSessionError;

use super::connection::SqliteConnection;

pub type SqlitePooledConnection = PooledConnection<'static, SqliteManager>;

/// Where a pool's connections point, parsed from a connection URL.
///
/// Accepted forms: `sqlite::memory:` or `:memory:`, `sqlite://path`, `sqlite:path`,
/// `jdbc:sqlite:path`, `file:` URIs, and bare paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteTarget {
    location: String,
    memory: bool,
}

impl SqliteTarget {
    /// # Errors
    /// Returns `SqlSessionError::ConfigError` for an empty URL.
    pub fn parse(url: &str) -> Result<Self, SqlSessionError> {
        let url = url.trim();
        let rest = ["jdbc:sqlite:", "sqlite://", "sqlite:"]
            .iter()
            .find_map(|prefix| url.strip_prefix(prefix))
            .unwrap_or(url);

        if rest.is_empty() {
            return Err(SqlSessionError::ConfigError(format!(
                "no SQLite database in URL '{url}'"
            )));
        }

        if rest == ":memory:" {
            // Pooled connections must share one database, so each pool gets its own named
            // shared-cache memory database.
            return Ok(Self {
                location: format!(
                    "file:sql-session-{}?mode=memory&cache=shared",
                    Uuid::new_v4().simple()
                ),
                memory: true,
            });
        }

        Ok(Self {
            location: rest.to_string(),
            memory: rest.contains("mode=memory"),
        })
    }

    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    #[must_use]
    pub fn is_memory(&self) -> bool {
        self.memory
    }

    pub(crate) fn open(&self) -> rusqlite::Result<rusqlite::Connection> {
        // default open flags include SQLITE_OPEN_URI, so `file:` locations work as-is
        rusqlite::Connection::open(&self.location)
    }
}

/// Settings applied to every new pooled connection.
#[derive(Debug, Clone, Default)]
pub struct ConnectionSettings {
    pub statement_cache_capacity: usize,
    pub busy_timeout: Option<Duration>,
    pub init_sql: Option<String>,
}

impl ConnectionSettings {
    fn apply(&self, conn: &rusqlite::Connection) -> rusqlite::Result<()> {
        conn.set_prepared_statement_cache_capacity(self.statement_cache_capacity);
        if let Some(timeout) = self.busy_timeout {
            conn.busy_timeout(timeout)?;
        }
        if let Some(sql) = &self.init_sql {
            conn.execute_batch(sql)?;
        }
        Ok(())
    }
}

/// bb8 manager for `SQLite` connections.
#[derive(Debug, Clone)]
pub struct SqliteManager {
    target: SqliteTarget,
    settings: ConnectionSettings,
}

impl SqliteManager {
    #[must_use]
    pub fn new(target: SqliteTarget, settings: ConnectionSettings) -> Self {
        Self { target, settings }
    }

    #[must_use]
    pub fn target(&self) -> &SqliteTarget {
        &self.target
    }

    /// Build a pool with bb8 defaults from this manager.
    ///
    /// # Errors
    /// Returns `SqlSessionError` if the initial connections cannot be opened.
    pub async fn build_pool(self) -> Result<Pool<SqliteManager>, SqlSessionError> {
        Ok(Pool::builder().build(self).await?)
    }
}

impl ManageConnection for SqliteManager {
    type Connection = SqliteConnection;
    type Error = rusqlite::Error;

    #[allow(clippy::manual_async_fn)]
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let target = self.target.clone();
        let settings = self.settings.clone();
        async move {
            let conn = target.open()?;
            settings.apply(&conn)?;
            debug!(location = target.location(), "sqlite connection opened");
            Ok(SqliteConnection::from_rusqlite(conn))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn is_valid(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        async move { conn.as_rusqlite().execute_batch("SELECT 1") }
    }

    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        // a connection handed back mid-transaction is not reusable
        !conn.as_rusqlite().is_autocommit()
    }
}
