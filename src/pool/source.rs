use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bb8::{ManageConnection, Pool, PooledConnection, State};
use tracing::debug;

use crate::driver::{DriverConnection, GeneratedKeys, PreparedStatement};
use crate::error::SqlSessionError;
use crate::session::{Session, SessionOptions};
use crate::sqlite::{ConnectionSettings, SqliteManager, SqlitePooledConnection, SqliteTarget};

use super::PoolOptions;

/// A named pool handing out open connections.
///
/// Clones share the pool. Once [`close`](Self::close)d, checkouts fail; connections already
/// handed out stay usable until dropped.
#[derive(Debug, Clone)]
pub struct DataSource {
    name: String,
    username: Option<String>,
    pool: Pool<SqliteManager>,
    closed: Arc<AtomicBool>,
}

impl DataSource {
    /// Open a pool for `url`.
    ///
    /// # Errors
    /// Returns `SqlSessionError::ConfigError` for invalid options or URL, or the driver's error
    /// if the initial connections cannot be opened.
    pub async fn connect(
        name: &str,
        url: &str,
        username: Option<&str>,
        options: &PoolOptions,
    ) -> Result<Self, SqlSessionError> {
        options.validate()?;
        let target = SqliteTarget::parse(url)?;

        // A shared-cache memory database lives only while one of its connections is open.
        let (min_idle, max_lifetime) = if target.is_memory() {
            (options.min_idle.or(Some(1)), None)
        } else {
            (options.min_idle, options.max_lifetime())
        };

        let settings = ConnectionSettings {
            statement_cache_capacity: options.statement_cache_capacity,
            busy_timeout: options.busy_timeout(),
            init_sql: options.init_sql.clone(),
        };
        let location = target.location().to_string();
        let manager = SqliteManager::new(target, settings);

        let pool = Pool::builder()
            .max_size(options.max_size)
            .min_idle(min_idle)
            .connection_timeout(options.connection_timeout())
            .idle_timeout(options.idle_timeout())
            .max_lifetime(max_lifetime)
            .build(manager)
            .await?;

        debug!(pool = name, %location, max_size = options.max_size, "data source opened");
        Ok(Self {
            name: name.to_string(),
            username: username.map(str::to_string),
            pool,
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Recorded for diagnostics; `SQLite` does not authenticate.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Check out a connection.
    ///
    /// # Errors
    /// Returns `SqlSessionError::ConnectionError` once closed, or `PoolErrorSqlite` if the
    /// checkout times out or a new connection fails to open.
    pub async fn connection(&self) -> Result<SqlitePooledConnection, SqlSessionError> {
        if self.is_closed() {
            return Err(SqlSessionError::ConnectionError(format!(
                "DataSource ({}) is closed.",
                self.name
            )));
        }
        Ok(self.pool.get_owned().await?)
    }

    /// Check out a connection and open a session over it.
    ///
    /// # Errors
    /// As [`connection`](Self::connection), plus errors applying `options`.
    pub async fn session(
        &self,
        options: SessionOptions,
    ) -> Result<Session<SqlitePooledConnection>, SqlSessionError> {
        Session::new(self.connection().await?, options)
    }

    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(pool = %self.name, "data source closed");
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.pool.state()
    }
}

impl<M> DriverConnection for PooledConnection<'_, M>
where
    M: ManageConnection,
    M::Connection: DriverConnection,
{
    fn prepare(
        &mut self,
        sql: &str,
        keys: &GeneratedKeys,
    ) -> Result<Box<dyn PreparedStatement + '_>, SqlSessionError> {
        (**self).prepare(sql, keys)
    }

    fn auto_commit(&self) -> bool {
        (**self).auto_commit()
    }

    fn set_auto_commit(&mut self, enabled: bool) -> Result<(), SqlSessionError> {
        (**self).set_auto_commit(enabled)
    }

    fn commit(&mut self) -> Result<(), SqlSessionError> {
        (**self).commit()
    }

    fn rollback(&mut self) -> Result<(), SqlSessionError> {
        (**self).rollback()
    }

    fn set_read_only(&mut self, read_only: bool) -> Result<(), SqlSessionError> {
        (**self).set_read_only(read_only)
    }

    fn query_timeout(&self) -> Result<Option<Duration>, SqlSessionError> {
        (**self).query_timeout()
    }

    fn set_query_timeout(&mut self, timeout: Option<Duration>) -> Result<(), SqlSessionError> {
        (**self).set_query_timeout(timeout)
    }
}
