use std::collections::{BTreeMap, BTreeSet};
use std::sync::{LazyLock, PoisonError, RwLock};

use tracing::debug;

use crate::error::SqlSessionError;

use super::{DataSource, PoolOptions};

/// Name of the pool behind [`DataSourceRegistry::init_default`].
pub const DEFAULT_POOL_NAME: &str = "default";

static GLOBAL: LazyLock<DataSourceRegistry> = LazyLock::new(DataSourceRegistry::new);

#[derive(Debug, Default)]
struct Entries {
    sources: BTreeMap<String, DataSource>,
    closed: BTreeSet<String>,
}

/// Named data sources, owned by the caller and passed where needed.
///
/// ```no_run
/// use sql_session::pool::DataSourceRegistry;
/// use sql_session::session::SessionOptions;
///
/// # async fn demo() -> Result<(), sql_session::SqlSessionError> {
/// let registry = DataSourceRegistry::new();
/// registry
///     .init("reports", "sqlite:reports.db", None, None, |opts| opts.max_size = 4)
///     .await?;
/// let session = registry.data_source("reports")?.session(SessionOptions::default()).await?;
/// session.close()?;
/// registry.close_all();
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct DataSourceRegistry {
    entries: RwLock<Entries>,
}

impl DataSourceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry for callers that want one implicit set of pools.
    #[must_use]
    pub fn global() -> &'static DataSourceRegistry {
        &GLOBAL
    }

    /// Open a pool under `name`, replacing and closing any pool already registered there.
    ///
    /// `configure` adjusts the default [`PoolOptions`] before the pool is built. The password is
    /// accepted for drivers that authenticate; `SQLite` ignores it.
    ///
    /// # Errors
    /// Returns the error from [`DataSource::connect`].
    pub async fn init<F>(
        &self,
        name: &str,
        url: &str,
        username: Option<&str>,
        _password: Option<&str>,
        configure: F,
    ) -> Result<DataSource, SqlSessionError>
    where
        F: FnOnce(&mut PoolOptions),
    {
        let mut options = PoolOptions::default();
        configure(&mut options);
        let source = DataSource::connect(name, url, username, &options).await?;

        let previous = {
            let mut entries = self.write();
            entries.closed.remove(name);
            entries.sources.insert(name.to_string(), source.clone())
        };
        if let Some(previous) = previous {
            debug!(pool = name, "replacing data source");
            previous.close();
        }
        Ok(source)
    }

    /// # Errors
    /// Returns `SqlSessionError::DataSourceAbsent` if no pool was initialized under `name`.
    pub fn data_source(&self, name: &str) -> Result<DataSource, SqlSessionError> {
        self.read()
            .sources
            .get(name)
            .cloned()
            .ok_or_else(|| SqlSessionError::DataSourceAbsent(name.to_string()))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.read().sources.contains_key(name)
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.read().sources.keys().cloned().collect()
    }

    /// Close and unregister the pool under `name`. Closing it again is a no-op.
    ///
    /// # Errors
    /// Returns `SqlSessionError::DataSourceAbsent` if `name` was never initialized.
    pub fn close(&self, name: &str) -> Result<(), SqlSessionError> {
        let source = {
            let mut entries = self.write();
            match entries.sources.remove(name) {
                Some(source) => {
                    entries.closed.insert(name.to_string());
                    source
                }
                None if entries.closed.contains(name) => return Ok(()),
                None => return Err(SqlSessionError::DataSourceAbsent(name.to_string())),
            }
        };
        source.close();
        Ok(())
    }

    pub fn close_all(&self) {
        let sources = {
            let mut entries = self.write();
            let sources = std::mem::take(&mut entries.sources);
            entries.closed.extend(sources.keys().cloned());
            sources
        };
        for source in sources.values() {
            source.close();
        }
    }

    /// [`init`](Self::init) under [`DEFAULT_POOL_NAME`].
    ///
    /// # Errors
    /// Returns the error from [`DataSource::connect`].
    pub async fn init_default<F>(
        &self,
        url: &str,
        username: Option<&str>,
        password: Option<&str>,
        configure: F,
    ) -> Result<DataSource, SqlSessionError>
    where
        F: FnOnce(&mut PoolOptions),
    {
        self.init(DEFAULT_POOL_NAME, url, username, password, configure)
            .await
    }

    /// # Errors
    /// Returns `SqlSessionError::DataSourceAbsent` if the default pool was never initialized.
    pub fn default_source(&self) -> Result<DataSource, SqlSessionError> {
        self.data_source(DEFAULT_POOL_NAME)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_names_are_reported() {
        let registry = DataSourceRegistry::new();
        let err = registry.data_source("missing").unwrap_err();
        assert_eq!(err.to_string(), "DataSource (missing) is absent.");
        assert!(matches!(
            registry.close("missing"),
            Err(SqlSessionError::DataSourceAbsent(_))
        ));
    }
}
