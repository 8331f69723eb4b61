use std::time::Duration;

use serde::Deserialize;

use crate::error::SqlSessionError;

/// Pool sizing and per-connection settings.
///
/// Deserializes from JSON with every field optional:
///
/// ```
/// use sql_session::pool::PoolOptions;
///
/// let opts: PoolOptions = serde_json::from_str(r#"{ "max_size": 4, "busy_timeout_ms": 500 }"#)?;
/// assert_eq!(opts.max_size, 4);
/// assert_eq!(opts.statement_cache_capacity, 250);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolOptions {
    pub max_size: u32,
    pub min_idle: Option<u32>,
    /// How long a checkout waits for a free connection.
    pub connection_timeout_ms: u64,
    pub idle_timeout_ms: Option<u64>,
    pub max_lifetime_ms: Option<u64>,
    /// Prepared statements cached per connection.
    pub statement_cache_capacity: usize,
    pub busy_timeout_ms: Option<u64>,
    /// Run on every new connection, e.g. `PRAGMA foreign_keys = ON`.
    pub init_sql: Option<String>,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_size: 10,
            min_idle: None,
            connection_timeout_ms: 30_000,
            idle_timeout_ms: None,
            max_lifetime_ms: None,
            statement_cache_capacity: 250,
            busy_timeout_ms: None,
            init_sql: None,
        }
    }
}

impl PoolOptions {
    #[must_use]
    pub fn builder() -> PoolOptionsBuilder {
        PoolOptionsBuilder::default()
    }

    /// # Errors
    /// Returns `SqlSessionError::ConfigError` for a zero-sized pool or `min_idle > max_size`.
    pub fn validate(&self) -> Result<(), SqlSessionError> {
        if self.max_size == 0 {
            return Err(SqlSessionError::ConfigError(
                "max_size must be at least 1".to_string(),
            ));
        }
        if let Some(min_idle) = self.min_idle {
            if min_idle > self.max_size {
                return Err(SqlSessionError::ConfigError(format!(
                    "min_idle ({min_idle}) exceeds max_size ({})",
                    self.max_size
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    #[must_use]
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_ms.map(Duration::from_millis)
    }

    #[must_use]
    pub fn max_lifetime(&self) -> Option<Duration> {
        self.max_lifetime_ms.map(Duration::from_millis)
    }

    #[must_use]
    pub fn busy_timeout(&self) -> Option<Duration> {
        self.busy_timeout_ms.map(Duration::from_millis)
    }
}

/// Fluent builder for [`PoolOptions`].
#[derive(Debug, Clone, Default)]
pub struct PoolOptionsBuilder {
    opts: PoolOptions,
}

impl PoolOptionsBuilder {
    #[must_use]
    pub fn max_size(mut self, max_size: u32) -> Self {
        self.opts.max_size = max_size;
        self
    }

    #[must_use]
    pub fn min_idle(mut self, min_idle: u32) -> Self {
        self.opts.min_idle = Some(min_idle);
        self
    }

    #[must_use]
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.opts.connection_timeout_ms = millis(timeout);
        self
    }

    #[must_use]
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.opts.idle_timeout_ms = Some(millis(timeout));
        self
    }

    #[must_use]
    pub fn max_lifetime(mut self, lifetime: Duration) -> Self {
        self.opts.max_lifetime_ms = Some(millis(lifetime));
        self
    }

    #[must_use]
    pub fn statement_cache_capacity(mut self, capacity: usize) -> Self {
        self.opts.statement_cache_capacity = capacity;
        self
    }

    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.opts.busy_timeout_ms = Some(millis(timeout));
        self
    }

    #[must_use]
    pub fn init_sql(mut self, sql: impl Into<String>) -> Self {
        self.opts.init_sql = Some(sql.into());
        self
    }

    #[must_use]
    pub fn finish(self) -> PoolOptions {
        self.opts
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_json_fields() {
        let opts: PoolOptions = serde_json::from_str(r#"{"min_idle": 2}"#).unwrap();
        assert_eq!(opts.max_size, 10);
        assert_eq!(opts.min_idle, Some(2));
        assert_eq!(opts.connection_timeout(), Duration::from_secs(30));
        assert_eq!(opts.idle_timeout(), None);
    }

    #[test]
    fn builder_and_validation() {
        let opts = PoolOptions::builder()
            .max_size(2)
            .busy_timeout(Duration::from_millis(750))
            .init_sql("PRAGMA foreign_keys = ON")
            .finish();
        assert_eq!(opts.busy_timeout(), Some(Duration::from_millis(750)));
        assert!(opts.validate().is_ok());

        let too_many_idle = PoolOptions::builder().max_size(2).min_idle(3).finish();
        assert!(matches!(
            too_many_idle.validate(),
            Err(SqlSessionError::ConfigError(_))
        ));
        assert!(PoolOptions::builder().max_size(0).finish().validate().is_err());
    }
}
