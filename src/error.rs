use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlSessionError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    PoolErrorSqlite(#[from] bb8::RunError<rusqlite::Error>),

    /// Pass-through slot for drivers that are not built into this crate.
    #[error(transparent)]
    Driver(Box<dyn std::error::Error + Send + Sync>),

    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    #[error("Missing value in column {column}")]
    MissingValue { column: String },

    #[error("Expected 1 row but received {0}.")]
    TooManyRows(usize),

    #[error("DataSource ({0}) is absent.")]
    DataSourceAbsent(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Cannot read column {column} as {expected}: found {actual}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        actual: String,
    },

    #[error("A transaction is already in progress; nested transactions are not supported")]
    NestedTransaction,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),
}

impl SqlSessionError {
    /// Wrap an error raised by an external driver without reinterpreting it.
    pub fn driver<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SqlSessionError::Driver(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_errors_render_expected_messages() {
        assert_eq!(
            SqlSessionError::TooManyRows(2).to_string(),
            "Expected 1 row but received 2."
        );
        assert_eq!(
            SqlSessionError::DataSourceAbsent("reports".into()).to_string(),
            "DataSource (reports) is absent."
        );
        assert_eq!(
            SqlSessionError::MissingValue {
                column: "name".into()
            }
            .to_string(),
            "Missing value in column name"
        );
    }

    #[test]
    fn driver_errors_are_transparent() {
        let io = std::io::Error::other("socket closed");
        let err = SqlSessionError::driver(io);
        assert_eq!(err.to_string(), "socket closed");
    }
}
