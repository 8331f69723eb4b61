use std::time::Duration;

use tracing::{debug, warn};

use crate::action::QueryAction;
use crate::driver::{DriverConnection, GeneratedKeys, PreparedStatement};
use crate::error::SqlSessionError;
use crate::parameter::Parameter;
use crate::query::Query;

use super::SessionOptions;

/// A connection plus the options every statement on it runs with.
///
/// The session owns its connection (or a checkout of a pooled one) until [`close`](Self::close)
/// or drop. Operations block until the driver returns; one session serves one flow of control.
pub struct Session<C: DriverConnection> {
    pub(crate) connection: C,
    pub(crate) options: SessionOptions,
    // Set when this session switched the connection to read-only and must switch it back
    restore_read_only: bool,
    // The connection's own timeout, put back when this session overrode it
    restore_query_timeout: Option<Option<Duration>>,
}

impl<C: DriverConnection> Session<C> {
    /// Wrap an open connection, applying the query timeout and read-only mode.
    ///
    /// Both settings are undone on [`close`](Self::close) or drop, so a pooled connection goes
    /// back with the settings it was checked out with.
    ///
    /// # Errors
    /// Returns the driver's error if either setting cannot be applied.
    pub fn new(mut connection: C, options: SessionOptions) -> Result<Self, SqlSessionError> {
        let restore_query_timeout = match options.query_timeout {
            Some(timeout) => {
                let previous = connection.query_timeout()?;
                connection.set_query_timeout(Some(timeout))?;
                Some(previous)
            }
            None => None,
        };
        if options.read_only {
            if let Err(err) = connection.set_read_only(true) {
                if let Some(previous) = restore_query_timeout {
                    connection.set_query_timeout(previous)?;
                }
                return Err(err);
            }
        }
        let restore_read_only = options.read_only;
        Ok(Self {
            connection,
            options,
            restore_read_only,
            restore_query_timeout,
        })
    }

    /// Session over a connection whose settings are already managed by someone else.
    pub(crate) fn attached(connection: C, options: SessionOptions) -> Self {
        Self {
            connection,
            options,
            restore_read_only: false,
            restore_query_timeout: None,
        }
    }

    #[must_use]
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    #[must_use]
    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// Escape hatch for driver-specific calls.
    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.connection
    }

    /// Dispatch an action to the operation its kind names.
    ///
    /// # Errors
    /// Returns whatever that operation returns.
    pub fn run<A: QueryAction>(&mut self, action: &A) -> Result<A::Output, SqlSessionError> {
        debug!(kind = ?action.kind(), "running action");
        action.run_with_session(self)
    }

    /// Release the connection, undoing the settings applied at construction.
    ///
    /// # Errors
    /// Returns the driver's error if the connection cannot be switched back.
    pub fn close(mut self) -> Result<(), SqlSessionError> {
        self.restore_settings()?;
        debug!("session closed");
        Ok(())
    }

    fn restore_settings(&mut self) -> Result<(), SqlSessionError> {
        if let Some(previous) = self.restore_query_timeout.take() {
            self.connection.set_query_timeout(previous)?;
        }
        if self.restore_read_only {
            self.restore_read_only = false;
            self.connection.set_read_only(false)?;
        }
        Ok(())
    }
}

impl<C: DriverConnection> Drop for Session<C> {
    fn drop(&mut self) {
        if let Err(err) = self.restore_settings() {
            warn!(error = %err, "failed to restore connection settings while dropping session");
        }
    }
}

/// Prepare the normalized statement and bind the query's final parameter list.
pub(crate) fn prepare_bound<'c, C: DriverConnection>(
    connection: &'c mut C,
    query: &Query,
    keys: &GeneratedKeys,
) -> Result<Box<dyn PreparedStatement + 'c>, SqlSessionError> {
    let binds = query.bind_list()?;
    let mut stmt = connection.prepare(query.normalized_statement(), keys)?;
    debug!(sql = stmt.sql(), binds = binds.len(), "prepared statement");
    bind_all(stmt.as_mut(), &binds)?;
    Ok(stmt)
}

/// Bind one value per marker, replacing whatever an earlier execution left in the slots.
///
/// # Errors
/// Returns `MalformedQuery` when the value count differs from the statement's marker count.
pub(crate) fn bind_all(
    stmt: &mut dyn PreparedStatement,
    params: &[&Parameter],
) -> Result<(), SqlSessionError> {
    let expected = stmt.parameter_count();
    if params.len() != expected {
        return Err(SqlSessionError::MalformedQuery(format!(
            "statement has {expected} parameter marker(s) but {} value(s) were supplied: {}",
            params.len(),
            stmt.sql()
        )));
    }
    stmt.clear_bindings()?;
    for (idx, param) in params.iter().enumerate() {
        stmt.bind(idx + 1, param)?;
    }
    Ok(())
}
