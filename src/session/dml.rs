use crate::driver::{DriverConnection, GeneratedKeys};
use crate::error::SqlSessionError;
use crate::query::Query;

use super::Session;
use super::core::prepare_bound;

impl<C: DriverConnection> Session<C> {
    /// Run a statement for effect; `true` when it produced a result set.
    ///
    /// # Errors
    /// Returns `MalformedQuery` for an unbindable template, or the driver's error.
    pub fn execute(&mut self, query: &Query) -> Result<bool, SqlSessionError> {
        let mut stmt = prepare_bound(&mut self.connection, query, &GeneratedKeys::None)?;
        stmt.execute()
    }

    /// Run a statement and return the affected-row count.
    ///
    /// # Errors
    /// Returns `MalformedQuery` for an unbindable template, or the driver's error.
    pub fn update(&mut self, query: &Query) -> Result<u64, SqlSessionError> {
        let mut stmt = prepare_bound(&mut self.connection, query, &GeneratedKeys::None)?;
        stmt.execute_update()
    }

    /// Run an insert and return its generated key.
    ///
    /// Keys are only requested when the session was opened with `return_generated_keys` or
    /// explicit key columns; otherwise this returns `Ok(None)`.
    ///
    /// # Errors
    /// Returns `MalformedQuery` for an unbindable template, or the driver's error.
    pub fn update_and_return_generated_key(
        &mut self,
        query: &Query,
    ) -> Result<Option<i64>, SqlSessionError> {
        let keys = self.options.generated_keys();
        let mut stmt = prepare_bound(&mut self.connection, query, &keys)?;
        stmt.execute_update()?;
        Ok(stmt.generated_key())
    }
}
