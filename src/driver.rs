//! Collaborator traits a database driver implements to back a [`Session`](crate::session::Session).
//!
//! The session only needs four capabilities: prepare a positional statement, bind one value per
//! marker, execute for a count or a cursor, and control the transaction. The built-in `sqlite`
//! backend implements them over `rusqlite`; other drivers can plug in the same way.

use std::sync::Arc;
use std::time::Duration;

use crate::error::SqlSessionError;
use crate::parameter::Parameter;
use crate::results::ColumnInfo;
use crate::types::RowValues;

/// How a prepared statement should report keys generated by an insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GeneratedKeys {
    #[default]
    None,
    /// Whatever the driver considers the generated key.
    Auto,
    /// Keys from the named columns.
    Columns(Vec<String>),
}

impl GeneratedKeys {
    #[must_use]
    pub fn requested(&self) -> bool {
        !matches!(self, GeneratedKeys::None)
    }
}

/// An open connection.
pub trait DriverConnection {
    /// Prepare a statement that uses positional markers only.
    ///
    /// # Errors
    /// Returns the driver's error if the statement cannot be prepared.
    fn prepare(
        &mut self,
        sql: &str,
        keys: &GeneratedKeys,
    ) -> Result<Box<dyn PreparedStatement + '_>, SqlSessionError>;

    /// `false` while a transaction is open.
    fn auto_commit(&self) -> bool;

    /// Disabling auto-commit opens a transaction; enabling it commits any open one.
    ///
    /// # Errors
    /// Returns the driver's error if the transaction state cannot be changed.
    fn set_auto_commit(&mut self, enabled: bool) -> Result<(), SqlSessionError>;

    /// # Errors
    /// Returns the driver's error if the commit fails.
    fn commit(&mut self) -> Result<(), SqlSessionError>;

    /// # Errors
    /// Returns the driver's error if the rollback fails.
    fn rollback(&mut self) -> Result<(), SqlSessionError>;

    /// # Errors
    /// Returns the driver's error if the mode cannot be changed.
    fn set_read_only(&mut self, read_only: bool) -> Result<(), SqlSessionError>;

    /// The timeout currently in effect; `None` when statements wait indefinitely.
    ///
    /// # Errors
    /// Returns the driver's error if the setting cannot be read.
    fn query_timeout(&self) -> Result<Option<Duration>, SqlSessionError>;

    /// Applies to every statement executed afterwards. `None` removes any timeout.
    ///
    /// # Errors
    /// Returns the driver's error if the timeout cannot be applied.
    fn set_query_timeout(&mut self, timeout: Option<Duration>) -> Result<(), SqlSessionError>;
}

/// A prepared statement with 1-based parameter slots.
pub trait PreparedStatement {
    fn sql(&self) -> &str;

    fn parameter_count(&self) -> usize;

    /// Bind `param` into slot `position` (1-based). A typed null may use its declared wire type.
    ///
    /// # Errors
    /// Returns the driver's error if the slot does not exist or the value cannot be bound.
    fn bind(&mut self, position: usize, param: &Parameter) -> Result<(), SqlSessionError>;

    /// Reset every slot to NULL so nothing carries over from an earlier execution.
    ///
    /// # Errors
    /// Returns the driver's error if the bindings cannot be cleared.
    fn clear_bindings(&mut self) -> Result<(), SqlSessionError>;

    /// Run the statement; `true` when it produced a result set.
    ///
    /// # Errors
    /// Returns the driver's error if execution fails.
    fn execute(&mut self) -> Result<bool, SqlSessionError>;

    /// Run the statement and report the affected-row count.
    ///
    /// # Errors
    /// Returns the driver's error if execution fails.
    fn execute_update(&mut self) -> Result<u64, SqlSessionError>;

    /// Key generated by the last execution, when keys were requested at prepare time.
    fn generated_key(&self) -> Option<i64>;

    /// Run the statement and open a forward-only cursor over its rows.
    ///
    /// # Errors
    /// Returns the driver's error if execution fails.
    fn query(&mut self) -> Result<Box<dyn Cursor + '_>, SqlSessionError>;
}

/// Forward-only result cursor. A row borrowed from [`next_row`](Cursor::next_row) is
/// invalidated by the following call.
pub trait Cursor {
    fn columns(&self) -> Arc<ColumnInfo>;

    /// # Errors
    /// Returns the driver's error if fetching the next row fails.
    fn next_row(&mut self) -> Result<Option<&dyn RawRow>, SqlSessionError>;
}

/// Raw column access for the current cursor row.
pub trait RawRow {
    /// Read column `index` (0-based). SQL NULL must come back as [`RowValues::Null`].
    ///
    /// # Errors
    /// Returns the driver's error if the column cannot be read.
    fn read(&self, index: usize) -> Result<RowValues, SqlSessionError>;
}

impl<D: DriverConnection + ?Sized> DriverConnection for &mut D {
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

impl<D: DriverConnection + ?Sized> DriverConnection for Box<D> {
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
