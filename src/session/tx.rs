use std::ops::{Deref, DerefMut};

use tracing::{debug, warn};

use crate::driver::DriverConnection;
use crate::error::SqlSessionError;

use super::Session;

/// A session bound to an open transaction.
///
/// Only handed out inside [`Session::transaction`]; commit and rollback belong to the enclosing
/// call. Every session operation is available through `Deref`.
pub struct TransactionalSession<'t, C: DriverConnection> {
    session: Session<&'t mut C>,
}

impl<'t, C: DriverConnection> Deref for TransactionalSession<'t, C> {
    type Target = Session<&'t mut C>;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}

impl<C: DriverConnection> DerefMut for TransactionalSession<'_, C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.session
    }
}

impl<C: DriverConnection> Session<C> {
    /// Run `body` inside a transaction.
    ///
    /// Auto-commit is disabled for the duration of the body. If the body returns `Ok`, the
    /// transaction is committed and auto-commit restored. If it returns `Err`, the transaction
    /// is rolled back and the body's error is returned unchanged; failures while rolling back
    /// are logged, not returned. A panicking body also rolls back before the panic propagates.
    ///
    /// ```rust
    /// use sql_session::prelude::*;
    ///
    /// let mut session = Session::new(SqliteConnection::open_in_memory()?, SessionOptions::default())?;
    /// session.execute(&query_of("CREATE TABLE t (id INTEGER)", vec![]))?;
    ///
    /// let failed: Result<(), SqlSessionError> = session.transaction(|tx| {
    ///     tx.update(&query_of("INSERT INTO t VALUES (1)", vec![]))?;
    ///     Err(SqlSessionError::ConfigError("abort".into()))
    /// });
    /// assert!(failed.is_err());
    ///
    /// let count = session.single(&query_of("SELECT COUNT(*) FROM t", vec![]), |row| row.i64(0_usize))?;
    /// assert_eq!(count, Some(0));
    /// # Ok::<(), SqlSessionError>(())
    /// ```
    ///
    /// # Errors
    /// Returns `NestedTransaction` if a transaction is already open on this connection, the
    /// driver's error if the transaction cannot be started or committed, or the body's error.
    pub fn transaction<T, E, F>(&mut self, body: F) -> Result<T, E>
    where
        E: From<SqlSessionError>,
        F: FnOnce(&mut TransactionalSession<'_, C>) -> Result<T, E>,
    {
        if !self.connection.auto_commit() {
            return Err(SqlSessionError::NestedTransaction.into());
        }

        self.connection.set_auto_commit(false)?;
        debug!("transaction started");
        let mut open = OpenTransaction {
            connection: &mut self.connection,
            armed: true,
        };

        let outcome = {
            let mut tx = TransactionalSession {
                session: Session::attached(&mut *open.connection, self.options.clone()),
            };
            body(&mut tx)
        };

        match outcome {
            Ok(value) => {
                open.commit()?;
                Ok(value)
            }
            Err(err) => {
                open.rollback();
                Err(err)
            }
        }
    }
}

/// An open transaction that rolls back on drop unless committed, so a panicking body cannot
/// leave the connection inside a transaction.
struct OpenTransaction<'c, C: DriverConnection> {
    connection: &'c mut C,
    armed: bool,
}

impl<C: DriverConnection> OpenTransaction<'_, C> {
    fn commit(mut self) -> Result<(), SqlSessionError> {
        // a failed commit leaves the guard armed, so drop rolls back
        self.connection.commit()?;
        self.armed = false;
        self.connection.set_auto_commit(true)?;
        debug!("transaction committed");
        Ok(())
    }

    fn rollback(mut self) {
        self.armed = false;
        rollback_quietly(&mut *self.connection);
    }
}

impl<C: DriverConnection> Drop for OpenTransaction<'_, C> {
    fn drop(&mut self) {
        if self.armed {
            if std::thread::panicking() {
                warn!("transaction body panicked; rolling back");
            }
            rollback_quietly(&mut *self.connection);
        }
    }
}

fn rollback_quietly<C: DriverConnection>(connection: &mut C) {
    match connection.rollback() {
        Ok(()) => debug!("transaction rolled back"),
        Err(err) => warn!(error = %err, "rollback failed"),
    }
    if let Err(err) = connection.set_auto_commit(true) {
        warn!(error = %err, "failed to restore auto-commit after rollback");
    }
}
