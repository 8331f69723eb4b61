//! Scoped acquisition: run an operation against a resource and close it on every exit path.
//!
//! Dropping a resource already releases it; [`using`] adds an explicit close so close errors
//! are reported instead of swallowed. If the operation panics, unwinding drops the resource.

use tracing::warn;

use crate::driver::DriverConnection;
use crate::error::SqlSessionError;
use crate::session::Session;

/// A resource with a fallible close.
pub trait Closeable {
    /// # Errors
    /// Returns the error raised while releasing the resource.
    fn close(self) -> Result<(), SqlSessionError>;
}

impl<C: DriverConnection> Closeable for Session<C> {
    fn close(self) -> Result<(), SqlSessionError> {
        Session::close(self)
    }
}

#[cfg(feature = "sqlite")]
impl Closeable for crate::sqlite::SqliteConnection {
    fn close(self) -> Result<(), SqlSessionError> {
        crate::sqlite::SqliteConnection::close(self)
    }
}

#[cfg(feature = "sqlite")]
impl<M: bb8::ManageConnection> Closeable for bb8::PooledConnection<'_, M> {
    /// Returns the connection to its pool.
    fn close(self) -> Result<(), SqlSessionError> {
        drop(self);
        Ok(())
    }
}

/// Run `f` against `resource`, then close it.
///
/// An error from `f` wins over a close error, which is then only logged. On success a close
/// error is returned.
///
/// ```
/// use sql_session::prelude::*;
///
/// let session = Session::new(SqliteConnection::open_in_memory()?, SessionOptions::default())?;
/// let answer = using(session, |session| {
///     session.single(&query_of("SELECT 42", vec![]), |row| row.i64(0_usize))
/// })?;
/// assert_eq!(answer, Some(42));
/// # Ok::<(), SqlSessionError>(())
/// ```
///
/// # Errors
/// Returns the error from `f`, or the close error when `f` succeeded.
pub fn using<R, T, E, F>(mut resource: R, f: F) -> Result<T, E>
where
    R: Closeable,
    E: From<SqlSessionError>,
    F: FnOnce(&mut R) -> Result<T, E>,
{
    let outcome = f(&mut resource);
    let closed = resource.close();
    match (outcome, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(err)) => Err(err.into()),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            warn!(error = %close_err, "failed to close resource after an error");
            Err(err)
        }
    }
}
