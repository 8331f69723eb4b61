// Session module: runs queries against one borrowed connection.
//
// - core: the `Session` type, construction, close and action dispatch
// - dml: execute / update / generated keys
// - select: single / list / for_each
// - prepared: batches and the bound-statement escape hatch
// - tx: `transaction` and `TransactionalSession`
// - options: `SessionOptions` and its builder

mod core;
mod dml;
mod options;
mod prepared;
mod select;
mod tx;

pub use self::core::Session;
pub use options::{SessionOptions, SessionOptionsBuilder};
pub use tx::TransactionalSession;

use crate::driver::DriverConnection;
use crate::error::SqlSessionError;

/// Open a session over `connection`.
///
/// # Errors
/// Returns the driver's error if the session options cannot be applied.
pub fn session_of<C: DriverConnection>(
    connection: C,
    options: SessionOptions,
) -> Result<Session<C>, SqlSessionError> {
    Session::new(connection, options)
}
