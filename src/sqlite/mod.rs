// SQLite backend, built on rusqlite with bb8 pooling.
//
// - connection: `SqliteConnection`, the `DriverConnection` implementation
// - query: prepared statements, cursors and value extraction
// - params: binding `Parameter` values as rusqlite values
// - config: URL parsing and the bb8 connection manager

pub mod config;
pub mod connection;
pub mod params;
pub mod query;

pub use config::{ConnectionSettings, SqliteManager, SqlitePooledConnection, SqliteTarget};
pub use connection::SqliteConnection;
pub use params::{parameter_to_sqlite_value, row_value_to_sqlite_value};
pub use query::{SqliteCursor, SqlitePreparedStatement, sqlite_extract_value};
