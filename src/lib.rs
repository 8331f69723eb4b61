//! Blocking SQL sessions over a driver connection.
//!
//! Statements are written with `:name` placeholders (or plain `?` markers), wrapped in an
//! immutable [`Query`](query::Query), and run through a [`Session`](session::Session) that binds
//! parameters, reads rows through the typed [`Row`](results::Row) accessor, enforces single-row
//! expectations in strict mode, and scopes transactions to a closure.
//!
//! ```rust
//! use sql_session::prelude::*;
//! use sql_session::{named_params, params};
//!
//! let mut session = Session::new(SqliteConnection::open_in_memory()?, SessionOptions::default())?;
//! session.update(&query_of("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)", params![]))?;
//! session.update(&named_query_of(
//!     "INSERT INTO users (name) VALUES (:name)",
//!     named_params! { "name" => "Alice" },
//! ))?;
//!
//! let names = session.list(&query_of("SELECT name FROM users", params![]), |row| {
//!     row.string("name")
//! })?;
//! assert_eq!(names, vec!["Alice".to_string()]);
//! # Ok::<(), SqlSessionError>(())
//! ```

pub mod action;
pub mod driver;
pub mod error;
pub mod loan;
pub mod parameter;
pub mod prelude;
pub mod query;
pub mod results;
pub mod session;
pub mod translation;
pub mod types;

#[cfg(feature = "sqlite")]
pub mod pool;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use error::SqlSessionError;
pub use parameter::{Parameter, param};
pub use query::{Query, named_query_of, query_of};
pub use session::{Session, SessionOptions, TransactionalSession, session_of};
pub use types::{RowValues, SemanticType, SqlType};
