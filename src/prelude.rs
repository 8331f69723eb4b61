//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::action::{
    ActionKind, ExecuteQueryAction, ListResultQueryAction, QueryAction, ResultQueryActionBuilder,
    SingleResultQueryAction, UpdateAndReturnGeneratedKeyQueryAction, UpdateQueryAction,
};
pub use crate::error::SqlSessionError;
pub use crate::loan::{Closeable, using};
pub use crate::parameter::{Parameter, param};
pub use crate::query::{Query, named_query_of, query_of};
pub use crate::results::{Blob, Clob, Row};
pub use crate::session::{
    Session, SessionOptions, SessionOptionsBuilder, TransactionalSession, session_of,
};
pub use crate::types::{Decimal, RowValues, SemanticType, SqlType};

#[cfg(feature = "sqlite")]
pub use crate::pool::{DataSource, DataSourceRegistry, PoolOptions};
#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteConnection;
