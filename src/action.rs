//! Actions: a [`Query`] bundled with what to do with it.
//!
//! An action is an immutable descriptor; every [`Session::run`](crate::session::Session::run)
//! executes the statement again.

use std::fmt;
use std::sync::Arc;

use crate::driver::DriverConnection;
use crate::error::SqlSessionError;
use crate::query::Query;
use crate::results::Row;
use crate::session::Session;

/// Which session operation an action dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Execute,
    Update,
    UpdateAndReturnGeneratedKey,
    List,
    Single,
}

/// Something a [`Session`] can run.
pub trait QueryAction {
    type Output;

    fn kind(&self) -> ActionKind;

    fn query(&self) -> &Query;

    /// # Errors
    /// Returns whatever the underlying session operation returns.
    fn run_with_session<C: DriverConnection>(
        &self,
        session: &mut Session<C>,
    ) -> Result<Self::Output, SqlSessionError>;
}

/// Extractor results: `Result<A, _>` always yields a value, `Option<A>` may skip the row.
pub trait Extracted<A> {
    /// # Errors
    /// Returns the extractor's own error.
    fn into_extracted(self) -> Result<Option<A>, SqlSessionError>;
}

impl<A> Extracted<A> for Result<A, SqlSessionError> {
    fn into_extracted(self) -> Result<Option<A>, SqlSessionError> {
        self.map(Some)
    }
}

impl<A> Extracted<A> for Option<A> {
    fn into_extracted(self) -> Result<Option<A>, SqlSessionError> {
        Ok(self)
    }
}

pub(crate) type Extractor<A> =
    Arc<dyn Fn(&Row<'_>) -> Result<Option<A>, SqlSessionError> + Send + Sync>;

macro_rules! plain_action {
    ($(#[$doc:meta])* $name:ident, $kind:ident, $output:ty, $method:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            query: Query,
        }

        impl $name {
            #[must_use]
            pub fn new(query: Query) -> Self {
                Self { query }
            }
        }

        impl QueryAction for $name {
            type Output = $output;

            fn kind(&self) -> ActionKind {
                ActionKind::$kind
            }

            fn query(&self) -> &Query {
                &self.query
            }

            fn run_with_session<C: DriverConnection>(
                &self,
                session: &mut Session<C>,
            ) -> Result<Self::Output, SqlSessionError> {
                session.$method(&self.query)
            }
        }
    };
}

plain_action!(
    /// Runs for effect; yields `true` if the statement produced a result set.
    ExecuteQueryAction,
    Execute,
    bool,
    execute
);

plain_action!(
    /// Yields the affected-row count.
    UpdateQueryAction,
    Update,
    u64,
    update
);

plain_action!(
    /// Yields the generated key of an insert, if any.
    UpdateAndReturnGeneratedKeyQueryAction,
    UpdateAndReturnGeneratedKey,
    Option<i64>,
    update_and_return_generated_key
);

/// A query plus a row extractor, waiting to be turned into a list or single action.
pub struct ResultQueryActionBuilder<A> {
    query: Query,
    extractor: Extractor<A>,
}

impl<A> ResultQueryActionBuilder<A> {
    pub(crate) fn new<F>(query: Query, extractor: F) -> Self
    where
        F: Fn(&Row<'_>) -> Result<Option<A>, SqlSessionError> + Send + Sync + 'static,
    {
        Self {
            query,
            extractor: Arc::new(extractor),
        }
    }

    #[must_use]
    pub fn as_list(&self) -> ListResultQueryAction<A> {
        ListResultQueryAction {
            query: self.query.clone(),
            extractor: Arc::clone(&self.extractor),
        }
    }

    #[must_use]
    pub fn as_single(&self) -> SingleResultQueryAction<A> {
        SingleResultQueryAction {
            query: self.query.clone(),
            extractor: Arc::clone(&self.extractor),
        }
    }
}

impl<A> Clone for ResultQueryActionBuilder<A> {
    fn clone(&self) -> Self {
        Self {
            query: self.query.clone(),
            extractor: Arc::clone(&self.extractor),
        }
    }
}

impl<A> fmt::Debug for ResultQueryActionBuilder<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultQueryActionBuilder")
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}

/// Materializes every extracted row, skipping rows mapped to `None`.
pub struct ListResultQueryAction<A> {
    query: Query,
    extractor: Extractor<A>,
}

impl<A> QueryAction for ListResultQueryAction<A> {
    type Output = Vec<A>;

    fn kind(&self) -> ActionKind {
        ActionKind::List
    }

    fn query(&self) -> &Query {
        &self.query
    }

    fn run_with_session<C: DriverConnection>(
        &self,
        session: &mut Session<C>,
    ) -> Result<Self::Output, SqlSessionError> {
        let extractor = &self.extractor;
        session.list_extracted(&self.query, |row| extractor(row))
    }
}

/// Extracts at most one row; strict sessions fail on more.
pub struct SingleResultQueryAction<A> {
    query: Query,
    extractor: Extractor<A>,
}

impl<A> QueryAction for SingleResultQueryAction<A> {
    type Output = Option<A>;

    fn kind(&self) -> ActionKind {
        ActionKind::Single
    }

    fn query(&self) -> &Query {
        &self.query
    }

    fn run_with_session<C: DriverConnection>(
        &self,
        session: &mut Session<C>,
    ) -> Result<Self::Output, SqlSessionError> {
        let extractor = &self.extractor;
        session.single_extracted(&self.query, |row| extractor(row))
    }
}

impl<A> fmt::Debug for ListResultQueryAction<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListResultQueryAction")
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}

impl<A> fmt::Debug for SingleResultQueryAction<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleResultQueryAction")
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params;
    use crate::query::query_of;

    #[test]
    fn actions_carry_their_kind_and_query() {
        let q = query_of("DELETE FROM t WHERE id = ?", params![1]);
        assert_eq!(q.as_execute().kind(), ActionKind::Execute);
        assert_eq!(q.as_update().kind(), ActionKind::Update);
        assert_eq!(
            q.as_update_and_return_generated_key().kind(),
            ActionKind::UpdateAndReturnGeneratedKey
        );
        assert_eq!(q.as_update().query(), &q);

        let builder = q.map(|row: &Row<'_>| row.i64(0_usize));
        assert_eq!(builder.as_list().kind(), ActionKind::List);
        assert_eq!(builder.as_single().kind(), ActionKind::Single);
    }

    #[test]
    fn extracted_option_skips_and_result_keeps() {
        assert_eq!(Some(3).into_extracted().unwrap(), Some(3));
        assert_eq!(Extracted::<i32>::into_extracted(None).unwrap(), None);
        let ok: Result<i32, SqlSessionError> = Ok(4);
        assert_eq!(ok.into_extracted().unwrap(), Some(4));
    }
}
