use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::action::{
    ExecuteQueryAction, Extracted, ResultQueryActionBuilder,
    UpdateAndReturnGeneratedKeyQueryAction, UpdateQueryAction,
};
use crate::error::SqlSessionError;
use crate::parameter::{Parameter, UNTYPED_NULL};
use crate::results::Row;
use crate::translation::NamedStatement;

/// An immutable statement plus its parameters.
///
/// The template is normalized once, at construction: every `:name` occurrence becomes a
/// positional `?` and the name-to-position map is kept alongside. Cloning is cheap; clones
/// share the same normalized statement.
///
/// ```rust
/// use sql_session::prelude::*;
///
/// let q = named_query_of(
///     "SELECT * FROM members WHERE id = :id OR parent_id = :id",
///     sql_session::named_params! { "id" => 7 },
/// );
/// assert_eq!(q.normalized_statement(), "SELECT * FROM members WHERE id = ? OR parent_id = ?");
/// assert_eq!(q.bind_list().unwrap().len(), 2);
/// ```
#[derive(Clone)]
pub struct Query {
    inner: Arc<QueryInner>,
}

struct QueryInner {
    statement: String,
    params: Vec<Parameter>,
    named_params: HashMap<String, Parameter>,
    normalized: NamedStatement,
}

impl Query {
    #[must_use]
    pub fn new(
        statement: impl Into<String>,
        params: Vec<Parameter>,
        named_params: HashMap<String, Parameter>,
    ) -> Self {
        let statement = statement.into();
        let normalized = NamedStatement::parse(&statement);
        Self {
            inner: Arc::new(QueryInner {
                statement,
                params,
                named_params,
                normalized,
            }),
        }
    }

    /// The template exactly as supplied.
    #[must_use]
    pub fn statement(&self) -> &str {
        &self.inner.statement
    }

    /// The template with named placeholders replaced by positional markers.
    #[must_use]
    pub fn normalized_statement(&self) -> &str {
        self.inner.normalized.statement()
    }

    #[must_use]
    pub fn params(&self) -> &[Parameter] {
        &self.inner.params
    }

    #[must_use]
    pub fn named_params(&self) -> &HashMap<String, Parameter> {
        &self.inner.named_params
    }

    /// Name -> 1-based positions in the normalized statement.
    #[must_use]
    pub fn replacement_map(&self) -> &HashMap<String, Vec<usize>> {
        self.inner.normalized.positions()
    }

    /// Final ordered bind values for the normalized statement.
    ///
    /// Templates without named placeholders bind the positional parameters verbatim. Otherwise
    /// each marker takes the value of the name occupying it; a name absent from the map binds
    /// as an untyped NULL.
    ///
    /// # Errors
    /// Returns `SqlSessionError::MalformedQuery` if a marker in a named template has no name.
    pub fn bind_list(&self) -> Result<Vec<&Parameter>, SqlSessionError> {
        let normalized = &self.inner.normalized;
        if !normalized.has_named_placeholders() {
            return Ok(self.inner.params.iter().collect());
        }

        let names = normalized.names_by_position()?;
        Ok(names
            .into_iter()
            .map(|name| self.inner.named_params.get(name).unwrap_or(&UNTYPED_NULL))
            .collect())
    }

    /// Run for effect.
    #[must_use]
    pub fn as_execute(&self) -> ExecuteQueryAction {
        ExecuteQueryAction::new(self.clone())
    }

    /// Run and report the affected-row count.
    #[must_use]
    pub fn as_update(&self) -> UpdateQueryAction {
        UpdateQueryAction::new(self.clone())
    }

    /// Run an insert and report its generated key.
    #[must_use]
    pub fn as_update_and_return_generated_key(&self) -> UpdateAndReturnGeneratedKeyQueryAction {
        UpdateAndReturnGeneratedKeyQueryAction::new(self.clone())
    }

    /// Attach a row extractor; finish with `as_list()` or `as_single()`.
    ///
    /// The extractor may return `Result<A, _>` or `Option<A>`; rows mapped to `None` are skipped.
    pub fn map<A, F, R>(&self, extractor: F) -> ResultQueryActionBuilder<A>
    where
        A: 'static,
        F: Fn(&Row<'_>) -> R + Send + Sync + 'static,
        R: Extracted<A>,
    {
        ResultQueryActionBuilder::new(self.clone(), move |row| extractor(row).into_extracted())
    }

    /// Map every row to a column-name -> JSON value object.
    #[must_use]
    pub fn map_to_json(&self) -> ResultQueryActionBuilder<JsonMap<String, JsonValue>> {
        self.map(|row: &Row<'_>| row.to_json_map())
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("statement", &self.inner.statement)
            .field("params", &self.inner.params)
            .field("named_params", &self.inner.named_params)
            .field("replacement_map", self.replacement_map())
            .finish()
    }
}

impl PartialEq for Query {
    fn eq(&self, other: &Self) -> bool {
        self.inner.statement == other.inner.statement
            && self.inner.params == other.inner.params
            && self.inner.named_params == other.inner.named_params
    }
}

/// Query with positional parameters.
pub fn query_of(statement: impl Into<String>, params: Vec<Parameter>) -> Query {
    Query::new(statement, params, HashMap::new())
}

/// Query with named parameters.
pub fn named_query_of(
    statement: impl Into<String>,
    named_params: HashMap<String, Parameter>,
) -> Query {
    Query::new(statement, Vec::new(), named_params)
}
