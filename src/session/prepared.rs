use std::collections::HashMap;

use tracing::debug;

use crate::driver::{DriverConnection, GeneratedKeys, PreparedStatement};
use crate::error::SqlSessionError;
use crate::parameter::{Parameter, UNTYPED_NULL};
use crate::query::Query;
use crate::translation::NamedStatement;

use super::Session;
use super::core::{bind_all, prepare_bound};

impl<C: DriverConnection> Session<C> {
    /// Prepare `statement` once and execute it once per row of positional values.
    ///
    /// Returns the affected-row count of each execution, in input order. Every row must supply
    /// exactly one value per marker.
    ///
    /// # Errors
    /// Returns `MalformedQuery` for a row of the wrong length, or the driver's error; executions
    /// before the failing row stay applied.
    pub fn batch_prepared_statement(
        &mut self,
        statement: &str,
        rows: &[Vec<Parameter>],
    ) -> Result<Vec<u64>, SqlSessionError> {
        let mut stmt = self.connection.prepare(statement, &GeneratedKeys::None)?;
        debug!(sql = statement, rows = rows.len(), "batch");

        let mut counts = Vec::with_capacity(rows.len());
        for params in rows {
            let binds: Vec<&Parameter> = params.iter().collect();
            bind_all(stmt.as_mut(), &binds)?;
            counts.push(stmt.execute_update()?);
        }
        Ok(counts)
    }

    /// Like [`batch_prepared_statement`](Self::batch_prepared_statement), with one name -> value
    /// map per row. The template is rewritten once and shared by every row; names missing from a
    /// row bind as untyped NULL.
    ///
    /// # Errors
    /// Returns `MalformedQuery` if the template mixes in bare `?` markers, or the driver's error.
    pub fn batch_prepared_named_statement(
        &mut self,
        statement: &str,
        rows: &[HashMap<String, Parameter>],
    ) -> Result<Vec<u64>, SqlSessionError> {
        let named = NamedStatement::parse(statement);
        let names = named.names_by_position()?;
        let mut stmt = self
            .connection
            .prepare(named.statement(), &GeneratedKeys::None)?;
        debug!(sql = named.statement(), rows = rows.len(), "named batch");

        let mut counts = Vec::with_capacity(rows.len());
        for params in rows {
            let binds: Vec<&Parameter> = names
                .iter()
                .map(|name| params.get(*name).unwrap_or(&UNTYPED_NULL))
                .collect();
            bind_all(stmt.as_mut(), &binds)?;
            counts.push(stmt.execute_update()?);
        }
        Ok(counts)
    }

    /// The query's statement, prepared and fully bound but not executed.
    ///
    /// Generated keys are requested per the session options.
    ///
    /// # Errors
    /// Returns `MalformedQuery` for an unbindable template, or the driver's error.
    pub fn create_prepared_statement(
        &mut self,
        query: &Query,
    ) -> Result<Box<dyn PreparedStatement + '_>, SqlSessionError> {
        let keys = self.options.generated_keys();
        prepare_bound(&mut self.connection, query, &keys)
    }
}
