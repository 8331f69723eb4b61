use crate::action::Extracted;
use crate::driver::{DriverConnection, GeneratedKeys};
use crate::error::SqlSessionError;
use crate::query::Query;
use crate::results::Row;

use super::Session;
use super::core::prepare_bound;

impl<C: DriverConnection> Session<C> {
    /// Extract the first row.
    ///
    /// A strict session reads the whole result and fails with `TooManyRows` when it holds more
    /// than one row; otherwise extra rows are ignored.
    ///
    /// ```rust
    /// use sql_session::prelude::*;
    ///
    /// let mut session = Session::new(SqliteConnection::open_in_memory()?, SessionOptions::strict())?;
    /// let one = session.single(&query_of("SELECT 1", vec![]), |row| row.i64(0_usize))?;
    /// assert_eq!(one, Some(1));
    /// # Ok::<(), SqlSessionError>(())
    /// ```
    ///
    /// # Errors
    /// Returns `TooManyRows`, the extractor's error, or the driver's error.
    pub fn single<A, F, R>(&mut self, query: &Query, mut extractor: F) -> Result<Option<A>, SqlSessionError>
    where
        F: FnMut(&Row<'_>) -> R,
        R: Extracted<A>,
    {
        self.single_extracted(query, |row| extractor(row).into_extracted())
    }

    /// Extract every row in cursor order, skipping rows the extractor maps to `None`.
    ///
    /// # Errors
    /// Returns the extractor's error or the driver's error.
    pub fn list<A, F, R>(&mut self, query: &Query, mut extractor: F) -> Result<Vec<A>, SqlSessionError>
    where
        F: FnMut(&Row<'_>) -> R,
        R: Extracted<A>,
    {
        self.list_extracted(query, |row| extractor(row).into_extracted())
    }

    /// Call `f` once per row, in cursor order, without collecting anything.
    ///
    /// # Errors
    /// Stops at and returns the first error from `f` or the driver.
    pub fn for_each<F>(&mut self, query: &Query, mut f: F) -> Result<(), SqlSessionError>
    where
        F: FnMut(&Row<'_>) -> Result<(), SqlSessionError>,
    {
        let mut stmt = prepare_bound(&mut self.connection, query, &GeneratedKeys::None)?;
        let mut cursor = stmt.query()?;
        let columns = cursor.columns();
        let mut position = 0;
        while let Some(raw) = cursor.next_row()? {
            f(&Row::new(&columns, raw, position))?;
            position += 1;
        }
        Ok(())
    }

    pub(crate) fn single_extracted<A, F>(
        &mut self,
        query: &Query,
        mut extract: F,
    ) -> Result<Option<A>, SqlSessionError>
    where
        F: FnMut(&Row<'_>) -> Result<Option<A>, SqlSessionError>,
    {
        let strict = self.options.strict;
        let mut stmt = prepare_bound(&mut self.connection, query, &GeneratedKeys::None)?;
        let mut cursor = stmt.query()?;
        let columns = cursor.columns();

        let mut first = None;
        let mut rows = 0;
        while let Some(raw) = cursor.next_row()? {
            if rows == 0 {
                first = extract(&Row::new(&columns, raw, 0))?;
            }
            rows += 1;
            if !strict {
                break;
            }
        }

        if strict && rows > 1 {
            return Err(SqlSessionError::TooManyRows(rows));
        }
        Ok(first)
    }

    pub(crate) fn list_extracted<A, F>(
        &mut self,
        query: &Query,
        mut extract: F,
    ) -> Result<Vec<A>, SqlSessionError>
    where
        F: FnMut(&Row<'_>) -> Result<Option<A>, SqlSessionError>,
    {
        let mut stmt = prepare_bound(&mut self.connection, query, &GeneratedKeys::None)?;
        let mut cursor = stmt.query()?;
        let columns = cursor.columns();

        let mut out = Vec::new();
        let mut position = 0;
        while let Some(raw) = cursor.next_row()? {
            if let Some(value) = extract(&Row::new(&columns, raw, position))? {
                out.push(value);
            }
            position += 1;
        }
        Ok(out)
    }
}
