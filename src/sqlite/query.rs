use std::sync::Arc;

use rusqlite::types::ValueRef;
use rusqlite::{CachedStatement, Rows};

use crate::driver::{Cursor, GeneratedKeys, PreparedStatement, RawRow};
use crate::error::SqlSessionError;
use crate::parameter::Parameter;
use crate::results::ColumnInfo;
use crate::types::RowValues;

use super::params::parameter_to_sqlite_value;

/// Extract a `RowValues` from a `SQLite` row.
///
/// # Errors
///
/// Returns `SqlSessionError` if the column cannot be read or holds invalid UTF-8 text.
pub fn sqlite_extract_value(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> Result<RowValues, SqlSessionError> {
    let value = row.get_ref(idx)?;
    match value {
        ValueRef::Null => Ok(RowValues::Null),
        ValueRef::Integer(i) => Ok(RowValues::Int(i)),
        ValueRef::Real(f) => Ok(RowValues::Float(f)),
        ValueRef::Text(_) => Ok(RowValues::Text(
            value.as_str().map_err(SqlSessionError::driver)?.to_owned(),
        )),
        ValueRef::Blob(b) => Ok(RowValues::Blob(b.to_vec())),
    }
}

impl RawRow for rusqlite::Row<'_> {
    fn read(&self, index: usize) -> Result<RowValues, SqlSessionError> {
        sqlite_extract_value(self, index)
    }
}

/// A statement from the connection's prepared-statement cache.
pub struct SqlitePreparedStatement<'c> {
    conn: &'c rusqlite::Connection,
    stmt: CachedStatement<'c>,
    sql: String,
    keys_requested: bool,
    shape: StatementShape,
    generated_key: Option<i64>,
}

impl<'c> SqlitePreparedStatement<'c> {
    pub(crate) fn new(
        conn: &'c rusqlite::Connection,
        sql: &str,
        keys: &GeneratedKeys,
    ) -> Result<Self, SqlSessionError> {
        let stmt = conn.prepare_cached(sql)?;
        Ok(Self {
            conn,
            stmt,
            sql: sql.to_owned(),
            keys_requested: keys.requested(),
            shape: StatementShape::of(sql),
            generated_key: None,
        })
    }

    fn drain(&mut self) -> Result<(), SqlSessionError> {
        let mut rows = self.stmt.raw_query();
        while rows.next()?.is_some() {}
        Ok(())
    }

    fn run_update(&mut self) -> Result<u64, SqlSessionError> {
        self.generated_key = None;
        let rowid_before = self.conn.last_insert_rowid();
        let affected = if self.stmt.column_count() > 0 {
            // RETURNING clauses and stray SELECTs yield rows; consume them
            self.drain()?;
            if self.stmt.readonly() { 0 } else { self.conn.changes() }
        } else {
            u64::try_from(self.stmt.raw_execute()?).unwrap_or(u64::MAX)
        };

        // SQLite has exactly one auto key per table, the rowid, whatever key columns were named
        if self.keys_requested && affected > 0 && self.shape.inserts {
            let rowid = self.conn.last_insert_rowid();
            // an upsert that took its DO UPDATE branch leaves the last rowid untouched
            if rowid != rowid_before || !self.shape.upserts {
                self.generated_key = Some(rowid);
            }
        }
        Ok(affected)
    }
}

const VERBS: [&str; 6] = ["INSERT", "REPLACE", "UPDATE", "DELETE", "SELECT", "VALUES"];

/// What a statement does, judged from its bare keywords.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct StatementShape {
    /// The main verb, after any `WITH` clause, is `INSERT` or `REPLACE`.
    inserts: bool,
    /// Has an `ON CONFLICT ... DO UPDATE` clause.
    upserts: bool,
}

impl StatementShape {
    fn of(sql: &str) -> Self {
        let bytes = sql.as_bytes();
        let mut shape = Self::default();
        let mut verb_seen = false;
        let mut previous: Option<&str> = None;
        let mut depth = 0_usize;
        let mut idx = 0;

        while idx < bytes.len() {
            match bytes[idx] {
                quote @ (b'\'' | b'"' | b'`') => idx = skip_past(bytes, idx + 1, &[quote]),
                b'[' => idx = skip_past(bytes, idx + 1, b"]"),
                b'-' if bytes.get(idx + 1) == Some(&b'-') => {
                    idx = skip_past(bytes, idx + 2, b"\n");
                }
                b'/' if bytes.get(idx + 1) == Some(&b'*') => {
                    idx = skip_past(bytes, idx + 2, b"*/");
                }
                b'(' => {
                    depth += 1;
                    idx += 1;
                }
                b')' => {
                    depth = depth.saturating_sub(1);
                    idx += 1;
                }
                b if b.is_ascii_alphabetic() || b == b'_' => {
                    let start = idx;
                    while bytes
                        .get(idx)
                        .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
                    {
                        idx += 1;
                    }
                    let word = &sql[start..idx];
                    if !verb_seen
                        && depth == 0
                        && VERBS.iter().any(|verb| word.eq_ignore_ascii_case(verb))
                    {
                        verb_seen = true;
                        shape.inserts = word.eq_ignore_ascii_case("INSERT")
                            || word.eq_ignore_ascii_case("REPLACE");
                    }
                    if word.eq_ignore_ascii_case("UPDATE")
                        && previous.is_some_and(|p| p.eq_ignore_ascii_case("DO"))
                    {
                        shape.upserts = true;
                    }
                    previous = Some(word);
                }
                _ => idx += 1,
            }
        }
        shape
    }
}

/// Index just past the first `terminator` at or after `from`, or the end of input.
fn skip_past(bytes: &[u8], from: usize, terminator: &[u8]) -> usize {
    bytes
        .get(from..)
        .and_then(|rest| rest.windows(terminator.len()).position(|w| w == terminator))
        .map_or(bytes.len(), |pos| from + pos + terminator.len())
}

impl PreparedStatement for SqlitePreparedStatement<'_> {
    fn sql(&self) -> &str {
        &self.sql
    }

    fn parameter_count(&self) -> usize {
        self.stmt.parameter_count()
    }

    fn bind(&mut self, position: usize, param: &Parameter) -> Result<(), SqlSessionError> {
        self.stmt
            .raw_bind_parameter(position, parameter_to_sqlite_value(param))?;
        Ok(())
    }

    fn clear_bindings(&mut self) -> Result<(), SqlSessionError> {
        self.stmt.clear_bindings();
        Ok(())
    }

    fn execute(&mut self) -> Result<bool, SqlSessionError> {
        if self.stmt.column_count() > 0 {
            self.drain()?;
            Ok(true)
        } else {
            self.run_update()?;
            Ok(false)
        }
    }

    fn execute_update(&mut self) -> Result<u64, SqlSessionError> {
        self.run_update()
    }

    fn generated_key(&self) -> Option<i64> {
        self.generated_key
    }

    fn query(&mut self) -> Result<Box<dyn Cursor + '_>, SqlSessionError> {
        let names = self
            .stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let columns = Arc::new(ColumnInfo::new(names));
        let rows = self.stmt.raw_query();
        Ok(Box::new(SqliteCursor { rows, columns }))
    }
}

/// Forward-only cursor over a running statement.
pub struct SqliteCursor<'s> {
    rows: Rows<'s>,
    columns: Arc<ColumnInfo>,
}

impl Cursor for SqliteCursor<'_> {
    fn columns(&self) -> Arc<ColumnInfo> {
        Arc::clone(&self.columns)
    }

    fn next_row(&mut self) -> Result<Option<&dyn RawRow>, SqlSessionError> {
        Ok(self.rows.next()?.map(|row| row as &dyn RawRow))
    }
}
