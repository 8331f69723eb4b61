use std::io::Cursor;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::{Map as JsonMap, Value as JsonValue};
use uuid::Uuid;

use crate::driver::RawRow;
use crate::error::SqlSessionError;
use crate::types::{Decimal, RowValues};

use super::ColumnInfo;
use super::lob::{Blob, Clob};
use super::value::{FromValue, Mismatch, array_elements};

/// A column reference: a 0-based index or a column label.
pub trait ColumnIndex {
    /// # Errors
    /// Returns `SqlSessionError::ColumnNotFound` if the column does not exist.
    fn resolve(&self, columns: &ColumnInfo) -> Result<usize, SqlSessionError>;
}

impl ColumnIndex for usize {
    fn resolve(&self, columns: &ColumnInfo) -> Result<usize, SqlSessionError> {
        if *self < columns.len() {
            Ok(*self)
        } else {
            Err(SqlSessionError::ColumnNotFound(format!(
                "index {self} (row has {} columns)",
                columns.len()
            )))
        }
    }
}

impl ColumnIndex for &str {
    fn resolve(&self, columns: &ColumnInfo) -> Result<usize, SqlSessionError> {
        columns
            .index_of(self)
            .ok_or_else(|| SqlSessionError::ColumnNotFound((*self).to_string()))
    }
}

impl ColumnIndex for String {
    fn resolve(&self, columns: &ColumnInfo) -> Result<usize, SqlSessionError> {
        self.as_str().resolve(columns)
    }
}

impl ColumnIndex for &String {
    fn resolve(&self, columns: &ColumnInfo) -> Result<usize, SqlSessionError> {
        self.as_str().resolve(columns)
    }
}

/// View over the cursor's current row.
///
/// A `Row` borrows the cursor, so it cannot outlive the call that handed it out; advancing the
/// cursor ends the borrow. Every typed accessor comes in two forms: `row.i64(col)` fails with
/// `MissingValue` on SQL NULL, `row.i64_opt(col)` returns `None`. Absence is the driver's null
/// signal, so a stored `0` is always `Some(0)`.
#[derive(Clone, Copy)]
pub struct Row<'r> {
    columns: &'r ColumnInfo,
    raw: &'r dyn RawRow,
    position: usize,
}

impl<'r> Row<'r> {
    #[must_use]
    pub fn new(columns: &'r ColumnInfo, raw: &'r dyn RawRow, position: usize) -> Self {
        Self {
            columns,
            raw,
            position,
        }
    }

    /// 0-based ordinal of this row in its result set.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        self.columns.names()
    }

    /// Raw driver value; NULL comes back as [`RowValues::Null`].
    ///
    /// # Errors
    /// Returns `ColumnNotFound` for an unknown column, or the driver's read error.
    pub fn value<I: ColumnIndex>(&self, column: I) -> Result<RowValues, SqlSessionError> {
        let idx = column.resolve(self.columns)?;
        self.raw.read(idx)
    }

    /// `None` when the column is SQL NULL.
    ///
    /// # Errors
    /// Returns `ColumnNotFound`, `TypeMismatch`, or the driver's read error.
    pub fn get_opt<T: FromValue, I: ColumnIndex>(
        &self,
        column: I,
    ) -> Result<Option<T>, SqlSessionError> {
        let idx = column.resolve(self.columns)?;
        let value = self.raw.read(idx)?;
        if value.is_null() {
            return Ok(None);
        }
        T::from_value(value)
            .map(Some)
            .map_err(|m| self.mismatch(idx, m))
    }

    /// # Errors
    /// Returns `MissingValue` when the column is SQL NULL, plus the errors of [`get_opt`](Self::get_opt).
    pub fn get<T: FromValue, I: ColumnIndex>(&self, column: I) -> Result<T, SqlSessionError> {
        let idx = column.resolve(self.columns)?;
        self.get_opt(idx)?.ok_or_else(|| SqlSessionError::MissingValue {
            column: self.label(idx),
        })
    }

    /// Typed array from a native array column or JSON array text. Null elements map to `None`.
    ///
    /// # Errors
    /// Returns `TypeMismatch` if the column is not an array or an element cannot be converted.
    pub fn array_opt<T: FromValue, I: ColumnIndex>(
        &self,
        column: I,
    ) -> Result<Option<Vec<Option<T>>>, SqlSessionError> {
        let idx = column.resolve(self.columns)?;
        let value = self.raw.read(idx)?;
        if value.is_null() {
            return Ok(None);
        }
        array_elements(value)
            .and_then(|items| items.into_iter().map(Option::<T>::from_value).collect())
            .map(Some)
            .map_err(|m| self.mismatch(idx, m))
    }

    /// # Errors
    /// Returns `MissingValue` when the column is SQL NULL, plus the errors of [`array_opt`](Self::array_opt).
    pub fn array<T: FromValue, I: ColumnIndex>(
        &self,
        column: I,
    ) -> Result<Vec<Option<T>>, SqlSessionError> {
        let idx = column.resolve(self.columns)?;
        self.array_opt(idx)?.ok_or_else(|| SqlSessionError::MissingValue {
            column: self.label(idx),
        })
    }

    /// # Errors
    /// See [`get_opt`](Self::get_opt).
    pub fn binary_stream_opt<I: ColumnIndex>(
        &self,
        column: I,
    ) -> Result<Option<Cursor<Vec<u8>>>, SqlSessionError> {
        Ok(self.bytes_opt(column)?.map(Cursor::new))
    }

    /// # Errors
    /// See [`get`](Self::get).
    pub fn binary_stream<I: ColumnIndex>(
        &self,
        column: I,
    ) -> Result<Cursor<Vec<u8>>, SqlSessionError> {
        self.bytes(column).map(Cursor::new)
    }

    /// # Errors
    /// See [`get_opt`](Self::get_opt).
    pub fn clob_opt<I: ColumnIndex>(&self, column: I) -> Result<Option<Clob>, SqlSessionError> {
        Ok(self.string_opt(column)?.map(Clob::new))
    }

    /// # Errors
    /// See [`get`](Self::get).
    pub fn clob<I: ColumnIndex>(&self, column: I) -> Result<Clob, SqlSessionError> {
        self.string(column).map(Clob::new)
    }

    /// # Errors
    /// See [`get_opt`](Self::get_opt).
    pub fn blob_opt<I: ColumnIndex>(&self, column: I) -> Result<Option<Blob>, SqlSessionError> {
        Ok(self.bytes_opt(column)?.map(Blob::new))
    }

    /// # Errors
    /// See [`get`](Self::get).
    pub fn blob<I: ColumnIndex>(&self, column: I) -> Result<Blob, SqlSessionError> {
        self.bytes(column).map(Blob::new)
    }

    /// Every column as label -> JSON value.
    ///
    /// # Errors
    /// Returns the driver's read error.
    pub fn to_json_map(&self) -> Result<JsonMap<String, JsonValue>, SqlSessionError> {
        let mut map = JsonMap::with_capacity(self.columns.len());
        for (idx, name) in self.columns.names().iter().enumerate() {
            map.insert(name.clone(), self.raw.read(idx)?.to_json());
        }
        Ok(map)
    }

    fn label(&self, idx: usize) -> String {
        self.columns
            .names()
            .get(idx)
            .cloned()
            .unwrap_or_else(|| idx.to_string())
    }

    fn mismatch(&self, idx: usize, m: Mismatch) -> SqlSessionError {
        SqlSessionError::TypeMismatch {
            column: self.label(idx),
            expected: m.expected,
            actual: m.actual,
        }
    }
}

macro_rules! typed_accessors {
    ($($name:ident, $name_opt:ident => $ty:ty;)*) => {
        impl Row<'_> {
            $(
                #[doc = concat!("Read a `", stringify!($ty), "`; fails with `MissingValue` on SQL NULL.")]
                ///
                /// # Errors
                /// Returns `MissingValue`, `ColumnNotFound`, `TypeMismatch`, or the driver's read error.
                pub fn $name<I: ColumnIndex>(&self, column: I) -> Result<$ty, SqlSessionError> {
                    self.get(column)
                }

                #[doc = concat!("Read a `", stringify!($ty), "`; `None` on SQL NULL.")]
                ///
                /// # Errors
                /// Returns `ColumnNotFound`, `TypeMismatch`, or the driver's read error.
                pub fn $name_opt<I: ColumnIndex>(
                    &self,
                    column: I,
                ) -> Result<Option<$ty>, SqlSessionError> {
                    self.get_opt(column)
                }
            )*
        }
    };
}

typed_accessors! {
    string, string_opt => String;
    i16, i16_opt => i16;
    i32, i32_opt => i32;
    i64, i64_opt => i64;
    f32, f32_opt => f32;
    f64, f64_opt => f64;
    decimal, decimal_opt => Decimal;
    boolean, boolean_opt => bool;
    bytes, bytes_opt => Vec<u8>;
    date, date_opt => NaiveDate;
    time, time_opt => NaiveTime;
    naive_date_time, naive_date_time_opt => NaiveDateTime;
    zoned_date_time, zoned_date_time_opt => DateTime<Local>;
    offset_date_time, offset_date_time_opt => DateTime<FixedOffset>;
    instant, instant_opt => DateTime<Utc>;
    uuid, uuid_opt => Uuid;
    json, json_opt => JsonValue;
}
