use chrono::SecondsFormat;
use rusqlite::types::Value;

use crate::parameter::Parameter;
use crate::types::{DATE_FORMAT, RowValues, TIME_FORMAT, TIMESTAMP_FORMAT};

/// Convert a single `RowValues` to a rusqlite `Value`.
///
/// SQLite has no native temporal, UUID, JSON or array types; those are stored as text in a
/// format the row coercions read back. Zoned timestamps are normalized to UTC so the stored
/// text is the instant.
#[must_use]
pub fn row_value_to_sqlite_value(value: &RowValues) -> Value {
    match value {
        RowValues::Int(i) => Value::Integer(*i),
        RowValues::Float(f) => Value::Real(*f),
        RowValues::Decimal(d) => Value::Text(d.to_string()),
        RowValues::Text(s) => Value::Text(s.clone()),
        RowValues::Bool(b) => Value::Integer(i64::from(*b)),
        RowValues::Date(d) => Value::Text(d.format(DATE_FORMAT).to_string()),
        RowValues::Time(t) => Value::Text(t.format(TIME_FORMAT).to_string()),
        RowValues::Timestamp(dt) => Value::Text(dt.format(TIMESTAMP_FORMAT).to_string()),
        RowValues::TimestampTz(dt) => {
            Value::Text(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        }
        RowValues::Uuid(u) => Value::Text(u.hyphenated().to_string()),
        RowValues::Null => Value::Null,
        RowValues::JSON(jval) => Value::Text(jval.to_string()),
        RowValues::Blob(bytes) => Value::Blob(bytes.clone()),
        RowValues::Array(_) => Value::Text(value.to_json().to_string()),
    }
}

/// Typed nulls bind as plain NULL; SQLite columns carry no wire type for them.
#[must_use]
pub fn parameter_to_sqlite_value(param: &Parameter) -> Value {
    row_value_to_sqlite_value(param.value())
}
