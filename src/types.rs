use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::SqlSessionError;

/// Values that can be stored in a database row or used as query parameters.
///
/// Drivers hand these back from a raw column read and accept them when binding. `Null` is the
/// driver's "this column was null" signal; a legitimate `Int(0)` is never treated as absent:
/// ```rust
/// use sql_session::prelude::*;
///
/// let params = vec![
///     RowValues::Int(1),
///     RowValues::Text("alice".into()),
///     RowValues::Bool(true),
/// ];
/// assert!(!params[0].is_null());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Arbitrary precision decimal, kept in its textual form
    Decimal(Decimal),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Calendar date
    Date(NaiveDate),
    /// Time of day
    Time(NaiveTime),
    /// Timestamp value without a zone
    Timestamp(NaiveDateTime),
    /// Instant on the UTC timeline (timestamp with time zone)
    TimestampTz(DateTime<Utc>),
    /// UUID value
    Uuid(Uuid),
    /// NULL value
    Null,
    /// JSON value
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
    /// Typed array
    Array(Vec<RowValues>),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short name of the variant, used in coercion errors.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            RowValues::Int(_) => "INTEGER",
            RowValues::Float(_) => "DOUBLE",
            RowValues::Decimal(_) => "DECIMAL",
            RowValues::Text(_) => "TEXT",
            RowValues::Bool(_) => "BOOLEAN",
            RowValues::Date(_) => "DATE",
            RowValues::Time(_) => "TIME",
            RowValues::Timestamp(_) => "TIMESTAMP",
            RowValues::TimestampTz(_) => "TIMESTAMPTZ",
            RowValues::Uuid(_) => "UUID",
            RowValues::Null => "NULL",
            RowValues::JSON(_) => "JSON",
            RowValues::Blob(_) => "BLOB",
            RowValues::Array(_) => "ARRAY",
        }
    }

    /// The semantic type a non-null value carries on its own.
    #[must_use]
    pub const fn semantic_type(&self) -> Option<SemanticType> {
        match self {
            RowValues::Int(_) => Some(SemanticType::Int64),
            RowValues::Float(_) => Some(SemanticType::Float64),
            RowValues::Decimal(_) => Some(SemanticType::Decimal),
            RowValues::Text(_) => Some(SemanticType::String),
            RowValues::Bool(_) => Some(SemanticType::Bool),
            RowValues::Date(_) => Some(SemanticType::Date),
            RowValues::Time(_) => Some(SemanticType::Time),
            RowValues::Timestamp(_) => Some(SemanticType::Timestamp),
            RowValues::TimestampTz(_) => Some(SemanticType::TimestampTz),
            RowValues::Uuid(_) => Some(SemanticType::Uuid),
            RowValues::JSON(_) => Some(SemanticType::Json),
            RowValues::Blob(_) => Some(SemanticType::Bytes),
            RowValues::Array(_) => Some(SemanticType::Array),
            RowValues::Null => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// Render the value as JSON, the shape used by the generic row mapper.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            RowValues::Int(i) => JsonValue::from(*i),
            RowValues::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(JsonValue::Null, JsonValue::Number),
            RowValues::Decimal(d) => JsonValue::String(d.to_string()),
            RowValues::Text(s) => JsonValue::String(s.clone()),
            RowValues::Bool(b) => JsonValue::Bool(*b),
            RowValues::Date(d) => JsonValue::String(d.format(DATE_FORMAT).to_string()),
            RowValues::Time(t) => JsonValue::String(t.format(TIME_FORMAT).to_string()),
            RowValues::Timestamp(ts) => JsonValue::String(ts.format(TIMESTAMP_FORMAT).to_string()),
            RowValues::TimestampTz(ts) => JsonValue::String(ts.to_rfc3339()),
            RowValues::Uuid(u) => JsonValue::String(u.to_string()),
            RowValues::Null => JsonValue::Null,
            RowValues::JSON(j) => j.clone(),
            RowValues::Blob(bytes) => {
                JsonValue::Array(bytes.iter().map(|b| JsonValue::from(*b)).collect())
            }
            RowValues::Array(items) => JsonValue::Array(items.iter().map(Self::to_json).collect()),
        }
    }

    /// Lift a JSON value back into row values (arrays stored as JSON text use this).
    #[must_use]
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => RowValues::Null,
            JsonValue::Bool(b) => RowValues::Bool(*b),
            JsonValue::Number(n) => n
                .as_i64()
                .map(RowValues::Int)
                .or_else(|| n.as_f64().map(RowValues::Float))
                .unwrap_or_else(|| RowValues::Text(n.to_string())),
            JsonValue::String(s) => RowValues::Text(s.clone()),
            JsonValue::Array(items) => RowValues::Array(items.iter().map(Self::from_json).collect()),
            JsonValue::Object(_) => RowValues::JSON(value.clone()),
        }
    }
}

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const TIME_FORMAT: &str = "%H:%M:%S%.f";
pub(crate) const TIMESTAMP_FORMAT: &str = "%F %T%.f";

/// Wire-level SQL type codes a binder can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    Varchar,
    Numeric,
    Double,
    Float,
    Boolean,
    Binary,
    Date,
    Time,
    Timestamp,
    Array,
    Other,
}

impl SqlType {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            SqlType::Varchar => "VARCHAR",
            SqlType::Numeric => "NUMERIC",
            SqlType::Double => "DOUBLE",
            SqlType::Float => "FLOAT",
            SqlType::Boolean => "BOOLEAN",
            SqlType::Binary => "VARBINARY",
            SqlType::Date => "DATE",
            SqlType::Time => "TIME",
            SqlType::Timestamp => "TIMESTAMP",
            SqlType::Array => "ARRAY",
            SqlType::Other => "OTHER",
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Closed set of value types a [`Parameter`](crate::parameter::Parameter) can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticType {
    String,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Decimal,
    Bool,
    Bytes,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Uuid,
    Json,
    Array,
}

impl SemanticType {
    /// Static mapping from declared type to the wire type used when binding a null.
    #[must_use]
    pub const fn sql_type(self) -> SqlType {
        match self {
            SemanticType::String => SqlType::Varchar,
            SemanticType::Int16 | SemanticType::Int32 | SemanticType::Int64 => SqlType::Numeric,
            SemanticType::Float64 | SemanticType::Decimal => SqlType::Double,
            SemanticType::Float32 => SqlType::Float,
            SemanticType::Bool => SqlType::Boolean,
            SemanticType::Bytes => SqlType::Binary,
            SemanticType::Date => SqlType::Date,
            SemanticType::Time => SqlType::Time,
            SemanticType::Timestamp | SemanticType::TimestampTz => SqlType::Timestamp,
            SemanticType::Array => SqlType::Array,
            SemanticType::Uuid | SemanticType::Json => SqlType::Other,
        }
    }
}

static DECIMAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").expect("decimal pattern is valid")
});

/// Arbitrary-precision decimal carried in its canonical textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal(String);

impl Decimal {
    /// Parse a decimal literal such as `-12.50` or `1e3`.
    ///
    /// # Errors
    /// Returns `SqlSessionError::TypeMismatch` if the text is not a decimal literal.
    pub fn parse(text: &str) -> Result<Self, SqlSessionError> {
        let trimmed = text.trim();
        if !DECIMAL_RE.is_match(trimmed) {
            return Err(SqlSessionError::TypeMismatch {
                column: String::new(),
                expected: "decimal",
                actual: format!("'{trimmed}'"),
            });
        }
        Ok(Decimal(trimmed.trim_start_matches('+').to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lossy conversion for callers that only need a float.
    #[must_use]
    pub fn to_f64(&self) -> Option<f64> {
        self.0.parse().ok()
    }
}

impl FromStr for Decimal {
    type Err = SqlSessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::parse(s)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Decimal(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_wire_types_follow_declared_type() {
        assert_eq!(SemanticType::String.sql_type(), SqlType::Varchar);
        assert_eq!(SemanticType::Int16.sql_type(), SqlType::Numeric);
        assert_eq!(SemanticType::Int64.sql_type(), SqlType::Numeric);
        assert_eq!(SemanticType::Decimal.sql_type(), SqlType::Double);
        assert_eq!(SemanticType::Float32.sql_type(), SqlType::Float);
        assert_eq!(SemanticType::TimestampTz.sql_type(), SqlType::Timestamp);
        assert_eq!(SemanticType::Time.sql_type(), SqlType::Time);
        assert_eq!(SemanticType::Date.sql_type(), SqlType::Date);
        assert_eq!(SemanticType::Uuid.sql_type(), SqlType::Other);
    }

    #[test]
    fn zero_is_not_null() {
        assert!(!RowValues::Int(0).is_null());
        assert!(RowValues::Null.is_null());
        assert_eq!(RowValues::Null.semantic_type(), None);
        assert_eq!(RowValues::Int(0).semantic_type(), Some(SemanticType::Int64));
    }

    #[test]
    fn decimal_parsing() {
        assert_eq!(Decimal::parse(" +12.50 ").unwrap().as_str(), "12.50");
        assert_eq!(Decimal::parse("-.5").unwrap().as_str(), "-.5");
        assert_eq!(Decimal::parse("1e3").unwrap().to_f64(), Some(1000.0));
        assert!(Decimal::parse("12,5").is_err());
        assert!(Decimal::parse("").is_err());
    }

    #[test]
    fn json_round_trip_for_arrays() {
        let json = serde_json::json!([1, 2.5, "x", null, true]);
        let values = RowValues::from_json(&json);
        assert_eq!(
            values,
            RowValues::Array(vec![
                RowValues::Int(1),
                RowValues::Float(2.5),
                RowValues::Text("x".into()),
                RowValues::Null,
                RowValues::Bool(true),
            ])
        );
        assert_eq!(values.to_json(), json);
    }
}
