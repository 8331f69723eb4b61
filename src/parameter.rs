//! Parameter boxes: a bind value plus the type it was declared with.
//!
//! A bare `None` carries no type, so drivers that need a concrete wire type for NULL would
//! otherwise have to guess. Converting an `Option<T>` keeps `T`'s declared type around:
//! ```rust
//! use sql_session::prelude::*;
//!
//! let missing: Option<String> = None;
//! let p = Parameter::from(missing);
//! assert!(p.is_null());
//! assert_eq!(p.sql_type(), Some(SqlType::Varchar));
//!
//! assert_eq!(Parameter::null().sql_type(), None);
//! ```

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::types::{Decimal, RowValues, SemanticType, SqlType};

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    value: RowValues,
    declared: Option<SemanticType>,
}

pub(crate) static UNTYPED_NULL: Parameter = Parameter::null();

impl Parameter {
    /// A value whose type is inferred from the value itself.
    #[must_use]
    pub fn new(value: RowValues) -> Self {
        Self {
            value,
            declared: None,
        }
    }

    /// A value with an explicitly declared type.
    #[must_use]
    pub fn typed(value: RowValues, declared: SemanticType) -> Self {
        Self {
            value,
            declared: Some(declared),
        }
    }

    /// Untyped SQL NULL. How it binds is up to the driver.
    #[must_use]
    pub const fn null() -> Self {
        Self {
            value: RowValues::Null,
            declared: None,
        }
    }

    /// NULL that still knows which wire type it stands for.
    #[must_use]
    pub const fn typed_null(declared: SemanticType) -> Self {
        Self {
            value: RowValues::Null,
            declared: Some(declared),
        }
    }

    /// Build an array parameter from any iterator of convertible elements.
    pub fn array<T, I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<RowValues>,
    {
        Self::typed(
            RowValues::Array(items.into_iter().map(Into::into).collect()),
            SemanticType::Array,
        )
    }

    #[must_use]
    pub fn value(&self) -> &RowValues {
        &self.value
    }

    #[must_use]
    pub fn into_value(self) -> RowValues {
        self.value
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.value.is_null()
    }

    /// Declared type, falling back to the type carried by a non-null value.
    #[must_use]
    pub fn semantic_type(&self) -> Option<SemanticType> {
        self.declared.or_else(|| self.value.semantic_type())
    }

    /// Wire type the binder should target; `None` only for an untyped NULL.
    #[must_use]
    pub fn sql_type(&self) -> Option<SqlType> {
        self.semantic_type().map(SemanticType::sql_type)
    }
}

impl Default for Parameter {
    fn default() -> Self {
        Self::null()
    }
}

impl From<RowValues> for Parameter {
    fn from(value: RowValues) -> Self {
        Parameter::new(value)
    }
}

/// Rust types with a fixed declared SQL type.
pub trait SqlTyped: Into<RowValues> {
    const SEMANTIC_TYPE: SemanticType;
}

/// Box an optional value, keeping `T`'s declared type even when the value is absent.
pub fn param<T: SqlTyped>(value: Option<T>) -> Parameter {
    match value {
        Some(v) => Parameter::typed(v.into(), T::SEMANTIC_TYPE),
        None => Parameter::typed_null(T::SEMANTIC_TYPE),
    }
}

macro_rules! impl_sql_typed {
    ($($ty:ty => $semantic:ident, |$v:ident| $convert:expr;)*) => {
        $(
            impl From<$ty> for RowValues {
                fn from($v: $ty) -> Self {
                    $convert
                }
            }

            impl SqlTyped for $ty {
                const SEMANTIC_TYPE: SemanticType = SemanticType::$semantic;
            }

            impl From<$ty> for Parameter {
                fn from(value: $ty) -> Self {
                    param(Some(value))
                }
            }

            impl From<Option<$ty>> for Parameter {
                fn from(value: Option<$ty>) -> Self {
                    param(value)
                }
            }
        )*
    };
}

impl_sql_typed! {
    String => String, |v| RowValues::Text(v);
    &str => String, |v| RowValues::Text(v.to_owned());
    i16 => Int16, |v| RowValues::Int(i64::from(v));
    i32 => Int32, |v| RowValues::Int(i64::from(v));
    i64 => Int64, |v| RowValues::Int(v);
    u32 => Int64, |v| RowValues::Int(i64::from(v));
    f32 => Float32, |v| RowValues::Float(f64::from(v));
    f64 => Float64, |v| RowValues::Float(v);
    bool => Bool, |v| RowValues::Bool(v);
    Decimal => Decimal, |v| RowValues::Decimal(v);
    Vec<u8> => Bytes, |v| RowValues::Blob(v);
    &[u8] => Bytes, |v| RowValues::Blob(v.to_vec());
    NaiveDate => Date, |v| RowValues::Date(v);
    NaiveTime => Time, |v| RowValues::Time(v);
    NaiveDateTime => Timestamp, |v| RowValues::Timestamp(v);
    DateTime<Utc> => TimestampTz, |v| RowValues::TimestampTz(v);
    DateTime<Local> => TimestampTz, |v| RowValues::TimestampTz(v.with_timezone(&Utc));
    DateTime<FixedOffset> => TimestampTz, |v| RowValues::TimestampTz(v.with_timezone(&Utc));
    Uuid => Uuid, |v| RowValues::Uuid(v);
    JsonValue => Json, |v| RowValues::JSON(v);
}

/// Build a `Vec<Parameter>` from heterogeneous values.
///
/// ```rust
/// use sql_session::params;
///
/// let values = params!["Alice", 42, None::<i64>];
/// assert_eq!(values.len(), 3);
/// assert!(values[2].is_null());
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::parameter::Parameter>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::parameter::Parameter::from($value)),+]
    };
}

/// Build a `HashMap<String, Parameter>` for named-parameter queries.
///
/// ```rust
/// use sql_session::named_params;
///
/// let values = named_params! { "id" => 1, "name" => "Bob" };
/// assert_eq!(values.len(), 2);
/// ```
#[macro_export]
macro_rules! named_params {
    () => {
        ::std::collections::HashMap::<::std::string::String, $crate::parameter::Parameter>::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut map = ::std::collections::HashMap::<::std::string::String, $crate::parameter::Parameter>::new();
        $(map.insert(::std::string::String::from($name), $crate::parameter::Parameter::from($value));)+
        map
    }};
}
