//! Coercions from driver values to Rust types.
//!
//! Callers never see a NULL here: [`Row`](super::Row) checks the driver's null signal first and
//! only hands non-null values to [`FromValue`]. The one exception is [`Option<T>`], used for
//! array elements, which maps NULL to `None`.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::types::{DATE_FORMAT, Decimal, RowValues, TIME_FORMAT, TIMESTAMP_FORMAT};

/// A value that could not be coerced to the requested type.
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    pub expected: &'static str,
    pub actual: String,
}

impl Mismatch {
    fn new(expected: &'static str, value: &RowValues) -> Self {
        let actual = match value {
            RowValues::Text(s) => format!("TEXT '{s}'"),
            RowValues::Int(i) => format!("INTEGER {i}"),
            RowValues::Float(f) => format!("DOUBLE {f}"),
            other => other.type_name().to_string(),
        };
        Self { expected, actual }
    }
}

/// Conversion from a non-null driver value.
pub trait FromValue: Sized {
    /// Name used in coercion errors.
    const EXPECTED: &'static str;

    /// # Errors
    /// Returns [`Mismatch`] if the value cannot represent `Self`.
    fn from_value(value: RowValues) -> Result<Self, Mismatch>;
}

impl FromValue for RowValues {
    const EXPECTED: &'static str = "value";

    fn from_value(value: RowValues) -> Result<Self, Mismatch> {
        Ok(value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_value(value: RowValues) -> Result<Self, Mismatch> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "string";

    fn from_value(value: RowValues) -> Result<Self, Mismatch> {
        match value {
            RowValues::Text(s) => Ok(s),
            RowValues::Int(i) => Ok(i.to_string()),
            RowValues::Float(f) => Ok(f.to_string()),
            RowValues::Decimal(d) => Ok(d.to_string()),
            RowValues::Bool(b) => Ok(b.to_string()),
            RowValues::Date(d) => Ok(d.format(DATE_FORMAT).to_string()),
            RowValues::Time(t) => Ok(t.format(TIME_FORMAT).to_string()),
            RowValues::Timestamp(ts) => Ok(ts.format(TIMESTAMP_FORMAT).to_string()),
            RowValues::TimestampTz(ts) => Ok(ts.to_rfc3339()),
            RowValues::Uuid(u) => Ok(u.to_string()),
            RowValues::JSON(j) => Ok(j.to_string()),
            RowValues::Array(_) => Ok(value.to_json().to_string()),
            RowValues::Blob(bytes) => String::from_utf8(bytes)
                .map_err(|_| Mismatch::new(Self::EXPECTED, &RowValues::Blob(Vec::new()))),
            RowValues::Null => Err(Mismatch::new(Self::EXPECTED, &value)),
        }
    }
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "i64";

    fn from_value(value: RowValues) -> Result<Self, Mismatch> {
        match &value {
            RowValues::Int(i) => Ok(*i),
            RowValues::Bool(b) => Ok(i64::from(*b)),
            RowValues::Float(f) => truncate(*f).ok_or_else(|| Mismatch::new(Self::EXPECTED, &value)),
            RowValues::Decimal(d) => d
                .as_str()
                .parse::<i64>()
                .ok()
                .or_else(|| d.to_f64().and_then(truncate))
                .ok_or_else(|| Mismatch::new(Self::EXPECTED, &value)),
            RowValues::Text(s) => {
                let trimmed = s.trim();
                trimmed
                    .parse::<i64>()
                    .ok()
                    .or_else(|| trimmed.parse::<f64>().ok().and_then(truncate))
                    .ok_or_else(|| Mismatch::new(Self::EXPECTED, &value))
            }
            _ => Err(Mismatch::new(Self::EXPECTED, &value)),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn truncate(f: f64) -> Option<i64> {
    let t = f.trunc();
    if t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64 {
        Some(t as i64)
    } else {
        None
    }
}

macro_rules! narrow_int {
    ($($ty:ty => $name:literal),*) => {
        $(
            impl FromValue for $ty {
                const EXPECTED: &'static str = $name;

                fn from_value(value: RowValues) -> Result<Self, Mismatch> {
                    let wide = i64::from_value(value.clone())
                        .map_err(|m| Mismatch { expected: Self::EXPECTED, ..m })?;
                    <$ty>::try_from(wide).map_err(|_| Mismatch::new(Self::EXPECTED, &value))
                }
            }
        )*
    };
}

narrow_int!(i16 => "i16", i32 => "i32");

impl FromValue for f64 {
    const EXPECTED: &'static str = "f64";

    #[allow(clippy::cast_precision_loss)]
    fn from_value(value: RowValues) -> Result<Self, Mismatch> {
        match &value {
            RowValues::Float(f) => Ok(*f),
            RowValues::Int(i) => Ok(*i as f64),
            RowValues::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            RowValues::Decimal(d) => d
                .to_f64()
                .ok_or_else(|| Mismatch::new(Self::EXPECTED, &value)),
            RowValues::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| Mismatch::new(Self::EXPECTED, &value)),
            _ => Err(Mismatch::new(Self::EXPECTED, &value)),
        }
    }
}

impl FromValue for f32 {
    const EXPECTED: &'static str = "f32";

    #[allow(clippy::cast_possible_truncation)]
    fn from_value(value: RowValues) -> Result<Self, Mismatch> {
        f64::from_value(value)
            .map(|f| f as f32)
            .map_err(|m| Mismatch { expected: Self::EXPECTED, ..m })
    }
}

impl FromValue for Decimal {
    const EXPECTED: &'static str = "decimal";

    fn from_value(value: RowValues) -> Result<Self, Mismatch> {
        match &value {
            RowValues::Decimal(d) => Ok(d.clone()),
            RowValues::Int(i) => Ok(Decimal::from(*i)),
            RowValues::Float(f) => {
                Decimal::parse(&f.to_string()).map_err(|_| Mismatch::new(Self::EXPECTED, &value))
            }
            RowValues::Text(s) => {
                Decimal::parse(s).map_err(|_| Mismatch::new(Self::EXPECTED, &value))
            }
            _ => Err(Mismatch::new(Self::EXPECTED, &value)),
        }
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "boolean";

    fn from_value(value: RowValues) -> Result<Self, Mismatch> {
        match &value {
            RowValues::Bool(b) => Ok(*b),
            RowValues::Int(i) => Ok(*i != 0),
            RowValues::Float(f) => Ok(*f != 0.0),
            RowValues::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "yes" | "y" | "on" | "1" => Ok(true),
                "false" | "f" | "no" | "n" | "off" | "0" => Ok(false),
                _ => Err(Mismatch::new(Self::EXPECTED, &value)),
            },
            _ => Err(Mismatch::new(Self::EXPECTED, &value)),
        }
    }
}

impl FromValue for Vec<u8> {
    const EXPECTED: &'static str = "bytes";

    fn from_value(value: RowValues) -> Result<Self, Mismatch> {
        match value {
            RowValues::Blob(bytes) => Ok(bytes),
            RowValues::Text(s) => Ok(s.into_bytes()),
            RowValues::Uuid(u) => Ok(u.as_bytes().to_vec()),
            other => Err(Mismatch::new(Self::EXPECTED, &other)),
        }
    }
}

impl FromValue for NaiveDate {
    const EXPECTED: &'static str = "date";

    fn from_value(value: RowValues) -> Result<Self, Mismatch> {
        match &value {
            RowValues::Date(d) => Ok(*d),
            RowValues::Timestamp(ts) => Ok(ts.date()),
            RowValues::TimestampTz(ts) => Ok(ts.with_timezone(&Local).date_naive()),
            RowValues::Text(s) => {
                let trimmed = s.trim();
                NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
                    .ok()
                    .or_else(|| parse_naive_timestamp(trimmed).map(|ts| ts.date()))
                    .ok_or_else(|| Mismatch::new(Self::EXPECTED, &value))
            }
            _ => Err(Mismatch::new(Self::EXPECTED, &value)),
        }
    }
}

impl FromValue for NaiveTime {
    const EXPECTED: &'static str = "time";

    fn from_value(value: RowValues) -> Result<Self, Mismatch> {
        match &value {
            RowValues::Time(t) => Ok(*t),
            RowValues::Timestamp(ts) => Ok(ts.time()),
            RowValues::TimestampTz(ts) => Ok(ts.with_timezone(&Local).time()),
            RowValues::Text(s) => {
                let trimmed = s.trim();
                NaiveTime::parse_from_str(trimmed, TIME_FORMAT)
                    .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
                    .ok()
                    .or_else(|| parse_naive_timestamp(trimmed).map(|ts| ts.time()))
                    .ok_or_else(|| Mismatch::new(Self::EXPECTED, &value))
            }
            _ => Err(Mismatch::new(Self::EXPECTED, &value)),
        }
    }
}

impl FromValue for NaiveDateTime {
    const EXPECTED: &'static str = "timestamp";

    fn from_value(value: RowValues) -> Result<Self, Mismatch> {
        match &value {
            RowValues::Timestamp(ts) => Ok(*ts),
            RowValues::Date(d) => Ok(d.and_time(NaiveTime::MIN)),
            RowValues::TimestampTz(ts) => Ok(ts.with_timezone(&Local).naive_local()),
            RowValues::Text(s) => {
                let trimmed = s.trim();
                parse_naive_timestamp(trimmed)
                    .or_else(|| {
                        DateTime::parse_from_rfc3339(trimmed)
                            .ok()
                            .map(|ts| ts.with_timezone(&Local).naive_local())
                    })
                    .ok_or_else(|| Mismatch::new(Self::EXPECTED, &value))
            }
            _ => Err(Mismatch::new(Self::EXPECTED, &value)),
        }
    }
}

/// Zone-less timestamp layouts accepted from text columns, most specific first.
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

fn parse_naive_timestamp(text: &str) -> Option<NaiveDateTime> {
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, DATE_FORMAT)
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// A stored zone-less timestamp stands for local wall-clock time.
fn local_instant(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

impl FromValue for DateTime<Utc> {
    const EXPECTED: &'static str = "instant";

    fn from_value(value: RowValues) -> Result<Self, Mismatch> {
        match &value {
            RowValues::TimestampTz(ts) => Ok(*ts),
            RowValues::Timestamp(ts) => {
                local_instant(*ts).ok_or_else(|| Mismatch::new(Self::EXPECTED, &value))
            }
            RowValues::Int(secs) => DateTime::from_timestamp(*secs, 0)
                .ok_or_else(|| Mismatch::new(Self::EXPECTED, &value)),
            RowValues::Text(s) => {
                let trimmed = s.trim();
                DateTime::parse_from_rfc3339(trimmed)
                    .map(|ts| ts.with_timezone(&Utc))
                    .ok()
                    .or_else(|| parse_naive_timestamp(trimmed).and_then(local_instant))
                    .ok_or_else(|| Mismatch::new(Self::EXPECTED, &value))
            }
            _ => Err(Mismatch::new(Self::EXPECTED, &value)),
        }
    }
}

impl FromValue for DateTime<Local> {
    const EXPECTED: &'static str = "zoned timestamp";

    fn from_value(value: RowValues) -> Result<Self, Mismatch> {
        DateTime::<Utc>::from_value(value)
            .map(|instant| instant.with_timezone(&Local))
            .map_err(|m| Mismatch { expected: Self::EXPECTED, ..m })
    }
}

impl FromValue for DateTime<FixedOffset> {
    const EXPECTED: &'static str = "offset timestamp";

    fn from_value(value: RowValues) -> Result<Self, Mismatch> {
        DateTime::<Utc>::from_value(value)
            .map(|instant| instant.with_timezone(&Local).fixed_offset())
            .map_err(|m| Mismatch { expected: Self::EXPECTED, ..m })
    }
}

impl FromValue for Uuid {
    const EXPECTED: &'static str = "uuid";

    fn from_value(value: RowValues) -> Result<Self, Mismatch> {
        match &value {
            RowValues::Uuid(u) => Ok(*u),
            RowValues::Text(s) => {
                Uuid::parse_str(s.trim()).map_err(|_| Mismatch::new(Self::EXPECTED, &value))
            }
            RowValues::Blob(bytes) => {
                Uuid::from_slice(bytes).map_err(|_| Mismatch::new(Self::EXPECTED, &value))
            }
            _ => Err(Mismatch::new(Self::EXPECTED, &value)),
        }
    }
}

impl FromValue for JsonValue {
    const EXPECTED: &'static str = "json";

    fn from_value(value: RowValues) -> Result<Self, Mismatch> {
        match value {
            RowValues::JSON(j) => Ok(j),
            RowValues::Text(s) => serde_json::from_str(&s)
                .map_err(|_| Mismatch::new(Self::EXPECTED, &RowValues::Text(s))),
            other => Ok(other.to_json()),
        }
    }
}

/// Elements of an array column, from a native array or JSON array text.
pub(crate) fn array_elements(value: RowValues) -> Result<Vec<RowValues>, Mismatch> {
    match value {
        RowValues::Array(items) => Ok(items),
        RowValues::JSON(json @ JsonValue::Array(_)) => match RowValues::from_json(&json) {
            RowValues::Array(items) => Ok(items),
            other => Err(Mismatch::new("array", &other)),
        },
        RowValues::Text(s) => match serde_json::from_str::<JsonValue>(&s) {
            Ok(json @ JsonValue::Array(_)) => array_elements(RowValues::JSON(json)),
            _ => Err(Mismatch::new("array", &RowValues::Text(s))),
        },
        other => Err(Mismatch::new("array", &other)),
    }
}
