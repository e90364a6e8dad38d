//! Field value conversion between Rust types and [`SqlValue`].

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::builder::value::SqlValue;
use crate::error::ValueError;

/// Storage-independent type tag of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticType {
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer. Accepted by the value layer, but no dialect
    /// maps it to a column type.
    Int64,
    /// Text.
    Text,
    /// Boolean.
    Bool,
    /// UTC timestamp.
    Timestamp,
    /// 64-bit float.
    Float64,
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Text => "text",
            Self::Bool => "bool",
            Self::Timestamp => "timestamp",
            Self::Float64 => "float64",
        };
        f.write_str(name)
    }
}

/// A Rust type that can back a column.
///
/// `from_value` never sees [`SqlValue::Null`] for `Option<T>` fields; the
/// `Option` impl handles it before delegating.
pub trait FieldValue: Sized {
    /// Semantic type of the column.
    const SEMANTIC_TYPE: SemanticType;
    /// Whether the column accepts `NULL`.
    const NULLABLE: bool = false;
    /// Rust type name used in conversion errors.
    const TYPE_NAME: &'static str;

    /// Converts the field into a SQL value.
    fn to_value(&self) -> SqlValue;

    /// Converts a SQL value read from a row into the field type.
    ///
    /// # Errors
    ///
    /// Returns a [`ValueError`] when the value has an incompatible shape.
    fn from_value(value: SqlValue) -> Result<Self, ValueError>;
}

fn mismatch<T: FieldValue>(value: &SqlValue) -> ValueError {
    if value.is_null() {
        ValueError::UnexpectedNull(T::TYPE_NAME)
    } else {
        ValueError::TypeMismatch {
            expected: T::TYPE_NAME,
            found: value.kind(),
        }
    }
}

/// Reads an integer from any scalar shape: floats are rounded half to even,
/// text is parsed after trimming.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn integer<T: FieldValue>(value: SqlValue) -> Result<i64, ValueError> {
    match value {
        SqlValue::Int(n) => Ok(n),
        SqlValue::Bool(b) => Ok(i64::from(b)),
        SqlValue::Float(f) => {
            let rounded = f.round_ties_even();
            if rounded.is_finite() && rounded >= i64::MIN as f64 && rounded < i64::MAX as f64 {
                Ok(rounded as i64)
            } else {
                Err(ValueError::OutOfRange {
                    expected: T::TYPE_NAME,
                    value: f.to_string(),
                })
            }
        }
        SqlValue::Text(ref s) => s.trim().parse().map_err(|_| mismatch::<T>(&value)),
        other => Err(mismatch::<T>(&other)),
    }
}

impl FieldValue for i32 {
    const SEMANTIC_TYPE: SemanticType = SemanticType::Int32;
    const TYPE_NAME: &'static str = "i32";

    fn to_value(&self) -> SqlValue {
        SqlValue::Int(i64::from(*self))
    }

    fn from_value(value: SqlValue) -> Result<Self, ValueError> {
        let n = integer::<Self>(value)?;
        Self::try_from(n).map_err(|_| ValueError::OutOfRange {
            expected: Self::TYPE_NAME,
            value: n.to_string(),
        })
    }
}

impl FieldValue for i64 {
    const SEMANTIC_TYPE: SemanticType = SemanticType::Int64;
    const TYPE_NAME: &'static str = "i64";

    fn to_value(&self) -> SqlValue {
        SqlValue::Int(*self)
    }

    fn from_value(value: SqlValue) -> Result<Self, ValueError> {
        integer::<Self>(value)
    }
}

impl FieldValue for String {
    const SEMANTIC_TYPE: SemanticType = SemanticType::Text;
    const TYPE_NAME: &'static str = "String";

    fn to_value(&self) -> SqlValue {
        SqlValue::Text(self.clone())
    }

    /// Any non-null scalar converts to its plain text.
    fn from_value(value: SqlValue) -> Result<Self, ValueError> {
        match value {
            SqlValue::Text(s) => Ok(s),
            SqlValue::Null => Err(mismatch::<Self>(&value)),
            other => Ok(other.to_string()),
        }
    }
}

impl FieldValue for bool {
    const SEMANTIC_TYPE: SemanticType = SemanticType::Bool;
    const TYPE_NAME: &'static str = "bool";

    fn to_value(&self) -> SqlValue {
        SqlValue::Bool(*self)
    }

    fn from_value(value: SqlValue) -> Result<Self, ValueError> {
        match value {
            SqlValue::Bool(b) => Ok(b),
            SqlValue::Int(0) => Ok(false),
            SqlValue::Int(1) => Ok(true),
            SqlValue::Int(n) => Err(ValueError::OutOfRange {
                expected: Self::TYPE_NAME,
                value: n.to_string(),
            }),
            SqlValue::Text(ref s) if s.trim().eq_ignore_ascii_case("true") => Ok(true),
            SqlValue::Text(ref s) if s.trim().eq_ignore_ascii_case("false") => Ok(false),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl FieldValue for f64 {
    const SEMANTIC_TYPE: SemanticType = SemanticType::Float64;
    const TYPE_NAME: &'static str = "f64";

    fn to_value(&self) -> SqlValue {
        SqlValue::Float(*self)
    }

    #[allow(clippy::cast_precision_loss)]
    fn from_value(value: SqlValue) -> Result<Self, ValueError> {
        match value {
            SqlValue::Float(f) => Ok(f),
            SqlValue::Int(n) => Ok(n as f64),
            SqlValue::Text(ref s) => s.trim().parse().map_err(|_| mismatch::<Self>(&value)),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl FieldValue for DateTime<Utc> {
    const SEMANTIC_TYPE: SemanticType = SemanticType::Timestamp;
    const TYPE_NAME: &'static str = "DateTime<Utc>";

    fn to_value(&self) -> SqlValue {
        SqlValue::Timestamp(*self)
    }

    fn from_value(value: SqlValue) -> Result<Self, ValueError> {
        match value {
            SqlValue::Timestamp(ts) => Ok(ts),
            SqlValue::Text(s) => parse_timestamp(&s),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

/// Parses timestamp text as stored by either dialect.
///
/// Accepts RFC 3339 (the embedded layout) and `YYYY-MM-DD HH:MM:SS[.f]`,
/// which is taken to be UTC.
///
/// # Errors
///
/// Returns [`ValueError::InvalidTimestamp`] for any other layout.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, ValueError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| ValueError::InvalidTimestamp(s.to_string()))
}

impl<T: FieldValue> FieldValue for Option<T> {
    const SEMANTIC_TYPE: SemanticType = T::SEMANTIC_TYPE;
    const NULLABLE: bool = true;
    const TYPE_NAME: &'static str = T::TYPE_NAME;

    fn to_value(&self) -> SqlValue {
        self.as_ref().map_or(SqlValue::Null, FieldValue::to_value)
    }

    fn from_value(value: SqlValue) -> Result<Self, ValueError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}
