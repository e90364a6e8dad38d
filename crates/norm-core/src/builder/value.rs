//! SQL values and literal rendering.
//!
//! Statements produced by the builder inline their literals, so every value
//! that reaches SQL text goes through [`SqlValue::to_sql_literal`].

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};

use crate::dialect::Dialect;

/// A SQL value read from, or destined for, a column.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Point in time, always UTC.
    Timestamp(DateTime<Utc>),
}

impl SqlValue {
    /// Renders the value as an inline SQL literal for `dialect`.
    ///
    /// - `NULL` for null, `1`/`0` for booleans
    /// - text is single-quoted with embedded quotes doubled
    /// - timestamps use the dialect's layout, quoted
    /// - numbers use their locale-independent decimal form
    #[must_use]
    pub fn to_sql_literal(&self, dialect: Dialect) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => String::from(if *b { "1" } else { "0" }),
            Self::Int(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => quote(s),
            Self::Timestamp(ts) => quote(&dialect.format_timestamp(ts)),
        }
    }

    /// Renders the value's plain text as a quoted literal.
    ///
    /// Key comparisons in `DELETE` statements are always emitted this way
    /// (`id = '1'`); both engines coerce the text back to the column type.
    #[must_use]
    pub fn to_quoted_literal(&self, dialect: Dialect) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Timestamp(ts) => quote(&dialect.format_timestamp(ts)),
            other => quote(&other.to_string()),
        }
    }

    /// Short name of the value's kind, used in diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Bool(_) => "Bool",
            Self::Int(_) => "Int",
            Self::Float(_) => "Float",
            Self::Text(_) => "Text",
            Self::Timestamp(_) => "Timestamp",
        }
    }

    /// Returns `true` for [`SqlValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Compares two values the way records compare: timestamps at second
    /// granularity, everything else exactly.
    #[must_use]
    pub fn record_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Timestamp(a), Self::Timestamp(b)) => a.trunc_subsecs(0) == b.trunc_subsecs(0),
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
            Self::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
        }
    }
}

/// A materialized row: column name to value.
pub type RowMap = BTreeMap<String, SqlValue>;

fn quote(s: &str) -> String {
    let escaped = s.replace('\'', "''");
    format!("'{escaped}'")
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

impl ToSqlValue for i64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(self)
    }
}

impl ToSqlValue for i32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl ToSqlValue for DateTime<Utc> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Timestamp(self)
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}
