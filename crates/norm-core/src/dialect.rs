//! SQL dialect support.
//!
//! The two supported engines differ in DDL vocabulary, type names, how the
//! engine reports a freshly assigned identity, and how the live schema is
//! introspected. A [`Dialect`] is a plain tag; everything that varies lives
//! in its static [`DialectRules`] table, so the builder stays a pure function
//! of `(dialect, descriptor, inputs)`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::SemanticType;

/// Target SQL engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Embedded file or in-memory engine (SQLite).
    Sqlite,
    /// Networked server engine (MySQL).
    MySql,
}

/// How a dialect finishes a statement whose result is read through a row
/// cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementTail {
    /// Replace the terminating `;` with the given text.
    ReplaceTerminator(&'static str),
    /// Append the given text after the statement.
    Append(&'static str),
}

impl StatementTail {
    /// Applies the tail to a complete, `;`-terminated statement.
    pub fn apply(self, sql: &mut String) {
        match self {
            Self::ReplaceTerminator(tail) => {
                if sql.ends_with(';') {
                    sql.pop();
                }
                sql.push_str(tail);
            }
            Self::Append(tail) => sql.push_str(tail),
        }
    }
}

/// Per-dialect rule table.
#[derive(Debug)]
pub struct DialectRules {
    /// Dialect name.
    pub name: &'static str,
    /// Keyword following `PRIMARY KEY` for auto-increment keys.
    pub autoincrement_keyword: &'static str,
    /// Statement appended to an `INSERT` so that a scalar read yields the
    /// assigned identity.
    pub insert_trailer: &'static str,
    /// Finishes a `DELETE … WHERE pk = …;` so it yields a row on success.
    pub delete_tail: StatementTail,
    /// Finishes a `DELETE FROM …;` so it yields a row per removal.
    pub truncate_tail: StatementTail,
    /// Column list and values used when an insert has no non-key columns.
    pub empty_insert: &'static str,
    /// Statement opening a transaction.
    pub begin_transaction: &'static str,
    /// Whether a column type can be changed in place.
    pub alter_column_type: bool,
    type_map: fn(SemanticType) -> Option<&'static str>,
    format_timestamp: fn(&DateTime<Utc>) -> String,
    table_info: fn(&str) -> String,
    alter_type: fn(&str, &str, &str) -> String,
    live_type_matches: fn(&str, &str) -> bool,
}

static SQLITE: DialectRules = DialectRules {
    name: "sqlite",
    autoincrement_keyword: "AUTOINCREMENT",
    insert_trailer: " SELECT last_insert_rowid();",
    delete_tail: StatementTail::ReplaceTerminator(" RETURNING *;"),
    truncate_tail: StatementTail::ReplaceTerminator(" RETURNING *;"),
    empty_insert: "DEFAULT VALUES",
    begin_transaction: "BEGIN;",
    alter_column_type: false,
    type_map: sqlite_type,
    format_timestamp: sqlite_timestamp,
    table_info: sqlite_table_info,
    alter_type: generic_alter_type,
    live_type_matches: str::eq_ignore_ascii_case,
};

static MYSQL: DialectRules = DialectRules {
    name: "mysql",
    autoincrement_keyword: "AUTO_INCREMENT",
    insert_trailer: " SELECT LAST_INSERT_ID();",
    delete_tail: StatementTail::Append(" SELECT ROW_COUNT();"),
    truncate_tail: StatementTail::Append(" SELECT 1 FROM DUAL WHERE ROW_COUNT() > 0;"),
    empty_insert: "() VALUES ()",
    begin_transaction: "START TRANSACTION;",
    alter_column_type: true,
    type_map: mysql_type,
    format_timestamp: mysql_timestamp,
    table_info: mysql_table_info,
    alter_type: mysql_alter_type,
    live_type_matches: mysql_types_match,
};

impl Dialect {
    /// Returns the rule table for this dialect.
    #[must_use]
    pub fn rules(self) -> &'static DialectRules {
        match self {
            Self::Sqlite => &SQLITE,
            Self::MySql => &MYSQL,
        }
    }

    /// Returns the name of the dialect.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.rules().name
    }

    /// Maps a semantic type to this dialect's column type, if it has one.
    #[must_use]
    pub fn type_name(self, semantic: SemanticType) -> Option<&'static str> {
        (self.rules().type_map)(semantic)
    }

    /// Formats a timestamp the way this dialect stores it (unquoted).
    #[must_use]
    pub fn format_timestamp(self, ts: &DateTime<Utc>) -> String {
        (self.rules().format_timestamp)(ts)
    }

    /// Returns the schema introspection query for `table`.
    #[must_use]
    pub fn table_info_query(self, table: &str) -> String {
        (self.rules().table_info)(table)
    }

    /// Returns the in-place column type change statement.
    #[must_use]
    pub fn alter_type_statement(self, table: &str, column: &str, sql_type: &str) -> String {
        (self.rules().alter_type)(table, column, sql_type)
    }

    /// Compares a live column type against the expected one.
    ///
    /// Comparison is case-insensitive.
    #[must_use]
    pub fn live_type_matches(self, live: &str, expected: &str) -> bool {
        (self.rules().live_type_matches)(live, expected)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn sqlite_type(semantic: SemanticType) -> Option<&'static str> {
    match semantic {
        SemanticType::Int32 => Some("INTEGER"),
        SemanticType::Text => Some("TEXT"),
        SemanticType::Bool => Some("BOOLEAN"),
        SemanticType::Timestamp => Some("TEXT"),
        SemanticType::Float64 => Some("REAL"),
        SemanticType::Int64 => None,
    }
}

fn mysql_type(semantic: SemanticType) -> Option<&'static str> {
    match semantic {
        SemanticType::Int32 => Some("INT"),
        SemanticType::Text => Some("VARCHAR(255)"),
        SemanticType::Bool => Some("TINYINT(1)"),
        SemanticType::Timestamp => Some("DATETIME"),
        SemanticType::Float64 => Some("DOUBLE"),
        SemanticType::Int64 => None,
    }
}

/// ISO-8601 round-trip layout with seven fractional digits, in UTC.
fn sqlite_timestamp(ts: &DateTime<Utc>) -> String {
    let ticks = (ts.timestamp_subsec_nanos() / 100).min(9_999_999);
    format!("{}.{ticks:07}Z", ts.format("%Y-%m-%dT%H:%M:%S"))
}

fn mysql_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn sqlite_table_info(table: &str) -> String {
    format!("PRAGMA table_info({table})")
}

fn mysql_table_info(table: &str) -> String {
    let table = table.replace('\'', "''");
    format!(
        "SELECT COLUMN_NAME, COLUMN_TYPE, IS_NULLABLE, COLUMN_DEFAULT, COLUMN_KEY, EXTRA \
         FROM INFORMATION_SCHEMA.COLUMNS \
         WHERE TABLE_NAME = '{table}' AND TABLE_SCHEMA = DATABASE() \
         ORDER BY ORDINAL_POSITION"
    )
}

fn generic_alter_type(table: &str, column: &str, sql_type: &str) -> String {
    format!("ALTER TABLE {table} ALTER COLUMN {column} TYPE {sql_type};")
}

fn mysql_alter_type(table: &str, column: &str, sql_type: &str) -> String {
    format!("ALTER TABLE {table} MODIFY COLUMN {column} {sql_type};")
}

const MYSQL_INTEGER_TYPES: &[&str] = &[
    "tinyint",
    "smallint",
    "mediumint",
    "int",
    "integer",
    "bigint",
];

/// Older servers report integer display widths (`int(11)`); they carry no
/// type information and are ignored.
fn mysql_types_match(live: &str, expected: &str) -> bool {
    if live.eq_ignore_ascii_case(expected) {
        return true;
    }
    let Some((base, rest)) = live.split_once('(') else {
        return false;
    };
    let Some(width) = rest.strip_suffix(')') else {
        return false;
    };
    !width.is_empty()
        && width.bytes().all(|b| b.is_ascii_digit())
        && base.eq_ignore_ascii_case(expected)
        && MYSQL_INTEGER_TYPES
            .iter()
            .any(|t| t.eq_ignore_ascii_case(base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_type_map() {
        assert_eq!(Dialect::Sqlite.type_name(SemanticType::Int32), Some("INTEGER"));
        assert_eq!(Dialect::Sqlite.type_name(SemanticType::Bool), Some("BOOLEAN"));
        assert_eq!(Dialect::Sqlite.type_name(SemanticType::Timestamp), Some("TEXT"));
        assert_eq!(Dialect::MySql.type_name(SemanticType::Text), Some("VARCHAR(255)"));
        assert_eq!(Dialect::MySql.type_name(SemanticType::Bool), Some("TINYINT(1)"));
        assert_eq!(Dialect::MySql.type_name(SemanticType::Float64), Some("DOUBLE"));
        assert_eq!(Dialect::MySql.type_name(SemanticType::Int64), None);
    }

    #[test]
    fn test_timestamp_layouts() {
        let ts = Utc.timestamp_opt(1_704_067_200, 123_456_789).unwrap();
        assert_eq!(
            Dialect::Sqlite.format_timestamp(&ts),
            "2024-01-01T00:00:00.1234567Z"
        );
        assert_eq!(Dialect::MySql.format_timestamp(&ts), "2024-01-01 00:00:00");
    }

    #[test]
    fn test_table_info_queries() {
        assert_eq!(
            Dialect::Sqlite.table_info_query("Posts"),
            "PRAGMA table_info(Posts)"
        );
        let mysql = Dialect::MySql.table_info_query("Posts");
        assert!(mysql.starts_with("SELECT COLUMN_NAME, COLUMN_TYPE"));
        assert!(mysql.contains("FROM INFORMATION_SCHEMA.COLUMNS"));
        assert!(mysql.contains("WHERE TABLE_NAME = 'Posts'"));
    }

    #[test]
    fn test_statement_tails() {
        let mut sql = String::from("DELETE FROM Posts WHERE id = '1';");
        Dialect::Sqlite.rules().delete_tail.apply(&mut sql);
        assert_eq!(sql, "DELETE FROM Posts WHERE id = '1' RETURNING *;");

        let mut sql = String::from("DELETE FROM Posts WHERE id = '1';");
        Dialect::MySql.rules().delete_tail.apply(&mut sql);
        assert_eq!(sql, "DELETE FROM Posts WHERE id = '1'; SELECT ROW_COUNT();");
    }

    #[test]
    fn test_live_type_matching() {
        assert!(Dialect::Sqlite.live_type_matches("integer", "INTEGER"));
        assert!(!Dialect::Sqlite.live_type_matches("INT", "INTEGER"));
        assert!(Dialect::MySql.live_type_matches("varchar(255)", "VARCHAR(255)"));
        assert!(Dialect::MySql.live_type_matches("int(11)", "INT"));
        assert!(Dialect::MySql.live_type_matches("tinyint(1)", "TINYINT(1)"));
        assert!(!Dialect::MySql.live_type_matches("tinyint(4)", "TINYINT(1)"));
        assert!(!Dialect::MySql.live_type_matches("varchar(100)", "VARCHAR(255)"));
    }

    #[test]
    fn test_dialect_serde_names() {
        let d: Dialect = serde_json::from_str("\"mysql\"").unwrap();
        assert_eq!(d, Dialect::MySql);
        assert_eq!(Dialect::Sqlite.to_string(), "sqlite");
    }
}
