//! Dialect-tagged SQL text.

use std::fmt;

use crate::dialect::Dialect;

/// SQL text produced by the builder, tagged with its table and dialect.
///
/// The text may hold several `;`-separated statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlPayload {
    sql: String,
    table: String,
    dialect: Dialect,
}

impl SqlPayload {
    /// Creates a payload.
    pub fn new(dialect: Dialect, table: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            table: table.into(),
            dialect,
        }
    }

    /// The SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Table the payload targets.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Dialect the payload was built for.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Appends raw text.
    pub fn push_str(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    /// Mutable access to the text, for dialect overlays.
    pub(crate) fn sql_mut(&mut self) -> &mut String {
        &mut self.sql
    }

    /// Consumes the payload, returning the SQL text.
    #[must_use]
    pub fn into_sql(self) -> String {
        self.sql
    }
}

impl fmt::Display for SqlPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

impl AsRef<str> for SqlPayload {
    fn as_ref(&self) -> &str {
        &self.sql
    }
}
