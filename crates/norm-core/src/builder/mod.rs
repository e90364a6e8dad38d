//! Dialect-aware SQL synthesis.
//!
//! [`SqlBuilder`] turns an [`EntityDescriptor`] plus inputs into
//! [`SqlPayload`]s. Every builder is a pure function of the dialect, the
//! descriptor and its arguments; the dialect-specific parts come from
//! [`DialectRules`](crate::dialect::DialectRules).

pub mod payload;
pub mod predicate;
pub mod value;

pub use payload::SqlPayload;
pub use predicate::{Column, CompareOp, Expr, Predicate, compile};
pub use value::{RowMap, SqlValue, ToSqlValue};

use crate::dialect::Dialect;
use crate::error::{CoreError, Result};
use crate::schema::{ColumnDescriptor, Entity, EntityDescriptor};

/// Builds SQL payloads for one dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlBuilder {
    dialect: Dialect,
}

impl SqlBuilder {
    /// Creates a builder for `dialect`.
    #[must_use]
    pub const fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// The target dialect.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Column type for `column` in this dialect.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnsupportedSemanticType`] if the dialect has no
    /// mapping for the column's semantic type.
    pub fn column_type(&self, column: &ColumnDescriptor) -> Result<&'static str> {
        self.dialect
            .type_name(column.semantic)
            .ok_or_else(|| CoreError::UnsupportedSemanticType {
                column: column.name.to_string(),
                semantic: column.semantic,
                dialect: self.dialect,
            })
    }

    /// `CREATE TABLE IF NOT EXISTS N (col type [PRIMARY KEY [AUTOINCREMENT]], …);`
    ///
    /// # Errors
    ///
    /// Fails on an empty table name or an unmappable column type.
    pub fn create_collection(&self, descriptor: &EntityDescriptor) -> Result<SqlPayload> {
        let table = table_of(descriptor)?;
        let columns = descriptor
            .columns()
            .iter()
            .map(|column| self.column_definition(column))
            .collect::<Result<Vec<_>>>()?;
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {table} ({});",
            columns.join(", ")
        );
        Ok(self.payload(table, sql))
    }

    fn column_definition(&self, column: &ColumnDescriptor) -> Result<String> {
        let mut sql = format!("{} {}", column.name, self.column_type(column)?);
        if column.primary_key {
            sql.push_str(" PRIMARY KEY");
            if column.auto_increment {
                sql.push(' ');
                sql.push_str(self.dialect.rules().autoincrement_keyword);
            }
        }
        Ok(sql)
    }

    /// Live schema introspection query.
    ///
    /// # Errors
    ///
    /// Fails on an empty table name.
    pub fn table_info(&self, descriptor: &EntityDescriptor) -> Result<SqlPayload> {
        let table = table_of(descriptor)?;
        Ok(self.payload(table, self.dialect.table_info_query(table)))
    }

    /// `INSERT INTO N (cols) VALUES (literals);` followed by the dialect's
    /// identity trailer. The primary key is left out.
    ///
    /// # Errors
    ///
    /// Fails on an empty table name.
    pub fn insert<T: Entity>(
        &self,
        descriptor: &EntityDescriptor,
        record: &T,
    ) -> Result<SqlPayload> {
        let table = table_of(descriptor)?;
        let (names, literals): (Vec<_>, Vec<_>) = descriptor
            .columns()
            .iter()
            .zip(record.column_values())
            .filter(|(column, _)| !column.primary_key)
            .map(|(column, value)| (column.name, value.to_sql_literal(self.dialect)))
            .unzip();

        let rules = self.dialect.rules();
        let mut sql = if names.is_empty() {
            format!("INSERT INTO {table} {};", rules.empty_insert)
        } else {
            format!(
                "INSERT INTO {table} ({}) VALUES ({});",
                names.join(", "),
                literals.join(", ")
            )
        };
        sql.push_str(rules.insert_trailer);
        Ok(self.payload(table, sql))
    }

    /// `DELETE FROM N WHERE pk = 'value';` with the dialect's delete tail.
    ///
    /// # Errors
    ///
    /// Fails on an empty table name or when the entity has no primary key.
    pub fn delete<T: Entity>(
        &self,
        descriptor: &EntityDescriptor,
        record: &T,
    ) -> Result<SqlPayload> {
        let table = table_of(descriptor)?;
        let (index, pk) = descriptor
            .primary_key_index()
            .zip(descriptor.primary_key())
            .ok_or(CoreError::MissingPrimaryKey(descriptor.type_name()))?;
        let value = record
            .column_values()
            .into_iter()
            .nth(index)
            .unwrap_or_default();

        let mut payload = self.payload(
            table,
            format!(
                "DELETE FROM {table} WHERE {} = {};",
                pk.name,
                value.to_quoted_literal(self.dialect)
            ),
        );
        self.dialect.rules().delete_tail.apply(payload.sql_mut());
        Ok(payload)
    }

    /// Deletes every row, observably yielding a row per removal.
    ///
    /// # Errors
    ///
    /// Fails on an empty table name.
    pub fn truncate(&self, descriptor: &EntityDescriptor) -> Result<SqlPayload> {
        let table = table_of(descriptor)?;
        let mut payload = self.payload(table, format!("DELETE FROM {table};"));
        self.dialect.rules().truncate_tail.apply(payload.sql_mut());
        Ok(payload)
    }

    /// `SELECT * FROM N WHERE <predicate>;`
    ///
    /// # Errors
    ///
    /// Fails on an empty table name or an unsupported predicate node.
    pub fn select<T: Entity>(
        &self,
        descriptor: &EntityDescriptor,
        predicate: &Predicate<T>,
    ) -> Result<SqlPayload> {
        let table = table_of(descriptor)?;
        let clause = compile(predicate.expr(), descriptor, self.dialect)?;
        Ok(self.payload(table, format!("SELECT * FROM {table} WHERE {clause};")))
    }

    /// In-place column type change.
    #[must_use]
    pub fn alter_type(&self, table: &str, column: &str, sql_type: &str) -> SqlPayload {
        self.payload(
            table,
            self.dialect.alter_type_statement(table, column, sql_type),
        )
    }

    /// `ALTER TABLE N ADD COLUMN col type;`
    #[must_use]
    pub fn add_column(&self, table: &str, column: &str, sql_type: &str) -> SqlPayload {
        self.payload(
            table,
            format!("ALTER TABLE {table} ADD COLUMN {column} {sql_type};"),
        )
    }

    /// `ALTER TABLE N DROP COLUMN col;`
    #[must_use]
    pub fn drop_column(&self, table: &str, column: &str) -> SqlPayload {
        self.payload(table, format!("ALTER TABLE {table} DROP COLUMN {column};"))
    }

    fn payload(&self, table: &str, sql: String) -> SqlPayload {
        SqlPayload::new(self.dialect, table, sql)
    }
}

fn table_of(descriptor: &EntityDescriptor) -> Result<&'static str> {
    let table = descriptor.table_name();
    if table.is_empty() {
        return Err(CoreError::MissingCollectionName(descriptor.type_name()));
    }
    Ok(table)
}
