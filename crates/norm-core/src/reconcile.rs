//! Schema reconciliation planning.
//!
//! Compares the declared columns of an entity with the columns the live
//! database reports and produces the DDL that aligns them. Planning is pure;
//! executing the plan is the caller's job.
//!
//! Statements come out in this order:
//!
//! 1. for each live column, in live order: a `DROP COLUMN` when no declared
//!    column has its name, or a type fix when its type differs
//! 2. an `ADD COLUMN` for each declared column the live table lacks, in
//!    declaration order
//!
//! Dialects that cannot change a column type in place get a drop followed by
//! an add, which discards the column's data.

use crate::builder::{RowMap, SqlBuilder, SqlPayload, SqlValue};
use crate::error::Result;
use crate::schema::EntityDescriptor;

/// A column as reported by the live database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveColumn {
    /// Column name.
    pub name: String,
    /// Column type as the engine spells it.
    pub sql_type: String,
}

impl LiveColumn {
    /// Creates a live column.
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
        }
    }

    /// Reads a table-info row.
    ///
    /// Accepts both the `name`/`type` keys of `PRAGMA table_info` and the
    /// `COLUMN_NAME`/`COLUMN_TYPE` keys of `INFORMATION_SCHEMA.COLUMNS`, in
    /// any case. Returns `None` when the row has no name.
    #[must_use]
    pub fn from_row(row: &RowMap) -> Option<Self> {
        let name = lookup(row, &["name", "column_name"])?;
        let sql_type = lookup(row, &["type", "column_type"]).unwrap_or_default();
        Some(Self { name, sql_type })
    }

    /// Reads every row of a table-info result.
    #[must_use]
    pub fn from_rows(rows: &[RowMap]) -> Vec<Self> {
        rows.iter().filter_map(Self::from_row).collect()
    }
}

fn lookup(row: &RowMap, keys: &[&str]) -> Option<String> {
    row.iter()
        .find(|(key, _)| keys.iter().any(|k| key.eq_ignore_ascii_case(k)))
        .and_then(|(_, value)| match value {
            SqlValue::Null => None,
            other => Some(other.to_string()),
        })
}

/// Plans the statements that bring `live` in line with `descriptor`.
///
/// Returns an empty plan when the schemas already agree, so running the
/// plan and planning again yields nothing.
///
/// # Errors
///
/// Fails on an empty table name or an unmappable column type.
pub fn plan(
    builder: &SqlBuilder,
    descriptor: &EntityDescriptor,
    live: &[LiveColumn],
) -> Result<Vec<SqlPayload>> {
    let table = descriptor.table_name();
    let dialect = builder.dialect();
    let mut statements = Vec::new();

    for column in live {
        let Some(index) = descriptor.position_of(&column.name) else {
            statements.push(builder.drop_column(table, &column.name));
            continue;
        };
        let expected = builder.column_type(&descriptor.columns()[index])?;
        if dialect.live_type_matches(&column.sql_type, expected) {
            continue;
        }
        if dialect.rules().alter_column_type {
            statements.push(builder.alter_type(table, &column.name, expected));
        } else {
            statements.push(builder.drop_column(table, &column.name));
            statements.push(builder.add_column(table, &column.name, expected));
        }
    }

    for column in descriptor.columns() {
        let present = live.iter().any(|l| l.name.eq_ignore_ascii_case(column.name));
        if !present {
            statements.push(builder.add_column(table, column.name, builder.column_type(column)?));
        }
    }

    Ok(statements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::schema::{ColumnDescriptor, SemanticType};

    fn posts(columns: Vec<ColumnDescriptor>) -> EntityDescriptor {
        EntityDescriptor::new("Post", Some("Posts"), columns, vec![])
    }

    fn declared() -> EntityDescriptor {
        posts(vec![
            ColumnDescriptor::new("id", "id", SemanticType::Int32).primary_key(true),
            ColumnDescriptor::new("title", "title", SemanticType::Text),
            ColumnDescriptor::new("description", "description", SemanticType::Text),
        ])
    }

    fn sqls(plan: &[SqlPayload]) -> Vec<&str> {
        plan.iter().map(SqlPayload::sql).collect()
    }

    #[test]
    fn test_adds_missing_column() {
        let live = [LiveColumn::new("id", "INTEGER"), LiveColumn::new("title", "TEXT")];
        let plan = plan(&SqlBuilder::new(Dialect::Sqlite), &declared(), &live).unwrap();
        assert_eq!(
            sqls(&plan),
            ["ALTER TABLE Posts ADD COLUMN description TEXT;"]
        );
    }

    #[test]
    fn test_matching_schema_plans_nothing() {
        let live = [
            LiveColumn::new("id", "integer"),
            LiveColumn::new("title", "text"),
            LiveColumn::new("description", "TEXT"),
        ];
        let plan = plan(&SqlBuilder::new(Dialect::Sqlite), &declared(), &live).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_order_drop_alter_add() {
        let live = [
            LiveColumn::new("id", "INTEGER"),
            LiveColumn::new("legacy", "TEXT"),
            LiveColumn::new("title", "INTEGER"),
        ];
        let sqlite = plan(&SqlBuilder::new(Dialect::Sqlite), &declared(), &live).unwrap();
        assert_eq!(
            sqls(&sqlite),
            [
                "ALTER TABLE Posts DROP COLUMN legacy;",
                "ALTER TABLE Posts DROP COLUMN title;",
                "ALTER TABLE Posts ADD COLUMN title TEXT;",
                "ALTER TABLE Posts ADD COLUMN description TEXT;",
            ]
        );

        let live = [
            LiveColumn::new("id", "int(11)"),
            LiveColumn::new("legacy", "text"),
            LiveColumn::new("title", "int"),
        ];
        let mysql = plan(&SqlBuilder::new(Dialect::MySql), &declared(), &live).unwrap();
        assert_eq!(
            sqls(&mysql),
            [
                "ALTER TABLE Posts DROP COLUMN legacy;",
                "ALTER TABLE Posts MODIFY COLUMN title VARCHAR(255);",
                "ALTER TABLE Posts ADD COLUMN description VARCHAR(255);",
            ]
        );
    }

    #[test]
    fn test_live_column_from_either_casing() {
        let mut pragma = RowMap::new();
        pragma.insert("cid".into(), SqlValue::Int(0));
        pragma.insert("name".into(), SqlValue::Text("id".into()));
        pragma.insert("type".into(), SqlValue::Text("INTEGER".into()));

        let mut schema = RowMap::new();
        schema.insert("COLUMN_NAME".into(), SqlValue::Text("id".into()));
        schema.insert("COLUMN_TYPE".into(), SqlValue::Text("int".into()));

        let mut nameless = RowMap::new();
        nameless.insert("type".into(), SqlValue::Text("TEXT".into()));

        assert_eq!(
            LiveColumn::from_rows(&[pragma, schema, nameless]),
            vec![LiveColumn::new("id", "INTEGER"), LiveColumn::new("id", "int")]
        );
    }
}
