//! Entity trait and descriptors.

use std::hash::{Hash, Hasher};

use chrono::SubsecRound;

use super::field::SemanticType;
use crate::builder::value::SqlValue;
use crate::error::ValueError;

/// Metadata for one column-bearing field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Rust field name.
    pub field: &'static str,
    /// Storage column name.
    pub name: &'static str,
    /// Semantic type tag.
    pub semantic: SemanticType,
    /// Whether the column accepts `NULL`.
    pub nullable: bool,
    /// Whether this is the primary key.
    pub primary_key: bool,
    /// Whether the engine assigns the key. Only meaningful on primary keys.
    pub auto_increment: bool,
}

impl ColumnDescriptor {
    /// Creates a plain, non-key column descriptor.
    #[must_use]
    pub const fn new(field: &'static str, name: &'static str, semantic: SemanticType) -> Self {
        Self {
            field,
            name,
            semantic,
            nullable: false,
            primary_key: false,
            auto_increment: false,
        }
    }

    /// Marks the column nullable.
    #[must_use]
    pub const fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Marks the column as primary key.
    #[must_use]
    pub const fn primary_key(mut self, auto_increment: bool) -> Self {
        self.primary_key = true;
        self.auto_increment = auto_increment;
        self
    }
}

/// A field referring to another entity through a join column.
///
/// References are recorded but never resolved or emitted as columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceDescriptor {
    /// Rust field name.
    pub field: &'static str,
    /// Name of the join column.
    pub column: &'static str,
}

/// Memoized metadata of an entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescriptor {
    type_name: &'static str,
    collection_name: Option<&'static str>,
    columns: Vec<ColumnDescriptor>,
    primary_key: Option<usize>,
    references: Vec<ReferenceDescriptor>,
}

impl EntityDescriptor {
    /// Creates a descriptor.
    ///
    /// The table name is `collection_name` when given, else `type_name`.
    /// The primary key is the first column flagged as such.
    #[must_use]
    pub fn new(
        type_name: &'static str,
        collection_name: Option<&'static str>,
        columns: Vec<ColumnDescriptor>,
        references: Vec<ReferenceDescriptor>,
    ) -> Self {
        let primary_key = columns.iter().position(|c| c.primary_key);
        Self {
            type_name,
            collection_name,
            columns,
            primary_key,
            references,
        }
    }

    /// Simple name of the Rust type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Value of the collection-name annotation, if any.
    #[must_use]
    pub const fn collection_name(&self) -> Option<&'static str> {
        self.collection_name
    }

    /// Table name.
    #[must_use]
    pub fn table_name(&self) -> &'static str {
        self.collection_name.unwrap_or(self.type_name)
    }

    /// Columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Position of the primary key among the columns.
    #[must_use]
    pub const fn primary_key_index(&self) -> Option<usize> {
        self.primary_key
    }

    /// The primary-key column.
    #[must_use]
    pub fn primary_key(&self) -> Option<&ColumnDescriptor> {
        self.primary_key.map(|i| &self.columns[i])
    }

    /// Reference fields.
    #[must_use]
    pub fn references(&self) -> &[ReferenceDescriptor] {
        &self.references
    }

    /// Finds a column by Rust field name.
    #[must_use]
    pub fn column_by_field(&self, field: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.field == field)
    }

    /// Finds a column position by storage name, ignoring ASCII case.
    #[must_use]
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// A record type mapped to one collection.
///
/// Usually derived with `#[derive(Entity)]`; can be implemented by hand.
pub trait Entity: Default + 'static {
    /// Builds the descriptor. Called once per registry.
    fn describe() -> EntityDescriptor;

    /// Values of the column-bearing fields, in column order.
    fn column_values(&self) -> Vec<SqlValue>;

    /// Assigns the value of the column at `index`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValueError`] if the value cannot be converted to the
    /// field's type or `index` is not a column.
    fn assign(&mut self, index: usize, value: SqlValue) -> Result<(), ValueError>;
}

/// Record equality: every column-bearing field compares equal, timestamps at
/// second granularity.
pub fn records_equal<T: Entity>(a: &T, b: &T) -> bool {
    let left = a.column_values();
    let right = b.column_values();
    left.len() == right.len() && left.iter().zip(&right).all(|(l, r)| l.record_eq(r))
}

/// Hash consistent with [`records_equal`].
pub fn hash_record<T: Entity, H: Hasher>(record: &T, state: &mut H) {
    for value in record.column_values() {
        hash_value(&value, state);
    }
}

fn hash_value<H: Hasher>(value: &SqlValue, state: &mut H) {
    match value {
        SqlValue::Null => {}
        SqlValue::Bool(b) => b.hash(state),
        SqlValue::Int(n) => n.hash(state),
        SqlValue::Float(f) => {
            // 0.0 == -0.0
            let bits = if *f == 0.0 { 0 } else { f.to_bits() };
            bits.hash(state);
        }
        SqlValue::Text(s) => s.hash(state),
        SqlValue::Timestamp(ts) => ts.trunc_subsecs(0).to_rfc3339().hash(state),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;

    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::schema::FieldValue;

    #[derive(Debug, Default)]
    struct Note {
        id: i32,
        body: String,
        at: DateTime<Utc>,
    }

    impl Entity for Note {
        fn describe() -> EntityDescriptor {
            EntityDescriptor::new(
                "Note",
                None,
                vec![
                    ColumnDescriptor::new("id", "id", SemanticType::Int32).primary_key(true),
                    ColumnDescriptor::new("body", "body", SemanticType::Text),
                    ColumnDescriptor::new("at", "at", SemanticType::Timestamp),
                ],
                vec![],
            )
        }

        fn column_values(&self) -> Vec<SqlValue> {
            vec![self.id.to_value(), self.body.to_value(), self.at.to_value()]
        }

        fn assign(&mut self, index: usize, value: SqlValue) -> Result<(), ValueError> {
            match index {
                0 => self.id = FieldValue::from_value(value)?,
                1 => self.body = FieldValue::from_value(value)?,
                2 => self.at = FieldValue::from_value(value)?,
                other => return Err(ValueError::UnknownColumn(other)),
            }
            Ok(())
        }
    }

    fn hash_of(note: &Note) -> u64 {
        let mut hasher = DefaultHasher::new();
        hash_record(note, &mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_descriptor_defaults_table_name() {
        let d = Note::describe();
        assert_eq!(d.table_name(), "Note");
        assert_eq!(d.primary_key().map(|c| c.name), Some("id"));
        assert_eq!(d.primary_key_index(), Some(0));
        assert_eq!(d.position_of("BODY"), Some(1));
        assert!(d.column_by_field("missing").is_none());
    }

    #[test]
    fn test_equality_ignores_subseconds() {
        let a = Note {
            id: 1,
            body: "x".into(),
            at: Utc.timestamp_opt(1_700_000_000, 100).unwrap(),
        };
        let b = Note {
            id: 1,
            body: "x".into(),
            at: Utc.timestamp_opt(1_700_000_000, 999_000_000).unwrap(),
        };
        assert!(records_equal(&a, &b));
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_inequality_on_any_field() {
        let a = Note {
            id: 1,
            body: "x".into(),
            at: DateTime::default(),
        };
        let b = Note {
            id: 1,
            body: "y".into(),
            at: DateTime::default(),
        };
        assert!(!records_equal(&a, &b));
    }

    #[test]
    fn test_assign_rejects_unknown_index() {
        let mut note = Note::default();
        assert_eq!(
            note.assign(9, SqlValue::Null),
            Err(ValueError::UnknownColumn(9))
        );
        note.assign(1, SqlValue::Text("hi".into())).unwrap();
        assert_eq!(note.body, "hi");
    }
}
