//! Materialized result rows.

use std::sync::Arc;

use norm_core::{RowMap, SqlValue};

/// One result row: values in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<SqlValue>,
}

impl Row {
    pub(crate) fn new(columns: Arc<[String]>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    /// Column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values in column order.
    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of the named column. Names match ignoring ASCII case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .and_then(|i| self.values.get(i))
    }

    /// Value at `index`.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// Converts the row into a name-to-value map.
    #[must_use]
    pub fn into_map(self) -> RowMap {
        self.columns.iter().cloned().zip(self.values).collect()
    }
}

/// Cursor over the rows a statement returned.
#[derive(Debug, Default)]
pub struct Rows {
    rows: std::vec::IntoIter<Row>,
}

impl Rows {
    pub(crate) fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: rows.into_iter(),
        }
    }

    /// Returns `true` if no rows remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.len() == 0
    }
}

impl Iterator for Rows {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.rows.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl ExactSizeIterator for Rows {}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Row {
        Row::new(
            Arc::from(vec![String::from("id"), String::from("Title")]),
            vec![SqlValue::Int(1), SqlValue::Text("a".into())],
        )
    }

    #[test]
    fn test_get_ignores_case() {
        let row = row();
        assert_eq!(row.get("title"), Some(&SqlValue::Text("a".into())));
        assert_eq!(row.get("ID"), Some(&SqlValue::Int(1)));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.get_index(1), row.get("Title"));
    }

    #[test]
    fn test_into_map() {
        let map = row().into_map();
        assert_eq!(map.get("id"), Some(&SqlValue::Int(1)));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_cursor() {
        let mut rows = Rows::new(vec![row(), row()]);
        assert!(!rows.is_empty());
        assert_eq!(rows.len(), 2);
        rows.next();
        rows.next();
        assert!(rows.is_empty());
        assert!(rows.next().is_none());
    }
}
