use std::collections::HashMap;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::types::RowValues;

/// A row from a database query result
///
/// Column names and the name-to-index map are shared with every other row of the same
/// result set.
#[derive(Debug, Clone)]
pub struct CustomDbRow {
    /// The column names for this row (shared across all rows in a result set)
    pub column_names: Arc<Vec<String>>,
    /// The values for this row
    pub rows: Vec<RowValues>,
    #[doc(hidden)]
    pub(crate) column_index: Arc<HashMap<String, usize>>,
}

pub(crate) fn index_columns(column_names: &[String]) -> Arc<HashMap<String, usize>> {
    let mut index = HashMap::with_capacity(column_names.len());
    for (i, name) in column_names.iter().enumerate() {
        // Duplicate names resolve to the first column, as a linear search would.
        index.entry(name.clone()).or_insert(i);
    }
    Arc::new(index)
}

impl CustomDbRow {
    /// Create a standalone row, building its own column index.
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, rows: Vec<RowValues>) -> Self {
        let column_index = index_columns(&column_names);
        Self {
            column_names,
            rows,
            column_index,
        }
    }

    /// Get the index of a column by name
    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        self.column_index.get(column_name).copied()
    }

    /// Get a value from the row by column name
    ///
    /// Returns `None` if the column wasn't found.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        self.get_column_index(column_name)
            .and_then(|idx| self.rows.get(idx))
    }

    /// Get a value from the row by column index
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.rows.get(index)
    }
}

/// Serializes as an ordered map of column name to value.
impl Serialize for CustomDbRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.rows.len()))?;
        for (name, value) in self.column_names.iter().zip(&self.rows) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name_and_index() {
        let names = Arc::new(vec!["id".to_string(), "name".to_string()]);
        let row = CustomDbRow::new(names, vec![RowValues::Int(7), RowValues::Text("x".into())]);
        assert_eq!(row.get("id"), Some(&RowValues::Int(7)));
        assert_eq!(row.get("name").and_then(RowValues::as_text), Some("x"));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.get_by_index(1), Some(&RowValues::Text("x".into())));
        assert_eq!(row.get_by_index(2), None);
    }

    #[test]
    fn duplicate_names_resolve_to_first_column() {
        let names = Arc::new(vec!["v".to_string(), "v".to_string()]);
        let row = CustomDbRow::new(names, vec![RowValues::Int(1), RowValues::Int(2)]);
        assert_eq!(row.get("v"), Some(&RowValues::Int(1)));
    }
}
