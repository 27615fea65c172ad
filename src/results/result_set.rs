use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use super::row::{CustomDbRow, index_columns};
use crate::types::RowValues;

/// A result set from a database query
///
/// Holds the materialized rows of a SELECT. Column names and the column index are
/// built once per result set and shared by all of its rows.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultSet {
    /// The rows returned by the query
    pub results: Vec<CustomDbRow>,
    /// Number of rows collected into `results`
    pub rows_affected: usize,
    #[serde(skip)]
    column_names: Option<Arc<Vec<String>>>,
    #[serde(skip)]
    column_index: Option<Arc<HashMap<String, usize>>>,
}

impl ResultSet {
    /// Create a new result set with a known capacity
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            results: Vec::with_capacity(capacity),
            ..ResultSet::default()
        }
    }

    /// Set the column names for this result set (to be shared by all rows)
    pub fn set_column_names(&mut self, column_names: Arc<Vec<String>>) {
        self.column_index = Some(index_columns(&column_names));
        self.column_names = Some(column_names);
    }

    /// Get the column names for this result set
    #[must_use]
    pub fn get_column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Add a row to the result set. Ignored until column names are set.
    pub fn add_row_values(&mut self, row_values: Vec<RowValues>) {
        let (Some(column_names), Some(column_index)) = (&self.column_names, &self.column_index)
        else {
            return;
        };
        self.results.push(CustomDbRow {
            column_names: Arc::clone(column_names),
            rows: row_values,
            column_index: Arc::clone(column_index),
        });
        self.rows_affected += 1;
    }

    /// Add a prebuilt row; its column names are adopted if none are set yet.
    pub fn add_row(&mut self, row: CustomDbRow) {
        if self.column_names.is_none() {
            self.column_names = Some(Arc::clone(&row.column_names));
            self.column_index = Some(Arc::clone(&row.column_index));
        }
        self.results.push(row);
        self.rows_affected += 1;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_share_column_metadata() {
        let mut rs = ResultSet::with_capacity(2);
        rs.set_column_names(Arc::new(vec!["a".into(), "b".into()]));
        rs.add_row_values(vec![RowValues::Int(1), RowValues::Null]);
        rs.add_row_values(vec![RowValues::Int(2), RowValues::Bool(true)]);

        assert_eq!(rs.len(), 2);
        assert_eq!(rs.rows_affected, 2);
        assert!(Arc::ptr_eq(&rs.results[0].column_names, &rs.results[1].column_names));
        assert!(Arc::ptr_eq(&rs.results[0].column_index, &rs.results[1].column_index));
        assert_eq!(rs.results[1].get("b"), Some(&RowValues::Bool(true)));
    }

    #[test]
    fn rows_without_column_names_are_dropped() {
        let mut rs = ResultSet::default();
        rs.add_row_values(vec![RowValues::Int(1)]);
        assert!(rs.is_empty());
    }
}
