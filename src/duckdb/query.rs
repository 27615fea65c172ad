use crate::error::DuckDbMiddlewareError;
use crate::results::ResultSet;

use super::rows::DuckDbRows;

/// Drain `rows` into a [`ResultSet`]. The column-name list is shared by every row.
///
/// The cursor is left open at end-of-data; closing it stays with the caller.
///
/// # Errors
///
/// Returns `Misuse` if `rows` is closed, `InvalidDataType` if a column cannot be decoded.
pub fn build_result_set(rows: &mut DuckDbRows) -> Result<ResultSet, DuckDbMiddlewareError> {
    let column_names = rows.shared_columns();
    let mut result_set = ResultSet::with_capacity(rows.row_count());
    result_set.set_column_names(column_names);

    let mut row_values = Vec::with_capacity(rows.column_count());
    while rows.next_into(&mut row_values)? {
        result_set.add_row_values(std::mem::take(&mut row_values));
    }
    Ok(result_set)
}
