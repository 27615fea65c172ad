use std::sync::Arc;

use tracing::debug;

use crate::error::DuckDbMiddlewareError;
use crate::types::{NativeType, RowValues, ScanType};

use super::native::NativeResult;
use super::prepared::StatementShared;

/// Forward-only cursor over a materialized, column-major DuckDB result.
///
/// Rows produced by [`DuckDbStatement::query`](super::DuckDbStatement::query) keep the
/// statement marked busy until they are closed or dropped. Rows from the direct path
/// stand alone.
pub struct DuckDbRows {
    result: Option<NativeResult>,
    statement: Option<Arc<StatementShared>>,
    columns: Arc<Vec<String>>,
    types: Vec<NativeType>,
    row_count: usize,
    cursor: usize,
    /// Set once the iterator has yielded an error; iteration is over after that.
    failed: bool,
}

impl std::fmt::Debug for DuckDbRows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbRows")
            .field("result", &self.result.as_ref().map(|_| "<duckdb_result>"))
            .field("columns", &self.columns)
            .field("types", &self.types)
            .field("row_count", &self.row_count)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

impl DuckDbRows {
    pub(crate) fn new(mut result: NativeResult, statement: Option<Arc<StatementShared>>) -> Self {
        let column_count = result.column_count();
        let columns = (0..column_count).map(|i| result.column_name(i)).collect();
        let types = (0..column_count).map(|i| result.column_type(i)).collect();
        let row_count = result.row_count();
        Self {
            result: Some(result),
            statement,
            columns: Arc::new(columns),
            types,
            row_count,
            cursor: 0,
            failed: false,
        }
    }

    fn ensure_open(&self, op: &str) -> Result<(), DuckDbMiddlewareError> {
        if self.result.is_none() {
            return Err(DuckDbMiddlewareError::misuse(format!("{op} of closed rows")));
        }
        Ok(())
    }

    /// Column names in engine order.
    ///
    /// # Errors
    ///
    /// Returns [`DuckDbMiddlewareError::Misuse`] on closed rows.
    pub fn columns(&self) -> Result<&[String], DuckDbMiddlewareError> {
        self.ensure_open("Columns")?;
        Ok(self.columns.as_slice())
    }

    pub(crate) fn shared_columns(&self) -> Arc<Vec<String>> {
        Arc::clone(&self.columns)
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Offset of the next row to be read.
    #[must_use]
    pub fn position(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.result.is_none()
    }

    #[must_use]
    pub fn column_native_type(&self, index: usize) -> Option<NativeType> {
        self.types.get(index).copied()
    }

    /// Host type for generic scanning; `None` for unknown columns or types.
    #[must_use]
    pub fn column_scan_type(&self, index: usize) -> Option<ScanType> {
        self.column_native_type(index).and_then(NativeType::scan_type)
    }

    /// Engine type name; empty for unknown columns or types.
    #[must_use]
    pub fn column_type_name(&self, index: usize) -> &'static str {
        self.column_native_type(index)
            .map_or("", NativeType::database_type_name)
    }

    /// Decode the row at the cursor into `dst` and advance by one.
    ///
    /// Returns `Ok(false)` at end-of-data without moving the cursor. On a decode error
    /// the cursor stays on the failing row.
    ///
    /// # Errors
    ///
    /// [`DuckDbMiddlewareError::Misuse`] on closed rows,
    /// [`DuckDbMiddlewareError::InvalidDataType`] for a column type this adapter cannot
    /// decode.
    pub fn next_into(&mut self, dst: &mut Vec<RowValues>) -> Result<bool, DuckDbMiddlewareError> {
        self.ensure_open("Next")?;
        if self.cursor >= self.row_count {
            return Ok(false);
        }
        let Some(result) = self.result.as_mut() else {
            return Ok(false);
        };

        let row = self.cursor;
        dst.clear();
        dst.reserve(self.types.len());
        for (col, ty) in self.types.iter().enumerate() {
            dst.push(decode_cell(result, col, *ty, row)?);
        }

        self.cursor += 1;
        Ok(true)
    }

    /// Owned-row variant of [`next_into`](Self::next_into).
    ///
    /// # Errors
    ///
    /// Same as [`next_into`](Self::next_into).
    pub fn next_row(&mut self) -> Result<Option<Vec<RowValues>>, DuckDbMiddlewareError> {
        let mut row = Vec::with_capacity(self.types.len());
        Ok(self.next_into(&mut row)?.then_some(row))
    }

    /// Release the native result and free the owning statement for reuse.
    ///
    /// # Errors
    ///
    /// Returns [`DuckDbMiddlewareError::Misuse`] if the rows were already closed.
    pub fn close(&mut self) -> Result<(), DuckDbMiddlewareError> {
        let Some(result) = self.result.take() else {
            return Err(DuckDbMiddlewareError::misuse(
                "Close of already closed rows",
            ));
        };
        drop(result);
        if let Some(statement) = self.statement.take() {
            statement.release_rows();
        }
        Ok(())
    }
}

/// Yields rows until end-of-data or the first error, whichever comes first.
impl Iterator for DuckDbRows {
    type Item = Result<Vec<RowValues>, DuckDbMiddlewareError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_closed() || self.failed {
            return None;
        }
        let item = self.next_row().transpose();
        self.failed = matches!(item, Some(Err(_)));
        item
    }
}

impl Drop for DuckDbRows {
    fn drop(&mut self) {
        if self.result.is_some() {
            debug!(cursor = self.cursor, rows = self.row_count, "rows dropped without close");
            let _ = self.close();
        }
    }
}

fn decode_cell(
    result: &mut NativeResult,
    col: usize,
    ty: NativeType,
    row: usize,
) -> Result<RowValues, DuckDbMiddlewareError> {
    if let NativeType::Unsupported(native_type) = ty {
        return Err(DuckDbMiddlewareError::InvalidDataType {
            column: col,
            native_type,
        });
    }
    if result.is_null(col, row) {
        return Ok(RowValues::Null);
    }

    let value = match ty {
        NativeType::Boolean => RowValues::Bool(result.bool_cell(col, row)?),
        NativeType::TinyInt => RowValues::TinyInt(result.cell::<i8>(col, row)?),
        NativeType::SmallInt => RowValues::SmallInt(result.cell::<i16>(col, row)?),
        NativeType::Integer => RowValues::Int(result.cell::<i32>(col, row)?),
        NativeType::BigInt => RowValues::BigInt(result.cell::<i64>(col, row)?),
        NativeType::Float => RowValues::Float(result.cell::<f32>(col, row)?),
        NativeType::Double => RowValues::Double(result.cell::<f64>(col, row)?),
        NativeType::Date => RowValues::Timestamp(result.date_cell(col, row)?),
        NativeType::Timestamp => RowValues::Timestamp(result.timestamp_cell(col, row)?),
        NativeType::Varchar => RowValues::Text(result.varchar_cell(col, row)?),
        NativeType::Unsupported(native_type) => {
            return Err(DuckDbMiddlewareError::InvalidDataType {
                column: col,
                native_type,
            });
        }
    };
    Ok(value)
}
