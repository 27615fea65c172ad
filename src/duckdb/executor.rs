use tracing::debug;

use crate::error::DuckDbMiddlewareError;
use crate::results::ResultSet;
use crate::types::RowValues;

use super::connection::DuckDbConnection;
use super::query::build_result_set;

/// Execute a batch of SQL statements with no parameters.
///
/// # Errors
///
/// Returns the engine's error text as `ExecutionError`.
pub fn execute_batch(conn: &DuckDbConnection, query: &str) -> Result<(), DuckDbMiddlewareError> {
    conn.execute_batch(query)
}

/// Execute a SELECT and materialize every row.
///
/// Parameters go through typed binds on a prepared statement. If any of them has no
/// typed-bind rule, the whole parameter list is interpolated into the text instead.
///
/// # Errors
///
/// Returns the engine's error text, a binder error, or `Skip` when neither path can
/// carry the parameters.
pub fn execute_select(
    conn: &DuckDbConnection,
    query: &str,
    params: &[RowValues],
) -> Result<ResultSet, DuckDbMiddlewareError> {
    let stmt = conn.prepare(query)?;
    let outcome = stmt.query(params).and_then(|mut rows| {
        let set = build_result_set(&mut rows);
        rows.close()?;
        set
    });
    stmt.close()?;

    match outcome {
        Err(e) if e.is_skip() => {
            debug!(reason = %e, "typed binds unavailable; interpolating select");
            let mut rows = conn.query(query, params)?;
            let set = build_result_set(&mut rows);
            rows.close()?;
            set
        }
        other => other,
    }
}

/// Execute a DML statement and return the number of rows changed.
///
/// Same fallback rule as [`execute_select`].
///
/// # Errors
///
/// Returns the engine's error text, a binder error, or `Skip` when neither path can
/// carry the parameters.
pub fn execute_dml(
    conn: &DuckDbConnection,
    query: &str,
    params: &[RowValues],
) -> Result<usize, DuckDbMiddlewareError> {
    let stmt = conn.prepare(query)?;
    let outcome = stmt.execute(params);
    stmt.close()?;

    match outcome {
        Err(e) if e.is_skip() => {
            debug!(reason = %e, "typed binds unavailable; interpolating dml");
            conn.execute(query, params)
        }
        other => other,
    }
}
