use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::error::DuckDbMiddlewareError;
use crate::types::RowValues;

use super::connection::ConnectionShared;
use super::native::NativePrepared;
use super::params::bind_params;
use super::rows::DuckDbRows;

pub(crate) struct StatementState {
    /// `None` once the statement is closed.
    handle: Option<NativePrepared>,
    rows_open: bool,
}

/// State shared between a statement and the rows it hands out.
pub(crate) struct StatementShared {
    state: Mutex<StatementState>,
}

impl StatementShared {
    fn lock(&self) -> MutexGuard<'_, StatementState> {
        match self.state.lock() {
            Ok(guard) => guard,
            // A panic mid-call cannot leave the flags half-written; keep going.
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub(crate) fn release_rows(&self) {
        self.lock().rows_open = false;
    }
}

/// Handle to a prepared DuckDB statement.
///
/// States: open, open with rows (after [`query`](Self::query)), closed. Calls on one
/// statement are serialized by an internal mutex held for the whole call.
pub struct DuckDbStatement {
    connection: Arc<ConnectionShared>,
    shared: Arc<StatementShared>,
    sql: Arc<String>,
}

impl std::fmt::Debug for DuckDbStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbStatement")
            .field("statement", &"<duckdb_prepared_statement>")
            .field("sql", &self.sql)
            .finish()
    }
}

impl DuckDbStatement {
    pub(crate) fn new(connection: Arc<ConnectionShared>, handle: NativePrepared, sql: &str) -> Self {
        Self {
            connection,
            shared: Arc::new(StatementShared {
                state: Mutex::new(StatementState {
                    handle: Some(handle),
                    rows_open: false,
                }),
            }),
            sql: Arc::new(sql.to_owned()),
        }
    }

    /// Lock the state and check it is safe to run: not closed and no open rows.
    fn lock_for_run(&self, op: &str) -> Result<MutexGuard<'_, StatementState>, DuckDbMiddlewareError> {
        let guard = self.shared.lock();
        if guard.handle.is_none() {
            return Err(DuckDbMiddlewareError::misuse(format!("{op} after Close")));
        }
        if guard.rows_open {
            return Err(DuckDbMiddlewareError::misuse(format!("{op} with active Rows")));
        }
        Ok(guard)
    }

    /// Number of `?`/`$n` parameters, read from the live handle. Zero once closed.
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.shared
            .lock()
            .handle
            .as_ref()
            .map_or(0, NativePrepared::param_count)
    }

    /// Access the raw SQL string of the prepared statement.
    #[must_use]
    pub fn sql(&self) -> &str {
        self.sql.as_str()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.lock().handle.is_none()
    }

    /// Bind `params`, run the statement, and return the number of rows changed.
    ///
    /// # Errors
    ///
    /// [`DuckDbMiddlewareError::Misuse`] when closed or while rows are open; binder
    /// errors (`ArgumentCount`, `Skip`, `CouldNotBind`); the engine's error text as
    /// [`DuckDbMiddlewareError::ExecutionError`].
    pub fn execute(&self, params: &[RowValues]) -> Result<usize, DuckDbMiddlewareError> {
        let mut guard = self.lock_for_run("Exec")?;
        // Lock order is statement, then connection.
        let _conn = self.connection.lock_open("Exec")?;
        let Some(handle) = guard.handle.as_mut() else {
            return Err(DuckDbMiddlewareError::misuse("Exec after Close"));
        };
        bind_params(handle, params)?;
        debug!(sql = %self.sql, params = params.len(), "execute prepared");
        let mut result = handle.execute()?;
        Ok(result.rows_changed())
    }

    /// Bind `params`, run the statement, and return a cursor over its result.
    ///
    /// The statement cannot be executed again or closed until the rows are closed.
    ///
    /// # Errors
    ///
    /// Same as [`execute`](Self::execute).
    pub fn query(&self, params: &[RowValues]) -> Result<DuckDbRows, DuckDbMiddlewareError> {
        let mut guard = self.lock_for_run("Query")?;
        let _conn = self.connection.lock_open("Query")?;
        let Some(handle) = guard.handle.as_mut() else {
            return Err(DuckDbMiddlewareError::misuse("Query after Close"));
        };
        bind_params(handle, params)?;
        debug!(sql = %self.sql, params = params.len(), "query prepared");
        let result = handle.execute()?;
        guard.rows_open = true;
        Ok(DuckDbRows::new(result, Some(Arc::clone(&self.shared))))
    }

    /// Release the native handle.
    ///
    /// # Errors
    ///
    /// Returns [`DuckDbMiddlewareError::Misuse`] while rows are open or on a second close.
    pub fn close(&self) -> Result<(), DuckDbMiddlewareError> {
        let mut guard = self.shared.lock();
        if guard.rows_open {
            return Err(DuckDbMiddlewareError::misuse("Close with active Rows"));
        }
        let Some(handle) = guard.handle.take() else {
            return Err(DuckDbMiddlewareError::misuse("double Close of Stmt"));
        };
        drop(handle);
        Ok(())
    }
}
