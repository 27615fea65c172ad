use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::error::DuckDbMiddlewareError;
use crate::results::ResultSet;
use crate::types::RowValues;

use super::config::DuckDbOptions;
use super::interpolate::interpolate_params;
use super::native::{NativeConfig, NativeConnection, NativeDatabase, NativeResult};
use super::prepared::DuckDbStatement;
use super::rows::DuckDbRows;
use super::transaction::Tx;

pub(crate) struct NativeHandles {
    con: NativeConnection,
    db: NativeDatabase,
}

/// Connection state shared with the statements prepared on it.
pub(crate) struct ConnectionShared {
    handles: Mutex<Option<NativeHandles>>,
    closed: AtomicBool,
}

impl ConnectionShared {
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn lock(&self) -> MutexGuard<'_, Option<NativeHandles>> {
        match self.handles.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Hold the connection open for the duration of a statement call.
    pub(crate) fn lock_open(
        &self,
        op: &str,
    ) -> Result<MutexGuard<'_, Option<NativeHandles>>, DuckDbMiddlewareError> {
        let guard = self.lock();
        if guard.is_none() {
            return Err(DuckDbMiddlewareError::misuse(format!(
                "{op} on a statement whose connection is closed"
            )));
        }
        Ok(guard)
    }
}

/// A DuckDB database plus one connection to it.
///
/// All calls on one connection are serialized by an internal mutex. Statements and rows
/// derived from the connection should be closed before it; statements used after the
/// connection is closed fail with [`DuckDbMiddlewareError::Misuse`].
///
/// [`DuckDbRows`](super::DuckDbRows) own their materialized result buffer, so a cursor obtained before
/// [`close`](Self::close) stays readable afterwards until it is itself closed or dropped.
pub struct DuckDbConnection {
    shared: Arc<ConnectionShared>,
    path: String,
}

impl std::fmt::Debug for DuckDbConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbConnection")
            .field("path", &self.path)
            .field("closed", &self.shared.is_closed())
            .finish()
    }
}

impl DuckDbConnection {
    /// Open a connection from a DSN of the form `<path>[?key=value&...]`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for a malformed DSN or a rejected flag, `ConnectionError`
    /// when the engine cannot open the database.
    pub fn open(dsn: &str) -> Result<Self, DuckDbMiddlewareError> {
        Self::open_with(&DuckDbOptions::from_dsn(dsn)?)
    }

    /// Open a connection from already-parsed options.
    ///
    /// # Errors
    ///
    /// Same as [`open`](Self::open).
    pub fn open_with(opts: &DuckDbOptions) -> Result<Self, DuckDbMiddlewareError> {
        let mut config = NativeConfig::new()?;
        for (flag, value) in opts.engine_flags() {
            config.set(flag, value)?;
        }
        let db = NativeDatabase::open(&opts.db_path, &config)?;
        drop(config);
        let con = NativeConnection::connect(&db)?;
        debug!(path = %opts.db_path, "duckdb connection opened");

        Ok(Self {
            shared: Arc::new(ConnectionShared {
                handles: Mutex::new(Some(NativeHandles { con, db })),
                closed: AtomicBool::new(false),
            }),
            path: opts.db_path.clone(),
        })
    }

    /// Path the database was opened with; empty for in-memory.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Run `f` against the open native connection while holding the connection lock.
    fn with_native<R>(
        &self,
        op: &str,
        f: impl FnOnce(&NativeConnection) -> Result<R, DuckDbMiddlewareError>,
    ) -> Result<R, DuckDbMiddlewareError> {
        let guard = self.shared.lock();
        let Some(handles) = guard.as_ref() else {
            return Err(DuckDbMiddlewareError::misuse(format!(
                "{op} on a closed connection"
            )));
        };
        f(&handles.con)
    }

    pub(crate) fn run(&self, sql: &str) -> Result<NativeResult, DuckDbMiddlewareError> {
        self.with_native("Exec", |con| con.query(sql))
    }

    /// Run SQL without parameters (may contain several statements).
    ///
    /// # Errors
    ///
    /// Returns the engine's error text as `ExecutionError`.
    pub fn execute_batch(&self, sql: &str) -> Result<(), DuckDbMiddlewareError> {
        debug!(sql, "execute batch");
        self.run(sql).map(drop)
    }

    /// Direct path: interpolate `params` into `sql` and run it, returning rows changed.
    ///
    /// # Errors
    ///
    /// `Skip` when the arguments cannot be interpolated; the engine's error text as
    /// `ExecutionError`.
    pub fn execute(&self, sql: &str, params: &[RowValues]) -> Result<usize, DuckDbMiddlewareError> {
        let text = interpolate_params(sql, params)?;
        debug!(sql = %text, "execute direct");
        let mut result = self.run(&text)?;
        Ok(result.rows_changed())
    }

    /// Direct path: interpolate `params` into `sql` and return a standalone cursor.
    ///
    /// # Errors
    ///
    /// Same as [`execute`](Self::execute).
    pub fn query(&self, sql: &str, params: &[RowValues]) -> Result<DuckDbRows, DuckDbMiddlewareError> {
        let text = interpolate_params(sql, params)?;
        debug!(sql = %text, "query direct");
        let result = self.run(&text)?;
        Ok(DuckDbRows::new(result, None))
    }

    /// Prepare `sql`. Argument count is only checked when the statement runs.
    ///
    /// # Errors
    ///
    /// Returns the engine's prepare error text as `ExecutionError`.
    pub fn prepare(&self, sql: &str) -> Result<DuckDbStatement, DuckDbMiddlewareError> {
        let handle = self.with_native("Prepare", |con| con.prepare(sql))?;
        debug!(sql, "prepared statement");
        Ok(DuckDbStatement::new(Arc::clone(&self.shared), handle, sql))
    }

    /// Issue `BEGIN TRANSACTION` and return a handle for commit/rollback.
    ///
    /// # Errors
    ///
    /// Returns the engine's error text, e.g. when a transaction is already active.
    pub fn begin(&self) -> Result<Tx<'_>, DuckDbMiddlewareError> {
        self.run("BEGIN TRANSACTION")?;
        Ok(Tx::new(self))
    }

    /// Prepared path with interpolation fallback; see [`super::executor::execute_select`].
    ///
    /// # Errors
    ///
    /// Propagates statement, binder and engine errors.
    pub fn execute_select(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, DuckDbMiddlewareError> {
        super::executor::execute_select(self, sql, params)
    }

    /// Prepared path with interpolation fallback; see [`super::executor::execute_dml`].
    ///
    /// # Errors
    ///
    /// Propagates statement, binder and engine errors.
    pub fn execute_dml(&self, sql: &str, params: &[RowValues]) -> Result<usize, DuckDbMiddlewareError> {
        super::executor::execute_dml(self, sql, params)
    }

    /// Disconnect, then close the database.
    ///
    /// Open cursors keep their own result buffer and are not invalidated.
    ///
    /// # Errors
    ///
    /// Returns [`DuckDbMiddlewareError::Misuse`] on a second close.
    pub fn close(&self) -> Result<(), DuckDbMiddlewareError> {
        let mut guard = self.shared.lock();
        let Some(NativeHandles { con, db }) = guard.take() else {
            return Err(DuckDbMiddlewareError::misuse("database already closed"));
        };
        self.shared.closed.store(true, Ordering::Release);
        drop(con);
        drop(db);
        debug!(path = %self.path, "duckdb connection closed");
        Ok(())
    }
}

impl Drop for DuckDbConnection {
    fn drop(&mut self) {
        if !self.shared.is_closed() {
            let _ = self.close();
        }
    }
}
