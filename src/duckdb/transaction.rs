use tracing::warn;

use crate::error::DuckDbMiddlewareError;
use crate::results::ResultSet;
use crate::types::RowValues;

use super::connection::DuckDbConnection;
use super::prepared::DuckDbStatement;
use super::rows::DuckDbRows;

/// Transaction handle returned by [`DuckDbConnection::begin`].
///
/// Holds no state of its own: commit and rollback are plain statements on the owning
/// connection. After either one the handle is spent and every further call is a
/// [`DuckDbMiddlewareError::Misuse`]. A handle dropped while still active rolls back.
pub struct Tx<'a> {
    conn: Option<&'a DuckDbConnection>,
}

impl std::fmt::Debug for Tx<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tx")
            .field("active", &self.conn.is_some())
            .finish()
    }
}

impl<'a> Tx<'a> {
    pub(crate) fn new(conn: &'a DuckDbConnection) -> Self {
        Self { conn: Some(conn) }
    }

    fn conn(&self, op: &str) -> Result<&'a DuckDbConnection, DuckDbMiddlewareError> {
        self.conn.ok_or_else(|| {
            DuckDbMiddlewareError::misuse(format!("{op} on a finished transaction"))
        })
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.conn.is_some()
    }

    /// Direct-path execute inside the transaction.
    ///
    /// # Errors
    ///
    /// See [`DuckDbConnection::execute`].
    pub fn execute(&self, sql: &str, params: &[RowValues]) -> Result<usize, DuckDbMiddlewareError> {
        self.conn("Exec")?.execute(sql, params)
    }

    /// Direct-path query inside the transaction.
    ///
    /// # Errors
    ///
    /// See [`DuckDbConnection::query`].
    pub fn query(&self, sql: &str, params: &[RowValues]) -> Result<DuckDbRows, DuckDbMiddlewareError> {
        self.conn("Query")?.query(sql, params)
    }

    /// Prepare a statement on the transaction's connection.
    ///
    /// # Errors
    ///
    /// See [`DuckDbConnection::prepare`].
    pub fn prepare(&self, sql: &str) -> Result<DuckDbStatement, DuckDbMiddlewareError> {
        self.conn("Prepare")?.prepare(sql)
    }

    /// Execute a SELECT and materialize it.
    ///
    /// # Errors
    ///
    /// See [`DuckDbConnection::execute_select`].
    pub fn execute_select(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, DuckDbMiddlewareError> {
        self.conn("Query")?.execute_select(sql, params)
    }

    /// Execute a DML statement and return rows changed.
    ///
    /// # Errors
    ///
    /// See [`DuckDbConnection::execute_dml`].
    pub fn execute_dml(&self, sql: &str, params: &[RowValues]) -> Result<usize, DuckDbMiddlewareError> {
        self.conn("Exec")?.execute_dml(sql, params)
    }

    fn finish(&mut self, op: &str, sql: &str) -> Result<(), DuckDbMiddlewareError> {
        let conn = self.conn(op)?;
        // The handle is spent whatever the engine answers.
        self.conn = None;
        conn.run(sql).map(drop)
    }

    /// Issue `COMMIT TRANSACTION`.
    ///
    /// # Errors
    ///
    /// `Misuse` if the transaction already finished; otherwise the engine's error text.
    pub fn commit(&mut self) -> Result<(), DuckDbMiddlewareError> {
        self.finish("Commit", "COMMIT TRANSACTION")
    }

    /// Issue `ROLLBACK`.
    ///
    /// # Errors
    ///
    /// `Misuse` if the transaction already finished; otherwise the engine's error text.
    pub fn rollback(&mut self) -> Result<(), DuckDbMiddlewareError> {
        self.finish("Rollback", "ROLLBACK")
    }
}

impl Drop for Tx<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if conn.is_closed() {
                return;
            }
            warn!("transaction dropped while active; rolling back");
            if let Err(e) = conn.run("ROLLBACK") {
                warn!(error = %e, "rollback on drop failed");
            }
        }
    }
}
