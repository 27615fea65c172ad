use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DuckDbMiddlewareError;
use crate::executor::AsyncDatabaseExecutor;
use crate::results::ResultSet;
use crate::types::RowValues;

use super::config::DuckDbOptions;
use super::connection::DuckDbConnection;
use super::transaction::Tx;

/// Async handle over a [`DuckDbConnection`].
///
/// Every engine call runs on tokio's blocking pool so the runtime's worker threads never
/// wait on DuckDB. Clones share the same connection; calls from clones are serialized
/// by the connection's own lock.
#[derive(Debug, Clone)]
pub struct AsyncDuckDbConnection {
    conn: Arc<DuckDbConnection>,
}

pub(crate) async fn run_blocking<F, R>(
    conn: Arc<DuckDbConnection>,
    func: F,
) -> Result<R, DuckDbMiddlewareError>
where
    F: FnOnce(&DuckDbConnection) -> Result<R, DuckDbMiddlewareError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || func(conn.as_ref()))
        .await
        .map_err(|e| DuckDbMiddlewareError::ExecutionError(format!("duckdb worker join error: {e}")))?
}

impl AsyncDuckDbConnection {
    /// Open from a DSN on the blocking pool.
    ///
    /// # Errors
    ///
    /// Same as [`DuckDbConnection::open`].
    pub async fn open(dsn: &str) -> Result<Self, DuckDbMiddlewareError> {
        let opts = DuckDbOptions::from_dsn(dsn)?;
        Self::open_with(opts).await
    }

    /// Open from parsed options on the blocking pool.
    ///
    /// # Errors
    ///
    /// Same as [`DuckDbConnection::open_with`].
    pub async fn open_with(opts: DuckDbOptions) -> Result<Self, DuckDbMiddlewareError> {
        let conn = tokio::task::spawn_blocking(move || DuckDbConnection::open_with(&opts))
            .await
            .map_err(|e| {
                DuckDbMiddlewareError::ExecutionError(format!("duckdb worker join error: {e}"))
            })??;
        Ok(Self::from_connection(conn))
    }

    #[must_use]
    pub fn from_connection(conn: DuckDbConnection) -> Self {
        Self {
            conn: Arc::new(conn),
        }
    }

    /// The synchronous connection underneath.
    #[must_use]
    pub fn connection(&self) -> &Arc<DuckDbConnection> {
        &self.conn
    }

    /// Run `func` against the connection on the blocking pool.
    ///
    /// # Errors
    ///
    /// Whatever `func` returns, or `ExecutionError` if the blocking task panicked.
    pub async fn interact<F, R>(&self, func: F) -> Result<R, DuckDbMiddlewareError>
    where
        F: FnOnce(&DuckDbConnection) -> Result<R, DuckDbMiddlewareError> + Send + 'static,
        R: Send + 'static,
    {
        run_blocking(Arc::clone(&self.conn), func).await
    }

    /// Run `func` inside `BEGIN TRANSACTION`; commit on `Ok`, roll back on `Err`.
    ///
    /// # Errors
    ///
    /// The error returned by `func` (after rollback), or the engine's begin/commit error.
    pub async fn with_transaction<F, R>(&self, func: F) -> Result<R, DuckDbMiddlewareError>
    where
        F: FnOnce(&Tx<'_>) -> Result<R, DuckDbMiddlewareError> + Send + 'static,
        R: Send + 'static,
    {
        self.interact(move |conn| {
            let mut tx = conn.begin()?;
            match func(&tx) {
                Ok(value) => {
                    tx.commit()?;
                    Ok(value)
                }
                Err(e) => {
                    tx.rollback()?;
                    Err(e)
                }
            }
        })
        .await
    }

    /// Close the underlying connection.
    ///
    /// # Errors
    ///
    /// `Misuse` on a second close.
    pub async fn close(&self) -> Result<(), DuckDbMiddlewareError> {
        self.interact(DuckDbConnection::close).await
    }
}

#[async_trait]
impl AsyncDatabaseExecutor for AsyncDuckDbConnection {
    async fn execute_batch(&mut self, query: &str) -> Result<(), DuckDbMiddlewareError> {
        let query = query.to_owned();
        self.interact(move |conn| conn.execute_batch(&query)).await
    }

    async fn execute_select(
        &mut self,
        query: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, DuckDbMiddlewareError> {
        let query = query.to_owned();
        let params = params.to_vec();
        self.interact(move |conn| conn.execute_select(&query, &params))
            .await
    }

    async fn execute_dml(
        &mut self,
        query: &str,
        params: &[RowValues],
    ) -> Result<usize, DuckDbMiddlewareError> {
        let query = query.to_owned();
        let params = params.to_vec();
        self.interact(move |conn| conn.execute_dml(&query, &params))
            .await
    }
}
