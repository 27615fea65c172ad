use async_trait::async_trait;

use crate::error::DuckDbMiddlewareError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Async query surface shared by the connection wrappers in this crate.
#[async_trait]
pub trait AsyncDatabaseExecutor {
    /// Executes a batch of SQL statements (can be a mix of reads/writes). No parameters are supported.
    async fn execute_batch(&mut self, query: &str) -> Result<(), DuckDbMiddlewareError>;

    /// Executes a single SELECT statement and returns the result set.
    async fn execute_select(
        &mut self,
        query: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, DuckDbMiddlewareError>;

    /// Executes a single DML statement (INSERT, UPDATE, DELETE, etc.) and returns the number of rows affected.
    async fn execute_dml(
        &mut self,
        query: &str,
        params: &[RowValues],
    ) -> Result<usize, DuckDbMiddlewareError>;
}
