//! DuckDB adapter with a small, synchronous client surface (connection, prepared
//! statement, cursor, transaction) plus an async wrapper for tokio applications.
//!
//! ```rust,no_run
//! use duckdb_middleware::prelude::*;
//!
//! # fn main() -> Result<(), DuckDbMiddlewareError> {
//! let conn = DuckDbConnection::open("")?;
//! conn.execute_batch("CREATE TABLE t (id INTEGER, name VARCHAR)")?;
//! conn.execute_dml("INSERT INTO t VALUES (?, ?)", &[RowValues::Int(1), RowValues::Text("a".into())])?;
//! let rs = conn.execute_select("SELECT name FROM t WHERE id = ?", &[RowValues::Int(1)])?;
//! assert_eq!(rs.results[0].get("name").and_then(RowValues::as_text), Some("a"));
//! conn.close()?;
//! # Ok(())
//! # }
//! ```

pub mod duckdb;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod results;
pub mod types;

pub use duckdb::{
    AsyncDuckDbConnection, DuckDbConnection, DuckDbDriver, DuckDbOptions, DuckDbRows,
    DuckDbStatement, Tx,
};
pub use error::DuckDbMiddlewareError;
pub use executor::AsyncDatabaseExecutor;
pub use results::{CustomDbRow, ResultSet};
pub use types::{NativeType, RowValues, ScanType};
