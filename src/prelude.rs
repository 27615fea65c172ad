//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::duckdb::{
    AccessMode, AsyncDuckDbConnection, DuckDbConnection, DuckDbDriver, DuckDbOptions,
    DuckDbOptionsBuilder, DuckDbRows, DuckDbStatement, Tx, build_result_set, interpolate_params,
};
pub use crate::error::DuckDbMiddlewareError;
pub use crate::executor::AsyncDatabaseExecutor;
pub use crate::results::{CustomDbRow, ResultSet};
pub use crate::types::{NativeType, RowValues, ScanType};
