// DuckDB module - drives the embedded engine through its C API
//
// This module is split into several sub-modules:
// - native: owners for the raw engine handles (the only place with `unsafe`)
// - params: typed binds for prepared statements
// - interpolate / placeholders: literal rendering for the direct path
// - rows / prepared / connection / transaction: the synchronous client surface
// - executor / query: prepared-first execution and result materialization
// - worker: async wrapper over the blocking engine calls

pub mod config;
pub mod connection;
pub mod executor;
pub mod interpolate;
mod native;
pub mod params;
pub mod placeholders;
pub mod prepared;
pub mod query;
pub mod rows;
pub mod transaction;
pub mod worker;

// Re-export the public API
pub use config::{AccessMode, DuckDbOptions, DuckDbOptionsBuilder};
pub use connection::DuckDbConnection;
pub use executor::{execute_batch, execute_dml, execute_select};
pub use interpolate::{escape_value, interpolate_params};
pub use params::is_bindable;
pub use placeholders::{count_placeholders, placeholder_positions};
pub use prepared::DuckDbStatement;
pub use query::build_result_set;
pub use rows::DuckDbRows;
pub use transaction::Tx;
pub use worker::AsyncDuckDbConnection;

/// Explicit factory for DuckDB connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuckDbDriver;

impl DuckDbDriver {
    /// Name the driver answers to.
    pub const NAME: &'static str = "duckdb";

    /// Open a connection from a DSN of the form `<path>[?key=value&...]`.
    ///
    /// # Errors
    ///
    /// See [`DuckDbConnection::open`].
    pub fn open(&self, dsn: &str) -> Result<DuckDbConnection, crate::error::DuckDbMiddlewareError> {
        DuckDbConnection::open(dsn)
    }
}
