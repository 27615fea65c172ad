use thiserror::Error;

#[derive(Debug, Error)]
pub enum DuckDbMiddlewareError {
    /// Caller broke the statement/cursor/connection contract (double close,
    /// use after close, operating with an open cursor).
    #[error("misuse of duckdb middleware: {0}")]
    Misuse(String),

    #[error("could not bind parameter")]
    CouldNotBind,

    #[error("incorrect argument count for command: have {actual} want {expected}")]
    ArgumentCount { expected: usize, actual: usize },

    /// No rule exists for this parameter vector on the current path; a higher
    /// layer may retry on the other path.
    #[error("skipped: {0}")]
    Skip(String),

    /// Engine diagnostic, passed through unmodified.
    #[error("{0}")]
    ExecutionError(String),

    #[error("invalid data type in column {column} (native type {native_type})")]
    InvalidDataType { column: usize, native_type: u32 },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),
}

impl DuckDbMiddlewareError {
    /// Build a usage error and log it; misuse is a bug in the caller and should be loud.
    pub(crate) fn misuse(what: impl Into<String>) -> Self {
        let what = what.into();
        tracing::error!(target: "duckdb_middleware", "misuse: {what}");
        DuckDbMiddlewareError::Misuse(what)
    }

    /// True for the skip/defer signal emitted by the binder and the escaper.
    #[must_use]
    pub fn is_skip(&self) -> bool {
        matches!(self, DuckDbMiddlewareError::Skip(_))
    }

    #[must_use]
    pub fn is_misuse(&self) -> bool {
        matches!(self, DuckDbMiddlewareError::Misuse(_))
    }
}
