use clap::ValueEnum;
use tracing::debug;

use crate::error::DuckDbMiddlewareError;

use super::connection::DuckDbConnection;

/// Engine flags that may be set from a DSN query string.
const RECOGNIZED_FLAGS: [&str; 4] = ["access_mode", "threads", "max_memory", "default_order"];

/// How the engine may touch the database file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum AccessMode {
    Automatic,
    ReadOnly,
    ReadWrite,
}

impl AccessMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AccessMode::Automatic => "AUTOMATIC",
            AccessMode::ReadOnly => "READ_ONLY",
            AccessMode::ReadWrite => "READ_WRITE",
        }
    }
}

/// Options for opening a DuckDB connection.
///
/// Each `Some` field is handed to the engine as the configuration flag of the same name
/// before the database is opened. An empty `db_path` opens an in-memory database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuckDbOptions {
    pub db_path: String,
    pub access_mode: Option<String>,
    pub threads: Option<String>,
    pub max_memory: Option<String>,
    pub default_order: Option<String>,
}

impl DuckDbOptions {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Parse `<path>[?key=value&...]`.
    ///
    /// The query part is form-urlencoded: values are percent-decoded, `+` is a space, and
    /// a bare key counts as a key with an empty value. Keys other than `access_mode`,
    /// `threads`, `max_memory` and `default_order` are ignored. Empty values are ignored.
    /// When a key repeats, the first value wins.
    ///
    /// # Errors
    ///
    /// Returns [`DuckDbMiddlewareError::ConfigError`] for a malformed `%` escape.
    pub fn from_dsn(dsn: &str) -> Result<Self, DuckDbMiddlewareError> {
        let (path, query) = match dsn.split_once('?') {
            Some((path, query)) => (path, query),
            None => (dsn, ""),
        };
        if let Some(pos) = invalid_percent_escape(query.as_bytes()) {
            return Err(DuckDbMiddlewareError::ConfigError(format!(
                "invalid percent escape at offset {pos} in DSN parameters '{query}'"
            )));
        }
        let mut opts = Self::new(path);

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            let slot = match key.as_ref() {
                "access_mode" => &mut opts.access_mode,
                "threads" => &mut opts.threads,
                "max_memory" => &mut opts.max_memory,
                "default_order" => &mut opts.default_order,
                other => {
                    debug!(key = other, "ignoring unrecognized DSN parameter");
                    continue;
                }
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        Ok(opts)
    }

    /// Flag/value pairs to set on the engine configuration, in a fixed order.
    pub fn engine_flags(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        let values = [
            &self.access_mode,
            &self.threads,
            &self.max_memory,
            &self.default_order,
        ];
        RECOGNIZED_FLAGS
            .into_iter()
            .zip(values)
            .filter_map(|(flag, value)| value.as_deref().map(|v| (flag, v)))
    }
}

/// Offset of the first `%` not followed by two hex digits.
fn invalid_percent_escape(data: &[u8]) -> Option<usize> {
    data.iter().enumerate().find_map(|(i, &b)| {
        let well_formed = b != b'%'
            || data
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        (!well_formed).then_some(i)
    })
}

/// Fluent builder for DuckDB options.
#[derive(Debug, Clone)]
pub struct DuckDbOptionsBuilder {
    opts: DuckDbOptions,
}

impl DuckDbOptionsBuilder {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            opts: DuckDbOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn access_mode(mut self, mode: AccessMode) -> Self {
        self.opts.access_mode = Some(mode.as_str().to_string());
        self
    }

    #[must_use]
    pub fn threads(mut self, threads: u32) -> Self {
        self.opts.threads = Some(threads.to_string());
        self
    }

    /// Memory limit in the engine's own notation, e.g. `"1GB"`.
    #[must_use]
    pub fn max_memory(mut self, limit: impl Into<String>) -> Self {
        self.opts.max_memory = Some(limit.into());
        self
    }

    #[must_use]
    pub fn default_order(mut self, order: impl Into<String>) -> Self {
        self.opts.default_order = Some(order.into());
        self
    }

    #[must_use]
    pub fn finish(self) -> DuckDbOptions {
        self.opts
    }

    /// Open a connection with the accumulated options.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the engine rejects a flag, `ConnectionError` if the
    /// database cannot be opened.
    pub fn build(self) -> Result<DuckDbConnection, DuckDbMiddlewareError> {
        DuckDbConnection::open_with(&self.finish())
    }
}

impl DuckDbConnection {
    #[must_use]
    pub fn builder(db_path: impl Into<String>) -> DuckDbOptionsBuilder {
        DuckDbOptionsBuilder::new(db_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_path_has_no_flags() {
        let opts = DuckDbOptions::from_dsn("data/app.db").unwrap();
        assert_eq!(opts.db_path, "data/app.db");
        assert_eq!(opts.engine_flags().count(), 0);
    }

    #[test]
    fn empty_dsn_is_in_memory() {
        assert_eq!(DuckDbOptions::from_dsn("").unwrap(), DuckDbOptions::in_memory());
        let opts = DuckDbOptions::from_dsn("?threads=2").unwrap();
        assert_eq!(opts.db_path, "");
        assert_eq!(opts.threads.as_deref(), Some("2"));
    }

    #[test]
    fn recognized_keys_map_to_flags() {
        let opts = DuckDbOptions::from_dsn(
            "x.db?access_mode=READ_ONLY&threads=4&max_memory=1GB&default_order=DESC",
        )
        .unwrap();
        let flags: Vec<_> = opts.engine_flags().collect();
        assert_eq!(
            flags,
            vec![
                ("access_mode", "READ_ONLY"),
                ("threads", "4"),
                ("max_memory", "1GB"),
                ("default_order", "DESC"),
            ]
        );
    }

    #[test]
    fn unknown_and_empty_values_are_ignored() {
        let opts = DuckDbOptions::from_dsn("x.db?cache=shared&threads=&max_memory=2GB").unwrap();
        assert_eq!(opts.threads, None);
        assert_eq!(opts.max_memory.as_deref(), Some("2GB"));
        assert_eq!(opts.engine_flags().count(), 1);
    }

    #[test]
    fn first_occurrence_wins() {
        let opts = DuckDbOptions::from_dsn("x.db?threads=1&threads=8").unwrap();
        assert_eq!(opts.threads.as_deref(), Some("1"));
    }

    #[test]
    fn bare_key_is_an_empty_value() {
        let opts = DuckDbOptions::from_dsn("x.db?foo&threads&max_memory=2GB").unwrap();
        assert_eq!(opts.threads, None);
        assert_eq!(opts.engine_flags().collect::<Vec<_>>(), vec![("max_memory", "2GB")]);
    }

    #[test]
    fn values_are_percent_decoded() {
        let opts = DuckDbOptions::from_dsn("x.db?max_memory=1%20GB&default_order=de+sc").unwrap();
        assert_eq!(opts.max_memory.as_deref(), Some("1 GB"));
        assert_eq!(opts.default_order.as_deref(), Some("de sc"));
    }

    #[test]
    fn broken_percent_escape_is_rejected() {
        for dsn in ["x.db?threads=%zz", "x.db?threads=4%", "x.db?max_memory=1%2"] {
            let err = DuckDbOptions::from_dsn(dsn).unwrap_err();
            assert!(matches!(err, DuckDbMiddlewareError::ConfigError(_)), "{dsn}: {err}");
        }
        // The path part is not form-encoded.
        assert!(DuckDbOptions::from_dsn("100%.db").is_ok());
    }

    #[test]
    fn builder_sets_flags() {
        let opts = DuckDbOptionsBuilder::new("")
            .access_mode(AccessMode::ReadWrite)
            .threads(2)
            .finish();
        assert_eq!(opts.access_mode.as_deref(), Some("READ_WRITE"));
        assert_eq!(opts.threads.as_deref(), Some("2"));
        assert_eq!(opts.max_memory, None);
    }
}
