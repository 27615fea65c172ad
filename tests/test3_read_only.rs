use duckdb_middleware::duckdb::{AccessMode, DuckDbOptionsBuilder};
use duckdb_middleware::prelude::*;

#[test]
fn test3_read_only_rejects_writes() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("ro.duckdb");
    let path = path.to_string_lossy().into_owned();

    {
        let conn = DuckDbConnection::open(&path)?;
        conn.execute_batch("CREATE TABLE users (name VARCHAR, age INTEGER)")?;
        conn.execute_dml("INSERT INTO users VALUES (?, ?)", &[
            RowValues::Text("alice".into()),
            RowValues::Int(30),
        ])?;
        conn.close()?;
    }

    let conn = DuckDbDriver.open(&format!("{path}?access_mode=READ_ONLY"))?;
    let err = conn
        .execute("INSERT INTO users VALUES (?, ?)", &[
            RowValues::Text("bob".into()),
            RowValues::Int(40),
        ])
        .unwrap_err();
    assert!(matches!(err, DuckDbMiddlewareError::ExecutionError(_)), "got {err}");

    let rs = conn.execute_select("SELECT name FROM users", &[])?;
    assert_eq!(rs.len(), 1);
    assert_eq!(rs.results[0].get("name").and_then(RowValues::as_text), Some("alice"));
    conn.close()?;
    Ok(())
}

#[test]
fn test3_builder_applies_engine_flags() -> Result<(), Box<dyn std::error::Error>> {
    let conn = DuckDbOptionsBuilder::new("")
        .access_mode(AccessMode::Automatic)
        .threads(2)
        .build()?;
    let rs = conn.execute_select("SELECT current_setting('threads') AS threads", &[])?;
    assert_eq!(rs.results[0].get("threads").and_then(RowValues::as_int), Some(2));
    Ok(())
}

#[test]
fn test3_rejected_flag_value_is_a_config_error() {
    let err = DuckDbConnection::open("?threads=not-a-number").unwrap_err();
    assert!(
        matches!(
            err,
            DuckDbMiddlewareError::ConfigError(_) | DuckDbMiddlewareError::ConnectionError(_)
        ),
        "got {err}"
    );

    let err = DuckDbConnection::open("?threads=%zz").unwrap_err();
    assert!(matches!(err, DuckDbMiddlewareError::ConfigError(_)), "got {err}");
}

#[test]
fn test3_dsn_values_are_form_decoded() -> Result<(), Box<dyn std::error::Error>> {
    // A bare key is an empty value and is ignored like any other.
    let conn = DuckDbConnection::open("?foo&threads")?;
    conn.execute_batch("SELECT 1")?;
    conn.close()?;

    let conn = DuckDbConnection::open("?max_memory=1%20GB&threads=1")?;
    let rs = conn.execute_select("SELECT current_setting('threads') AS threads", &[])?;
    assert_eq!(rs.results[0].get("threads").and_then(RowValues::as_int), Some(1));
    conn.close()?;
    Ok(())
}

#[test]
fn test3_unknown_dsn_keys_are_ignored() -> Result<(), Box<dyn std::error::Error>> {
    let conn = DuckDbConnection::open("?cache=shared&threads=1")?;
    assert_eq!(conn.path(), "");
    conn.execute_batch("SELECT 1")?;
    Ok(())
}
