use clap::Parser;
use duckdb_middleware::prelude::*;
use tracing::{Level, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Walk through the duckdb-middleware client surface")]
struct Args {
    /// Database file; a temporary file is used when omitted.
    #[arg(long)]
    db: Option<String>,
    /// Access mode for the first connection.
    #[arg(long, value_enum, default_value = "automatic")]
    access_mode: AccessMode,
    /// Log at debug level.
    #[arg(long)]
    verbose: bool,
}

fn print_json(label: &str, rs: &ResultSet) -> Result<(), Box<dyn std::error::Error>> {
    println!("{label}: {}", serde_json::to_string_pretty(rs)?);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let tmp = tempfile::tempdir()?;
    let path = args.db.unwrap_or_else(|| {
        tmp.path()
            .join("simple.duckdb")
            .to_string_lossy()
            .into_owned()
    });

    let conn = DuckDbOptionsBuilder::new(path.clone())
        .access_mode(args.access_mode)
        .build()?;
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (name VARCHAR, age INTEGER, height FLOAT, awesome BOOLEAN, bday DATE);
         CREATE TABLE IF NOT EXISTS purchases (user_name VARCHAR, item VARCHAR, price DOUBLE);",
    )?;

    let insert = conn.prepare("INSERT INTO users VALUES (?, ?, CAST(? AS FLOAT), ?, CAST(? AS DATE))")?;
    for (name, age, height, bday) in [("marc", 99, 1.91, "1970-01-01"), ("macgyver", 70, 1.85, "1951-01-23")] {
        insert.execute(&[
            RowValues::Text(name.into()),
            RowValues::Int(age),
            RowValues::Double(height),
            RowValues::Bool(true),
            RowValues::Text(bday.into()),
        ])?;
    }
    insert.close()?;

    let rs = conn.execute_select(
        "SELECT * FROM users WHERE (name = ? OR name = ?) AND age > ? AND awesome = ?",
        &[
            RowValues::Text("macgyver".into()),
            RowValues::Text("marc".into()),
            RowValues::Int(30),
            RowValues::Bool(true),
        ],
    )?;
    print_json("users", &rs)?;

    let mut tx = conn.begin()?;
    tx.execute_dml(
        "INSERT INTO purchases VALUES (?, ?, ?)",
        &[
            RowValues::Text("marc".into()),
            RowValues::Text("paperclip".into()),
            RowValues::Double(0.05),
        ],
    )?;
    tx.rollback()?;
    info!("rolled back the paperclip purchase");

    let mut tx = conn.begin()?;
    tx.execute_dml(
        "INSERT INTO purchases VALUES (?, ?, ?)",
        &[
            RowValues::Text("macgyver".into()),
            RowValues::Text("swiss army knife".into()),
            RowValues::Double(42.0),
        ],
    )?;
    tx.commit()?;

    let rs = conn.execute_select("SELECT user_name, item, price FROM purchases", &[])?;
    print_json("purchases", &rs)?;
    conn.close()?;

    let ro = DuckDbDriver.open(&format!("{path}?access_mode=READ_ONLY"))?;
    match ro.execute("INSERT INTO users VALUES (?, ?, ?, ?, ?)", &[
        RowValues::Text("bob".into()),
        RowValues::Int(1),
        RowValues::Double(1.0),
        RowValues::Bool(false),
        RowValues::Text("2000-01-01".into()),
    ]) {
        Ok(_) => info!("unexpected: read-only insert succeeded"),
        Err(e) => info!(error = %e, "read-only connection refused the insert"),
    }
    let rs = ro.execute_select("SELECT count(*) AS users FROM users", &[])?;
    print_json("read-only count", &rs)?;
    ro.close()?;
    Ok(())
}
