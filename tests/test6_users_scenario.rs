use chrono::NaiveDate;
use duckdb_middleware::prelude::*;

fn midnight(y: i32, m: u32, d: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .expect("valid date")
}

fn seed(conn: &DuckDbConnection) -> Result<(), DuckDbMiddlewareError> {
    conn.execute_batch(
        "CREATE TABLE users (name VARCHAR, age INTEGER, height FLOAT, awesome BOOLEAN, bday DATE)",
    )?;
    conn.execute_batch(
        "INSERT INTO users VALUES ('marc', 99, 1.91, true, '1970-01-01');
         INSERT INTO users VALUES ('macgyver', 70, 1.85, true, '1951-01-23');",
    )
}

#[test]
fn test6_prepared_query_filters_users() -> Result<(), Box<dyn std::error::Error>> {
    let conn = DuckDbConnection::open("")?;
    seed(&conn)?;

    let stmt = conn.prepare(
        "SELECT name, age, height, awesome, bday FROM users \
         WHERE (name = ? OR name = ?) AND age > ? AND awesome = ?",
    )?;
    let mut rows = stmt.query(&[
        RowValues::Text("macgyver".into()),
        RowValues::Text("marc".into()),
        RowValues::Int(30),
        RowValues::Bool(true),
    ])?;

    assert_eq!(rows.columns()?, ["name", "age", "height", "awesome", "bday"]);
    let mut seen = Vec::new();
    while let Some(row) = rows.next_row()? {
        seen.push(row);
    }
    rows.close()?;
    stmt.close()?;

    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0][0], RowValues::Text("marc".into()));
    assert_eq!(seen[0][1], RowValues::Int(99));
    assert_eq!(seen[0][2], RowValues::Float(1.91));
    assert_eq!(seen[0][3], RowValues::Bool(true));
    assert_eq!(seen[0][4], RowValues::Timestamp(midnight(1970, 1, 1)));
    assert_eq!(seen[1][0], RowValues::Text("macgyver".into()));
    assert_eq!(seen[1][4], RowValues::Timestamp(midnight(1951, 1, 23)));
    Ok(())
}

#[test]
fn test6_direct_query_filters_users() -> Result<(), Box<dyn std::error::Error>> {
    let conn = DuckDbConnection::open("")?;
    seed(&conn)?;

    let mut rows = conn.query(
        "SELECT name, awesome, bday FROM users \
         WHERE (name = ? OR name = ?) AND age > ? AND awesome = ?",
        &[
            RowValues::Text("macgyver".into()),
            RowValues::Text("marc".into()),
            RowValues::Int(30),
            RowValues::Bool(true),
        ],
    )?;
    let seen: Vec<_> = rows.by_ref().collect::<Result<_, _>>()?;
    rows.close()?;

    assert_eq!(
        seen,
        vec![
            vec![
                RowValues::Text("marc".into()),
                RowValues::Bool(true),
                RowValues::Timestamp(midnight(1970, 1, 1)),
            ],
            vec![
                RowValues::Text("macgyver".into()),
                RowValues::Bool(true),
                RowValues::Timestamp(midnight(1951, 1, 23)),
            ],
        ]
    );
    Ok(())
}

#[test]
fn test6_result_set_serializes_by_column_name() -> Result<(), Box<dyn std::error::Error>> {
    let conn = DuckDbConnection::open("")?;
    seed(&conn)?;

    let rs = conn.execute_select(
        "SELECT name, age FROM users WHERE age < ?",
        &[RowValues::Int(80)],
    )?;
    let json = serde_json::to_value(&rs)?;
    assert_eq!(
        json["results"][0],
        serde_json::json!({ "name": { "Text": "macgyver" }, "age": { "Int": 70 } })
    );
    assert_eq!(json["rows_affected"], 1);
    Ok(())
}
