use chrono::NaiveDateTime;

use crate::error::DuckDbMiddlewareError;
use crate::types::RowValues;

use super::native::NativePrepared;

/// True when every argument has a typed-bind rule.
#[must_use]
pub fn is_bindable(params: &[RowValues]) -> bool {
    params.iter().all(|p| unsupported_reason(p).is_none())
}

fn unsupported_reason(value: &RowValues) -> Option<String> {
    match value {
        RowValues::TinyInt(_)
        | RowValues::SmallInt(_)
        | RowValues::Int(_)
        | RowValues::BigInt(_)
        | RowValues::Double(_)
        | RowValues::Bool(_)
        | RowValues::Timestamp(_) => None,
        RowValues::Text(s) if s.contains('\0') => {
            Some("text argument with an interior NUL byte".to_string())
        }
        RowValues::Text(_) => None,
        other => Some(format!("no typed bind for {} argument", other.kind())),
    }
}

fn timestamp_micros(ts: &NaiveDateTime) -> i64 {
    ts.and_utc().timestamp_micros()
}

/// Bind `params` onto the prepared statement, 1-based in placeholder order.
///
/// The whole vector is checked before the first native call, so a skip leaves no
/// bound values behind. A native failure mid-way leaves earlier bindings in place; the
/// caller must rebind from scratch before executing.
///
/// # Errors
///
/// - [`DuckDbMiddlewareError::ArgumentCount`] when `params.len()` differs from the
///   statement's parameter count.
/// - [`DuckDbMiddlewareError::Skip`] when any argument has no typed-bind rule.
/// - [`DuckDbMiddlewareError::CouldNotBind`] when the engine rejects a value.
pub(crate) fn bind_params(
    stmt: &mut NativePrepared,
    params: &[RowValues],
) -> Result<(), DuckDbMiddlewareError> {
    let expected = stmt.param_count();
    if expected != params.len() {
        return Err(DuckDbMiddlewareError::ArgumentCount {
            expected,
            actual: params.len(),
        });
    }

    if let Some(reason) = params.iter().find_map(unsupported_reason) {
        return Err(DuckDbMiddlewareError::Skip(reason));
    }

    for (i, value) in params.iter().enumerate() {
        let idx = i as u64 + 1;
        match value {
            RowValues::TinyInt(v) => stmt.bind_i8(idx, *v)?,
            RowValues::SmallInt(v) => stmt.bind_i16(idx, *v)?,
            RowValues::Int(v) => stmt.bind_i32(idx, *v)?,
            RowValues::BigInt(v) => stmt.bind_i64(idx, *v)?,
            RowValues::Double(v) => stmt.bind_f64(idx, *v)?,
            RowValues::Bool(v) => stmt.bind_bool(idx, *v)?,
            RowValues::Timestamp(ts) => stmt.bind_timestamp_micros(idx, timestamp_micros(ts))?,
            RowValues::Text(s) => stmt.bind_varchar(idx, s)?,
            other => {
                return Err(DuckDbMiddlewareError::Skip(format!(
                    "no typed bind for {} argument",
                    other.kind()
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn bindable_kinds() {
        assert!(is_bindable(&[
            RowValues::TinyInt(1),
            RowValues::SmallInt(2),
            RowValues::Int(3),
            RowValues::BigInt(4),
            RowValues::Double(5.0),
            RowValues::Bool(true),
            RowValues::Text("x".into()),
        ]));
        assert!(is_bindable(&[]));
    }

    #[test]
    fn one_unsupported_kind_defers_the_whole_vector() {
        assert!(!is_bindable(&[RowValues::Int(1), RowValues::Null]));
        assert!(!is_bindable(&[RowValues::Float(1.0)]));
        assert!(!is_bindable(&[RowValues::Blob(vec![0])]));
        assert!(!is_bindable(&[RowValues::Text("a\0b".into())]));
    }

    #[test]
    fn timestamps_bind_as_utc_micros() {
        let ts = NaiveDate::from_ymd_opt(1970, 1, 1)
            .and_then(|d| d.and_hms_micro_opt(0, 0, 1, 250))
            .expect("valid timestamp");
        assert_eq!(timestamp_micros(&ts), 1_000_250);
    }
}
