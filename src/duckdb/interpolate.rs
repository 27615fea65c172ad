//! Literal interpolation for the direct (unprepared) path.
//!
//! Not injection-safe against every encoding; prefer typed binds where they apply.

use std::fmt::Write;

use crate::error::DuckDbMiddlewareError;
use crate::types::RowValues;

use super::placeholders::placeholder_positions;

/// Substitute each `?` placeholder in `query` with the literal rendering of the next
/// argument.
///
/// # Errors
///
/// Returns [`DuckDbMiddlewareError::Skip`] when the placeholder count differs from
/// `params.len()` or when an argument has no literal rendering.
pub fn interpolate_params(query: &str, params: &[RowValues]) -> Result<String, DuckDbMiddlewareError> {
    let positions = placeholder_positions(query);
    if positions.len() != params.len() {
        return Err(DuckDbMiddlewareError::Skip(format!(
            "query has {} placeholders but {} arguments were supplied",
            positions.len(),
            params.len()
        )));
    }
    if params.is_empty() {
        return Ok(query.to_string());
    }

    let mut buf = String::with_capacity(query.len() + params.len() * 8);
    let mut last = 0;
    // Counts are equal, so every argument is consumed exactly once.
    for (pos, arg) in positions.into_iter().zip(params) {
        buf.push_str(&query[last..pos]);
        append_literal(&mut buf, arg)?;
        last = pos + 1;
    }
    buf.push_str(&query[last..]);
    Ok(buf)
}

fn append_literal(buf: &mut String, arg: &RowValues) -> Result<(), DuckDbMiddlewareError> {
    match arg {
        RowValues::Null => buf.push_str("NULL"),
        RowValues::TinyInt(v) => write_display(buf, v),
        RowValues::SmallInt(v) => write_display(buf, v),
        RowValues::Int(v) => write_display(buf, v),
        RowValues::BigInt(v) => write_display(buf, v),
        RowValues::Double(v) => {
            if !v.is_finite() {
                return Err(DuckDbMiddlewareError::Skip(format!(
                    "no literal for non-finite double {v}"
                )));
            }
            // Display is the shortest representation that round-trips.
            write_display(buf, v);
        }
        RowValues::Bool(v) => buf.push(if *v { '1' } else { '0' }),
        // Seconds only: sub-second precision is lost on this path.
        RowValues::Timestamp(ts) => write_display(buf, &ts.and_utc().timestamp()),
        RowValues::Text(s) => append_text_literal(buf, s),
        other => {
            return Err(DuckDbMiddlewareError::Skip(format!(
                "no literal rule for {} argument",
                other.kind()
            )));
        }
    }
    Ok(())
}

fn write_display<T: std::fmt::Display>(buf: &mut String, v: &T) {
    // Writing into a String cannot fail.
    let _ = write!(buf, "{v}");
}

fn needs_escape(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\x1a' | '\'' | '"' | '\\')
}

/// Quote `s` as a string literal. Values containing escaped characters use the
/// `E'...'` form so the engine interprets the backslash sequences.
///
/// The engine has no escape for NUL inside a literal, so a value containing NUL is
/// rendered as a parenthesized concatenation with `chr(0)` between the pieces.
pub fn append_text_literal(buf: &mut String, s: &str) {
    if !s.contains('\0') {
        append_quoted(buf, s);
        return;
    }
    buf.push('(');
    for (i, piece) in s.split('\0').enumerate() {
        if i > 0 {
            buf.push_str(" || chr(0) || ");
        }
        append_quoted(buf, piece);
    }
    buf.push(')');
}

fn append_quoted(buf: &mut String, s: &str) {
    if s.chars().any(needs_escape) {
        buf.push('E');
        buf.push('\'');
        escape_value(buf, s);
    } else {
        buf.push('\'');
        buf.push_str(s);
    }
    buf.push('\'');
}

/// Append `s` with LF, CR, 0x1A, quotes and backslash backslash-escaped.
///
/// NUL is not handled here; see [`append_text_literal`].
pub fn escape_value(buf: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '\n' => buf.push_str("\\n"),
            '\r' => buf.push_str("\\r"),
            '\x1a' => buf.push_str("\\032"),
            '\'' => buf.push_str("\\'"),
            '"' => buf.push_str("\\\""),
            '\\' => buf.push_str("\\\\"),
            _ => buf.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn renders_each_kind() -> Result<(), DuckDbMiddlewareError> {
        let ts = NaiveDate::from_ymd_opt(2021, 3, 11)
            .and_then(|d| d.and_hms_opt(8, 4, 5))
            .expect("valid date");
        let out = interpolate_params(
            "VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            &[
                RowValues::Null,
                RowValues::TinyInt(-8),
                RowValues::SmallInt(16),
                RowValues::Int(32),
                RowValues::BigInt(-64),
                RowValues::Double(0.1),
                RowValues::Bool(true),
                RowValues::Timestamp(ts),
                RowValues::Text("marc".into()),
            ],
        )?;
        assert_eq!(
            out,
            "VALUES (NULL, -8, 16, 32, -64, 0.1, 1, 1615449845, 'marc')"
        );
        Ok(())
    }

    #[test]
    fn replaces_every_placeholder_in_order() -> Result<(), DuckDbMiddlewareError> {
        let out = interpolate_params(
            "SELECT * FROM users WHERE (name = ? OR name = ?) AND age > ? AND awesome = ?",
            &[
                RowValues::Text("macgyver".into()),
                RowValues::Text("marc".into()),
                RowValues::Int(30),
                RowValues::Bool(false),
            ],
        )?;
        assert!(!out.contains('?'));
        assert_eq!(
            out,
            "SELECT * FROM users WHERE (name = 'macgyver' OR name = 'marc') AND age > 30 AND awesome = 0"
        );
        Ok(())
    }

    #[test]
    fn arity_mismatch_is_a_skip() {
        let too_few = interpolate_params("SELECT ?, ?", &[RowValues::Int(1)]);
        assert!(matches!(too_few, Err(ref e) if e.is_skip()));
        let too_many = interpolate_params("SELECT ?", &[RowValues::Int(1), RowValues::Int(2)]);
        assert!(matches!(too_many, Err(ref e) if e.is_skip()));
        let none = interpolate_params("SELECT 1", &[RowValues::Int(1)]);
        assert!(matches!(none, Err(ref e) if e.is_skip()));
    }

    #[test]
    fn unsupported_kinds_are_a_skip() {
        let blob = interpolate_params("SELECT ?", &[RowValues::Blob(vec![1, 2])]);
        assert!(matches!(blob, Err(ref e) if e.is_skip()));
        let float = interpolate_params("SELECT ?", &[RowValues::Float(1.5)]);
        assert!(matches!(float, Err(ref e) if e.is_skip()));
        let nan = interpolate_params("SELECT ?", &[RowValues::Double(f64::NAN)]);
        assert!(matches!(nan, Err(ref e) if e.is_skip()));
    }

    #[test]
    fn escapes_special_characters() {
        let mut buf = String::new();
        append_text_literal(&mut buf, "a'b\"c\\d\ne\rf\x1ag");
        assert_eq!(buf, "E'a\\'b\\\"c\\\\d\\ne\\rf\\032g'");
    }

    #[test]
    fn nul_is_spliced_in_with_chr() {
        let mut buf = String::new();
        append_text_literal(&mut buf, "a\0b'c");
        assert_eq!(buf, "('a' || chr(0) || E'b\\'c')");

        let mut buf = String::new();
        append_text_literal(&mut buf, "\0\0");
        assert_eq!(buf, "('' || chr(0) || '' || chr(0) || '')");
    }

    #[test]
    fn plain_text_stays_a_plain_literal() {
        let mut buf = String::new();
        append_text_literal(&mut buf, "hello world");
        assert_eq!(buf, "'hello world'");
    }

    #[test]
    fn placeholders_inside_literals_are_kept() -> Result<(), DuckDbMiddlewareError> {
        let out = interpolate_params("SELECT '?' AS q, ?", &[RowValues::Int(7)])?;
        assert_eq!(out, "SELECT '?' AS q, 7");
        Ok(())
    }
}
