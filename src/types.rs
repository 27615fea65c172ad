use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Values that can be used as statement parameters or decoded from a result row.
///
/// The same enum is used in both directions so helper code does not need to branch on
/// engine types:
/// ```rust
/// use duckdb_middleware::prelude::*;
///
/// let params = vec![
///     RowValues::Int(1),
///     RowValues::Text("alice".into()),
///     RowValues::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RowValues {
    /// NULL value
    Null,
    /// BOOLEAN
    Bool(bool),
    /// TINYINT (8-bit)
    TinyInt(i8),
    /// SMALLINT (16-bit)
    SmallInt(i16),
    /// INTEGER (32-bit)
    Int(i32),
    /// BIGINT (64-bit)
    BigInt(i64),
    /// FLOAT (32-bit). Decoded from results; has no typed-bind rule.
    Float(f32),
    /// DOUBLE (64-bit)
    Double(f64),
    /// Calendar timestamp, always interpreted as UTC. DATE columns decode to midnight.
    Timestamp(NaiveDateTime),
    /// VARCHAR
    Text(String),
    /// Binary data. Neither bindable nor interpolatable.
    Blob(Vec<u8>),
}

impl RowValues {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Any integer variant widened to `i64`.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            RowValues::TinyInt(v) => Some(i64::from(*v)),
            RowValues::SmallInt(v) => Some(i64::from(*v)),
            RowValues::Int(v) => Some(i64::from(*v)),
            RowValues::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        if let RowValues::Bool(value) = self {
            return Some(*value);
        }
        match self.as_int() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        }
    }

    /// Either float variant widened to `f64`.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            RowValues::Float(v) => Some(f64::from(*v)),
            RowValues::Double(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let RowValues::Timestamp(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            // Try "YYYY-MM-DD HH:MM:SS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(dt);
            }
            // Try "YYYY-MM-DD HH:MM:SS.ffffff"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
                return Some(dt);
            }
        }
        None
    }

    /// Calendar date of a timestamp value.
    #[must_use]
    pub fn as_date(&self) -> Option<NaiveDate> {
        self.as_timestamp().map(|ts| ts.date())
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let RowValues::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Short name of the variant, used in skip diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            RowValues::Null => "null",
            RowValues::Bool(_) => "bool",
            RowValues::TinyInt(_) => "int8",
            RowValues::SmallInt(_) => "int16",
            RowValues::Int(_) => "int32",
            RowValues::BigInt(_) => "int64",
            RowValues::Float(_) => "float32",
            RowValues::Double(_) => "float64",
            RowValues::Timestamp(_) => "timestamp",
            RowValues::Text(_) => "text",
            RowValues::Blob(_) => "blob",
        }
    }
}

/// Host type a column decodes into, for generic scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Timestamp,
    Text,
}

/// Column types this adapter knows how to decode, keyed by the engine's type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeType {
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Double,
    Date,
    Timestamp,
    Varchar,
    /// Any other engine tag, kept verbatim for diagnostics.
    Unsupported(u32),
}

impl NativeType {
    #[must_use]
    pub fn scan_type(self) -> Option<ScanType> {
        match self {
            NativeType::Boolean => Some(ScanType::Bool),
            NativeType::TinyInt => Some(ScanType::Int8),
            NativeType::SmallInt => Some(ScanType::Int16),
            NativeType::Integer => Some(ScanType::Int32),
            NativeType::BigInt => Some(ScanType::Int64),
            NativeType::Float => Some(ScanType::Float32),
            NativeType::Double => Some(ScanType::Float64),
            NativeType::Date | NativeType::Timestamp => Some(ScanType::Timestamp),
            NativeType::Varchar => Some(ScanType::Text),
            NativeType::Unsupported(_) => None,
        }
    }

    /// Engine type name for diagnostics; empty for unsupported tags.
    #[must_use]
    pub fn database_type_name(self) -> &'static str {
        match self {
            NativeType::Boolean => "BOOLEAN",
            NativeType::TinyInt => "TINYINT",
            NativeType::SmallInt => "SMALLINT",
            NativeType::Integer => "INT",
            NativeType::BigInt => "BIGINT",
            NativeType::Float => "FLOAT",
            NativeType::Double => "DOUBLE",
            NativeType::Date => "DATE",
            NativeType::Timestamp => "TIMESTAMP",
            NativeType::Varchar => "VARCHAR",
            NativeType::Unsupported(_) => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_accessors_widen() {
        assert_eq!(RowValues::TinyInt(-3).as_int(), Some(-3));
        assert_eq!(RowValues::Int(70).as_int(), Some(70));
        assert_eq!(RowValues::Text("70".into()).as_int(), None);
        assert_eq!(RowValues::BigInt(1).as_bool(), Some(true));
        assert_eq!(RowValues::Float(1.5).as_float(), Some(1.5));
    }

    #[test]
    fn timestamp_from_text() {
        let parsed = RowValues::Text("2021-09-20 11:39:00".into()).as_timestamp();
        let expected = NaiveDate::from_ymd_opt(2021, 9, 20)
            .and_then(|d| d.and_hms_opt(11, 39, 0));
        assert_eq!(parsed, expected);
    }

    #[test]
    fn type_table_is_consistent() {
        assert_eq!(NativeType::Date.scan_type(), Some(ScanType::Timestamp));
        assert_eq!(NativeType::Integer.database_type_name(), "INT");
        assert_eq!(NativeType::Unsupported(27).scan_type(), None);
        assert_eq!(NativeType::Unsupported(27).database_type_name(), "");
    }
}
