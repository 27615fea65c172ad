//! Owners for the raw DuckDB C handles.
//!
//! Every handle is released in `Drop`, so each one is freed exactly once. Higher layers
//! express "close" by taking the owner out of an `Option` and dropping it.
#![allow(unsafe_code)]

use std::ffi::{CStr, CString, c_char, c_void};
use std::ptr;

use ::duckdb::ffi;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::DuckDbMiddlewareError;
use crate::types::NativeType;

fn c_string(what: &str, value: &str) -> Result<CString, DuckDbMiddlewareError> {
    CString::new(value).map_err(|_| {
        DuckDbMiddlewareError::ParameterError(format!("{what} contains an interior NUL byte"))
    })
}

/// Copy a borrowed engine string. Null yields `fallback`.
unsafe fn borrowed_message(p: *const c_char, fallback: &str) -> String {
    if p.is_null() {
        return fallback.to_string();
    }
    unsafe { CStr::from_ptr(p) }.to_string_lossy().into_owned()
}

pub(crate) fn native_type(tag: ffi::duckdb_type) -> NativeType {
    match tag {
        ffi::DUCKDB_TYPE_DUCKDB_TYPE_BOOLEAN => NativeType::Boolean,
        ffi::DUCKDB_TYPE_DUCKDB_TYPE_TINYINT => NativeType::TinyInt,
        ffi::DUCKDB_TYPE_DUCKDB_TYPE_SMALLINT => NativeType::SmallInt,
        ffi::DUCKDB_TYPE_DUCKDB_TYPE_INTEGER => NativeType::Integer,
        ffi::DUCKDB_TYPE_DUCKDB_TYPE_BIGINT => NativeType::BigInt,
        ffi::DUCKDB_TYPE_DUCKDB_TYPE_FLOAT => NativeType::Float,
        ffi::DUCKDB_TYPE_DUCKDB_TYPE_DOUBLE => NativeType::Double,
        ffi::DUCKDB_TYPE_DUCKDB_TYPE_DATE => NativeType::Date,
        ffi::DUCKDB_TYPE_DUCKDB_TYPE_TIMESTAMP => NativeType::Timestamp,
        ffi::DUCKDB_TYPE_DUCKDB_TYPE_VARCHAR => NativeType::Varchar,
        other => NativeType::Unsupported(other as u32),
    }
}

// -------------------------- config --------------------------

pub(crate) struct NativeConfig {
    raw: ffi::duckdb_config,
}

impl NativeConfig {
    pub(crate) fn new() -> Result<Self, DuckDbMiddlewareError> {
        let mut raw: ffi::duckdb_config = ptr::null_mut();
        let rc = unsafe { ffi::duckdb_create_config(&mut raw) };
        if rc != ffi::DuckDBSuccess || raw.is_null() {
            return Err(DuckDbMiddlewareError::ConfigError(
                "could not create database configuration".into(),
            ));
        }
        Ok(Self { raw })
    }

    pub(crate) fn set(&mut self, flag: &str, value: &str) -> Result<(), DuckDbMiddlewareError> {
        let c_flag = c_string("config flag", flag)?;
        let c_value = c_string("config value", value)?;
        let rc = unsafe { ffi::duckdb_set_config(self.raw, c_flag.as_ptr(), c_value.as_ptr()) };
        if rc != ffi::DuckDBSuccess {
            return Err(DuckDbMiddlewareError::ConfigError(format!(
                "engine rejected {flag}={value}"
            )));
        }
        Ok(())
    }
}

impl Drop for NativeConfig {
    fn drop(&mut self) {
        unsafe { ffi::duckdb_destroy_config(&mut self.raw) };
    }
}

// -------------------------- database --------------------------

pub(crate) struct NativeDatabase {
    raw: ffi::duckdb_database,
}

// The engine database object is internally synchronized.
unsafe impl Send for NativeDatabase {}

impl NativeDatabase {
    /// Open `path`; an empty path opens an in-memory database.
    pub(crate) fn open(path: &str, config: &NativeConfig) -> Result<Self, DuckDbMiddlewareError> {
        let c_path = if path.is_empty() {
            None
        } else {
            Some(c_string("database path", path)?)
        };
        let path_ptr = c_path.as_ref().map_or(ptr::null(), |p| p.as_ptr());

        let mut raw: ffi::duckdb_database = ptr::null_mut();
        let mut err: *mut c_char = ptr::null_mut();
        let rc = unsafe { ffi::duckdb_open_ext(path_ptr, &mut raw, config.raw, &mut err) };

        let message = unsafe { borrowed_message(err, "unknown error") };
        if !err.is_null() {
            unsafe { ffi::duckdb_free(err.cast::<c_void>()) };
        }
        if rc != ffi::DuckDBSuccess || raw.is_null() {
            return Err(DuckDbMiddlewareError::ConnectionError(format!(
                "could not open database: {message}"
            )));
        }
        Ok(Self { raw })
    }
}

impl Drop for NativeDatabase {
    fn drop(&mut self) {
        unsafe { ffi::duckdb_close(&mut self.raw) };
    }
}

// -------------------------- connection --------------------------

pub(crate) struct NativeConnection {
    raw: ffi::duckdb_connection,
}

// Access is serialized by the owning `DuckDbConnection`'s mutex.
unsafe impl Send for NativeConnection {}

impl NativeConnection {
    pub(crate) fn connect(db: &NativeDatabase) -> Result<Self, DuckDbMiddlewareError> {
        let mut raw: ffi::duckdb_connection = ptr::null_mut();
        let rc = unsafe { ffi::duckdb_connect(db.raw, &mut raw) };
        if rc != ffi::DuckDBSuccess || raw.is_null() {
            return Err(DuckDbMiddlewareError::ConnectionError(
                "could not connect to database".into(),
            ));
        }
        Ok(Self { raw })
    }

    /// Run one self-contained statement.
    pub(crate) fn query(&self, sql: &str) -> Result<NativeResult, DuckDbMiddlewareError> {
        let c_sql = c_string("query", sql)?;
        let mut result = NativeResult::empty();
        let rc = unsafe { ffi::duckdb_query(self.raw, c_sql.as_ptr(), result.as_mut_ptr()) };
        if rc != ffi::DuckDBSuccess {
            return Err(result.into_error());
        }
        Ok(result)
    }

    pub(crate) fn prepare(&self, sql: &str) -> Result<NativePrepared, DuckDbMiddlewareError> {
        let c_sql = c_string("query", sql)?;
        let mut raw: ffi::duckdb_prepared_statement = ptr::null_mut();
        let rc = unsafe { ffi::duckdb_prepare(self.raw, c_sql.as_ptr(), &mut raw) };
        // The engine allocates a handle even on failure; wrap it first so it is released.
        let prepared = NativePrepared { raw };
        if rc != ffi::DuckDBSuccess {
            let message = if prepared.raw.is_null() {
                "could not prepare statement".to_string()
            } else {
                unsafe {
                    borrowed_message(
                        ffi::duckdb_prepare_error(prepared.raw),
                        "could not prepare statement",
                    )
                }
            };
            return Err(DuckDbMiddlewareError::ExecutionError(message));
        }
        Ok(prepared)
    }
}

impl Drop for NativeConnection {
    fn drop(&mut self) {
        unsafe { ffi::duckdb_disconnect(&mut self.raw) };
    }
}

// -------------------------- prepared statement --------------------------

pub(crate) struct NativePrepared {
    raw: ffi::duckdb_prepared_statement,
}

// Access is serialized by the owning `DuckDbStatement`'s mutex.
unsafe impl Send for NativePrepared {}

impl NativePrepared {
    pub(crate) fn param_count(&self) -> usize {
        if self.raw.is_null() {
            return 0;
        }
        let n = unsafe { ffi::duckdb_nparams(self.raw) };
        usize::try_from(n).unwrap_or(usize::MAX)
    }

    fn bound(rc: ffi::duckdb_state) -> Result<(), DuckDbMiddlewareError> {
        if rc == ffi::DuckDBSuccess {
            Ok(())
        } else {
            Err(DuckDbMiddlewareError::CouldNotBind)
        }
    }

    pub(crate) fn bind_bool(&mut self, idx: u64, v: bool) -> Result<(), DuckDbMiddlewareError> {
        Self::bound(unsafe { ffi::duckdb_bind_boolean(self.raw, idx, v) })
    }

    pub(crate) fn bind_i8(&mut self, idx: u64, v: i8) -> Result<(), DuckDbMiddlewareError> {
        Self::bound(unsafe { ffi::duckdb_bind_int8(self.raw, idx, v) })
    }

    pub(crate) fn bind_i16(&mut self, idx: u64, v: i16) -> Result<(), DuckDbMiddlewareError> {
        Self::bound(unsafe { ffi::duckdb_bind_int16(self.raw, idx, v) })
    }

    pub(crate) fn bind_i32(&mut self, idx: u64, v: i32) -> Result<(), DuckDbMiddlewareError> {
        Self::bound(unsafe { ffi::duckdb_bind_int32(self.raw, idx, v) })
    }

    pub(crate) fn bind_i64(&mut self, idx: u64, v: i64) -> Result<(), DuckDbMiddlewareError> {
        Self::bound(unsafe { ffi::duckdb_bind_int64(self.raw, idx, v) })
    }

    pub(crate) fn bind_f64(&mut self, idx: u64, v: f64) -> Result<(), DuckDbMiddlewareError> {
        Self::bound(unsafe { ffi::duckdb_bind_double(self.raw, idx, v) })
    }

    pub(crate) fn bind_timestamp_micros(
        &mut self,
        idx: u64,
        micros: i64,
    ) -> Result<(), DuckDbMiddlewareError> {
        let ts = ffi::duckdb_timestamp { micros };
        Self::bound(unsafe { ffi::duckdb_bind_timestamp(self.raw, idx, ts) })
    }

    /// The C string only lives for the duration of the call.
    pub(crate) fn bind_varchar(&mut self, idx: u64, v: &str) -> Result<(), DuckDbMiddlewareError> {
        let c_value = CString::new(v).map_err(|_| DuckDbMiddlewareError::CouldNotBind)?;
        let rc = unsafe { ffi::duckdb_bind_varchar(self.raw, idx, c_value.as_ptr()) };
        drop(c_value);
        Self::bound(rc)
    }

    pub(crate) fn execute(&mut self) -> Result<NativeResult, DuckDbMiddlewareError> {
        let mut result = NativeResult::empty();
        let rc = unsafe { ffi::duckdb_execute_prepared(self.raw, result.as_mut_ptr()) };
        if rc != ffi::DuckDBSuccess {
            return Err(result.into_error());
        }
        Ok(result)
    }
}

impl Drop for NativePrepared {
    fn drop(&mut self) {
        if !self.raw.is_null() {
            unsafe { ffi::duckdb_destroy_prepare(&mut self.raw) };
        }
    }
}

// -------------------------- result --------------------------

/// Plain-old-data cell types that can be read straight out of a column buffer.
pub(crate) trait NativeScalar: Copy {}

impl NativeScalar for u8 {}
impl NativeScalar for i8 {}
impl NativeScalar for i16 {}
impl NativeScalar for i32 {}
impl NativeScalar for i64 {}
impl NativeScalar for f32 {}
impl NativeScalar for f64 {}
impl NativeScalar for *const c_char {}

/// A materialized, column-major result. Boxed so the engine struct never moves.
pub(crate) struct NativeResult {
    raw: Box<ffi::duckdb_result>,
}

// Owned exclusively by one cursor at a time.
unsafe impl Send for NativeResult {}

impl NativeResult {
    fn empty() -> Self {
        // All-zero is the documented "not yet filled" state of a duckdb_result.
        Self {
            raw: Box::new(unsafe { std::mem::zeroed() }),
        }
    }

    fn as_mut_ptr(&mut self) -> *mut ffi::duckdb_result {
        &mut *self.raw
    }

    /// Take the engine's error text; the result is still destroyed by `Drop`.
    fn into_error(mut self) -> DuckDbMiddlewareError {
        let message = unsafe {
            borrowed_message(
                ffi::duckdb_result_error(self.as_mut_ptr()),
                "unknown engine error",
            )
        };
        DuckDbMiddlewareError::ExecutionError(message)
    }

    pub(crate) fn column_count(&mut self) -> usize {
        let n = unsafe { ffi::duckdb_column_count(self.as_mut_ptr()) };
        usize::try_from(n).unwrap_or(0)
    }

    pub(crate) fn row_count(&mut self) -> usize {
        let n = unsafe { ffi::duckdb_row_count(self.as_mut_ptr()) };
        usize::try_from(n).unwrap_or(0)
    }

    pub(crate) fn rows_changed(&mut self) -> usize {
        let n = unsafe { ffi::duckdb_rows_changed(self.as_mut_ptr()) };
        usize::try_from(n).unwrap_or(0)
    }

    pub(crate) fn column_name(&mut self, col: usize) -> String {
        let p = unsafe { ffi::duckdb_column_name(self.as_mut_ptr(), col as u64) };
        unsafe { borrowed_message(p, "") }
    }

    pub(crate) fn column_type(&mut self, col: usize) -> NativeType {
        native_type(unsafe { ffi::duckdb_column_type(self.as_mut_ptr(), col as u64) })
    }

    /// Column `col` viewed as exactly `row_count` values of `T`; `None` when the engine
    /// has no buffer for it.
    fn column<T: NativeScalar>(&mut self, col: usize) -> Option<&[T]> {
        let rows = self.row_count();
        let data = unsafe { ffi::duckdb_column_data(self.as_mut_ptr(), col as u64) };
        if data.is_null() {
            return None;
        }
        Some(unsafe { std::slice::from_raw_parts(data.cast::<T>().cast_const(), rows) })
    }

    /// Read one cell. Panics if `row` is past the end of the buffer.
    pub(crate) fn cell<T: NativeScalar>(
        &mut self,
        col: usize,
        row: usize,
    ) -> Result<T, DuckDbMiddlewareError> {
        let rows = self.row_count();
        assert!(row < rows, "row offset {row} out of bounds for {rows} rows");
        let column = self.column::<T>(col).ok_or_else(|| {
            DuckDbMiddlewareError::ExecutionError(format!("no data buffer for column {col}"))
        })?;
        Ok(column[row])
    }

    pub(crate) fn is_null(&mut self, col: usize, row: usize) -> bool {
        let rows = self.row_count();
        assert!(row < rows, "row offset {row} out of bounds for {rows} rows");
        let mask = unsafe { ffi::duckdb_nullmask_data(self.as_mut_ptr(), col as u64) };
        if mask.is_null() {
            return false;
        }
        let mask = unsafe { std::slice::from_raw_parts(mask.cast::<u8>().cast_const(), rows) };
        mask[row] != 0
    }

    pub(crate) fn bool_cell(&mut self, col: usize, row: usize) -> Result<bool, DuckDbMiddlewareError> {
        self.cell::<u8>(col, row).map(|b| b != 0)
    }

    pub(crate) fn varchar_cell(
        &mut self,
        col: usize,
        row: usize,
    ) -> Result<String, DuckDbMiddlewareError> {
        let p = self.cell::<*const c_char>(col, row)?;
        Ok(unsafe { borrowed_message(p, "") })
    }

    /// DATE cells hold days since 1970-01-01; decoded to midnight.
    pub(crate) fn date_cell(
        &mut self,
        col: usize,
        row: usize,
    ) -> Result<NaiveDateTime, DuckDbMiddlewareError> {
        let days = self.cell::<i32>(col, row)?;
        NaiveDate::from_ymd_opt(1970, 1, 1)
            .and_then(|epoch| epoch.checked_add_signed(chrono::Duration::days(i64::from(days))))
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .ok_or_else(|| {
                DuckDbMiddlewareError::ExecutionError(format!("date out of range: {days} days"))
            })
    }

    /// TIMESTAMP cells hold microseconds since the Unix epoch, UTC.
    pub(crate) fn timestamp_cell(
        &mut self,
        col: usize,
        row: usize,
    ) -> Result<NaiveDateTime, DuckDbMiddlewareError> {
        let micros = self.cell::<i64>(col, row)?;
        DateTime::from_timestamp_micros(micros)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| {
                DuckDbMiddlewareError::ExecutionError(format!(
                    "timestamp out of range: {micros} us"
                ))
            })
    }
}

impl Drop for NativeResult {
    fn drop(&mut self) {
        unsafe { ffi::duckdb_destroy_result(self.as_mut_ptr()) };
    }
}
