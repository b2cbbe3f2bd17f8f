use crate::error_message_from_ptr;
use anyhow::{Context, Error, Result};
use libsqlite3_sys::*;
use quill_core::{Value, truncate_long};
use rust_decimal::prelude::ToPrimitive;
use std::{
    ffi::{CStr, c_int},
    os::raw::{c_char, c_void},
};
use time::{format_description::BorrowedFormatItem, macros::format_description};

const DATE: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");
const TIME: &[BorrowedFormatItem<'_>] =
    format_description!("[hour]:[minute]:[second].[subsecond]");
const TIMESTAMP: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]");
const TIMESTAMP_WITH_TIMEZONE: &[BorrowedFormatItem<'_>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory]:[offset_minute]"
);

unsafe fn bind_text(statement: *mut sqlite3_stmt, index: c_int, v: &str) -> c_int {
    unsafe {
        sqlite3_bind_text(
            statement,
            index,
            v.as_ptr() as *const c_char,
            v.len() as c_int,
            SQLITE_TRANSIENT(),
        )
    }
}

fn out_of_bounds(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot bind {:?} into a sqlite integer because it's out of bounds",
        value
    ))
}

/// Binds `value` to the 1 based parameter `index`.
pub(crate) fn bind_value(statement: *mut sqlite3_stmt, index: c_int, value: &Value) -> Result<()> {
    unsafe {
        let rc = match value {
            v if v.is_null() => sqlite3_bind_null(statement, index),
            Value::Boolean(Some(v)) => sqlite3_bind_int(statement, index, *v as c_int),
            Value::Int8(Some(v)) => sqlite3_bind_int(statement, index, *v as c_int),
            Value::Int16(Some(v)) => sqlite3_bind_int(statement, index, *v as c_int),
            Value::Int32(Some(v)) => sqlite3_bind_int(statement, index, *v as c_int),
            Value::Int64(Some(v)) => sqlite3_bind_int64(statement, index, *v),
            Value::Int128(Some(v)) => sqlite3_bind_int64(
                statement,
                index,
                sqlite3_int64::try_from(*v).map_err(|_| out_of_bounds(value))?,
            ),
            Value::UInt8(Some(v)) => sqlite3_bind_int(statement, index, *v as c_int),
            Value::UInt16(Some(v)) => sqlite3_bind_int(statement, index, *v as c_int),
            Value::UInt32(Some(v)) => sqlite3_bind_int64(statement, index, *v as sqlite3_int64),
            Value::UInt64(Some(v)) => sqlite3_bind_int64(
                statement,
                index,
                sqlite3_int64::try_from(*v).map_err(|_| out_of_bounds(value))?,
            ),
            Value::UInt128(Some(v)) => sqlite3_bind_int64(
                statement,
                index,
                sqlite3_int64::try_from(*v).map_err(|_| out_of_bounds(value))?,
            ),
            Value::Float32(Some(v)) => sqlite3_bind_double(statement, index, *v as f64),
            Value::Float64(Some(v)) => sqlite3_bind_double(statement, index, *v),
            Value::Decimal(Some(v)) => sqlite3_bind_double(
                statement,
                index,
                v.to_f64().ok_or_else(|| {
                    Error::msg(format!("Cannot convert the Decimal value `{}` to f64", v))
                })?,
            ),
            Value::Varchar(Some(v)) => bind_text(statement, index, v),
            Value::Blob(Some(v)) => sqlite3_bind_blob(
                statement,
                index,
                v.as_ptr() as *const c_void,
                v.len() as c_int,
                SQLITE_TRANSIENT(),
            ),
            Value::Date(Some(v)) => bind_text(statement, index, &v.format(DATE)?),
            Value::Time(Some(v)) => bind_text(statement, index, &v.format(TIME)?),
            Value::Timestamp(Some(v)) => bind_text(statement, index, &v.format(TIMESTAMP)?),
            Value::TimestampWithTimezone(Some(v)) => {
                bind_text(statement, index, &v.format(TIMESTAMP_WITH_TIMEZONE)?)
            }
            Value::Uuid(Some(v)) => bind_text(statement, index, &v.to_string()),
            _ => {
                return Err(Error::msg(format!(
                    "Cannot use a {:?} as a query parameter",
                    value
                )));
            }
        };
        if rc != SQLITE_OK {
            let db = sqlite3_db_handle(statement);
            let query = sqlite3_sql(statement);
            return Err(
                Error::msg(error_message_from_ptr(&sqlite3_errmsg(db)).to_string()).context(
                    format!(
                        "Cannot bind parameter {} to query:\n{}",
                        index,
                        truncate_long!(CStr::from_ptr(query).to_string_lossy())
                    ),
                ),
            );
        }
        Ok(())
    }
}

/// Binds every argument in order, starting from parameter 1.
pub(crate) fn bind_arguments(statement: *mut sqlite3_stmt, arguments: &[Value]) -> Result<()> {
    for (i, value) in arguments.iter().enumerate() {
        let index = c_int::try_from(i + 1).context("Too many arguments for a sqlite statement")?;
        bind_value(statement, index, value)?;
    }
    Ok(())
}
