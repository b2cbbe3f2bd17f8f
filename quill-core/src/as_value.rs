use crate::{Value, truncate_long};
use anyhow::{Context, Error, Result};
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use std::{any, borrow::Cow};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, macros::format_description};
use uuid::Uuid;

/// Conversion between native Rust types and the dynamically typed [`Value`]
/// that backs bound arguments and decoded columns.
///
/// # Conversion contract
/// - `as_value` wraps `self` into its canonical variant without loss.
/// - `try_from_value` accepts the canonical variant and, where it is lossless,
///   neighbouring ones (narrower integers, integral decimals, text encodings
///   of dates and uuids as stored by backends without native types).
/// - Narrowing conversions are range checked, the error names both the
///   offending value and the target type.
///
/// # Examples
/// ```rust
/// use quill_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert!(matches!(v, Value::Int32(Some(42))));
/// let n: i64 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// The NULL value of this type.
    fn as_empty_value() -> Value;
    fn as_value(self) -> Value;
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

fn mismatch<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert {:?} to {}",
        value,
        any::type_name::<T>()
    ))
}

macro_rules! impl_as_value_integer {
    ($source:ty, $destination:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                #[allow(unreachable_patterns)]
                let converted = match &value {
                    $destination(Some(v)) => return Ok(*v),
                    Value::Int8(Some(v)) => <$source>::try_from(*v).ok(),
                    Value::Int16(Some(v)) => <$source>::try_from(*v).ok(),
                    Value::Int32(Some(v)) => <$source>::try_from(*v).ok(),
                    Value::Int64(Some(v)) => <$source>::try_from(*v).ok(),
                    Value::Int128(Some(v)) => <$source>::try_from(*v).ok(),
                    Value::UInt8(Some(v)) => <$source>::try_from(*v).ok(),
                    Value::UInt16(Some(v)) => <$source>::try_from(*v).ok(),
                    Value::UInt32(Some(v)) => <$source>::try_from(*v).ok(),
                    Value::UInt64(Some(v)) => <$source>::try_from(*v).ok(),
                    Value::UInt128(Some(v)) => <$source>::try_from(*v).ok(),
                    Value::Decimal(Some(v)) => {
                        if !v.is_integer() {
                            return Err(Error::msg(format!(
                                "Value {v}: Decimal is not an integer, cannot convert to {}",
                                any::type_name::<Self>()
                            )));
                        }
                        v.to_i128().and_then(|v| <$source>::try_from(v).ok())
                    }
                    _ => return Err(mismatch::<Self>(&value)),
                };
                converted.ok_or_else(|| {
                    Error::msg(format!(
                        "Value {} is out of range for {}",
                        value,
                        any::type_name::<Self>()
                    ))
                })
            }
        }
    };
}

impl_as_value_integer!(i8, Value::Int8);
impl_as_value_integer!(i16, Value::Int16);
impl_as_value_integer!(i32, Value::Int32);
impl_as_value_integer!(i64, Value::Int64);
impl_as_value_integer!(i128, Value::Int128);
impl_as_value_integer!(u8, Value::UInt8);
impl_as_value_integer!(u16, Value::UInt16);
impl_as_value_integer!(u32, Value::UInt32);
impl_as_value_integer!(u64, Value::UInt64);
impl_as_value_integer!(u128, Value::UInt128);

impl AsValue for bool {
    fn as_empty_value() -> Value {
        Value::Boolean(None)
    }
    fn as_value(self) -> Value {
        Value::Boolean(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) if v.eq_ignore_ascii_case("true") => Ok(true),
            Value::Varchar(Some(ref v)) if v.eq_ignore_ascii_case("false") => Ok(false),
            Value::Float32(..) | Value::Float64(..) | Value::Decimal(..) => {
                Err(mismatch::<Self>(&value))
            }
            _ => i128::try_from_value(value).map(|v| v != 0),
        }
    }
}

macro_rules! impl_as_value_float {
    ($source:ty, $destination:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    Value::Float32(Some(v)) => Ok(v as _),
                    Value::Float64(Some(v)) => Ok(v as _),
                    Value::Decimal(Some(v)) => v
                        .to_f64()
                        .map(|v| v as _)
                        .ok_or_else(|| mismatch::<Self>(&value)),
                    Value::Varchar(Some(ref v)) => v
                        .parse::<$source>()
                        .with_context(|| format!("Cannot parse `{}` as a float", truncate_long!(v))),
                    _ => i64::try_from_value(value).map(|v| v as _),
                }
            }
        }
    };
}

impl_as_value_float!(f32, Value::Float32);
impl_as_value_float!(f64, Value::Float64);

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(Some(v)) => Ok(v),
            Value::Float32(Some(v)) => {
                Decimal::from_f32(v).ok_or_else(|| mismatch::<Self>(&value))
            }
            Value::Float64(Some(v)) => {
                Decimal::from_f64(v).ok_or_else(|| mismatch::<Self>(&value))
            }
            Value::Varchar(Some(ref v)) => v
                .parse::<Decimal>()
                .with_context(|| format!("Cannot parse `{}` as a decimal", truncate_long!(v))),
            _ => i128::try_from_value(value)
                .and_then(|v| Decimal::from_i128(v).context("Integer does not fit a decimal")),
        }
    }
}

impl AsValue for String {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) => Ok(v),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Cow<'static, str> {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self.into_owned()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        String::try_from_value(value).map(Into::into)
    }
}

impl AsValue for Box<[u8]> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(Some(v)) => Ok(v),
            Value::Varchar(Some(v)) => Ok(v.into_bytes().into_boxed_slice()),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Vec<u8> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self.into_boxed_slice()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Box::<[u8]>::try_from_value(value).map(Into::into)
    }
}

impl AsValue for Uuid {
    fn as_empty_value() -> Value {
        Value::Uuid(None)
    }
    fn as_value(self) -> Value {
        Value::Uuid(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) => Uuid::parse_str(v)
                .with_context(|| format!("Cannot parse `{}` as a uuid", truncate_long!(v))),
            Value::Blob(Some(ref v)) => {
                Uuid::from_slice(v).context("Blob is not a 16 bytes uuid")
            }
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

macro_rules! parse_time {
    ($type:ty, $value:expr, $($formats:tt),+ $(,)?) => {{
        let value: &str = $value;
        let mut result = None;
        for format in [$(format_description!($formats),)+] {
            if let Ok(parsed) = <$type>::parse(value, format) {
                result = Some(parsed);
                break;
            }
        }
        result.ok_or_else(|| {
            Error::msg(format!(
                "Cannot parse `{}` as {}",
                truncate_long!(value),
                any::type_name::<$type>()
            ))
        })
    }};
}

impl AsValue for Date {
    fn as_empty_value() -> Value {
        Value::Date(None)
    }
    fn as_value(self) -> Value {
        Value::Date(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Date(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.date()),
            Value::Varchar(Some(ref v)) => parse_time!(Date, v, "[year]-[month]-[day]"),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Time {
    fn as_empty_value() -> Value {
        Value::Time(None)
    }
    fn as_value(self) -> Value {
        Value::Time(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Time(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) => parse_time!(
                Time,
                v,
                "[hour]:[minute]:[second].[subsecond]",
                "[hour]:[minute]:[second]",
                "[hour]:[minute]",
            ),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for PrimitiveDateTime {
    fn as_empty_value() -> Value {
        Value::Timestamp(None)
    }
    fn as_value(self) -> Value {
        Value::Timestamp(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) => parse_time!(
                PrimitiveDateTime,
                v,
                "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]",
                "[year]-[month]-[day]T[hour]:[minute]:[second]",
                "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]",
                "[year]-[month]-[day] [hour]:[minute]:[second]",
            ),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for OffsetDateTime {
    fn as_empty_value() -> Value {
        Value::TimestampWithTimezone(None)
    }
    fn as_value(self) -> Value {
        Value::TimestampWithTimezone(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::TimestampWithTimezone(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.assume_utc()),
            Value::Varchar(Some(v)) => parse_time!(
                OffsetDateTime,
                &v,
                "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory]:[offset_minute]",
                "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]",
                "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory]:[offset_minute]",
                "[year]-[month]-[day] [hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]",
            )
            .or_else(|_| {
                PrimitiveDateTime::try_from_value(Value::Varchar(Some(v))).map(|v| v.assume_utc())
            }),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        T::try_from_value(value).map(Some)
    }
}

impl<T: AsValue> AsValue for Box<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        (*self).as_value()
    }
    fn try_from_value(value: Value) -> Result<Self> {
        T::try_from_value(value).map(Box::new)
    }
}
