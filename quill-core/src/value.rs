use rust_decimal::Decimal;
use std::fmt::{self, Display};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Dynamically typed value crossing the driver boundary.
///
/// Every variant but `Null` carries an `Option` so that a typed NULL (for
/// example an absent `Option<i32>`) keeps its type information for drivers
/// that care about it.
#[derive(Default, Debug, Clone, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int8(Option<i8>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    Int128(Option<i128>),
    UInt8(Option<u8>),
    UInt16(Option<u16>),
    UInt32(Option<u32>),
    UInt64(Option<u64>),
    UInt128(Option<u128>),
    Float32(Option<f32>),
    Float64(Option<f64>),
    Decimal(Option<Decimal>),
    Varchar(Option<String>),
    Blob(Option<Box<[u8]>>),
    Date(Option<Date>),
    Time(Option<Time>),
    Timestamp(Option<PrimitiveDateTime>),
    TimestampWithTimezone(Option<OffsetDateTime>),
    Uuid(Option<Uuid>),
}

impl Value {
    pub fn same_type(&self, other: &Self) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }

    pub fn is_null(&self) -> bool {
        match self {
            Value::Null
            | Value::Boolean(None)
            | Value::Int8(None)
            | Value::Int16(None)
            | Value::Int32(None)
            | Value::Int64(None)
            | Value::Int128(None)
            | Value::UInt8(None)
            | Value::UInt16(None)
            | Value::UInt32(None)
            | Value::UInt64(None)
            | Value::UInt128(None)
            | Value::Float32(None)
            | Value::Float64(None)
            | Value::Decimal(None)
            | Value::Varchar(None)
            | Value::Blob(None)
            | Value::Date(None)
            | Value::Time(None)
            | Value::Timestamp(None)
            | Value::TimestampWithTimezone(None)
            | Value::Uuid(None) => true,
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("NULL");
        }
        match self {
            Value::Boolean(Some(v)) => v.fmt(f),
            Value::Int8(Some(v)) => v.fmt(f),
            Value::Int16(Some(v)) => v.fmt(f),
            Value::Int32(Some(v)) => v.fmt(f),
            Value::Int64(Some(v)) => v.fmt(f),
            Value::Int128(Some(v)) => v.fmt(f),
            Value::UInt8(Some(v)) => v.fmt(f),
            Value::UInt16(Some(v)) => v.fmt(f),
            Value::UInt32(Some(v)) => v.fmt(f),
            Value::UInt64(Some(v)) => v.fmt(f),
            Value::UInt128(Some(v)) => v.fmt(f),
            Value::Float32(Some(v)) => v.fmt(f),
            Value::Float64(Some(v)) => v.fmt(f),
            Value::Decimal(Some(v)) => v.fmt(f),
            Value::Varchar(Some(v)) => write!(f, "'{}'", v),
            Value::Blob(Some(v)) => write!(f, "<{} bytes>", v.len()),
            Value::Date(Some(v)) => v.fmt(f),
            Value::Time(Some(v)) => v.fmt(f),
            Value::Timestamp(Some(v)) => v.fmt(f),
            Value::TimestampWithTimezone(Some(v)) => v.fmt(f),
            Value::Uuid(Some(v)) => v.fmt(f),
            _ => f.write_str("NULL"),
        }
    }
}
