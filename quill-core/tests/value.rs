#[cfg(test)]
mod tests {
    use quill_core::{AsValue, Value};
    use rust_decimal::Decimal;
    use std::borrow::Cow;
    use time::macros::{date, datetime, time};
    use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
    use uuid::Uuid;

    #[test]
    fn value_none() {
        assert_eq!(Value::Null, Value::Null);
        assert_ne!(Value::Float32(Some(1.0)), Value::Null);
        assert!(Value::Null.is_null());
        assert!(Value::Int32(None).is_null());
        assert!(!Value::Int32(Some(0)).is_null());
        assert!(Value::Int32(None).same_type(&Value::Int32(Some(1))));
        assert!(!Value::Int32(None).same_type(&Value::Int64(None)));
        assert_eq!(Value::Varchar(None).to_string(), "NULL");
    }

    #[test]
    fn value_bool() {
        let val: Value = true.into();
        assert_eq!(val, Value::Boolean(Some(true)));
        assert_ne!(val, Value::Boolean(Some(false)));
        assert_ne!(val, Value::Boolean(None));
        assert_eq!(bool::try_from_value(val).unwrap(), true);
        assert_eq!(bool::try_from_value(1i8.into()).unwrap(), true);
        assert_eq!(bool::try_from_value(0i64.into()).unwrap(), false);
        assert_eq!(bool::try_from_value(2u128.into()).unwrap(), true);
        assert_eq!(bool::try_from_value("TRUE".into()).unwrap(), true);
        assert!(matches!(bool::try_from_value(0.5f32.into()), Err(..)));
        assert!(matches!(bool::try_from_value("yes".into()), Err(..)));
    }

    #[test]
    fn value_integers() {
        assert_eq!(42i32.as_value(), Value::Int32(Some(42)));
        assert_eq!(7u16.as_value(), Value::UInt16(Some(7)));
        assert_eq!(i8::try_from_value(Value::Int64(Some(-128))).unwrap(), -128);
        assert_eq!(u64::try_from_value(Value::Int32(Some(5))).unwrap(), 5);
        assert_eq!(
            i128::try_from_value(Value::UInt64(Some(u64::MAX))).unwrap(),
            u64::MAX as i128
        );
        assert_eq!(i32::try_from_value(Decimal::new(1200, 2).into()).unwrap(), 12);

        let error = i8::try_from_value(Value::Int64(Some(300))).unwrap_err();
        assert!(error.to_string().contains("300"));
        assert!(error.to_string().contains("i8"));
        assert!(u32::try_from_value(Value::Int32(Some(-1))).is_err());
        assert!(i32::try_from_value(Decimal::new(125, 1).into()).is_err());
        assert!(i32::try_from_value(Value::Float64(Some(1.0))).is_err());
        assert!(i32::try_from_value(Value::Int32(None)).is_err());
    }

    #[test]
    fn value_floats() {
        assert_eq!(0.25f64.as_value(), Value::Float64(Some(0.25)));
        assert_eq!(f64::try_from_value(Value::Float32(Some(0.5))).unwrap(), 0.5);
        assert_eq!(f32::try_from_value(Value::Int64(Some(3))).unwrap(), 3.0);
        assert_eq!(f64::try_from_value("1.5".into()).unwrap(), 1.5);
        assert_eq!(
            f64::try_from_value(Decimal::new(375, 2).into()).unwrap(),
            3.75
        );
        assert!(f64::try_from_value("one".into()).is_err());
    }

    #[test]
    fn value_decimal() {
        let value = Decimal::new(31415, 4);
        assert_eq!(value.as_value(), Value::Decimal(Some(value)));
        assert_eq!(Decimal::try_from_value("3.1415".into()).unwrap(), value);
        assert_eq!(
            Decimal::try_from_value(Value::Int64(Some(12))).unwrap(),
            Decimal::new(12, 0)
        );
        assert_eq!(
            Decimal::try_from_value(Value::Float64(Some(0.5))).unwrap(),
            Decimal::new(5, 1)
        );
        assert!(Decimal::try_from_value(Value::Float64(Some(f64::NAN))).is_err());
    }

    #[test]
    fn value_text_and_blob() {
        let val: Value = "hello".into();
        assert_eq!(val, Value::Varchar(Some("hello".into())));
        assert_eq!(val.to_string(), "'hello'");
        assert_eq!(String::try_from_value(val.clone()).unwrap(), "hello");
        assert_eq!(
            Cow::<'static, str>::try_from_value(val.clone()).unwrap(),
            "hello"
        );
        assert_eq!(Vec::<u8>::try_from_value(val).unwrap(), b"hello");
        assert!(String::try_from_value(Value::Int32(Some(1))).is_err());

        let val = vec![1u8, 2, 3].as_value();
        assert_eq!(val, Value::Blob(Some([1, 2, 3].into())));
        assert_eq!(val.to_string(), "<3 bytes>");
        assert_eq!(Box::<[u8]>::try_from_value(val).unwrap().len(), 3);
    }

    #[test]
    fn value_uuid() {
        let uuid = Uuid::parse_str("5e915574-bb30-4430-98cf-c5854f61fbbd").unwrap();
        assert_eq!(uuid.as_value(), Value::Uuid(Some(uuid)));
        assert_eq!(
            Uuid::try_from_value("5e915574-bb30-4430-98cf-c5854f61fbbd".into()).unwrap(),
            uuid
        );
        assert_eq!(
            Uuid::try_from_value(uuid.as_bytes().to_vec().into()).unwrap(),
            uuid
        );
        assert!(Uuid::try_from_value(vec![1u8, 2].into()).is_err());
        assert!(Uuid::try_from_value("not a uuid".into()).is_err());
    }

    #[test]
    fn value_time() {
        assert_eq!(
            Date::try_from_value("2025-01-31".into()).unwrap(),
            date!(2025 - 01 - 31)
        );
        assert_eq!(
            Date::try_from_value(datetime!(2025-07-15 10:30:00).into()).unwrap(),
            date!(2025 - 07 - 15)
        );
        assert_eq!(
            Time::try_from_value("12:00:10".into()).unwrap(),
            time!(12:00:10)
        );
        assert_eq!(
            Time::try_from_value("12:00:10.5".into()).unwrap(),
            time!(12:00:10.5)
        );
        assert_eq!(Time::try_from_value("08:15".into()).unwrap(), time!(08:15));
        assert_eq!(
            PrimitiveDateTime::try_from_value("2025-07-15 10:30:00".into()).unwrap(),
            datetime!(2025-07-15 10:30:00)
        );
        assert_eq!(
            PrimitiveDateTime::try_from_value("2025-07-15T10:30:00.25".into()).unwrap(),
            datetime!(2025-07-15 10:30:00.25)
        );
        assert_eq!(
            OffsetDateTime::try_from_value("2025-07-15 10:30:00+02:00".into()).unwrap(),
            datetime!(2025-07-15 10:30:00 +2)
        );
        assert_eq!(
            OffsetDateTime::try_from_value("2025-07-15 10:30:00".into()).unwrap(),
            datetime!(2025-07-15 10:30:00 UTC)
        );
        assert!(Date::try_from_value("31/01/2025".into()).is_err());
        assert!(Time::try_from_value(Value::Int32(Some(1))).is_err());
    }

    #[test]
    fn value_option() {
        assert_eq!(Some(5i16).as_value(), Value::Int16(Some(5)));
        assert_eq!(None::<i16>.as_value(), Value::Int16(None));
        assert_eq!(None::<String>.as_value(), Value::Varchar(None));
        assert_eq!(Option::<i32>::try_from_value(Value::Null).unwrap(), None);
        assert_eq!(
            Option::<i32>::try_from_value(Value::Varchar(None)).unwrap(),
            None
        );
        assert_eq!(
            Option::<i32>::try_from_value(Value::Int64(Some(9))).unwrap(),
            Some(9)
        );
        assert!(Option::<i8>::try_from_value(Value::Int64(Some(900))).is_err());
        assert_eq!(*Box::<i64>::try_from_value(3i32.into()).unwrap(), 3);
    }
}
