//! Property-based tests for field type round trips.
//!
//! Every scalar field type must satisfy `deserialize(serialize(x)) == x` and
//! the same for terms: whatever the application writes, reading the wire form
//! back yields the original value.

use chrono::DateTime;
use proptest::prelude::*;
use searchlayer_core::types::{
    BooleanType, ByteType, DateTimeType, DoubleType, FieldType, FloatType, IntType, KeywordType,
    LongType, ShortType,
};

fn finite_f64() -> impl Strategy<Value = f64> {
    any::<f64>().prop_filter("wire numbers are finite", |x| x.is_finite())
}

fn finite_f32() -> impl Strategy<Value = f32> {
    any::<f32>().prop_filter("wire numbers are finite", |x| x.is_finite())
}

fn keyword_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9_./ -]{0,40}").unwrap()
}

fn epoch_millis() -> impl Strategy<Value = i64> {
    // Stays well inside chrono's representable range.
    -8_000_000_000_000i64..8_000_000_000_000i64
}

proptest! {
    #[test]
    fn byte_round_trips(x in any::<i8>()) {
        prop_assert_eq!(ByteType.deserialize(ByteType.serialize(&x)).unwrap(), x);
        prop_assert_eq!(ByteType.deserialize_term(ByteType.serialize_term(&x)).unwrap(), x);
    }

    #[test]
    fn short_round_trips(x in any::<i16>()) {
        prop_assert_eq!(ShortType.deserialize(ShortType.serialize(&x)).unwrap(), x);
    }

    #[test]
    fn integer_round_trips(x in any::<i32>()) {
        prop_assert_eq!(IntType.deserialize(IntType.serialize(&x)).unwrap(), x);
    }

    #[test]
    fn long_round_trips(x in any::<i64>()) {
        prop_assert_eq!(LongType.deserialize(LongType.serialize(&x)).unwrap(), x);
    }

    #[test]
    fn float_round_trips(x in finite_f32()) {
        prop_assert_eq!(FloatType.deserialize(FloatType.serialize(&x)).unwrap(), x);
    }

    #[test]
    fn double_round_trips(x in finite_f64()) {
        prop_assert_eq!(DoubleType.deserialize(DoubleType.serialize(&x)).unwrap(), x);
    }

    #[test]
    fn boolean_round_trips(x in any::<bool>()) {
        prop_assert_eq!(BooleanType.deserialize(BooleanType.serialize(&x)).unwrap(), x);
    }

    #[test]
    fn keyword_round_trips(s in keyword_strategy()) {
        prop_assert_eq!(
            KeywordType.deserialize(KeywordType.serialize(&s)).unwrap(),
            s.clone()
        );
        prop_assert_eq!(
            KeywordType.deserialize_term(KeywordType.serialize_term(&s)).unwrap(),
            s
        );
    }

    #[test]
    fn date_round_trips_at_millisecond_precision(ms in epoch_millis()) {
        let moment = DateTime::from_timestamp_millis(ms).unwrap();
        prop_assert_eq!(
            DateTimeType.deserialize(DateTimeType.serialize(&moment)).unwrap(),
            moment
        );
        // The epoch-millisecond read form agrees with the string form.
        prop_assert_eq!(
            DateTimeType.deserialize(searchlayer_core::value::Value::I64(ms)).unwrap(),
            moment
        );
    }

    #[test]
    fn integer_string_coercion_agrees_with_the_native_form(x in any::<i32>()) {
        let via_string = IntType
            .deserialize(searchlayer_core::value::Value::Str(x.to_string()))
            .unwrap();
        prop_assert_eq!(via_string, x);
    }
}
