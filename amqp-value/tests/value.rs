use std::time::SystemTime;

use amqp_value::{
    from_slice,
    primitives::{Symbol, Timestamp, Uuid},
    to_vec, AmqpType, Descriptor, Error, Value,
};

#[test]
fn simple_create() {
    assert_eq!(Value::default().amqp_type(), AmqpType::Null);
    assert!(Value::default().is_null());

    let value = Value::from(true);
    assert_eq!(value.amqp_type(), AmqpType::Bool);
    assert_eq!(value.as_bool(), Ok(true));

    assert_eq!(Value::from(255u8).as_ubyte(), Ok(255));
    assert_eq!(Value::from(b'a' as i8).as_byte(), Ok(97));
    assert_eq!(Value::from(65535u16).as_ushort(), Ok(65535));
    assert_eq!(Value::from(32767i16).as_short(), Ok(32767));
    assert_eq!(Value::from(32i32).as_int(), Ok(32));
    assert_eq!(Value::from(32i64).as_long(), Ok(32));
    assert_eq!(Value::from(39u64).as_ulong(), Ok(39));
    assert_eq!(Value::from(39.0f32).as_float(), Ok(39.0));
    assert_eq!(Value::from(39.0f64).as_double(), Ok(39.0));

    let fred = Value::from("Fred");
    assert_eq!(fred.amqp_type(), AmqpType::String);
    assert_eq!(fred.as_string().map(String::as_str), Ok("Fred"));
    assert_eq!(fred, Value::from(String::from("Fred")));
}

#[test]
fn test_list() {
    assert_eq!(Value::list().list_item_count(), Ok(0));
    assert!(matches!(
        Value::from(false).list_item_count(),
        Err(Error::TypeMismatch { .. })
    ));

    let mut list = Value::list();
    list.set_list_item_count(4).unwrap();
    assert_eq!(list.list_item_count(), Ok(4));
    list.set_list_item(0, 123i32).unwrap();
    list.set_list_item(1, 23.97f32).unwrap();
    list.set_list_item(2, "ABCD").unwrap();
    list.set_list_item(3, 'a').unwrap();

    assert_eq!(list.list_item(0).and_then(Value::as_int), Ok(123));
    assert_eq!(list.list_item(1).and_then(Value::as_float), Ok(23.97));
    assert_eq!(list.list_item(3).and_then(Value::as_char), Ok('a'));
    assert!(matches!(
        list.list_item(4),
        Err(Error::IndexOutOfRange { index: 4, count: 4 })
    ));
}

#[test]
fn test_map() {
    assert_eq!(Value::map().map_pair_count(), Ok(0));
    assert!(Value::from(false).map_pair_count().is_err());

    let mut map = Value::map();
    map.set_map_value("ABC", 5i32).unwrap();
    map.set_map_value(3i32, "ABC").unwrap();
    assert_eq!(map.map_pair_count(), Ok(2));
    assert_eq!(map.map_value(&Value::from("ABC")), Ok(Some(&Value::Int(5))));
    assert_eq!(map.map_value(&Value::from(3i32)), Ok(Some(&Value::from("ABC"))));
    assert_eq!(map.map_value(&Value::from(4i32)), Ok(None));

    let (key, value) = map.map_key_value_at(1).unwrap();
    assert_eq!(key.amqp_type(), AmqpType::Int);
    assert_eq!(value.amqp_type(), AmqpType::String);
    assert_eq!(key.as_int(), Ok(3));
    assert!(matches!(
        map.map_key_value_at(2),
        Err(Error::IndexOutOfRange { index: 2, count: 2 })
    ));
}

#[test]
fn map_keys_compare_by_value() {
    let mut map = Value::map();
    map.set_map_value(Symbol::from("key"), 1u8).unwrap();
    map.set_map_value("key", 2u8).unwrap();
    // a symbol and a string with the same text are different keys
    assert_eq!(map.map_pair_count(), Ok(2));

    map.set_map_value(Symbol::from("key"), 3u8).unwrap();
    assert_eq!(map.map_pair_count(), Ok(2));
    assert_eq!(map.map_key_value_at(0).unwrap().1, &Value::UByte(3));
}

#[test]
fn test_array() {
    assert_eq!(Value::array().array_item_count(), Ok(0));
    assert!(Value::from(false).array_item_count().is_err());

    let mut array = Value::array();
    array.add_array_item("3").unwrap();
    array.add_array_item("Foo").unwrap();
    array.add_array_item("George").unwrap();
    assert_eq!(array.array_item_count(), Ok(3));
    assert_eq!(array.array_item(0), Ok(&Value::from("3")));
    assert!(array.array_item(3).is_err());

    let decoded = from_slice(&to_vec(&array).unwrap()).unwrap();
    assert_eq!(decoded, array);
}

#[test]
fn test_char() {
    let value = Value::from('%');
    assert_eq!(value.as_char(), Ok('%'));
    assert!(Value::from(false).as_char().is_err());
}

#[test]
fn test_timestamp() {
    let now = Timestamp::from(SystemTime::now());
    let value = Value::from(now);
    assert_eq!(value.as_timestamp(), Ok(now));
    assert!(Value::from(false).as_timestamp().is_err());
}

#[test]
fn test_symbol() {
    let value = Value::from(Symbol::from("timeNow"));
    assert_eq!(value.as_symbol().map(Symbol::as_str), Ok("timeNow"));
    assert!(Value::from(false).as_symbol().is_err());
    // a string is not a symbol
    assert!(Value::from("timeNow").as_symbol().is_err());
}

#[test]
fn test_uuid() {
    let uuid = Uuid::from(uuid::Uuid::new_v4().into_bytes());
    let value = Value::from(uuid);
    assert_eq!(value.as_uuid(), Ok(uuid));
    assert_eq!(from_slice(&to_vec(&value).unwrap()), Ok(value));
}

#[test]
fn test_composite_value() {
    let value = Value::composite("My Composite Type", 5);
    assert_eq!(value.composite_field_count(), Ok(5));
    assert!(Value::from(false).composite_field_count().is_err());

    let mut value = Value::composite("CompType", 2);
    value.set_composite_field(0, 25i32).unwrap();
    value.set_composite_field(1, 25.0f32).unwrap();
    assert_eq!(value.composite_field(0).and_then(Value::as_int), Ok(25));
    assert_eq!(value.composite_field(1).and_then(Value::as_float), Ok(25.0));
    assert_eq!(value.descriptor(), Ok(&Descriptor::name("CompType")));

    let mut value = Value::composite_with_code(29, 0);
    assert_eq!(value.descriptor(), Ok(&Descriptor::Code(29)));
    value.set_composite_field_count(2).unwrap();
    assert_eq!(value.composite_field(1), Ok(&Value::Null));
}

#[test]
fn test_described() {
    let value = Value::described("My Composite Type", 5i32);
    assert_eq!(value.amqp_type(), AmqpType::Described);
    assert_eq!(value.descriptor(), Ok(&Descriptor::name("My Composite Type")));
    assert_eq!(value.described_value(), Ok(&Value::Int(5)));
    assert!(Value::from(5i32).described_value().is_err());

    let decoded = from_slice(&to_vec(&value).unwrap()).unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn copies_do_not_alias() {
    let mut original = Value::map();
    original.set_map_value("list", vec![1u32, 2u32]).unwrap();

    let mut copy = original.clone();
    copy.set_map_value("extra", true).unwrap();

    assert_eq!(original.map_pair_count(), Ok(1));
    assert_eq!(copy.map_pair_count(), Ok(2));
}

#[test]
fn every_primitive_round_trips_through_the_codec() {
    let values = vec![
        Value::Null,
        Value::from(false),
        Value::from(u8::MAX),
        Value::from(i8::MIN),
        Value::from(u16::MAX),
        Value::from(i16::MIN),
        Value::from(u32::MAX),
        Value::from(i32::MIN),
        Value::from(u64::MAX),
        Value::from(i64::MIN),
        Value::from(f32::MIN_POSITIVE),
        Value::from(-0.5f64),
        Value::from('\u{1F600}'),
        Value::from(Timestamp::from(-1)),
        Value::from(&[0u8; 300][..]),
        Value::from("x".repeat(300).as_str()),
        Value::from(Symbol::from("amqp:accepted:list")),
    ];
    for value in values {
        let encoded = to_vec(&value).unwrap();
        assert_eq!(from_slice(&encoded), Ok(value));
    }
}
