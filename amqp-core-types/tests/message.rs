use amqp_core_types::{
    messaging::{BodyType, Header, Message, Properties},
    DescribedType,
};
use amqp_value::{from_slice, primitives::Symbol, to_vec, Descriptor, Value};
use serde_bytes::ByteBuf;

fn header_with_fields(mask: u8) -> Header {
    let mut builder = Header::builder();
    if mask & 0b00001 != 0 {
        builder = builder.durable(true);
    }
    if mask & 0b00010 != 0 {
        builder = builder.priority(9);
    }
    if mask & 0b00100 != 0 {
        builder = builder.ttl(60_000);
    }
    if mask & 0b01000 != 0 {
        builder = builder.first_acquirer(false);
    }
    if mask & 0b10000 != 0 {
        builder = builder.delivery_count(u32::MAX);
    }
    builder.build()
}

#[test]
fn header_round_trips_for_every_subset_of_fields() {
    for mask in 0..32u8 {
        let header = header_with_fields(mask);
        let value = Value::from(&header);
        assert_eq!(Header::try_from(&value), Ok(header.clone()));

        let decoded = from_slice(&to_vec(&value).unwrap()).unwrap();
        assert_eq!(Header::try_from(&decoded), Ok(header));
    }
}

#[test]
fn values_from_header() {
    let header = Header::builder()
        .durable(true)
        .priority(3)
        .ttl(12345)
        .delivery_count(2)
        .build();
    let value = Value::from(&header);
    assert_eq!(value.descriptor(), Ok(&Descriptor::Code(Header::CODE)));
    assert_eq!(value.composite_field(0), Ok(&Value::Bool(true)));
    assert_eq!(value.composite_field(1), Ok(&Value::UByte(3)));
    assert_eq!(value.composite_field(2), Ok(&Value::UInt(12345)));
    assert_eq!(value.composite_field(3), Ok(&Value::Null));
    assert_eq!(value.composite_field(4), Ok(&Value::UInt(2)));
}

#[test]
fn symbolic_descriptor_is_accepted() {
    let mut value = Value::composite("amqp:header:list", 5);
    value.set_composite_field(0, true).unwrap();
    assert!(Header::is_header_type(&value));
    assert_eq!(Header::try_from(&value).map(|h| h.is_durable()), Ok(true));
}

#[test]
fn properties_do_not_pass_as_header() {
    let value = Value::from(&Properties::builder().subject("hello").build());
    assert!(!Header::is_header_type(&value));
    let err = Header::try_from(&value).unwrap_err();
    assert!(err.is_type_mismatch());
}

#[test]
fn message_body_transitions() {
    let mut message = Message::new();
    assert_eq!(message.body_type(), BodyType::None);

    message.add_body_amqp_data(ByteBuf::from(vec![1, 2, 3]));
    assert_eq!(message.body_type(), BodyType::Data);
    assert_eq!(message.body_amqp_data_count(), 1);
    assert_eq!(
        message.body_amqp_data(0),
        Ok(&ByteBuf::from(vec![1, 2, 3]))
    );

    message.set_body_amqp_value(Symbol::from("replaced"));
    assert_eq!(message.body_type(), BodyType::Value);
    assert_eq!(message.body_amqp_data_count(), 0);
    assert!(message.body_amqp_data(0).unwrap_err().is_index_out_of_range());
}

#[test]
fn copies_of_a_message_are_independent() {
    let mut original = Message::new();
    original.set_header(Header::builder().priority(1).build());
    original.set_format(7);

    let mut copy = original.clone();
    copy.set_header(None);
    copy.add_body_amqp_data(ByteBuf::from(vec![0]));

    assert_eq!(original.header().map(Header::priority), Some(1));
    assert_eq!(original.body_type(), BodyType::None);
    assert_eq!(copy.format(), 7);
}

#[test]
fn sequence_message_round_trips() {
    let mut message = Message::new();
    message
        .add_body_amqp_sequence(Value::from(vec![Value::from("a"), Value::from(1i64)]))
        .unwrap();
    message
        .add_body_amqp_sequence(Value::from(vec![Value::Null]))
        .unwrap();
    let mut application = Value::map();
    application.set_map_value("key", 42i32).unwrap();
    message.set_application_properties(application).unwrap();

    let decoded = Message::decode(&message.to_vec().unwrap()[..]).unwrap();
    assert_eq!(decoded.body_amqp_sequence_count(), 2);
    assert_eq!(decoded, message);
}
