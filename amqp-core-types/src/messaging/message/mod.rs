//! Implementation of Message as defined in AMQP 1.0 protocol Part 3.2

use std::fmt::Display;

use amqp_value::{
    primitives::Binary,
    value::AmqpType,
    Descriptor, Value,
};
use bytes::{Buf, BytesMut};

use super::{
    AmqpSequence, AmqpValue, ApplicationProperties, Data, DeliveryAnnotations, Footer, Header,
    MessageAnnotations, Properties,
};
use crate::{composite::DescribedType, definitions::MessageFormat, Error};

mod body;
pub use body::{Body, BodyType};

/// AMQP 1.0 Message
///
/// The annotation, application-properties and footer sections are carried as map values.
/// The body holds exactly one kind of section at a time; adding or setting a section of a
/// different kind discards the sections of the previous kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    format: MessageFormat,
    header: Option<Header>,
    delivery_annotations: Option<Value>,
    message_annotations: Option<Value>,
    properties: Option<Properties>,
    application_properties: Option<Value>,
    body: Body,
    footer: Option<Value>,
}

fn ensure_map(value: Option<Value>) -> Result<Option<Value>, Error> {
    match value {
        Some(Value::Map(_)) | None => Ok(value),
        Some(other) => Err(Error::Value(amqp_value::Error::TypeMismatch {
            expected: AmqpType::Map,
            found: other.amqp_type(),
        })),
    }
}

impl Message {
    /// Creates an empty message with format 0 and no body
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a Builder for [`Message`]
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Message format, 0 unless set
    pub fn format(&self) -> MessageFormat {
        self.format
    }

    /// Set the message format
    pub fn set_format(&mut self, format: MessageFormat) {
        self.format = format;
    }

    /// Transport headers for a message.
    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    /// Replaces the header
    pub fn set_header(&mut self, header: impl Into<Option<Header>>) {
        self.header = header.into();
    }

    /// Delivery-specific non-standard properties at the head of the message.
    pub fn delivery_annotations(&self) -> Option<&Value> {
        self.delivery_annotations.as_ref()
    }

    /// Replaces the delivery annotations, which must be a map
    pub fn set_delivery_annotations(&mut self, annotations: impl Into<Option<Value>>) -> Result<(), Error> {
        self.delivery_annotations = ensure_map(annotations.into())?;
        Ok(())
    }

    /// Properties aimed at the infrastructure, propagated across every delivery step
    pub fn message_annotations(&self) -> Option<&Value> {
        self.message_annotations.as_ref()
    }

    /// Replaces the message annotations, which must be a map
    pub fn set_message_annotations(&mut self, annotations: impl Into<Option<Value>>) -> Result<(), Error> {
        self.message_annotations = ensure_map(annotations.into())?;
        Ok(())
    }

    /// Immutable properties of the message.
    pub fn properties(&self) -> Option<&Properties> {
        self.properties.as_ref()
    }

    /// Replaces the properties
    pub fn set_properties(&mut self, properties: impl Into<Option<Properties>>) {
        self.properties = properties.into();
    }

    /// Structured application data
    pub fn application_properties(&self) -> Option<&Value> {
        self.application_properties.as_ref()
    }

    /// Replaces the application properties, which must be a map
    pub fn set_application_properties(&mut self, properties: impl Into<Option<Value>>) -> Result<(), Error> {
        self.application_properties = ensure_map(properties.into())?;
        Ok(())
    }

    /// Transport footers for a message.
    pub fn footer(&self) -> Option<&Value> {
        self.footer.as_ref()
    }

    /// Replaces the footer, which must be a map
    pub fn set_footer(&mut self, footer: impl Into<Option<Value>>) -> Result<(), Error> {
        self.footer = ensure_map(footer.into())?;
        Ok(())
    }

    /// The body of the message
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Kind of the current body
    pub fn body_type(&self) -> BodyType {
        self.body.body_type()
    }

    /// Appends a data section, discarding any body of another kind
    pub fn add_body_amqp_data(&mut self, data: impl Into<Binary>) {
        match &mut self.body {
            Body::Data(sections) => sections.push(data.into()),
            body => *body = Body::Data(vec![data.into()]),
        }
    }

    /// Data section at `index`
    pub fn body_amqp_data(&self, index: usize) -> Result<&Binary, Error> {
        match &self.body {
            Body::Data(sections) => sections
                .get(index)
                .ok_or_else(|| Error::out_of_range(index, sections.len())),
            _ => Err(Error::out_of_range(index, 0)),
        }
    }

    /// Number of data sections, 0 unless the body is data
    pub fn body_amqp_data_count(&self) -> usize {
        match &self.body {
            Body::Data(sections) => sections.len(),
            _ => 0,
        }
    }

    /// Appends an amqp-sequence section, discarding any body of another kind. The section
    /// must be a list.
    pub fn add_body_amqp_sequence(&mut self, sequence: Value) -> Result<(), Error> {
        if !matches!(sequence, Value::List(_)) {
            return Err(Error::Value(amqp_value::Error::TypeMismatch {
                expected: AmqpType::List,
                found: sequence.amqp_type(),
            }));
        }
        match &mut self.body {
            Body::Sequence(sections) => sections.push(sequence),
            body => *body = Body::Sequence(vec![sequence]),
        }
        Ok(())
    }

    /// Sequence section at `index`
    pub fn body_amqp_sequence(&self, index: usize) -> Result<&Value, Error> {
        match &self.body {
            Body::Sequence(sections) => sections
                .get(index)
                .ok_or_else(|| Error::out_of_range(index, sections.len())),
            _ => Err(Error::out_of_range(index, 0)),
        }
    }

    /// Number of sequence sections, 0 unless the body is a sequence
    pub fn body_amqp_sequence_count(&self) -> usize {
        match &self.body {
            Body::Sequence(sections) => sections.len(),
            _ => 0,
        }
    }

    /// Replaces the whole body with a single amqp-value section
    pub fn set_body_amqp_value(&mut self, value: impl Into<Value>) {
        self.body = Body::Value(value.into());
    }

    /// The amqp-value section
    pub fn body_amqp_value(&self) -> Result<&Value, Error> {
        match &self.body {
            Body::Value(value) => Ok(value),
            body => Err(Error::BodyTypeMismatch {
                expected: BodyType::Value,
                found: body.body_type(),
            }),
        }
    }

    /// Removes the body
    pub fn clear_body(&mut self) {
        self.body = Body::Empty;
    }

    /// Every present section in the standard order, as described values
    pub fn sections(&self) -> Vec<Value> {
        let mut sections = Vec::new();
        if let Some(header) = &self.header {
            sections.push(Value::from(header));
        }
        push_section::<DeliveryAnnotations>(&mut sections, &self.delivery_annotations);
        push_section::<MessageAnnotations>(&mut sections, &self.message_annotations);
        if let Some(properties) = &self.properties {
            sections.push(Value::from(properties));
        }
        push_section::<ApplicationProperties>(&mut sections, &self.application_properties);
        match &self.body {
            Body::Empty => {}
            Body::Data(data) => sections.extend(
                data.iter()
                    .map(|data| Value::described(Data::CODE, Value::Binary(data.clone()))),
            ),
            Body::Sequence(sequence) => sections.extend(
                sequence
                    .iter()
                    .map(|list| Value::described(AmqpSequence::CODE, list.clone())),
            ),
            Body::Value(value) => sections.push(Value::described(AmqpValue::CODE, value.clone())),
        }
        push_section::<Footer>(&mut sections, &self.footer);
        sections
    }

    /// Encodes the message as a sequence of described sections
    pub fn encode(&self, dst: &mut BytesMut) -> Result<(), Error> {
        for section in self.sections() {
            amqp_value::encode(&section, dst)?;
        }
        Ok(())
    }

    /// Encodes the message into a new buffer
    pub fn to_vec(&self) -> Result<Vec<u8>, Error> {
        let mut buf = BytesMut::new();
        self.encode(&mut buf)?;
        Ok(buf.to_vec())
    }

    /// Decodes a message from every remaining byte of `src`
    pub fn decode(mut src: impl Buf) -> Result<Self, Error> {
        let mut message = Message::new();
        let mut last = Slot::Start;
        while src.has_remaining() {
            let section = amqp_value::decode(&mut src)?;
            let slot = Slot::of(&section)?;
            let repeatable_body = matches!(slot, Slot::Data | Slot::Sequence);
            if slot < last || (slot == last && !repeatable_body) || last.conflicts_with(slot) {
                return Err(Error::UnexpectedSection(section.to_string()));
            }
            last = slot;
            message.accept(slot, &section)?;
        }
        Ok(message)
    }

    fn accept(&mut self, slot: Slot, section: &Value) -> Result<(), Error> {
        match slot {
            Slot::Start => {}
            Slot::Header => self.header = Some(Header::try_from(section)?),
            Slot::DeliveryAnnotations => {
                self.set_delivery_annotations(section.described_value()?.clone())?
            }
            Slot::MessageAnnotations => {
                self.set_message_annotations(section.described_value()?.clone())?
            }
            Slot::Properties => self.properties = Some(Properties::try_from(section)?),
            Slot::ApplicationProperties => {
                self.set_application_properties(section.described_value()?.clone())?
            }
            Slot::Data => self.add_body_amqp_data(section.described_value()?.as_binary()?.clone()),
            Slot::Sequence => self.add_body_amqp_sequence(section.described_value()?.clone())?,
            Slot::Value => self.set_body_amqp_value(section.described_value()?.clone()),
            Slot::Footer => self.set_footer(section.described_value()?.clone())?,
        }
        Ok(())
    }
}

fn push_section<T: DescribedType>(sections: &mut Vec<Value>, map: &Option<Value>) {
    if let Some(map) = map {
        sections.push(Value::described(Descriptor::Code(T::CODE), map.clone()));
    }
}

/// Position of a section within a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Slot {
    Start,
    Header,
    DeliveryAnnotations,
    MessageAnnotations,
    Properties,
    ApplicationProperties,
    Data,
    Sequence,
    Value,
    Footer,
}

impl Slot {
    fn of(section: &Value) -> Result<Self, Error> {
        let slot = if Header::is_described_by(section) {
            Slot::Header
        } else if DeliveryAnnotations::is_described_by(section) {
            Slot::DeliveryAnnotations
        } else if MessageAnnotations::is_described_by(section) {
            Slot::MessageAnnotations
        } else if Properties::is_described_by(section) {
            Slot::Properties
        } else if ApplicationProperties::is_described_by(section) {
            Slot::ApplicationProperties
        } else if Data::is_described_by(section) {
            Slot::Data
        } else if AmqpSequence::is_described_by(section) {
            Slot::Sequence
        } else if AmqpValue::is_described_by(section) {
            Slot::Value
        } else if Footer::is_described_by(section) {
            Slot::Footer
        } else {
            return Err(Error::UnexpectedSection(section.to_string()));
        };
        Ok(slot)
    }

    fn is_body(&self) -> bool {
        matches!(self, Slot::Data | Slot::Sequence | Slot::Value)
    }

    /// Body sections of different kinds cannot be mixed
    fn conflicts_with(&self, next: Slot) -> bool {
        self.is_body() && next.is_body() && *self != next
    }
}

impl Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Message {{ format: {}", self.format)?;
        if let Some(header) = &self.header {
            write!(f, ", header: {}", Value::from(header))?;
        }
        if let Some(annotations) = &self.delivery_annotations {
            write!(f, ", delivery_annotations: {}", annotations)?;
        }
        if let Some(annotations) = &self.message_annotations {
            write!(f, ", message_annotations: {}", annotations)?;
        }
        if let Some(properties) = &self.properties {
            write!(f, ", properties: {}", Value::from(properties))?;
        }
        if let Some(properties) = &self.application_properties {
            write!(f, ", application_properties: {}", properties)?;
        }
        write!(f, ", body: {}", self.body)?;
        if let Some(footer) = &self.footer {
            write!(f, ", footer: {}", footer)?;
        }
        write!(f, " }}")
    }
}

/// Builder for [`Message`]
#[derive(Debug, Clone, Default)]
pub struct Builder {
    inner: Message,
}

impl Builder {
    /// Set the message format
    pub fn format(mut self, format: MessageFormat) -> Self {
        self.inner.format = format;
        self
    }

    /// Set the header
    pub fn header(mut self, header: impl Into<Option<Header>>) -> Self {
        self.inner.header = header.into();
        self
    }

    /// Set the properties
    pub fn properties(mut self, properties: impl Into<Option<Properties>>) -> Self {
        self.inner.properties = properties.into();
        self
    }

    /// Append a data section
    pub fn data(mut self, data: impl Into<Binary>) -> Self {
        self.inner.add_body_amqp_data(data);
        self
    }

    /// Set an amqp-value body
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.inner.set_body_amqp_value(value);
        self
    }

    /// Builds the [`Message`]
    pub fn build(self) -> Message {
        self.inner
    }
}

impl From<Builder> for Message {
    fn from(builder: Builder) -> Self {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use amqp_value::{primitives::Symbol, Value};
    use serde_bytes::ByteBuf;

    use super::{BodyType, Message};
    use crate::{
        messaging::{Header, Properties},
        Error,
    };

    fn data(bytes: &[u8]) -> ByteBuf {
        ByteBuf::from(bytes.to_vec())
    }

    #[test]
    fn new_message_has_no_body() {
        let message = Message::new();
        assert_eq!(message.body_type(), BodyType::None);
        assert_eq!(message.format(), 0);
        assert_eq!(message.body_amqp_data_count(), 0);
        assert!(message.body_amqp_value().unwrap_err().is_type_mismatch());
    }

    #[test]
    fn body_kind_follows_last_mutation() {
        let mut message = Message::new();
        message.add_body_amqp_data(data(b"one"));
        assert_eq!(message.body_type(), BodyType::Data);
        assert_eq!(message.body_amqp_data_count(), 1);
        assert_eq!(message.body_amqp_data(0), Ok(&data(b"one")));

        message.set_body_amqp_value("value");
        assert_eq!(message.body_type(), BodyType::Value);
        assert_eq!(message.body_amqp_data_count(), 0);
        assert_eq!(message.body_amqp_value(), Ok(&Value::from("value")));

        message
            .add_body_amqp_sequence(Value::from(vec![1u32, 2u32]))
            .unwrap();
        assert_eq!(message.body_type(), BodyType::Sequence);
        assert_eq!(message.body_amqp_sequence_count(), 1);
        assert!(message.body_amqp_value().is_err());
    }

    #[test]
    fn section_index_out_of_range() {
        let mut message = Message::new();
        message.add_body_amqp_data(data(b"a"));
        message.add_body_amqp_data(data(b"b"));
        assert!(message.body_amqp_data(2).unwrap_err().is_index_out_of_range());
        assert!(message.body_amqp_sequence(0).unwrap_err().is_index_out_of_range());
    }

    #[test]
    fn sequence_section_must_be_a_list() {
        let mut message = Message::new();
        let err = message.add_body_amqp_sequence(Value::from(1u8)).unwrap_err();
        assert!(err.is_type_mismatch());
        assert_eq!(message.body_type(), BodyType::None);
    }

    #[test]
    fn annotations_must_be_maps() {
        let mut message = Message::new();
        assert!(message.set_message_annotations(Value::from(1u8)).is_err());
        let mut map = Value::map();
        map.set_map_value(Symbol::from("x-opt"), 1u8).unwrap();
        message.set_message_annotations(map.clone()).unwrap();
        assert_eq!(message.message_annotations(), Some(&map));
        message.set_message_annotations(None).unwrap();
        assert_eq!(message.message_annotations(), None);
    }

    #[test]
    fn message_round_trip() {
        let mut annotations = Value::map();
        annotations.set_map_value(Symbol::from("x-opt-key"), "v").unwrap();
        let mut message = Message::builder()
            .header(Header::builder().durable(true).build())
            .properties(Properties::builder().message_id("id-1").build())
            .data(data(b"first"))
            .data(data(b"second"))
            .build();
        message.set_delivery_annotations(annotations.clone()).unwrap();
        message.set_footer(annotations).unwrap();

        let encoded = message.to_vec().unwrap();
        let decoded = Message::decode(&encoded[..]).unwrap();
        assert_eq!(decoded, message);
        assert_eq!(decoded.body_amqp_data(1), Ok(&data(b"second")));
    }

    #[test]
    fn sections_out_of_order_are_rejected() {
        let mut buf = Vec::new();
        buf.extend(amqp_value::to_vec(&Value::from(Properties::new())).unwrap());
        buf.extend(amqp_value::to_vec(&Value::from(Header::new())).unwrap());
        assert!(matches!(
            Message::decode(&buf[..]),
            Err(Error::UnexpectedSection(_))
        ));
    }

    #[test]
    fn mixed_body_kinds_are_rejected() {
        let mut buf = Vec::new();
        buf.extend(amqp_value::to_vec(&Value::described(0x75u64, &b"a"[..])).unwrap());
        buf.extend(amqp_value::to_vec(&Value::described(0x77u64, 1u8)).unwrap());
        assert!(matches!(
            Message::decode(&buf[..]),
            Err(Error::UnexpectedSection(_))
        ));
    }

    #[test]
    fn display_lists_present_sections() {
        let message = Message::builder().value(42u32).build();
        let rendered = message.to_string();
        assert!(rendered.starts_with("Message { format: 0"));
        assert!(rendered.contains("body: value(42)"));
        assert!(!rendered.contains("header"));
    }
}
