//! Implementation of message properties

use amqp_value::{
    primitives::{Binary, Symbol, Timestamp},
    Value,
};

use super::MessageId;
use crate::{
    composite::{composite, field, fields_of, DescribedType},
    definitions::SequenceNo,
};

/// 3.2.16 Address String
/// <type name="address-string" class="restricted" source="string" provides="address"/>
pub type Address = String;

/// 3.2.4 Properties
/// Immutable properties of the message.
/// <type name="properties" class="composite" source="list" provides="section">
///     <descriptor name="amqp:properties:list" code="0x00000000:0x00000073"/>
/// </type>
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    /// <field name="message-id" type="*" requires="message-id"/>
    pub message_id: Option<MessageId>,

    /// <field name="user-id" type="binary"/>
    pub user_id: Option<Binary>,

    /// <field name="to" type="*" requires="address"/>
    pub to: Option<Address>,

    /// <field name="subject" type="string"/>
    pub subject: Option<String>,

    /// <field name="reply-to" type="*" requires="address"/>
    pub reply_to: Option<Address>,

    /// <field name="correlation-id" type="*" requires="message-id"/>
    pub correlation_id: Option<MessageId>,

    /// <field name="content-type" type="symbol"/>
    pub content_type: Option<Symbol>,

    /// <field name="content-encoding" type="symbol"/>
    pub content_encoding: Option<Symbol>,

    /// <field name="absolute-expiry-time" type="timestamp"/>
    pub absolute_expiry_time: Option<Timestamp>,

    /// <field name="creation-time" type="timestamp"/>
    pub creation_time: Option<Timestamp>,

    /// <field name="group-id" type="string"/>
    pub group_id: Option<String>,

    /// <field name="group-sequence" type="sequence-no"/>
    pub group_sequence: Option<SequenceNo>,

    /// <field name="reply-to-group-id" type="string"/>
    pub reply_to_group_id: Option<String>,
}

impl Properties {
    /// Creates properties with every field absent
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for [`Properties`]
    pub fn builder() -> Builder {
        Builder::new()
    }

    /// Returns true if `value` is described as message properties
    pub fn is_properties_type(value: &Value) -> bool {
        Self::is_described_by(value)
    }
}

impl DescribedType for Properties {
    const NAME: &'static str = "amqp:properties:list";
    const CODE: u64 = 0x0000_0000_0000_0073;
}

impl From<&Properties> for Value {
    fn from(properties: &Properties) -> Self {
        composite::<Properties>(vec![
            properties.message_id.as_ref().map(Value::from),
            properties.user_id.clone().map(Value::Binary),
            properties.to.clone().map(Value::String),
            properties.subject.clone().map(Value::String),
            properties.reply_to.clone().map(Value::String),
            properties.correlation_id.as_ref().map(Value::from),
            properties.content_type.clone().map(Value::Symbol),
            properties.content_encoding.clone().map(Value::Symbol),
            properties.absolute_expiry_time.map(Value::Timestamp),
            properties.creation_time.map(Value::Timestamp),
            properties.group_id.clone().map(Value::String),
            properties.group_sequence.map(Value::UInt),
            properties.reply_to_group_id.clone().map(Value::String),
        ])
    }
}

impl From<Properties> for Value {
    fn from(properties: Properties) -> Self {
        Value::from(&properties)
    }
}

impl TryFrom<&Value> for Properties {
    type Error = crate::Error;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let view = fields_of::<Properties>(value)?;
        Ok(Self {
            message_id: field(&view, 0)?,
            user_id: field(&view, 1)?,
            to: field(&view, 2)?,
            subject: field(&view, 3)?,
            reply_to: field(&view, 4)?,
            correlation_id: field(&view, 5)?,
            content_type: field(&view, 6)?,
            content_encoding: field(&view, 7)?,
            absolute_expiry_time: field(&view, 8)?,
            creation_time: field(&view, 9)?,
            group_id: field(&view, 10)?,
            group_sequence: field(&view, 11)?,
            reply_to_group_id: field(&view, 12)?,
        })
    }
}

/// Builder for [`Properties`]
#[derive(Debug, Default, Clone)]
pub struct Builder {
    inner: Properties,
}

impl Builder {
    /// Creates a builder with every field absent
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `message_id` field of [`Properties`]
    pub fn message_id(mut self, message_id: impl Into<MessageId>) -> Self {
        self.inner.message_id = Some(message_id.into());
        self
    }

    /// Set the `user_id` field of [`Properties`]
    pub fn user_id(mut self, user_id: impl Into<Binary>) -> Self {
        self.inner.user_id = Some(user_id.into());
        self
    }

    /// Set the `to` field of [`Properties`]
    pub fn to(mut self, to: impl Into<Address>) -> Self {
        self.inner.to = Some(to.into());
        self
    }

    /// Set the `subject` field of [`Properties`]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.inner.subject = Some(subject.into());
        self
    }

    /// Set the `reply_to` field of [`Properties`]
    pub fn reply_to(mut self, reply_to: impl Into<Address>) -> Self {
        self.inner.reply_to = Some(reply_to.into());
        self
    }

    /// Set the `correlation_id` field of [`Properties`]
    pub fn correlation_id(mut self, correlation_id: impl Into<MessageId>) -> Self {
        self.inner.correlation_id = Some(correlation_id.into());
        self
    }

    /// Set the `content_type` field of [`Properties`]
    pub fn content_type(mut self, content_type: impl Into<Symbol>) -> Self {
        self.inner.content_type = Some(content_type.into());
        self
    }

    /// Set the `content_encoding` field of [`Properties`]
    pub fn content_encoding(mut self, content_encoding: impl Into<Symbol>) -> Self {
        self.inner.content_encoding = Some(content_encoding.into());
        self
    }

    /// Set the `absolute_expiry_time` field of [`Properties`]
    pub fn absolute_expiry_time(mut self, absolute_expiry_time: impl Into<Timestamp>) -> Self {
        self.inner.absolute_expiry_time = Some(absolute_expiry_time.into());
        self
    }

    /// Set the `creation_time` field of [`Properties`]
    pub fn creation_time(mut self, creation_time: impl Into<Timestamp>) -> Self {
        self.inner.creation_time = Some(creation_time.into());
        self
    }

    /// Set the `group_id` field of [`Properties`]
    pub fn group_id(mut self, group_id: impl Into<String>) -> Self {
        self.inner.group_id = Some(group_id.into());
        self
    }

    /// Set the `group_sequence` field of [`Properties`]
    pub fn group_sequence(mut self, group_sequence: SequenceNo) -> Self {
        self.inner.group_sequence = Some(group_sequence);
        self
    }

    /// Set the `reply_to_group_id` field of [`Properties`]
    pub fn reply_to_group_id(mut self, reply_to_group_id: impl Into<String>) -> Self {
        self.inner.reply_to_group_id = Some(reply_to_group_id.into());
        self
    }

    /// Builds the [`Properties`]
    pub fn build(self) -> Properties {
        self.inner
    }
}

impl From<Builder> for Properties {
    fn from(builder: Builder) -> Self {
        builder.build()
    }
}
