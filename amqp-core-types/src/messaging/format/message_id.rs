//! Message ID

use std::fmt::Display;

use amqp_value::{
    primitives::{Binary, Uuid},
    AmqpType, Value,
};

use crate::composite::FromField;

/// Message ID
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageId {
    /// 3.2.11 Message ID Ulong
    /// <type name="message-id-ulong" class="restricted" source="ulong" provides="message-id"/>
    Ulong(u64),

    /// 3.2.12 Message ID UUID
    /// <type name="message-id-uuid" class="restricted" source="uuid" provides="message-id"/>
    Uuid(Uuid),

    /// 3.2.13 Message ID Binary
    /// <type name="message-id-binary" class="restricted" source="binary" provides="message-id"/>
    Binary(Binary),

    /// 3.2.14 Message ID String
    /// <type name="message-id-string" class="restricted" source="string" provides="message-id"/>
    String(String),
}

impl From<u64> for MessageId {
    fn from(value: u64) -> Self {
        Self::Ulong(value)
    }
}

impl From<Uuid> for MessageId {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<Binary> for MessageId {
    fn from(value: Binary) -> Self {
        Self::Binary(value)
    }
}

impl From<String> for MessageId {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for MessageId {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<&MessageId> for Value {
    fn from(id: &MessageId) -> Self {
        match id {
            MessageId::Ulong(value) => Value::ULong(*value),
            MessageId::Uuid(value) => Value::Uuid(*value),
            MessageId::Binary(value) => Value::Binary(value.clone()),
            MessageId::String(value) => Value::String(value.clone()),
        }
    }
}

impl TryFrom<&Value> for MessageId {
    type Error = amqp_value::Error;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::ULong(value) => Ok(MessageId::Ulong(*value)),
            Value::Uuid(value) => Ok(MessageId::Uuid(*value)),
            Value::Binary(value) => Ok(MessageId::Binary(value.clone())),
            Value::String(value) => Ok(MessageId::String(value.clone())),
            other => Err(amqp_value::Error::TypeMismatch {
                expected: AmqpType::String,
                found: other.amqp_type(),
            }),
        }
    }
}

impl FromField for MessageId {
    fn from_field(value: &Value) -> Result<Self, amqp_value::Error> {
        MessageId::try_from(value)
    }
}

impl Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&Value::from(self), f)
    }
}
