use std::fmt::Display;

use amqp_value::{primitives::Binary, Value};

/// Kind of body a [`Message`](super::Message) currently carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyType {
    /// Not a valid body. A message never reports it; kept for parity with peers that expose it
    Invalid,

    /// No body section
    None,

    /// One or more data sections
    Data,

    /// One or more amqp-sequence sections
    Sequence,

    /// A single amqp-value section
    Value,
}

/// The body consists of one of the following three choices: one or more data sections, one or more
/// amqp-sequence sections, or a single amqp-value section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Body {
    /// There is no body section at all
    #[default]
    Empty,

    /// One or more data sections
    Data(Vec<Binary>),

    /// One or more sequence sections, each a list
    Sequence(Vec<Value>),

    /// An amqp-value section contains a single AMQP value
    Value(Value),
}

impl Body {
    /// The kind of this body
    pub fn body_type(&self) -> BodyType {
        match self {
            Body::Empty => BodyType::None,
            Body::Data(_) => BodyType::Data,
            Body::Sequence(_) => BodyType::Sequence,
            Body::Value(_) => BodyType::Value,
        }
    }

    /// Whether the body section is [`Body::Data`]
    pub fn is_data(&self) -> bool {
        matches!(self, Body::Data(_))
    }

    /// Whether the body section is [`Body::Sequence`]
    pub fn is_sequence(&self) -> bool {
        matches!(self, Body::Sequence(_))
    }

    /// Whether the body section is [`Body::Value`]
    pub fn is_value(&self) -> bool {
        matches!(self, Body::Value(_))
    }

    /// Whether the body section is [`Body::Empty`]
    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }
}

impl Display for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Body::Empty => write!(f, "empty"),
            Body::Data(sections) => {
                write!(f, "data[")?;
                for (i, section) in sections.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", Value::Binary(section.clone()))?;
                }
                write!(f, "]")
            }
            Body::Sequence(sections) => {
                write!(f, "sequence[")?;
                for (i, section) in sections.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", section)?;
                }
                write!(f, "]")
            }
            Body::Value(value) => write!(f, "value({})", value),
        }
    }
}
