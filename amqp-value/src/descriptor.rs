//! Descriptor of described and composite values

use std::fmt::Display;

use crate::{primitives::Symbol, value::Value};

/// Descriptor of a described type
///
/// Symbols and ulongs are the two forms defined for well-known types. Any other value is
/// still a legal descriptor and is kept as is.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum Descriptor {
    /// Symbolic descriptor, ie. `amqp:header:list`
    Name(Symbol),
    /// Numeric descriptor, ie. `0x0000_0000_0000_0070`
    Code(u64),
    /// Any other descriptor value
    Value(Box<Value>),
}

impl Descriptor {
    /// Creates a symbolic descriptor
    pub fn name(name: impl Into<Symbol>) -> Self {
        Self::Name(name.into())
    }

    /// Creates a numeric descriptor
    pub fn code(code: u64) -> Self {
        Self::Code(code)
    }

    /// Returns the numeric code if this is a numeric descriptor
    pub fn as_code(&self) -> Option<u64> {
        match self {
            Descriptor::Code(code) => Some(*code),
            Descriptor::Name(_) | Descriptor::Value(_) => None,
        }
    }
}

impl From<u64> for Descriptor {
    fn from(code: u64) -> Self {
        Self::Code(code)
    }
}

impl From<&str> for Descriptor {
    fn from(name: &str) -> Self {
        Self::Name(Symbol::from(name))
    }
}

impl From<Symbol> for Descriptor {
    fn from(name: Symbol) -> Self {
        Self::Name(name)
    }
}

impl From<Descriptor> for Value {
    fn from(descriptor: Descriptor) -> Self {
        match descriptor {
            Descriptor::Name(name) => Value::Symbol(name),
            Descriptor::Code(code) => Value::ULong(code),
            Descriptor::Value(value) => *value,
        }
    }
}

impl From<Value> for Descriptor {
    fn from(value: Value) -> Self {
        match value {
            Value::Symbol(name) => Descriptor::Name(name),
            Value::ULong(code) => Descriptor::Code(code),
            other => Descriptor::Value(Box::new(other)),
        }
    }
}

impl Display for Descriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Descriptor::Name(name) => write!(f, "{}", name),
            Descriptor::Code(code) => write!(f, "0x{:x}", code),
            Descriptor::Value(value) => write!(f, "{}", value),
        }
    }
}
