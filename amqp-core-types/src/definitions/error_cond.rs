use std::fmt::Display;

use amqp_value::{primitives::Symbol, Value};

use super::{AmqpError, ConnectionError};

/// The condition of an [`Error`](super::Error)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum ErrorCondition {
    AmqpError(AmqpError),
    ConnectionError(ConnectionError),
    Custom(Symbol),
}

impl ErrorCondition {
    /// The symbol carried on the wire
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCondition::AmqpError(err) => err.as_str(),
            ErrorCondition::ConnectionError(err) => err.as_str(),
            ErrorCondition::Custom(symbol) => symbol.as_str(),
        }
    }
}

impl Display for ErrorCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ErrorCondition {
    fn from(value: &str) -> Self {
        let value = match AmqpError::try_from(value) {
            Ok(err) => return ErrorCondition::AmqpError(err),
            Err(value) => value,
        };
        match ConnectionError::try_from(value) {
            Ok(err) => ErrorCondition::ConnectionError(err),
            Err(value) => ErrorCondition::Custom(Symbol::from(value)),
        }
    }
}

impl From<Symbol> for ErrorCondition {
    fn from(value: Symbol) -> Self {
        ErrorCondition::from(value.as_str())
    }
}

impl From<&ErrorCondition> for Value {
    fn from(value: &ErrorCondition) -> Self {
        Value::Symbol(Symbol::from(value.as_str()))
    }
}
