use std::fmt::Display;

use amqp_value::primitives::Symbol;

use super::ErrorCondition;

/// Symbols used to indicate connection error conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionError {
    /// An operator intervened to close the connection for some reason
    ConnectionForced,

    /// A valid frame header cannot be formed from the incoming byte stream
    FramingError,

    /// The container is no longer available on the current connection
    Redirect,
}

impl ConnectionError {
    /// The symbol carried on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionError::ConnectionForced => "amqp:connection:forced",
            ConnectionError::FramingError => "amqp:connection:framing-error",
            ConnectionError::Redirect => "amqp:connection:redirect",
        }
    }
}

impl Display for ConnectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ConnectionError> for ErrorCondition {
    fn from(err: ConnectionError) -> Self {
        ErrorCondition::ConnectionError(err)
    }
}

impl From<ConnectionError> for Symbol {
    fn from(value: ConnectionError) -> Self {
        Symbol::from(value.as_str())
    }
}

impl<'a> TryFrom<&'a str> for ConnectionError {
    type Error = &'a str;

    fn try_from(value: &'a str) -> Result<Self, Self::Error> {
        match value {
            "amqp:connection:forced" => Ok(ConnectionError::ConnectionForced),
            "amqp:connection:framing-error" => Ok(ConnectionError::FramingError),
            "amqp:connection:redirect" => Ok(ConnectionError::Redirect),
            _ => Err(value),
        }
    }
}
