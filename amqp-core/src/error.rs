//! Error types of the connection core

use std::io;

/// Error returned by the operations of a connection or a transport
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error
    #[error(transparent)]
    Io(#[from] io::Error),

    /// A value was accessed as the wrong type or out of range
    #[error(transparent)]
    Value(#[from] amqp_value::Error),

    /// A message section or performative could not be converted
    #[error(transparent)]
    Types(#[from] amqp_core_types::Error),

    /// A frame could not be encoded or decoded
    #[error(transparent)]
    Frames(#[from] crate::frames::Error),

    /// The request uri could not be parsed
    #[error(transparent)]
    Url(#[from] url::ParseError),

    /// The operation is not valid in the current state of the object
    #[error("Logic error: {0}")]
    Logic(String),

    /// The frame engine or the transport rejected the operation
    #[error("Runtime failure: {0}")]
    Runtime(String),

    /// The construction inputs are contradictory
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    pub(crate) fn logic(msg: impl Into<String>) -> Self {
        Self::Logic(msg.into())
    }

    pub(crate) fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    pub(crate) fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// A value or section was read as a type it does not hold
    pub fn is_type_mismatch(&self) -> bool {
        match self {
            Error::Value(err) => matches!(err, amqp_value::Error::TypeMismatch { .. }),
            Error::Types(err) => err.is_type_mismatch(),
            _ => false,
        }
    }

    /// An index was beyond the number of items of a container
    pub fn is_index_out_of_range(&self) -> bool {
        match self {
            Error::Value(err) => matches!(err, amqp_value::Error::IndexOutOfRange { .. }),
            Error::Types(err) => err.is_index_out_of_range(),
            _ => false,
        }
    }

    /// Whether this is [`Error::Logic`]
    pub fn is_logic_error(&self) -> bool {
        matches!(self, Error::Logic(_))
    }

    /// Whether this is [`Error::Runtime`]
    pub fn is_runtime_failure(&self) -> bool {
        matches!(self, Error::Runtime(_))
    }

    /// Whether this is [`Error::Configuration`]
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }
}
