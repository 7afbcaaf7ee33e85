//! Errors raised when converting between records and generic values

use crate::messaging::BodyType;

/// Error converting a record to or from a [`Value`](amqp_value::Value)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Error from the underlying value algebra
    #[error(transparent)]
    Value(#[from] amqp_value::Error),

    /// The value is described by a different descriptor
    #[error("Descriptor mismatch: expecting {expected}, found {found}")]
    DescriptorMismatch {
        /// Symbolic name of the expected descriptor
        expected: &'static str,
        /// The descriptor that was found
        found: String,
    },

    /// A mandatory field is absent
    #[error("Missing mandatory field {0}")]
    MissingField(&'static str),

    /// A body operation does not match the message's current body type
    #[error("Body type mismatch: expecting {expected:?}, found {found:?}")]
    BodyTypeMismatch {
        /// Body type required by the operation
        expected: BodyType,
        /// Current body type
        found: BodyType,
    },

    /// A section appeared out of the standard order, or twice
    #[error("Unexpected section {0}")]
    UnexpectedSection(String),
}

impl Error {
    /// Returns true if the error is a type mismatch of any kind
    pub fn is_type_mismatch(&self) -> bool {
        matches!(
            self,
            Error::Value(amqp_value::Error::TypeMismatch { .. })
                | Error::DescriptorMismatch { .. }
                | Error::BodyTypeMismatch { .. }
        )
    }

    /// Returns true if an index was beyond the end of a container
    pub fn is_index_out_of_range(&self) -> bool {
        matches!(self, Error::Value(amqp_value::Error::IndexOutOfRange { .. }))
    }

    pub(crate) fn out_of_range(index: usize, count: usize) -> Self {
        Error::Value(amqp_value::Error::IndexOutOfRange { index, count })
    }
}
