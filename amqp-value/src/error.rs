//! Custom error

use crate::value::AmqpType;

/// Errors raised by value accessors and by the binary codec
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// An accessor was invoked on a value of a different AMQP type
    #[error("Type mismatch: expecting {expected}, found {found}")]
    TypeMismatch {
        /// The type the accessor converts to
        expected: AmqpType,
        /// The type actually stored
        found: AmqpType,
    },

    /// Container or field index beyond the current count
    #[error("Index {index} out of range (count {count})")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of items in the container
        count: usize,
    },

    /// Invalid format code
    #[error("Invalid format code 0x{0:02x}")]
    InvalidFormatCode(u8),

    /// Input ended before the value was complete
    #[error("Unexpected end of input")]
    UnexpectedEof,

    /// Found invalid UTF-8 encoding
    #[error("Invalid UTF-8 encoding")]
    InvalidUtf8Encoding,

    /// A `char` that is not a unicode scalar value
    #[error("Invalid char")]
    InvalidChar,

    /// Length is invalid
    #[error("Invalid length")]
    InvalidLength,

    /// Compound or described values nested deeper than the decoder accepts
    #[error("Values are nested too deeply")]
    NestingTooDeep,

    /// Extra bytes after a complete value
    #[error("Trailing bytes after value")]
    TrailingBytes,
}

impl Error {
    pub(crate) fn mismatch(expected: AmqpType, found: AmqpType) -> Self {
        Self::TypeMismatch { expected, found }
    }

    pub(crate) fn out_of_range(index: usize, count: usize) -> Self {
        Self::IndexOutOfRange { index, count }
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(_: std::string::FromUtf8Error) -> Self {
        Error::InvalidUtf8Encoding
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(_: std::str::Utf8Error) -> Self {
        Error::InvalidUtf8Encoding
    }
}
