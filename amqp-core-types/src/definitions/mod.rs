//! Types defined in AMQP 1.0 specification Part 2.8: Definitions

use amqp_value::{
    primitives::{OrderedMap, Symbol},
    Value,
};

/// 2.8.6 Milliseconds
pub type Milliseconds = u32;

/// 2.8.10 Sequence No
pub type SequenceNo = u32;

/// 2.8.11 Message Format
pub type MessageFormat = u32;

/// 2.8.13 Fields
pub type Fields = OrderedMap<Symbol, Value>;

/// 2.8.14 Error
mod error;
pub use error::Error;

mod error_cond;
pub use error_cond::ErrorCondition;

/// 2.8.15 AMQP Error
mod amqp_error;
pub use amqp_error::AmqpError;

/// 2.8.16 Connection Error
mod conn_error;
pub use conn_error::ConnectionError;

/// 2.8.19 Constant definition
mod constant_def;
pub use constant_def::{MAJOR, MINOR, MIN_MAX_FRAME_SIZE, PORT, REVISION, SECURE_PORT};

/// Encodes a [`Fields`] map as a generic map value
pub fn fields_to_value(fields: &Fields) -> Value {
    Value::Map(
        fields
            .iter()
            .map(|(key, value)| (Value::Symbol(key.clone()), value.clone()))
            .collect(),
    )
}

/// Reads a [`Fields`] map, whose keys must all be symbols
pub fn fields_from_value(value: &Value) -> Result<Fields, amqp_value::Error> {
    value
        .as_map()?
        .iter()
        .map(|(key, value)| Ok((key.as_symbol()?.clone(), value.clone())))
        .collect()
}
