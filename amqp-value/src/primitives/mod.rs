//! Wrappers for the AMQP primitive types that have no direct Rust counterpart

mod array;
mod map;
mod symbol;
mod timestamp;
mod uuid;

pub use self::array::Array;
pub use self::map::OrderedMap;
pub use self::symbol::Symbol;
pub use self::timestamp::Timestamp;
pub use self::uuid::{Uuid, UUID_WIDTH};

/// A sequence of octets.
///
/// encoding name = "vbin8", encoding code = 0xa0
/// category = variable, width = 1
/// label = "up to 2^8 - 1 octets of binary data"
///
/// encoding name = "vbin32", encoding code = 0xb0,
/// category = variable, width = 4,
/// label="up to 2^32 - 1 octets of binary data"
pub type Binary = serde_bytes::ByteBuf;
