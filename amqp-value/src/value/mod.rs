//! Value type for untyped AMQP1.0 data structures.

use std::fmt::Display;

use ordered_float::OrderedFloat;
use serde_bytes::ByteBuf;

use crate::{
    described::{Composite, Described},
    format_code::EncodingCodes,
    primitives::{Array, OrderedMap, Symbol, Timestamp, Uuid},
};

mod access;
pub(crate) mod de;
mod display;
pub(crate) mod ser;

pub use access::CompositeView;

/// Primitive type definitions
///
/// Container variants own their children, so `clone()` is always a deep copy and
/// equality is structural.
#[derive(Debug, Clone, Default, Hash, PartialEq, Eq)]
pub enum Value {
    /// Indicates an empty value
    ///
    /// encoding code = 0x40,
    /// category = fixed, width = 0,
    /// label = "the null value"
    #[default]
    Null,

    /// Represents a true or false value
    ///
    /// encoding code = 0x56
    /// category = fixed, width = 1
    /// label = "boolean with the octet 0x00 being false and octet 0x01 being true"
    ///
    /// encoding name = "true", encoding code = 0x41
    /// encoding name = "false", encoding code = 0x42
    Bool(bool),

    /// Integer in the range 0 to 2^8-1 inclusive
    ///
    /// encoding code = 0x50,
    /// category = fixed, width = 1
    UByte(u8),

    /// Integer in the range 0 to 2^16-1 inclusive
    ///
    /// encoding code = 0x60,
    /// category = fixed, width = 2
    UShort(u16),

    /// Integer in the range 0 to 2^32-1 inclusive
    ///
    /// encoding code = 0x70, category = fixed, width = 4
    ///
    /// encoding name = "smalluint", encoding code = 0x52
    /// encoding name = "uint0", encoding code = 0x43
    UInt(u32),

    /// Integer in the range 0 to 2^64-1 inclusive
    ///
    /// encoding code = 0x80, category = fixed, width = 8
    ///
    /// encoding name = "smallulong", encoding code = 0x53
    /// encoding name = "ulong0", encoding code = 0x44
    ULong(u64),

    /// Integer in the range -(2^7) to 2^7-1 inclusive
    ///
    /// encoding code = 0x51,
    /// category = fixed, width = 1
    Byte(i8),

    /// Integer in the range -(2^15) to 2^15-1 inclusive
    ///
    /// encoding code = 0x61,
    /// category = fixed, width = 2
    Short(i16),

    /// Integer in the range -(2^31) to 2^31-1 inclusive
    ///
    /// encoding code = 0x71, category = fixed, width = 4
    ///
    /// encoding name = "smallint", encoding code = 0x54
    Int(i32),

    /// Integer in the range -(2^63) to 2^63-1 inclusive
    ///
    /// encoding code = 0x81, category = fixed, width = 8
    ///
    /// encoding name = "smalllong", encoding code = 0x55
    Long(i64),

    /// 32-bit floating point number (IEEE 754-2008 binary32)
    ///
    /// encoding name = "ieee-754", encoding code = 0x72
    Float(OrderedFloat<f32>),

    /// 64-bit floating point number (IEEE 754-2008 binary64).
    ///
    /// encoding name = "ieee-754", encoding code = 0x82
    Double(OrderedFloat<f64>),

    /// A single Unicode character
    ///
    /// encoding name = "utf32", encoding code = 0x73
    Char(char),

    /// An absolute point in time
    ///
    /// encoding name = "ms64", code = 0x83,
    Timestamp(Timestamp),

    /// A universally unique identifier as defined by RFC-4122 in section 4.1.2
    ///
    /// encoding code = 0x98,
    Uuid(Uuid),

    /// A sequence of octets.
    ///
    /// encoding name = "vbin8", encoding code = 0xa0
    /// encoding name = "vbin32", encoding code = 0xb0,
    Binary(ByteBuf),

    /// A sequence of Unicode characters.
    ///
    /// encoding name = "str8-utf8", encoding code = 0xa1,
    /// encoding name = "str32-utf8", encoding code = 0xb1
    String(String),

    /// Symbolic values from a constrained domain.
    ///
    /// encoding name = "sym8", encoding code = 0xa3,
    /// encoding name = "sym32", encoding code = 0xb3
    Symbol(Symbol),

    /// A sequence of polymorphic values.
    ///
    /// encoding name = "list0", encoding code = 0x45
    /// encoding name = "list8", encoding code = 0xc0
    /// encoding name = "list32", encoding code = 0xd0
    List(Vec<Value>),

    /// A polymorphic mapping from distinct keys to values.
    ///
    /// encoding name = "map8", encoding code = 0xc1,
    /// encoding name = "map32", encoding code = 0xd1,
    ///
    /// Maps are ordered, two maps which are different only in the order in which their
    /// key-value pairs are encoded are not equal.
    Map(OrderedMap<Value, Value>),

    /// A sequence of values of a single type.
    ///
    /// encoding name = "array8", encoding code = 0xe0
    /// encoding name = "array32", encoding code = 0xf0,
    Array(Array<Value>),

    /// Described type
    ///
    /// Box is used to reduce the memory size of the Value type.
    Described(Box<Described>),

    /// A described list with a fixed number of optionally set fields
    Composite(Box<Composite>),
}

/// Discriminant of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum AmqpType {
    Null,
    Bool,
    UByte,
    UShort,
    UInt,
    ULong,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
    Timestamp,
    Uuid,
    Binary,
    String,
    Symbol,
    List,
    Map,
    Array,
    Described,
    Composite,
}

impl Display for AmqpType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AmqpType::Null => "null",
            AmqpType::Bool => "boolean",
            AmqpType::UByte => "ubyte",
            AmqpType::UShort => "ushort",
            AmqpType::UInt => "uint",
            AmqpType::ULong => "ulong",
            AmqpType::Byte => "byte",
            AmqpType::Short => "short",
            AmqpType::Int => "int",
            AmqpType::Long => "long",
            AmqpType::Float => "float",
            AmqpType::Double => "double",
            AmqpType::Char => "char",
            AmqpType::Timestamp => "timestamp",
            AmqpType::Uuid => "uuid",
            AmqpType::Binary => "binary",
            AmqpType::String => "string",
            AmqpType::Symbol => "symbol",
            AmqpType::List => "list",
            AmqpType::Map => "map",
            AmqpType::Array => "array",
            AmqpType::Described => "described",
            AmqpType::Composite => "composite",
        };
        f.write_str(s)
    }
}

impl Value {
    /// Returns the AMQP type of the value
    pub fn amqp_type(&self) -> AmqpType {
        match self {
            Value::Null => AmqpType::Null,
            Value::Bool(_) => AmqpType::Bool,
            Value::UByte(_) => AmqpType::UByte,
            Value::UShort(_) => AmqpType::UShort,
            Value::UInt(_) => AmqpType::UInt,
            Value::ULong(_) => AmqpType::ULong,
            Value::Byte(_) => AmqpType::Byte,
            Value::Short(_) => AmqpType::Short,
            Value::Int(_) => AmqpType::Int,
            Value::Long(_) => AmqpType::Long,
            Value::Float(_) => AmqpType::Float,
            Value::Double(_) => AmqpType::Double,
            Value::Char(_) => AmqpType::Char,
            Value::Timestamp(_) => AmqpType::Timestamp,
            Value::Uuid(_) => AmqpType::Uuid,
            Value::Binary(_) => AmqpType::Binary,
            Value::String(_) => AmqpType::String,
            Value::Symbol(_) => AmqpType::Symbol,
            Value::List(_) => AmqpType::List,
            Value::Map(_) => AmqpType::Map,
            Value::Array(_) => AmqpType::Array,
            Value::Described(_) => AmqpType::Described,
            Value::Composite(_) => AmqpType::Composite,
        }
    }

    /// Get the widest format code of the value type
    pub fn format_code(&self) -> u8 {
        let code = match *self {
            Value::Described(_) | Value::Composite(_) => EncodingCodes::DescribedType,
            Value::Null => EncodingCodes::Null,
            Value::Bool(_) => EncodingCodes::Boolean,
            Value::UByte(_) => EncodingCodes::UByte,
            Value::UShort(_) => EncodingCodes::UShort,
            Value::UInt(_) => EncodingCodes::UInt,
            Value::ULong(_) => EncodingCodes::ULong,
            Value::Byte(_) => EncodingCodes::Byte,
            Value::Short(_) => EncodingCodes::Short,
            Value::Int(_) => EncodingCodes::Int,
            Value::Long(_) => EncodingCodes::Long,
            Value::Float(_) => EncodingCodes::Float,
            Value::Double(_) => EncodingCodes::Double,
            Value::Char(_) => EncodingCodes::Char,
            Value::Timestamp(_) => EncodingCodes::Timestamp,
            Value::Uuid(_) => EncodingCodes::Uuid,
            Value::Binary(_) => EncodingCodes::VBin32,
            Value::String(_) => EncodingCodes::Str32,
            Value::Symbol(_) => EncodingCodes::Sym32,
            Value::List(_) => EncodingCodes::List32,
            Value::Map(_) => EncodingCodes::Map32,
            Value::Array(_) => EncodingCodes::Array32,
        };
        code as u8
    }

    /// Returns true for [`Value::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

macro_rules! impl_from_for_value {
    ($variant:ident, $variant_ty:ty) => {
        impl From<$variant_ty> for Value {
            fn from(val: $variant_ty) -> Self {
                Self::$variant(val)
            }
        }
    };

    ($($variant:ident, $variant_ty:ty),*) => {
        $(impl_from_for_value!($variant, $variant_ty);)*
    }
}

impl_from_for_value! {
    Bool, bool,
    UByte, u8,
    UShort, u16,
    UInt, u32,
    ULong, u64,
    Byte, i8,
    Short, i16,
    Int, i32,
    Long, i64,
    Float, OrderedFloat<f32>,
    Double, OrderedFloat<f64>,
    Char, char,
    Timestamp, Timestamp,
    Uuid, Uuid,
    Binary, ByteBuf,
    String, String,
    Symbol, Symbol,
    Map, OrderedMap<Value, Value>
}

impl From<f32> for Value {
    fn from(val: f32) -> Self {
        Self::Float(OrderedFloat::from(val))
    }
}

impl From<f64> for Value {
    fn from(val: f64) -> Self {
        Self::Double(OrderedFloat::from(val))
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Self {
        Self::String(val.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(val: &[u8]) -> Self {
        Self::Binary(ByteBuf::from(val))
    }
}

impl From<Described> for Value {
    fn from(value: Described) -> Self {
        Self::Described(Box::new(value))
    }
}

impl From<Composite> for Value {
    fn from(value: Composite) -> Self {
        Self::Composite(Box::new(value))
    }
}

impl<T> From<Array<T>> for Value
where
    T: Into<Value>,
{
    fn from(values: Array<T>) -> Self {
        Self::Array(values.0.into_iter().map(Into::into).collect())
    }
}

impl<T> From<Vec<T>> for Value
where
    T: Into<Value>,
{
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => Value::Null,
        }
    }
}

macro_rules! impl_try_from_for_value_variant {
    ($variant:ident, $variant_ty:ty) => {
        impl TryFrom<Value> for $variant_ty {
            type Error = Value;

            fn try_from(val: Value) -> Result<Self, Self::Error> {
                match val {
                    Value::$variant(inner) => Ok(inner),
                    _ => Err(val)
                }
            }
        }
    };

    ($($variant:ident, $variant_ty:ty),*) => {
        $(impl_try_from_for_value_variant!($variant, $variant_ty);)*
    }
}

impl_try_from_for_value_variant! {
    Bool, bool,
    UByte, u8,
    UShort, u16,
    UInt, u32,
    ULong, u64,
    Byte, i8,
    Short, i16,
    Int, i32,
    Long, i64,
    Float, OrderedFloat<f32>,
    Double, OrderedFloat<f64>,
    Char, char,
    Timestamp, Timestamp,
    Uuid, Uuid,
    Binary, ByteBuf,
    String, String,
    Symbol, Symbol,
    List, Vec<Value>,
    Map, OrderedMap<Value, Value>,
    Array, Array<Value>
}

impl TryFrom<Value> for f32 {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Float(val) => Ok(val.0),
            _ => Err(value),
        }
    }
}

impl TryFrom<Value> for f64 {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Double(val) => Ok(val.0),
            _ => Err(value),
        }
    }
}
