//! Decoding of [`Value`] from the AMQP 1.0 type system wire format

use bytes::{Buf, Bytes};
use ordered_float::OrderedFloat;
use serde_bytes::ByteBuf;

use super::Value;
use crate::{
    described::Described,
    descriptor::Descriptor,
    format_code::EncodingCodes,
    primitives::{Array, OrderedMap, Symbol, Timestamp, Uuid, UUID_WIDTH},
    Error,
};

/// Deepest nesting of compound and described values accepted by the decoder
pub const MAX_NESTING_DEPTH: usize = 64;

/// Deserialize exactly one [`Value`] from a slice
pub fn from_slice(slice: &[u8]) -> Result<Value, Error> {
    let mut reader = slice;
    let value = decode(&mut reader)?;
    match reader.has_remaining() {
        true => Err(Error::TrailingBytes),
        false => Ok(value),
    }
}

/// Decode one [`Value`] from the front of `src`, leaving the remaining bytes in place
///
/// Values nested deeper than [`MAX_NESTING_DEPTH`] fail with [`Error::NestingTooDeep`].
pub fn decode<B: Buf>(src: &mut B) -> Result<Value, Error> {
    decode_at(src, 0)
}

fn decode_at<B: Buf>(src: &mut B, depth: usize) -> Result<Value, Error> {
    let constructor = read_constructor(src, depth)?;
    read_value(&constructor, src, depth)
}

fn nested(depth: usize) -> Result<usize, Error> {
    match depth < MAX_NESTING_DEPTH {
        true => Ok(depth + 1),
        false => Err(Error::NestingTooDeep),
    }
}

/// A format code, possibly preceded by a descriptor
enum Constructor {
    Primitive(EncodingCodes),
    Described(Descriptor, Box<Constructor>),
}

impl Constructor {
    /// Whether values of this constructor take no bytes after the constructor
    fn is_zero_width(&self) -> bool {
        match self {
            Constructor::Primitive(code) => matches!(
                code,
                EncodingCodes::Null
                    | EncodingCodes::BooleanTrue
                    | EncodingCodes::BooleanFalse
                    | EncodingCodes::Uint0
                    | EncodingCodes::Ulong0
                    | EncodingCodes::List0
            ),
            Constructor::Described(_, inner) => inner.is_zero_width(),
        }
    }
}

fn ensure<B: Buf>(src: &B, len: usize) -> Result<(), Error> {
    match src.remaining() < len {
        true => Err(Error::UnexpectedEof),
        false => Ok(()),
    }
}

fn read_code<B: Buf>(src: &mut B) -> Result<EncodingCodes, Error> {
    ensure(src, 1)?;
    EncodingCodes::try_from(src.get_u8())
}

fn read_constructor<B: Buf>(src: &mut B, depth: usize) -> Result<Constructor, Error> {
    match read_code(src)? {
        EncodingCodes::DescribedType => {
            let depth = nested(depth)?;
            let descriptor = Descriptor::from(decode_at(src, depth)?);
            let inner = read_constructor(src, depth)?;
            Ok(Constructor::Described(descriptor, Box::new(inner)))
        }
        code => Ok(Constructor::Primitive(code)),
    }
}

fn read_value<B: Buf>(
    constructor: &Constructor,
    src: &mut B,
    depth: usize,
) -> Result<Value, Error> {
    match constructor {
        Constructor::Primitive(code) => read_primitive(*code, src, depth),
        Constructor::Described(descriptor, inner) => {
            let value = read_value(inner, src, depth)?;
            Ok(Value::Described(Box::new(Described {
                descriptor: descriptor.clone(),
                value,
            })))
        }
    }
}

fn read_size<B: Buf>(src: &mut B, wide: bool) -> Result<usize, Error> {
    match wide {
        true => {
            ensure(src, 4)?;
            Ok(src.get_u32() as usize)
        }
        false => {
            ensure(src, 1)?;
            Ok(src.get_u8() as usize)
        }
    }
}

/// Splits off a sized region so a malformed size cannot read past the value
fn read_region<B: Buf>(src: &mut B, wide: bool) -> Result<Bytes, Error> {
    let size = read_size(src, wide)?;
    ensure(src, size)?;
    Ok(src.copy_to_bytes(size))
}

fn read_primitive<B: Buf>(
    code: EncodingCodes,
    src: &mut B,
    depth: usize,
) -> Result<Value, Error> {
    let value = match code {
        EncodingCodes::Null => Value::Null,
        EncodingCodes::BooleanTrue => Value::Bool(true),
        EncodingCodes::BooleanFalse => Value::Bool(false),
        EncodingCodes::Boolean => {
            ensure(src, 1)?;
            match src.get_u8() {
                0x00 => Value::Bool(false),
                0x01 => Value::Bool(true),
                _ => return Err(Error::InvalidLength),
            }
        }
        EncodingCodes::UByte => {
            ensure(src, 1)?;
            Value::UByte(src.get_u8())
        }
        EncodingCodes::UShort => {
            ensure(src, 2)?;
            Value::UShort(src.get_u16())
        }
        EncodingCodes::UInt => {
            ensure(src, 4)?;
            Value::UInt(src.get_u32())
        }
        EncodingCodes::SmallUint => {
            ensure(src, 1)?;
            Value::UInt(src.get_u8() as u32)
        }
        EncodingCodes::Uint0 => Value::UInt(0),
        EncodingCodes::ULong => {
            ensure(src, 8)?;
            Value::ULong(src.get_u64())
        }
        EncodingCodes::SmallUlong => {
            ensure(src, 1)?;
            Value::ULong(src.get_u8() as u64)
        }
        EncodingCodes::Ulong0 => Value::ULong(0),
        EncodingCodes::Byte => {
            ensure(src, 1)?;
            Value::Byte(src.get_i8())
        }
        EncodingCodes::Short => {
            ensure(src, 2)?;
            Value::Short(src.get_i16())
        }
        EncodingCodes::Int => {
            ensure(src, 4)?;
            Value::Int(src.get_i32())
        }
        EncodingCodes::SmallInt => {
            ensure(src, 1)?;
            Value::Int(src.get_i8() as i32)
        }
        EncodingCodes::Long => {
            ensure(src, 8)?;
            Value::Long(src.get_i64())
        }
        EncodingCodes::SmallLong => {
            ensure(src, 1)?;
            Value::Long(src.get_i8() as i64)
        }
        EncodingCodes::Float => {
            ensure(src, 4)?;
            Value::Float(OrderedFloat(src.get_f32()))
        }
        EncodingCodes::Double => {
            ensure(src, 8)?;
            Value::Double(OrderedFloat(src.get_f64()))
        }
        EncodingCodes::Char => {
            ensure(src, 4)?;
            let c = char::from_u32(src.get_u32()).ok_or(Error::InvalidChar)?;
            Value::Char(c)
        }
        EncodingCodes::Timestamp => {
            ensure(src, 8)?;
            Value::Timestamp(Timestamp::from_milliseconds(src.get_i64()))
        }
        EncodingCodes::Uuid => {
            ensure(src, UUID_WIDTH)?;
            let mut buf = [0u8; UUID_WIDTH];
            src.copy_to_slice(&mut buf);
            Value::Uuid(Uuid::from(buf))
        }
        EncodingCodes::VBin8 | EncodingCodes::VBin32 => {
            let bytes = read_region(src, code == EncodingCodes::VBin32)?;
            Value::Binary(ByteBuf::from(bytes.to_vec()))
        }
        EncodingCodes::Str8 | EncodingCodes::Str32 => {
            let bytes = read_region(src, code == EncodingCodes::Str32)?;
            Value::String(String::from_utf8(bytes.to_vec())?)
        }
        EncodingCodes::Sym8 | EncodingCodes::Sym32 => {
            let bytes = read_region(src, code == EncodingCodes::Sym32)?;
            Value::Symbol(Symbol::from(String::from_utf8(bytes.to_vec())?))
        }
        EncodingCodes::List0 => Value::List(Vec::new()),
        EncodingCodes::List8 | EncodingCodes::List32 => {
            let wide = code == EncodingCodes::List32;
            let mut region = read_region(src, wide)?;
            let count = read_size(&mut region, wide)?;
            let depth = nested(depth)?;
            let mut items = Vec::new();
            for _ in 0..count {
                items.push(decode_at(&mut region, depth)?);
            }
            ensure_consumed(&region)?;
            Value::List(items)
        }
        EncodingCodes::Map8 | EncodingCodes::Map32 => {
            let wide = code == EncodingCodes::Map32;
            let mut region = read_region(src, wide)?;
            let count = read_size(&mut region, wide)?;
            if count % 2 != 0 {
                return Err(Error::InvalidLength);
            }
            let depth = nested(depth)?;
            let mut map = OrderedMap::new();
            for _ in 0..count / 2 {
                let key = decode_at(&mut region, depth)?;
                let value = decode_at(&mut region, depth)?;
                map.insert(key, value);
            }
            ensure_consumed(&region)?;
            Value::Map(map)
        }
        EncodingCodes::Array8 | EncodingCodes::Array32 => {
            let wide = code == EncodingCodes::Array32;
            let mut region = read_region(src, wide)?;
            let size = region.len();
            let count = read_size(&mut region, wide)?;
            let depth = nested(depth)?;
            let element = read_constructor(&mut region, depth)?;
            // zero width elements are bounded by the array's size, the others by the bytes left
            let limit = match element.is_zero_width() {
                true => size,
                false => region.len(),
            };
            if count > limit {
                return Err(Error::InvalidLength);
            }
            let mut items = Array::new();
            for _ in 0..count {
                items.push(read_value(&element, &mut region, depth)?);
            }
            ensure_consumed(&region)?;
            Value::Array(items)
        }
        // A described constructor is handled by `read_constructor`
        EncodingCodes::DescribedType => return Err(Error::InvalidFormatCode(code as u8)),
    };
    Ok(value)
}

fn ensure_consumed(region: &Bytes) -> Result<(), Error> {
    match region.is_empty() {
        true => Ok(()),
        false => Err(Error::InvalidLength),
    }
}

#[cfg(test)]
mod tests {
    use super::{decode, from_slice, MAX_NESTING_DEPTH};
    use crate::{
        described::Described,
        descriptor::Descriptor,
        primitives::{Array, Symbol},
        value::{ser::to_vec, Value},
        Error,
    };

    #[test]
    fn decode_leaves_remainder() {
        let mut buf: &[u8] = &[0x52, 0x07, 0xff, 0xee];
        assert_eq!(decode(&mut buf), Ok(Value::UInt(7)));
        assert_eq!(buf, &[0xff, 0xee]);
    }

    #[test]
    fn from_slice_rejects_trailing_bytes() {
        assert_eq!(from_slice(&[0x40, 0x40]), Err(Error::TrailingBytes));
    }

    #[test]
    fn truncated_input_is_eof() {
        assert_eq!(from_slice(&[0x70, 0x00, 0x01]), Err(Error::UnexpectedEof));
        assert_eq!(from_slice(&[0xa1, 0x05, b'a']), Err(Error::UnexpectedEof));
        assert_eq!(from_slice(&[]), Err(Error::UnexpectedEof));
    }

    #[test]
    fn list_count_must_match_size() {
        // size claims one extra byte that no item consumes
        assert_eq!(
            from_slice(&[0xc0, 0x03, 0x01, 0x41, 0x41]),
            Err(Error::InvalidLength)
        );
    }

    #[test]
    fn unknown_format_code() {
        assert_eq!(from_slice(&[0x74]), Err(Error::InvalidFormatCode(0x74)));
    }

    #[test]
    fn nested_structure_round_trip() {
        let mut map = Value::map();
        map.set_map_value(Symbol::from("key"), vec![Value::from(1i64), Value::Null])
            .unwrap();
        map.set_map_value("bin", &b"\x00\x01"[..]).unwrap();
        let value = Value::from(vec![
            map,
            Value::from(Array(vec![Symbol::from("a"), Symbol::from("bc")])),
            Value::from(Described::new("test:described", 'x')),
            Value::from(3.5f64),
        ]);
        let encoded = to_vec(&value).unwrap();
        assert_eq!(from_slice(&encoded), Ok(value));
    }

    #[test]
    fn composite_decodes_as_described_list() {
        let mut composite = Value::composite_with_code(0x70, 5);
        composite.set_composite_field(1, 4u8).unwrap();
        let decoded = from_slice(&to_vec(&composite).unwrap()).unwrap();
        assert_eq!(
            decoded,
            Value::described(0x70u64, vec![Value::Null, Value::UByte(4)])
        );
    }

    #[test]
    fn array_of_described_elements() {
        let items = vec![
            Value::described(0x75u64, &b"a"[..]),
            Value::described(0x75u64, &b"bc"[..]),
        ];
        let value = Value::Array(Array(items));
        let encoded = to_vec(&value).unwrap();
        // array8, descriptor once, vbin32 element constructor
        assert_eq!(&encoded[..6], &[0xe0, 0x10, 0x02, 0x00, 0x53, 0x75]);
        assert_eq!(encoded[6], 0xb0);
        assert_eq!(from_slice(&encoded), Ok(value));
    }

    #[test]
    fn chained_descriptors_are_limited() {
        assert_eq!(from_slice(&vec![0x00u8; 4096]), Err(Error::NestingTooDeep));
    }

    #[test]
    fn nested_lists_are_limited() {
        fn nest(depth: usize) -> Value {
            (0..depth).fold(Value::from(vec![Value::Null]), |inner, _| {
                Value::from(vec![inner])
            })
        }

        let shallow = nest(MAX_NESTING_DEPTH / 2);
        assert_eq!(from_slice(&to_vec(&shallow).unwrap()), Ok(shallow));

        let deep = nest(MAX_NESTING_DEPTH * 2);
        assert_eq!(
            from_slice(&to_vec(&deep).unwrap()),
            Err(Error::NestingTooDeep)
        );
    }

    #[test]
    fn array_count_is_bounded_by_its_size() {
        // array32 of 0x0fffffff nulls in five bytes
        assert_eq!(
            from_slice(&[0xf0, 0, 0, 0, 5, 0x0f, 0xff, 0xff, 0xff, 0x40]),
            Err(Error::InvalidLength)
        );
        // five ubytes with room for one
        assert_eq!(
            from_slice(&[0xe0, 0x03, 0x05, 0x50, 0x01]),
            Err(Error::InvalidLength)
        );
        assert_eq!(
            from_slice(&[0xe0, 0x02, 0x02, 0x40]),
            Ok(Value::Array(Array(vec![Value::Null, Value::Null])))
        );
    }

    #[test]
    fn any_value_can_be_a_descriptor() {
        let encoded = [0x00, 0xa1, 0x01, b'x', 0x40];
        let decoded = from_slice(&encoded).unwrap();
        assert_eq!(
            decoded.descriptor(),
            Ok(&Descriptor::Value(Box::new(Value::from("x"))))
        );
        assert_eq!(decoded.described_value(), Ok(&Value::Null));
        assert_eq!(to_vec(&decoded).unwrap(), encoded);
    }
}
