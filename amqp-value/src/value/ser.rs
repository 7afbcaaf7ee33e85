//! Encoding of [`Value`] into the AMQP 1.0 type system wire format

use bytes::{BufMut, BytesMut};

use super::Value;
use crate::{
    described::Composite, descriptor::Descriptor, format_code::EncodingCodes, Error,
};

/// Serialize a [`Value`] into a new vector
pub fn to_vec(value: &Value) -> Result<Vec<u8>, Error> {
    let mut buf = BytesMut::new();
    encode(value, &mut buf)?;
    Ok(buf.to_vec())
}

/// Append the encoding of `value` to `dst`.
///
/// The most compact encoding is always chosen. Fails if an array holds elements of
/// different types or a length does not fit in 32 bits.
pub fn encode(value: &Value, dst: &mut BytesMut) -> Result<(), Error> {
    match value {
        Value::Null => dst.put_u8(EncodingCodes::Null as u8),
        Value::Bool(true) => dst.put_u8(EncodingCodes::BooleanTrue as u8),
        Value::Bool(false) => dst.put_u8(EncodingCodes::BooleanFalse as u8),
        Value::UByte(v) => {
            dst.put_u8(EncodingCodes::UByte as u8);
            dst.put_u8(*v);
        }
        Value::UShort(v) => {
            dst.put_u8(EncodingCodes::UShort as u8);
            dst.put_u16(*v);
        }
        Value::UInt(0) => dst.put_u8(EncodingCodes::Uint0 as u8),
        Value::UInt(v @ 1..=255) => {
            dst.put_u8(EncodingCodes::SmallUint as u8);
            dst.put_u8(*v as u8);
        }
        Value::UInt(v) => {
            dst.put_u8(EncodingCodes::UInt as u8);
            dst.put_u32(*v);
        }
        Value::ULong(0) => dst.put_u8(EncodingCodes::Ulong0 as u8),
        Value::ULong(v @ 1..=255) => {
            dst.put_u8(EncodingCodes::SmallUlong as u8);
            dst.put_u8(*v as u8);
        }
        Value::ULong(v) => {
            dst.put_u8(EncodingCodes::ULong as u8);
            dst.put_u64(*v);
        }
        Value::Byte(v) => {
            dst.put_u8(EncodingCodes::Byte as u8);
            dst.put_i8(*v);
        }
        Value::Short(v) => {
            dst.put_u8(EncodingCodes::Short as u8);
            dst.put_i16(*v);
        }
        Value::Int(v @ -128..=127) => {
            dst.put_u8(EncodingCodes::SmallInt as u8);
            dst.put_i8(*v as i8);
        }
        Value::Int(v) => {
            dst.put_u8(EncodingCodes::Int as u8);
            dst.put_i32(*v);
        }
        Value::Long(v @ -128..=127) => {
            dst.put_u8(EncodingCodes::SmallLong as u8);
            dst.put_i8(*v as i8);
        }
        Value::Long(v) => {
            dst.put_u8(EncodingCodes::Long as u8);
            dst.put_i64(*v);
        }
        Value::Binary(bytes) => {
            write_variable(dst, EncodingCodes::VBin8, EncodingCodes::VBin32, bytes)?
        }
        Value::String(s) => {
            write_variable(dst, EncodingCodes::Str8, EncodingCodes::Str32, s.as_bytes())?
        }
        Value::Symbol(s) => {
            write_variable(dst, EncodingCodes::Sym8, EncodingCodes::Sym32, s.as_bytes())?
        }
        Value::List(items) if items.is_empty() => dst.put_u8(EncodingCodes::List0 as u8),
        Value::List(items) => {
            let mut body = BytesMut::new();
            for item in items {
                encode(item, &mut body)?;
            }
            write_compound(dst, EncodingCodes::List8, EncodingCodes::List32, items.len(), &body)?;
        }
        Value::Map(map) => {
            let mut body = BytesMut::new();
            for (key, value) in map {
                encode(key, &mut body)?;
                encode(value, &mut body)?;
            }
            write_compound(dst, EncodingCodes::Map8, EncodingCodes::Map32, map.len() * 2, &body)?;
        }
        Value::Array(items) => write_array(dst, items)?,
        Value::Described(described) => {
            dst.put_u8(EncodingCodes::DescribedType as u8);
            write_descriptor(dst, &described.descriptor)?;
            encode(&described.value, dst)?;
        }
        Value::Composite(composite) => {
            dst.put_u8(EncodingCodes::DescribedType as u8);
            write_descriptor(dst, &composite.descriptor)?;
            write_composite_list(dst, composite)?;
        }
        // Fixed width types share their single constructor with array elements
        Value::Float(_)
        | Value::Double(_)
        | Value::Char(_)
        | Value::Timestamp(_)
        | Value::Uuid(_) => {
            dst.put_u8(value.format_code());
            write_element(dst, value)?;
        }
    }
    Ok(())
}

fn write_descriptor(dst: &mut BytesMut, descriptor: &Descriptor) -> Result<(), Error> {
    match descriptor {
        Descriptor::Name(name) => write_variable(
            dst,
            EncodingCodes::Sym8,
            EncodingCodes::Sym32,
            name.as_bytes(),
        ),
        Descriptor::Code(code) => encode(&Value::ULong(*code), dst),
        Descriptor::Value(value) => encode(value, dst),
    }
}

fn write_composite_list(dst: &mut BytesMut, composite: &Composite) -> Result<(), Error> {
    let fields = composite.trimmed_fields();
    if fields.is_empty() {
        dst.put_u8(EncodingCodes::List0 as u8);
        return Ok(());
    }
    let mut body = BytesMut::new();
    for field in fields {
        match field {
            Some(value) => encode(value, &mut body)?,
            None => body.put_u8(EncodingCodes::Null as u8),
        }
    }
    write_compound(dst, EncodingCodes::List8, EncodingCodes::List32, fields.len(), &body)
}

fn len_u32(len: usize) -> Result<u32, Error> {
    u32::try_from(len).map_err(|_| Error::InvalidLength)
}

fn write_variable(
    dst: &mut BytesMut,
    code8: EncodingCodes,
    code32: EncodingCodes,
    bytes: &[u8],
) -> Result<(), Error> {
    match u8::try_from(bytes.len()) {
        Ok(len) => {
            dst.put_u8(code8 as u8);
            dst.put_u8(len);
        }
        Err(_) => {
            dst.put_u8(code32 as u8);
            dst.put_u32(len_u32(bytes.len())?);
        }
    }
    dst.put_slice(bytes);
    Ok(())
}

/// Writes a list or map. The size counts the count field and the body.
fn write_compound(
    dst: &mut BytesMut,
    code8: EncodingCodes,
    code32: EncodingCodes,
    count: usize,
    body: &[u8],
) -> Result<(), Error> {
    if body.len() < 255 && count <= 255 {
        dst.put_u8(code8 as u8);
        dst.put_u8(body.len() as u8 + 1);
        dst.put_u8(count as u8);
    } else {
        dst.put_u8(code32 as u8);
        dst.put_u32(len_u32(body.len() + 4)?);
        dst.put_u32(len_u32(count)?);
    }
    dst.put_slice(body);
    Ok(())
}

fn write_array(dst: &mut BytesMut, items: &[Value]) -> Result<(), Error> {
    let body = array_body(items)?;
    write_compound(dst, EncodingCodes::Array8, EncodingCodes::Array32, items.len(), &body)
}

/// Element constructor followed by the element bodies
fn array_body(items: &[Value]) -> Result<BytesMut, Error> {
    let mut body = BytesMut::new();
    match items.first() {
        Some(first) => {
            write_element_constructor(&mut body, first)?;
            for item in items {
                ensure_same_element_type(first, item)?;
                write_element(&mut body, item)?;
            }
        }
        // An empty array still needs an element constructor
        None => body.put_u8(EncodingCodes::Null as u8),
    }
    Ok(body)
}

fn ensure_same_element_type(first: &Value, item: &Value) -> Result<(), Error> {
    let mismatch = || Error::mismatch(first.amqp_type(), item.amqp_type());
    if first.amqp_type() != item.amqp_type() {
        return Err(mismatch());
    }
    match (first, item) {
        (Value::Described(a), Value::Described(b)) => {
            if a.descriptor != b.descriptor {
                return Err(mismatch());
            }
            ensure_same_element_type(&a.value, &b.value)
        }
        (Value::Composite(a), Value::Composite(b)) if a.descriptor != b.descriptor => {
            Err(mismatch())
        }
        _ => Ok(()),
    }
}

/// Constructor shared by every element of an array. Variable width types always use
/// their 32-bit form so one constructor fits all elements.
fn write_element_constructor(dst: &mut BytesMut, value: &Value) -> Result<(), Error> {
    match value {
        Value::Described(described) => {
            dst.put_u8(EncodingCodes::DescribedType as u8);
            write_descriptor(dst, &described.descriptor)?;
            write_element_constructor(dst, &described.value)?;
        }
        Value::Composite(composite) => {
            dst.put_u8(EncodingCodes::DescribedType as u8);
            write_descriptor(dst, &composite.descriptor)?;
            dst.put_u8(EncodingCodes::List32 as u8);
        }
        other => dst.put_u8(other.format_code()),
    }
    Ok(())
}

/// Element body for the constructor written by [`write_element_constructor`]
fn write_element(dst: &mut BytesMut, value: &Value) -> Result<(), Error> {
    match value {
        Value::Null => {}
        Value::Bool(v) => dst.put_u8(u8::from(*v)),
        Value::UByte(v) => dst.put_u8(*v),
        Value::UShort(v) => dst.put_u16(*v),
        Value::UInt(v) => dst.put_u32(*v),
        Value::ULong(v) => dst.put_u64(*v),
        Value::Byte(v) => dst.put_i8(*v),
        Value::Short(v) => dst.put_i16(*v),
        Value::Int(v) => dst.put_i32(*v),
        Value::Long(v) => dst.put_i64(*v),
        Value::Float(v) => dst.put_f32(v.0),
        Value::Double(v) => dst.put_f64(v.0),
        Value::Char(v) => dst.put_u32(u32::from(*v)),
        Value::Timestamp(v) => dst.put_i64(v.milliseconds()),
        Value::Uuid(v) => dst.put_slice(v.as_bytes()),
        Value::Binary(bytes) => write_element_variable(dst, bytes)?,
        Value::String(s) => write_element_variable(dst, s.as_bytes())?,
        Value::Symbol(s) => write_element_variable(dst, s.as_bytes())?,
        Value::List(items) => {
            let mut body = BytesMut::new();
            for item in items {
                encode(item, &mut body)?;
            }
            write_element_compound(dst, items.len(), &body)?;
        }
        Value::Map(map) => {
            let mut body = BytesMut::new();
            for (key, value) in map {
                encode(key, &mut body)?;
                encode(value, &mut body)?;
            }
            write_element_compound(dst, map.len() * 2, &body)?;
        }
        Value::Array(items) => {
            let body = array_body(items)?;
            write_element_compound(dst, items.len(), &body)?;
        }
        Value::Described(described) => write_element(dst, &described.value)?,
        Value::Composite(composite) => {
            let mut body = BytesMut::new();
            let fields = composite.trimmed_fields();
            for field in fields {
                match field {
                    Some(value) => encode(value, &mut body)?,
                    None => body.put_u8(EncodingCodes::Null as u8),
                }
            }
            write_element_compound(dst, fields.len(), &body)?;
        }
    }
    Ok(())
}

fn write_element_variable(dst: &mut BytesMut, bytes: &[u8]) -> Result<(), Error> {
    dst.put_u32(len_u32(bytes.len())?);
    dst.put_slice(bytes);
    Ok(())
}

fn write_element_compound(dst: &mut BytesMut, count: usize, body: &[u8]) -> Result<(), Error> {
    dst.put_u32(len_u32(body.len() + 4)?);
    dst.put_u32(len_u32(count)?);
    dst.put_slice(body);
    Ok(())
}
