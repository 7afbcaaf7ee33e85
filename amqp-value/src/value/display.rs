use std::fmt::{self, Display, Write};

use super::Value;

fn write_seq<'a>(
    f: &mut fmt::Formatter<'_>,
    open: char,
    close: char,
    items: impl Iterator<Item = &'a Value>,
) -> fmt::Result {
    f.write_char(open)?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    f.write_char(close)
}

/// Human readable rendering for logs.
///
/// Lists print as `[..]`, arrays as `<..>`, maps as `{k: v}`, symbols with a leading `:`
/// and described values as `descriptor(value)`.
impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::UByte(v) => write!(f, "{}", v),
            Value::UShort(v) => write!(f, "{}", v),
            Value::UInt(v) => write!(f, "{}", v),
            Value::ULong(v) => write!(f, "{}", v),
            Value::Byte(v) => write!(f, "{}", v),
            Value::Short(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v.0),
            Value::Double(v) => write!(f, "{}", v.0),
            Value::Char(v) => write!(f, "{:?}", v),
            Value::Timestamp(v) => write!(f, "timestamp({})", v.milliseconds()),
            Value::Uuid(v) => write!(f, "{}", v),
            Value::Binary(v) => write!(f, "b\"{}\"", v.escape_ascii()),
            Value::String(v) => write!(f, "{:?}", v),
            Value::Symbol(v) => write!(f, ":{}", v),
            Value::List(items) => write_seq(f, '[', ']', items.iter()),
            Value::Array(items) => write_seq(f, '<', '>', items.iter()),
            Value::Map(map) => {
                f.write_char('{')?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_char('}')
            }
            Value::Described(described) => {
                write!(f, "{}({})", described.descriptor, described.value)
            }
            Value::Composite(composite) => {
                write!(f, "{}(", composite.descriptor)?;
                for (i, field) in composite.trimmed_fields().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match field {
                        Some(value) => write!(f, "{}", value)?,
                        None => f.write_str("null")?,
                    }
                }
                f.write_char(')')
            }
        }
    }
}
