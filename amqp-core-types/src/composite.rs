//! Field level conversions shared by the described record types

use amqp_value::{
    primitives::{Binary, OrderedMap, Symbol, Timestamp},
    value::CompositeView,
    AmqpType, Composite, Descriptor, Value,
};

use crate::Error;

/// A type identified on the wire by a well-known descriptor
pub trait DescribedType {
    /// Symbolic form of the descriptor
    const NAME: &'static str;

    /// Numeric form of the descriptor
    const CODE: u64;

    /// Returns true if `value` is described by either form of this type's descriptor
    fn is_described_by(value: &Value) -> bool {
        match value.descriptor() {
            Ok(Descriptor::Code(code)) => *code == Self::CODE,
            Ok(Descriptor::Name(name)) => name == Self::NAME,
            Ok(Descriptor::Value(_)) | Err(_) => false,
        }
    }
}

/// Opens the fields of a record after checking its descriptor
pub(crate) fn fields_of<T: DescribedType>(value: &Value) -> Result<CompositeView<'_>, Error> {
    let view = value.composite_view()?;
    match T::is_described_by(value) {
        true => Ok(view),
        false => Err(Error::DescriptorMismatch {
            expected: T::NAME,
            found: view.descriptor.to_string(),
        }),
    }
}

/// Inner value of a restricted (non-list) described type after checking its descriptor
pub(crate) fn described_value_of<T: DescribedType>(value: &Value) -> Result<&Value, Error> {
    let inner = value.described_value()?;
    match T::is_described_by(value) {
        true => Ok(inner),
        false => Err(Error::DescriptorMismatch {
            expected: T::NAME,
            found: value.descriptor()?.to_string(),
        }),
    }
}

/// Builds the composite value of a record from its fields
pub(crate) fn composite<T: DescribedType>(fields: Vec<Option<Value>>) -> Value {
    Value::from(Composite {
        descriptor: Descriptor::Code(T::CODE),
        fields,
    })
}

/// Reads an optional field
pub(crate) fn field<T: FromField>(view: &CompositeView<'_>, index: usize) -> Result<Option<T>, Error> {
    view.field(index)
        .map(T::from_field)
        .transpose()
        .map_err(Into::into)
}

/// Reads a mandatory field
pub(crate) fn required<T: FromField>(
    view: &CompositeView<'_>,
    index: usize,
    name: &'static str,
) -> Result<T, Error> {
    field(view, index)?.ok_or(Error::MissingField(name))
}

/// Conversion from a field of a record
pub(crate) trait FromField: Sized {
    fn from_field(value: &Value) -> Result<Self, amqp_value::Error>;
}

macro_rules! impl_from_field {
    ($($ty:ty => $accessor:ident),*) => {
        $(
            impl FromField for $ty {
                fn from_field(value: &Value) -> Result<Self, amqp_value::Error> {
                    value.$accessor()
                }
            }
        )*
    };
}

macro_rules! impl_from_field_cloned {
    ($($ty:ty => $accessor:ident),*) => {
        $(
            impl FromField for $ty {
                fn from_field(value: &Value) -> Result<Self, amqp_value::Error> {
                    value.$accessor().cloned()
                }
            }
        )*
    };
}

impl_from_field! {
    bool => as_bool,
    u8 => as_ubyte,
    u16 => as_ushort,
    u32 => as_uint,
    u64 => as_ulong,
    Timestamp => as_timestamp
}

impl_from_field_cloned! {
    String => as_string,
    Symbol => as_symbol,
    Binary => as_binary,
    OrderedMap<Value, Value> => as_map
}

impl FromField for Value {
    fn from_field(value: &Value) -> Result<Self, amqp_value::Error> {
        Ok(value.clone())
    }
}

/// A `multiple="true"` field holds either a single value or an array
impl FromField for Vec<Symbol> {
    fn from_field(value: &Value) -> Result<Self, amqp_value::Error> {
        match value {
            Value::Symbol(symbol) => Ok(vec![symbol.clone()]),
            Value::Array(items) => items.iter().map(|item| item.as_symbol().cloned()).collect(),
            other => Err(amqp_value::Error::TypeMismatch {
                expected: AmqpType::Array,
                found: other.amqp_type(),
            }),
        }
    }
}

/// Encodes a `multiple="true"` symbol field as an array
pub(crate) fn symbols(symbols: &Option<Vec<Symbol>>) -> Option<Value> {
    symbols
        .as_ref()
        .map(|symbols| Value::Array(symbols.iter().cloned().map(Value::Symbol).collect()))
}

#[cfg(test)]
mod tests {
    use amqp_value::{primitives::Symbol, Value};

    use super::{field, fields_of, DescribedType, FromField};
    use crate::Error;

    struct Probe;

    impl DescribedType for Probe {
        const NAME: &'static str = "test:probe:list";
        const CODE: u64 = 0x1234;
    }

    #[test]
    fn descriptor_matches_by_name_or_code() {
        assert!(Probe::is_described_by(&Value::composite_with_code(0x1234, 1)));
        assert!(Probe::is_described_by(&Value::composite("test:probe:list", 1)));
        assert!(!Probe::is_described_by(&Value::composite_with_code(0x70, 1)));
        assert!(!Probe::is_described_by(&Value::from(1u64)));
    }

    #[test]
    fn mismatched_descriptor_is_reported() {
        let value = Value::composite_with_code(0x70, 1);
        match fields_of::<Probe>(&value) {
            Err(Error::DescriptorMismatch { expected, found }) => {
                assert_eq!(expected, "test:probe:list");
                assert_eq!(found, "0x70");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn single_symbol_reads_as_multiple() {
        let single = Vec::<Symbol>::from_field(&Value::from(Symbol::from("a"))).unwrap();
        assert_eq!(single, vec![Symbol::from("a")]);

        let mut value = Value::composite_with_code(0x1234, 2);
        value.set_composite_field(1, 7u32).unwrap();
        let view = fields_of::<Probe>(&value).unwrap();
        assert_eq!(field::<u32>(&view, 0), Ok(None));
        assert_eq!(field::<u32>(&view, 1), Ok(Some(7)));
        assert!(field::<bool>(&view, 1).unwrap_err().is_type_mismatch());
    }
}
