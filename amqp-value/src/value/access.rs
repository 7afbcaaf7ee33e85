//! Typed accessors and container operations on [`Value`]

use serde_bytes::ByteBuf;

use super::{AmqpType, Value};
use crate::{
    described::{Composite, Described},
    descriptor::Descriptor,
    primitives::{Array, OrderedMap, Symbol, Timestamp, Uuid},
    Error,
};

static NULL: Value = Value::Null;

macro_rules! impl_copy_accessors {
    ($($(#[$meta:meta])* $fn_name:ident => $variant:ident, $ty:ty;)*) => {
        $(
            $(#[$meta])*
            pub fn $fn_name(&self) -> Result<$ty, Error> {
                match self {
                    Value::$variant(val) => Ok(*val),
                    other => Err(Error::mismatch(AmqpType::$variant, other.amqp_type())),
                }
            }
        )*
    };
}

macro_rules! impl_ref_accessors {
    ($($(#[$meta:meta])* $fn_name:ident => $variant:ident, $ty:ty;)*) => {
        $(
            $(#[$meta])*
            pub fn $fn_name(&self) -> Result<&$ty, Error> {
                match self {
                    Value::$variant(val) => Ok(val),
                    other => Err(Error::mismatch(AmqpType::$variant, other.amqp_type())),
                }
            }
        )*
    };
}

impl Value {
    impl_copy_accessors! {
        /// Value of a `boolean`
        as_bool => Bool, bool;
        /// Value of a `ubyte`
        as_ubyte => UByte, u8;
        /// Value of a `ushort`
        as_ushort => UShort, u16;
        /// Value of a `uint`
        as_uint => UInt, u32;
        /// Value of a `ulong`
        as_ulong => ULong, u64;
        /// Value of a `byte`
        as_byte => Byte, i8;
        /// Value of a `short`
        as_short => Short, i16;
        /// Value of an `int`
        as_int => Int, i32;
        /// Value of a `long`
        as_long => Long, i64;
        /// Value of a `char`
        as_char => Char, char;
        /// Value of a `timestamp`
        as_timestamp => Timestamp, Timestamp;
        /// Value of a `uuid`
        as_uuid => Uuid, Uuid;
    }

    impl_ref_accessors! {
        /// Borrow a `string`
        as_string => String, String;
        /// Borrow a `symbol`
        as_symbol => Symbol, Symbol;
        /// Borrow a `binary`
        as_binary => Binary, ByteBuf;
        /// Borrow the items of a `list`
        as_list => List, Vec<Value>;
        /// Borrow a `map`
        as_map => Map, OrderedMap<Value, Value>;
        /// Borrow an `array`
        as_array => Array, Array<Value>;
    }

    /// Value of a `float`
    pub fn as_float(&self) -> Result<f32, Error> {
        match self {
            Value::Float(val) => Ok(val.0),
            other => Err(Error::mismatch(AmqpType::Float, other.amqp_type())),
        }
    }

    /// Value of a `double`
    pub fn as_double(&self) -> Result<f64, Error> {
        match self {
            Value::Double(val) => Ok(val.0),
            other => Err(Error::mismatch(AmqpType::Double, other.amqp_type())),
        }
    }

    /* ---------------------------------- List ---------------------------------- */

    /// Creates an empty list
    pub fn list() -> Self {
        Value::List(Vec::new())
    }

    fn list_mut(&mut self) -> Result<&mut Vec<Value>, Error> {
        match self {
            Value::List(items) => Ok(items),
            other => Err(Error::mismatch(AmqpType::List, other.amqp_type())),
        }
    }

    /// Resizes the list; new items are `null`
    pub fn set_list_item_count(&mut self, count: usize) -> Result<(), Error> {
        self.list_mut()?.resize(count, Value::Null);
        Ok(())
    }

    /// Sets the item at `index`, growing the list with `null` items when `index` is past
    /// the end
    pub fn set_list_item(&mut self, index: usize, item: impl Into<Value>) -> Result<(), Error> {
        let items = self.list_mut()?;
        if index >= items.len() {
            items.resize(index + 1, Value::Null);
        }
        items[index] = item.into();
        Ok(())
    }

    /// Item at `index`
    pub fn list_item(&self, index: usize) -> Result<&Value, Error> {
        let items = self.as_list()?;
        items
            .get(index)
            .ok_or_else(|| Error::out_of_range(index, items.len()))
    }

    /// Number of items in the list
    pub fn list_item_count(&self) -> Result<usize, Error> {
        self.as_list().map(Vec::len)
    }

    /* ----------------------------------- Map ---------------------------------- */

    /// Creates an empty map
    pub fn map() -> Self {
        Value::Map(OrderedMap::new())
    }

    /// Inserts or replaces the value under `key`. A new key goes to the end.
    pub fn set_map_value(
        &mut self,
        key: impl Into<Value>,
        value: impl Into<Value>,
    ) -> Result<(), Error> {
        match self {
            Value::Map(map) => {
                map.insert(key.into(), value.into());
                Ok(())
            }
            other => Err(Error::mismatch(AmqpType::Map, other.amqp_type())),
        }
    }

    /// Value stored under `key`, if any
    pub fn map_value(&self, key: &Value) -> Result<Option<&Value>, Error> {
        self.as_map().map(|map| map.get(key))
    }

    /// Key and value of the pair at `index` in insertion order
    pub fn map_key_value_at(&self, index: usize) -> Result<(&Value, &Value), Error> {
        let map = self.as_map()?;
        map.get_index(index)
            .ok_or_else(|| Error::out_of_range(index, map.len()))
    }

    /// Number of key-value pairs
    pub fn map_pair_count(&self) -> Result<usize, Error> {
        self.as_map().map(OrderedMap::len)
    }

    /* ---------------------------------- Array --------------------------------- */

    /// Creates an empty array.
    ///
    /// Callers keep every element of one AMQP type; the encoder rejects mixed arrays.
    pub fn array() -> Self {
        Value::Array(Array::new())
    }

    /// Appends an element
    pub fn add_array_item(&mut self, item: impl Into<Value>) -> Result<(), Error> {
        match self {
            Value::Array(items) => {
                items.push(item.into());
                Ok(())
            }
            other => Err(Error::mismatch(AmqpType::Array, other.amqp_type())),
        }
    }

    /// Element at `index`
    pub fn array_item(&self, index: usize) -> Result<&Value, Error> {
        let items = self.as_array()?;
        items
            .get(index)
            .ok_or_else(|| Error::out_of_range(index, items.len()))
    }

    /// Number of elements
    pub fn array_item_count(&self) -> Result<usize, Error> {
        self.as_array().map(|items| items.len())
    }

    /* -------------------------------- Composite ------------------------------- */

    /// Creates a composite with `field_count` unset fields
    pub fn composite(descriptor: impl Into<Descriptor>, field_count: usize) -> Self {
        Value::Composite(Box::new(Composite::new(descriptor, field_count)))
    }

    /// Creates a composite with a numeric descriptor
    pub fn composite_with_code(code: u64, field_count: usize) -> Self {
        Self::composite(Descriptor::Code(code), field_count)
    }

    /// Borrow a composite
    pub fn as_composite(&self) -> Result<&Composite, Error> {
        match self {
            Value::Composite(composite) => Ok(composite),
            other => Err(Error::mismatch(AmqpType::Composite, other.amqp_type())),
        }
    }

    fn composite_mut(&mut self) -> Result<&mut Composite, Error> {
        match self {
            Value::Composite(composite) => Ok(composite),
            other => Err(Error::mismatch(AmqpType::Composite, other.amqp_type())),
        }
    }

    /// Changes the number of fields; new fields are unset
    pub fn set_composite_field_count(&mut self, count: usize) -> Result<(), Error> {
        self.composite_mut()?.fields.resize(count, None);
        Ok(())
    }

    /// Sets field `index`. The field count is fixed, so `index` must be below it.
    pub fn set_composite_field(
        &mut self,
        index: usize,
        field: impl Into<Value>,
    ) -> Result<(), Error> {
        let composite = self.composite_mut()?;
        let count = composite.fields.len();
        let slot = composite
            .fields
            .get_mut(index)
            .ok_or_else(|| Error::out_of_range(index, count))?;
        *slot = Some(field.into());
        Ok(())
    }

    /// Field at `index`; an unset field reads as `null`
    pub fn composite_field(&self, index: usize) -> Result<&Value, Error> {
        let composite = self.as_composite()?;
        match composite.fields.get(index) {
            Some(Some(field)) => Ok(field),
            Some(None) => Ok(&NULL),
            None => Err(Error::out_of_range(index, composite.fields.len())),
        }
    }

    /// Number of fields
    pub fn composite_field_count(&self) -> Result<usize, Error> {
        self.as_composite().map(|c| c.fields.len())
    }

    /* -------------------------------- Described ------------------------------- */

    /// Creates a described value
    pub fn described(descriptor: impl Into<Descriptor>, value: impl Into<Value>) -> Self {
        Value::Described(Box::new(Described::new(descriptor, value)))
    }

    /// Borrow a described value
    pub fn as_described(&self) -> Result<&Described, Error> {
        match self {
            Value::Described(described) => Ok(described),
            other => Err(Error::mismatch(AmqpType::Described, other.amqp_type())),
        }
    }

    /// Descriptor of a described or composite value
    pub fn descriptor(&self) -> Result<&Descriptor, Error> {
        match self {
            Value::Described(described) => Ok(&described.descriptor),
            Value::Composite(composite) => Ok(&composite.descriptor),
            other => Err(Error::mismatch(AmqpType::Described, other.amqp_type())),
        }
    }

    /// The value carried by a described value
    pub fn described_value(&self) -> Result<&Value, Error> {
        self.as_described().map(|described| &described.value)
    }

    /// Returns true if this is a described or composite value with `descriptor`
    pub fn has_descriptor(&self, descriptor: &Descriptor) -> bool {
        self.descriptor().map(|d| d == descriptor).unwrap_or(false)
    }

    /// Read-only view over the fields of a record.
    ///
    /// Accepts both a [`Value::Composite`] and a described list, which is what decoding a
    /// composite from the wire yields.
    pub fn composite_view(&self) -> Result<CompositeView<'_>, Error> {
        match self {
            Value::Composite(composite) => Ok(CompositeView {
                descriptor: &composite.descriptor,
                fields: Fields::Slots(&composite.fields),
            }),
            Value::Described(described) => match &described.value {
                Value::List(items) => Ok(CompositeView {
                    descriptor: &described.descriptor,
                    fields: Fields::Items(items),
                }),
                other => Err(Error::mismatch(AmqpType::List, other.amqp_type())),
            },
            other => Err(Error::mismatch(AmqpType::Composite, other.amqp_type())),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Fields<'a> {
    Slots(&'a [Option<Value>]),
    Items(&'a [Value]),
}

/// Fields of a composite or of a described list
#[derive(Debug, Clone, Copy)]
pub struct CompositeView<'a> {
    /// Descriptor of the record
    pub descriptor: &'a Descriptor,
    fields: Fields<'a>,
}

impl<'a> CompositeView<'a> {
    /// Number of fields present
    pub fn len(&self) -> usize {
        match self.fields {
            Fields::Slots(slots) => slots.len(),
            Fields::Items(items) => items.len(),
        }
    }

    /// Returns true if no field is present
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Field at `index`. Unset, `null` and missing trailing fields are all `None`.
    pub fn field(&self, index: usize) -> Option<&'a Value> {
        let field = match self.fields {
            Fields::Slots(slots) => slots.get(index).and_then(Option::as_ref),
            Fields::Items(items) => items.get(index),
        };
        field.filter(|value| !value.is_null())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessor_on_wrong_type_is_type_mismatch() {
        let value = Value::from(true);
        assert_eq!(
            value.list_item_count(),
            Err(Error::TypeMismatch {
                expected: AmqpType::List,
                found: AmqpType::Bool
            })
        );
        assert!(matches!(value.as_int(), Err(Error::TypeMismatch { .. })));
        assert!(matches!(value.as_string(), Err(Error::TypeMismatch { .. })));
        assert_eq!(value.as_bool(), Ok(true));
    }

    #[test]
    fn list_item_past_count() {
        let mut list = Value::list();
        list.set_list_item_count(2).unwrap();
        assert_eq!(list.list_item(1), Ok(&Value::Null));
        assert_eq!(
            list.list_item(2),
            Err(Error::IndexOutOfRange { index: 2, count: 2 })
        );

        list.set_list_item(4, 10u32).unwrap();
        assert_eq!(list.list_item_count(), Ok(5));
        assert_eq!(list.list_item(4), Ok(&Value::UInt(10)));
    }

    #[test]
    fn composite_unset_field_reads_null() {
        let mut value = Value::composite("test:record", 3);
        value.set_composite_field(1, "b").unwrap();
        assert_eq!(value.composite_field(0), Ok(&Value::Null));
        assert_eq!(value.composite_field(1), Ok(&Value::from("b")));
        assert!(matches!(
            value.set_composite_field(3, 1u8),
            Err(Error::IndexOutOfRange { index: 3, count: 3 })
        ));
        assert!(matches!(
            value.composite_field(3),
            Err(Error::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn composite_view_over_described_list() {
        let value = Value::described(
            0x70u64,
            vec![Value::from(true), Value::Null, Value::from(3u32)],
        );
        let view = value.composite_view().unwrap();
        assert_eq!(view.descriptor, &Descriptor::Code(0x70));
        assert_eq!(view.len(), 3);
        assert_eq!(view.field(0), Some(&Value::Bool(true)));
        assert_eq!(view.field(1), None);
        assert_eq!(view.field(2), Some(&Value::UInt(3)));
        assert_eq!(view.field(7), None);
    }

    #[test]
    fn descriptor_of_plain_value_is_mismatch() {
        assert!(Value::from(1u8).descriptor().is_err());
        assert!(!Value::from(1u8).has_descriptor(&Descriptor::Code(0x70)));
    }
}
