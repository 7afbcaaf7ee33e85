//! Described and composite values

use crate::{descriptor::Descriptor, value::Value};

/// A value tagged with a descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Described {
    /// Descriptor identifying the meaning of `value`
    pub descriptor: Descriptor,
    /// The described value
    pub value: Value,
}

impl Described {
    /// Creates a new described value
    pub fn new(descriptor: impl Into<Descriptor>, value: impl Into<Value>) -> Self {
        Self {
            descriptor: descriptor.into(),
            value: value.into(),
        }
    }
}

/// A fixed-schema record: a descriptor plus a fixed number of optional fields.
///
/// On the wire a composite is a described list. Trailing unset fields are omitted and
/// unset fields in between are encoded as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Composite {
    /// Descriptor identifying the record type
    pub descriptor: Descriptor,
    /// Fields of the record; `None` is an unset field
    pub fields: Vec<Option<Value>>,
}

impl Composite {
    /// Creates a composite with `field_count` unset fields
    pub fn new(descriptor: impl Into<Descriptor>, field_count: usize) -> Self {
        Self {
            descriptor: descriptor.into(),
            fields: vec![None; field_count],
        }
    }

    /// Fields with trailing unset entries removed
    pub fn trimmed_fields(&self) -> &[Option<Value>] {
        let end = self
            .fields
            .iter()
            .rposition(Option::is_some)
            .map(|i| i + 1)
            .unwrap_or(0);
        &self.fields[..end]
    }
}
