//! Implementation of message header

use amqp_value::Value;

use crate::{
    composite::{composite, field, fields_of, DescribedType},
    definitions::Milliseconds,
};

/// Priority of a message whose header leaves it unset
pub const DEFAULT_PRIORITY: u8 = 4;

/// 3.2.1 Header
/// Transport headers for a message.
/// <type name="header" class="composite" source="list" provides="section">
///     <descriptor name="amqp:header:list" code="0x00000000:0x00000070"/>
/// </type>
///
/// Every field is optional. An absent field is distinct from a field explicitly set to its
/// default; the getters such as [`Header::is_durable`] apply the protocol defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    /// <field name="durable" type="boolean" default="false"/>
    pub durable: Option<bool>,

    /// <field name="priority" type="ubyte" default="4"/>
    pub priority: Option<u8>,

    /// <field name="ttl" type="milliseconds"/>
    pub ttl: Option<Milliseconds>,

    /// <field name="first-acquirer" type="boolean" default="false"/>
    pub first_acquirer: Option<bool>,

    /// <field name="delivery-count" type="uint" default="0"/>
    pub delivery_count: Option<u32>,
}

impl Header {
    /// Creates a header with every field absent
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for header
    pub fn builder() -> Builder {
        Default::default()
    }

    /// Returns true if `value` is described as a message header
    pub fn is_header_type(value: &Value) -> bool {
        Self::is_described_by(value)
    }

    /// Durability requirement, `false` when absent
    pub fn is_durable(&self) -> bool {
        self.durable.unwrap_or(false)
    }

    /// Relative message priority, 4 when absent
    pub fn priority(&self) -> u8 {
        self.priority.unwrap_or(DEFAULT_PRIORITY)
    }

    /// Time to live in milliseconds
    pub fn time_to_live(&self) -> Option<Milliseconds> {
        self.ttl
    }

    /// Whether the message has not been acquired before, `false` when absent
    pub fn is_first_acquirer(&self) -> bool {
        self.first_acquirer.unwrap_or(false)
    }

    /// Number of prior unsuccessful delivery attempts, 0 when absent
    pub fn delivery_count(&self) -> u32 {
        self.delivery_count.unwrap_or(0)
    }
}

impl DescribedType for Header {
    const NAME: &'static str = "amqp:header:list";
    const CODE: u64 = 0x0000_0000_0000_0070;
}

impl From<&Header> for Value {
    fn from(header: &Header) -> Self {
        composite::<Header>(vec![
            header.durable.map(Value::Bool),
            header.priority.map(Value::UByte),
            header.ttl.map(Value::UInt),
            header.first_acquirer.map(Value::Bool),
            header.delivery_count.map(Value::UInt),
        ])
    }
}

impl From<Header> for Value {
    fn from(header: Header) -> Self {
        Value::from(&header)
    }
}

impl TryFrom<&Value> for Header {
    type Error = crate::Error;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let view = fields_of::<Header>(value)?;
        Ok(Self {
            durable: field(&view, 0)?,
            priority: field(&view, 1)?,
            ttl: field(&view, 2)?,
            first_acquirer: field(&view, 3)?,
            delivery_count: field(&view, 4)?,
        })
    }
}

/// Builder for [`Header`]
#[derive(Debug, Default, Clone)]
pub struct Builder {
    inner: Header,
}

impl Builder {
    /// Set the `durable` field of [`Header`]
    pub fn durable(mut self, value: impl Into<Option<bool>>) -> Self {
        self.inner.durable = value.into();
        self
    }

    /// Set the `priority` field of [`Header`]
    pub fn priority(mut self, value: impl Into<Option<u8>>) -> Self {
        self.inner.priority = value.into();
        self
    }

    /// Set the `ttl` field of [`Header`]
    pub fn ttl(mut self, value: impl Into<Option<Milliseconds>>) -> Self {
        self.inner.ttl = value.into();
        self
    }

    /// Set the `first_acquirer` field of [`Header`]
    pub fn first_acquirer(mut self, value: impl Into<Option<bool>>) -> Self {
        self.inner.first_acquirer = value.into();
        self
    }

    /// Set the `delivery_count` field of [`Header`]
    pub fn delivery_count(mut self, value: impl Into<Option<u32>>) -> Self {
        self.inner.delivery_count = value.into();
        self
    }

    /// Builds the [`Header`]
    pub fn build(self) -> Header {
        self.inner
    }
}

impl From<Builder> for Header {
    fn from(builder: Builder) -> Self {
        builder.build()
    }
}
