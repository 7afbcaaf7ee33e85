use amqp_value::{primitives::Symbol, Value};

use crate::{
    composite::{composite, field, fields_of, required, symbols, DescribedType},
    definitions::{fields_from_value, fields_to_value, Fields, Milliseconds},
};

/// Negotiate connection parameters.
/// <type name="open" class="composite" source="list" provides="frame">
///     <descriptor name="amqp:open:list" code="0x00000000:0x00000010"/>
/// </type>
#[derive(Debug, Clone, PartialEq)]
pub struct Open {
    /// <field name="container-id" type="string" mandatory="true"/>
    pub container_id: String,

    /// <field name="hostname" type="string"/>
    pub hostname: Option<String>,

    /// <field name="max-frame-size" type="uint" default="4294967295"/>
    pub max_frame_size: MaxFrameSize,

    /// <field name="channel-max" type="ushort" default="65535"/>
    pub channel_max: ChannelMax,

    /// <field name="idle-time-out" type="milliseconds"/>
    pub idle_time_out: Option<Milliseconds>,

    /// <field name="outgoing-locales" type="ietf-language-tag" multiple="true"/>
    pub outgoing_locales: Option<Vec<Symbol>>,

    /// <field name="incoming-locales" type="ietf-language-tag" multiple="true"/>
    pub incoming_locales: Option<Vec<Symbol>>,

    /// <field name="offered-capabilities" type="symbol" multiple="true"/>
    pub offered_capabilities: Option<Vec<Symbol>>,

    /// <field name="desired-capabilities" type="symbol" multiple="true"/>
    pub desired_capabilities: Option<Vec<Symbol>>,

    /// <field name="properties" type="fields"/>
    pub properties: Option<Fields>,
}

impl Open {
    /// Creates an open with the given container id and every other field at its default
    pub fn new(container_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            hostname: None,
            max_frame_size: MaxFrameSize::default(),
            channel_max: ChannelMax::default(),
            idle_time_out: None,
            outgoing_locales: None,
            incoming_locales: None,
            offered_capabilities: None,
            desired_capabilities: None,
            properties: None,
        }
    }
}

/// Proposed maximum frame size
///
/// A simple wrapper over u32 with a default value set to `u32::MAX`
///
/// The largest frame size that the sending peer is able to accept on this connection. If this field
/// is not set it means that the peer does not impose any specific limit. A peer MUST NOT send
/// frames larger than its partner can handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxFrameSize(pub u32);

impl Default for MaxFrameSize {
    fn default() -> Self {
        MaxFrameSize(u32::MAX)
    }
}

impl From<u32> for MaxFrameSize {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<MaxFrameSize> for usize {
    fn from(value: MaxFrameSize) -> Self {
        value.0 as usize
    }
}

/// the maximum channel number that can be used on the connection
///
/// This value plus one is the maximum number of sessions that can be simultaneously active on
/// the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelMax(pub u16);

impl Default for ChannelMax {
    fn default() -> Self {
        Self(u16::MAX)
    }
}

impl From<u16> for ChannelMax {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl DescribedType for Open {
    const NAME: &'static str = "amqp:open:list";
    const CODE: u64 = 0x0000_0000_0000_0010;
}

impl From<&Open> for Value {
    fn from(open: &Open) -> Self {
        composite::<Open>(vec![
            Some(Value::String(open.container_id.clone())),
            open.hostname.clone().map(Value::String),
            Some(Value::UInt(open.max_frame_size.0)),
            Some(Value::UShort(open.channel_max.0)),
            open.idle_time_out.map(Value::UInt),
            symbols(&open.outgoing_locales),
            symbols(&open.incoming_locales),
            symbols(&open.offered_capabilities),
            symbols(&open.desired_capabilities),
            open.properties.as_ref().map(fields_to_value),
        ])
    }
}

impl TryFrom<&Value> for Open {
    type Error = crate::Error;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let view = fields_of::<Open>(value)?;
        Ok(Self {
            container_id: required(&view, 0, "container-id")?,
            hostname: field(&view, 1)?,
            max_frame_size: field::<u32>(&view, 2)?.map(MaxFrameSize).unwrap_or_default(),
            channel_max: field::<u16>(&view, 3)?.map(ChannelMax).unwrap_or_default(),
            idle_time_out: field(&view, 4)?,
            outgoing_locales: field(&view, 5)?,
            incoming_locales: field(&view, 6)?,
            offered_capabilities: field(&view, 7)?,
            desired_capabilities: field(&view, 8)?,
            properties: view.field(9).map(fields_from_value).transpose()?,
        })
    }
}
