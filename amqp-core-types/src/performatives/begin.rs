use amqp_value::{primitives::Symbol, Value};

use crate::{
    composite::{composite, field, fields_of, required, symbols, DescribedType},
    definitions::{fields_from_value, fields_to_value, Fields},
};

/// Begin a session on a channel.
/// <type name="begin" class="composite" source="list" provides="frame">
///     <descriptor name="amqp:begin:list" code="0x00000000:0x00000011"/>
/// </type>
#[derive(Debug, Clone, PartialEq)]
pub struct Begin {
    /// <field name="remote-channel" type="ushort"/>
    pub remote_channel: Option<u16>,

    /// <field name="next-outgoing-id" type="transfer-number" mandatory="true"/>
    pub next_outgoing_id: u32,

    /// <field name="incoming-window" type="uint" mandatory="true"/>
    pub incoming_window: u32,

    /// <field name="outgoing-window" type="uint" mandatory="true"/>
    pub outgoing_window: u32,

    /// <field name="handle-max" type="handle" default="4294967295"/>
    pub handle_max: Option<u32>,

    /// <field name="offered-capabilities" type="symbol" multiple="true"/>
    pub offered_capabilities: Option<Vec<Symbol>>,

    /// <field name="desired-capabilities" type="symbol" multiple="true"/>
    pub desired_capabilities: Option<Vec<Symbol>>,

    /// <field name="properties" type="fields"/>
    pub properties: Option<Fields>,
}

impl DescribedType for Begin {
    const NAME: &'static str = "amqp:begin:list";
    const CODE: u64 = 0x0000_0000_0000_0011;
}

impl From<&Begin> for Value {
    fn from(begin: &Begin) -> Self {
        composite::<Begin>(vec![
            begin.remote_channel.map(Value::UShort),
            Some(Value::UInt(begin.next_outgoing_id)),
            Some(Value::UInt(begin.incoming_window)),
            Some(Value::UInt(begin.outgoing_window)),
            begin.handle_max.map(Value::UInt),
            symbols(&begin.offered_capabilities),
            symbols(&begin.desired_capabilities),
            begin.properties.as_ref().map(fields_to_value),
        ])
    }
}

impl TryFrom<&Value> for Begin {
    type Error = crate::Error;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let view = fields_of::<Begin>(value)?;
        Ok(Self {
            remote_channel: field(&view, 0)?,
            next_outgoing_id: required(&view, 1, "next-outgoing-id")?,
            incoming_window: required(&view, 2, "incoming-window")?,
            outgoing_window: required(&view, 3, "outgoing-window")?,
            handle_max: field(&view, 4)?,
            offered_capabilities: field(&view, 5)?,
            desired_capabilities: field(&view, 6)?,
            properties: view.field(7).map(fields_from_value).transpose()?,
        })
    }
}
