use amqp_value::Value;

use crate::{
    composite::{composite, fields_of, DescribedType},
    definitions::Error,
};

/// End the session.
/// <type name="end" class="composite" source="list" provides="frame">
///     <descriptor name="amqp:end:list" code="0x00000000:0x00000017"/>
/// </type>
#[derive(Debug, Clone, Default, PartialEq)]
pub struct End {
    /// <field name="error" type="error"/>
    pub error: Option<Error>,
}

impl DescribedType for End {
    const NAME: &'static str = "amqp:end:list";
    const CODE: u64 = 0x0000_0000_0000_0017;
}

impl From<&End> for Value {
    fn from(end: &End) -> Self {
        composite::<End>(vec![end.error.as_ref().map(Value::from)])
    }
}

impl TryFrom<&Value> for End {
    type Error = crate::Error;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let view = fields_of::<End>(value)?;
        Ok(Self {
            error: view.field(0).map(Error::try_from).transpose()?,
        })
    }
}
