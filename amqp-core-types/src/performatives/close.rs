use amqp_value::Value;

use crate::{
    composite::{composite, fields_of, DescribedType},
    definitions::Error,
};

/// Signal a connection close.
/// <type name="close" class="composite" source="list" provides="frame">
///     <descriptor name="amqp:close:list" code="0x00000000:0x00000018"/>
/// </type>
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Close {
    /// <field name="error" type="error"/>
    pub error: Option<Error>,
}

impl Close {
    /// Creates a new close
    pub fn new(error: Option<Error>) -> Self {
        Self { error }
    }
}

impl DescribedType for Close {
    const NAME: &'static str = "amqp:close:list";
    const CODE: u64 = 0x0000_0000_0000_0018;
}

impl From<&Close> for Value {
    fn from(close: &Close) -> Self {
        composite::<Close>(vec![close.error.as_ref().map(Value::from)])
    }
}

impl TryFrom<&Value> for Close {
    type Error = crate::Error;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let view = fields_of::<Close>(value)?;
        Ok(Self {
            error: view.field(0).map(Error::try_from).transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use amqp_value::{from_slice, to_vec, Value};

    use super::Close;
    use crate::definitions::{AmqpError, Error};

    #[test]
    fn empty_close_is_a_bare_descriptor_and_list0() {
        let encoded = to_vec(&Value::from(&Close::default())).unwrap();
        assert_eq!(encoded, vec![0x00, 0x53, 0x18, 0x45]);
    }

    #[test]
    fn close_with_error_round_trip() {
        let close = Close::new(Some(Error::new(
            AmqpError::ResourceLimitExceeded,
            String::from("idle timeout"),
            None,
        )));
        let decoded = from_slice(&to_vec(&Value::from(&close)).unwrap()).unwrap();
        assert_eq!(Close::try_from(&decoded), Ok(close));
    }
}
