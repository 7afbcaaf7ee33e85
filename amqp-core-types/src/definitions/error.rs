use std::fmt::Display;

use amqp_value::{primitives::Symbol, Value};

use super::{fields_from_value, fields_to_value, ErrorCondition, Fields};
use crate::composite::{composite, field, fields_of, required, DescribedType};

/// <type name="error" class="composite" source="list">
/// <descriptor name="amqp:error:list" code="0x00000000:0x0000001d"/>
/// </type>
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    /// <field name="condition" type="symbol" requires="error-condition" mandatory="true"/>
    pub condition: ErrorCondition,

    /// <field name="description" type="string"/>
    pub description: Option<String>,

    /// <field name="info" type="fields"/>
    pub info: Option<Fields>,
}

impl Error {
    /// Creates a new error. An empty description is treated as absent.
    pub fn new(
        condition: impl Into<ErrorCondition>,
        description: impl Into<Option<String>>,
        info: impl Into<Option<Fields>>,
    ) -> Self {
        Self {
            condition: condition.into(),
            description: description.into().filter(|d| !d.is_empty()),
            info: info.into(),
        }
    }
}

impl<T> From<T> for Error
where
    T: Into<ErrorCondition>,
{
    fn from(condition: T) -> Self {
        Self {
            condition: condition.into(),
            description: None,
            info: None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.condition)?;
        if let Some(description) = &self.description {
            write!(f, ": {}", description)?;
        }
        Ok(())
    }
}

impl DescribedType for Error {
    const NAME: &'static str = "amqp:error:list";
    const CODE: u64 = 0x0000_0000_0000_001d;
}

impl From<&Error> for Value {
    fn from(error: &Error) -> Self {
        composite::<Error>(vec![
            Some(Value::from(&error.condition)),
            error.description.clone().map(Value::String),
            error.info.as_ref().map(fields_to_value),
        ])
    }
}

impl TryFrom<&Value> for Error {
    type Error = crate::Error;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let view = fields_of::<Error>(value)?;
        let condition: Symbol = required(&view, 0, "condition")?;
        let info = view.field(2).map(fields_from_value).transpose()?;
        Ok(Self {
            condition: ErrorCondition::from(condition),
            description: field(&view, 1)?,
            info,
        })
    }
}

#[cfg(test)]
mod tests {
    use amqp_value::{from_slice, primitives::Symbol, to_vec, Value};

    use super::Error;
    use crate::definitions::{AmqpError, Fields};

    #[test]
    fn error_round_trips_through_the_codec() {
        let mut info = Fields::new();
        info.insert(Symbol::from("hint"), Value::from("retry later"));
        let expected = Error::new(AmqpError::DecodeError, String::from("bad frame"), info);

        let encoded = to_vec(&Value::from(&expected)).unwrap();
        let decoded = from_slice(&encoded).unwrap();
        assert_eq!(Error::try_from(&decoded), Ok(expected));
    }

    #[test]
    fn empty_description_is_omitted() {
        let error = Error::new(AmqpError::NotAllowed, String::new(), None);
        assert_eq!(error.description, None);
        assert_eq!(error.to_string(), "amqp:not-allowed");
    }

    #[test]
    fn missing_condition_is_rejected() {
        let value = Value::composite_with_code(0x1d, 3);
        assert_eq!(
            Error::try_from(&value),
            Err(crate::Error::MissingField("condition"))
        );
    }
}
