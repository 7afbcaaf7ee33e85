//! Performatives defined in AMQP 1.0 specification Part 2.7
//!
//! Only the connection level performatives are typed. The session and link performatives
//! travel as generic values between the connection and the owners of its endpoints.

mod begin;
mod close;
mod end;
mod open;

pub use begin::*;
pub use close::*;
pub use end::*;
pub use open::*;

use std::fmt::Display;

use amqp_value::Value;

use crate::composite::DescribedType;

/// AMQP 1.0 Performatives
#[derive(Debug, Clone, PartialEq)]
pub enum Performative {
    /// Open
    Open(Open),

    /// Begin
    Begin(Begin),

    /// End
    End(End),

    /// Close
    Close(Close),

    /// Any other described performative, left undecoded
    Other(Value),
}

impl Performative {
    /// Short name used when logging frames
    pub fn name(&self) -> &'static str {
        match self {
            Performative::Open(_) => "open",
            Performative::Begin(_) => "begin",
            Performative::End(_) => "end",
            Performative::Close(_) => "close",
            Performative::Other(value) => match value.descriptor().ok().and_then(|d| d.as_code()) {
                Some(0x12) => "attach",
                Some(0x13) => "flow",
                Some(0x14) => "transfer",
                Some(0x15) => "disposition",
                Some(0x16) => "detach",
                _ => "unknown",
            },
        }
    }
}

impl TryFrom<Value> for Performative {
    type Error = crate::Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let performative = if Open::is_described_by(&value) {
            Performative::Open(Open::try_from(&value)?)
        } else if Begin::is_described_by(&value) {
            Performative::Begin(Begin::try_from(&value)?)
        } else if End::is_described_by(&value) {
            Performative::End(End::try_from(&value)?)
        } else if Close::is_described_by(&value) {
            Performative::Close(Close::try_from(&value)?)
        } else {
            // anything else must at least be a described record
            value.composite_view()?;
            Performative::Other(value)
        };
        Ok(performative)
    }
}

impl From<&Performative> for Value {
    fn from(performative: &Performative) -> Self {
        match performative {
            Performative::Open(open) => Value::from(open),
            Performative::Begin(begin) => Value::from(begin),
            Performative::End(end) => Value::from(end),
            Performative::Close(close) => Value::from(close),
            Performative::Other(value) => value.clone(),
        }
    }
}

impl Display for Performative {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name(), Value::from(self))
    }
}
