#![deny(missing_docs, missing_debug_implementations)]

//! AMQP 1.0 message envelope, connection performatives and shared definitions, layered on
//! the value algebra of [`amqp_value`].

pub mod definitions;
pub mod error;
pub mod messaging;
pub mod performatives;
pub mod states;

mod composite;

pub use composite::DescribedType;
pub use error::Error;
