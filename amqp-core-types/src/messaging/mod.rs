//! Types defined in AMQP 1.0 specification Part 3.2: Messaging

mod format;
pub use format::*;

mod message;
pub use message::{Body, BodyType, Builder as MessageBuilder, Message};
