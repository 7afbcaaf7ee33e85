//! Low level framing
//!
//! Two layers: a `tokio_util::codec::LengthDelimitedCodec` splits the byte stream on the
//! 4-byte frame size, and [`amqp::FrameCodec`] reads the rest of the frame header and the
//! performative it carries. The protocol header that precedes all frames has its own codec
//! in [`protocol_header`].

pub mod amqp;
mod error;
pub mod protocol_header;

pub use error::Error;

/// Frame type of AMQP frames
pub const FRAME_TYPE_AMQP: u8 = 0x00;

/// Frame type of SASL frames
pub const FRAME_TYPE_SASL: u8 = 0x01;

/// Size of the fixed frame header, including the size field itself
pub const FRAME_HEADER_SIZE: usize = 8;
