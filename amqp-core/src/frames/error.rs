use std::io;

/// Error encoding or decoding a frame
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error
    #[error("IO Error {0:?}")]
    Io(#[from] io::Error),

    /// The frame body is not a valid encoding
    #[error("Decode Error {0}")]
    Value(#[from] amqp_value::Error),

    /// The frame body does not hold a performative
    #[error("Decode Error {0}")]
    Types(#[from] amqp_core_types::Error),

    /// The frame is larger than the negotiated maximum
    #[error("Frame exceeds the max frame size of {max} bytes")]
    MaxFrameSizeExceeded {
        /// Negotiated maximum
        max: usize,
    },

    /// Fewer bytes than the fixed frame header
    #[error("Frame is shorter than its header")]
    InvalidFrameHeader,

    /// The data offset points inside the fixed header or past the frame
    #[error("Invalid data offset {0}")]
    InvalidDataOffset(u8),

    /// Frame types other than AMQP are not handled
    #[error("Unsupported frame type {0:#04x}")]
    UnsupportedFrameType(u8),

    /// The eight bytes received do not form a protocol header
    #[error("Invalid protocol header {0:?}")]
    InvalidProtocolHeader([u8; 8]),
}
