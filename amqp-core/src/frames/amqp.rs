//! AMQP frame type and corresponding encoder and decoder

use std::{fmt::Display, io};

use amqp_core_types::performatives::Performative;
use amqp_value::Value;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec, LengthDelimitedCodecError};

use super::{Error, FRAME_HEADER_SIZE, FRAME_TYPE_AMQP};

/// AMQP frame
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// AMQP frame channel
    pub channel: u16,

    /// AMQP frame body
    pub body: FrameBody,
}

impl Frame {
    /// Creates a frame carrying a performative without payload
    pub fn new(channel: u16, performative: Performative) -> Self {
        Self::with_payload(channel, performative, Bytes::new())
    }

    /// Creates a frame carrying a performative followed by an opaque payload
    pub fn with_payload(channel: u16, performative: Performative, payload: Bytes) -> Self {
        Self {
            channel,
            body: FrameBody::Performative {
                performative,
                payload,
            },
        }
    }

    /// Creates an emtpy frame. The empty frame is only used to reset
    /// the remote idle timeout
    pub fn empty() -> Self {
        Self {
            channel: 0,
            body: FrameBody::Empty,
        }
    }

    /// Returns the performative carried by the frame, if any
    pub fn performative(&self) -> Option<&Performative> {
        match &self.body {
            FrameBody::Performative { performative, .. } => Some(performative),
            FrameBody::Empty => None,
        }
    }
}

impl Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.body {
            FrameBody::Performative {
                performative,
                payload,
            } => match payload.is_empty() {
                true => write!(f, "[{}] {}", self.channel, performative),
                false => write!(
                    f,
                    "[{}] {} + {} bytes",
                    self.channel,
                    performative,
                    payload.len()
                ),
            },
            FrameBody::Empty => write!(f, "[{}] empty", self.channel),
        }
    }
}

/// Body of an AMQP frame
#[derive(Debug, Clone, PartialEq)]
pub enum FrameBody {
    /// A performative and whatever bytes follow it in the frame
    Performative {
        /// The performative
        performative: Performative,

        /// Bytes after the performative, passed on without interpretation
        payload: Bytes,
    },

    /// A frame without body, used as a heartbeat
    Empty,
}

/// Encoder and decoder of AMQP frames
///
/// Frames in either direction are limited to `max_frame_size` bytes, size field included.
#[derive(Debug)]
pub struct FrameCodec {
    framing: LengthDelimitedCodec,
    max_frame_size: usize,
}

impl FrameCodec {
    /// Creates a codec for frames of up to `max_frame_size` bytes
    pub fn new(max_frame_size: usize) -> Self {
        let framing = LengthDelimitedCodec::builder()
            .big_endian()
            .length_field_length(4)
            .max_frame_length(max_frame_size)
            .length_adjustment(-4)
            .new_codec();
        Self {
            framing,
            max_frame_size,
        }
    }

    /// Current limit on the size of a frame
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// Changes the limit after negotiation
    pub fn set_max_frame_size(&mut self, max_frame_size: usize) {
        self.max_frame_size = max_frame_size;
        self.framing.set_max_frame_length(max_frame_size);
    }

    fn framing_error(&self, err: io::Error) -> Error {
        match err
            .get_ref()
            .map(|inner| inner.is::<LengthDelimitedCodecError>())
        {
            Some(true) => Error::MaxFrameSizeExceeded {
                max: self.max_frame_size,
            },
            _ => Error::Io(err),
        }
    }
}

fn write_header(dst: &mut BytesMut, channel: u16) {
    // extended headers are never written, thus doff is always 2
    dst.put_u8(2);
    dst.put_u8(FRAME_TYPE_AMQP);
    dst.put_u16(channel);
}

impl Encoder<Frame> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE);
        write_header(&mut buf, item.channel);
        if let FrameBody::Performative {
            performative,
            payload,
        } = item.body
        {
            amqp_value::encode(&Value::from(&performative), &mut buf)?;
            buf.put(payload);
        }

        // the size field is not part of `buf`
        if buf.len() + 4 > self.max_frame_size {
            return Err(Error::MaxFrameSizeExceeded {
                max: self.max_frame_size,
            });
        }
        self.framing
            .encode(buf.freeze(), dst)
            .map_err(|err| self.framing_error(err))
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let mut src = match self.framing.decode(src) {
            Ok(Some(src)) => src,
            Ok(None) => return Ok(None),
            Err(err) => return Err(self.framing_error(err)),
        };

        if src.len() < FRAME_HEADER_SIZE - 4 {
            return Err(Error::InvalidFrameHeader);
        }
        let doff = src.get_u8();
        let ftype = src.get_u8();
        let channel = src.get_u16();

        // skip the extended header
        let extended = (doff as usize * 4)
            .checked_sub(FRAME_HEADER_SIZE)
            .filter(|len| *len <= src.len())
            .ok_or(Error::InvalidDataOffset(doff))?;
        src.advance(extended);

        if ftype != FRAME_TYPE_AMQP {
            return Err(Error::UnsupportedFrameType(ftype));
        }

        let body = if src.is_empty() {
            FrameBody::Empty
        } else {
            let mut body = src.freeze();
            let value = amqp_value::decode(&mut body)?;
            FrameBody::Performative {
                performative: Performative::try_from(value)?,
                payload: body,
            }
        };

        Ok(Some(Frame { channel, body }))
    }
}
