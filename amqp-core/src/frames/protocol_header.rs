//! Implements the protocol headers

use amqp_core_types::definitions::{MAJOR, MINOR, REVISION};
use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::Error;

const PROTOCOL_HEADER_PREFIX: &[u8; 4] = b"AMQP";

/// Size of a protocol header on the wire
pub const PROTOCOL_HEADER_SIZE: usize = 8;

/// Protocol header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolHeader {
    /// Protocol ID
    pub id: ProtocolId,

    /// Major number
    pub major: u8,

    /// Minor number
    pub minor: u8,

    /// Revision number
    pub revision: u8,
}

impl Default for ProtocolHeader {
    fn default() -> Self {
        Self::amqp()
    }
}

impl ProtocolHeader {
    /// Creates a new protocol header
    pub fn new(id: ProtocolId, major: u8, minor: u8, revision: u8) -> Self {
        Self {
            id,
            major,
            minor,
            revision,
        }
    }

    /// Creates an AMQP 1.0.0 protocol header
    pub fn amqp() -> Self {
        Self::new(ProtocolId::Amqp, MAJOR, MINOR, REVISION)
    }

    /// Creates a TLS protocol header
    pub fn tls() -> Self {
        Self::new(ProtocolId::Tls, MAJOR, MINOR, REVISION)
    }

    /// Creates a SASL protocol header
    pub fn sasl() -> Self {
        Self::new(ProtocolId::Sasl, MAJOR, MINOR, REVISION)
    }

    /// Returns whether the protocol id is AMQP
    pub fn is_amqp(&self) -> bool {
        self.id == ProtocolId::Amqp
    }

    /// Returns whether the protocol id is TLS
    pub fn is_tls(&self) -> bool {
        self.id == ProtocolId::Tls
    }

    /// Returns whether the protocol id is SASL
    pub fn is_sasl(&self) -> bool {
        self.id == ProtocolId::Sasl
    }
}

impl From<ProtocolHeader> for [u8; PROTOCOL_HEADER_SIZE] {
    fn from(value: ProtocolHeader) -> Self {
        [
            PROTOCOL_HEADER_PREFIX[0],
            PROTOCOL_HEADER_PREFIX[1],
            PROTOCOL_HEADER_PREFIX[2],
            PROTOCOL_HEADER_PREFIX[3],
            value.id as u8,
            value.major,
            value.minor,
            value.revision,
        ]
    }
}

impl From<ProtocolHeader> for Bytes {
    fn from(header: ProtocolHeader) -> Self {
        let bytes: [u8; PROTOCOL_HEADER_SIZE] = header.into();
        Bytes::copy_from_slice(&bytes[..])
    }
}

impl TryFrom<[u8; PROTOCOL_HEADER_SIZE]> for ProtocolHeader {
    type Error = [u8; PROTOCOL_HEADER_SIZE];

    fn try_from(v: [u8; PROTOCOL_HEADER_SIZE]) -> Result<Self, Self::Error> {
        if &v[..4] != PROTOCOL_HEADER_PREFIX {
            return Err(v);
        }
        let id = ProtocolId::try_from(v[4]).map_err(|_| v)?;
        Ok(Self::new(id, v[5], v[6], v[7]))
    }
}

/// Protocol ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolId {
    /// AMQP
    Amqp = 0x0,

    /// TLS
    Tls = 0x2,

    /// SASL
    Sasl = 0x3,
}

impl TryFrom<u8> for ProtocolId {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x0 => Ok(Self::Amqp),
            0x2 => Ok(Self::Tls),
            0x3 => Ok(Self::Sasl),
            other => Err(other),
        }
    }
}

/// Encoder and decoder of [`ProtocolHeader`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtocolHeaderCodec {}

impl ProtocolHeaderCodec {
    /// Creates a new codec
    pub fn new() -> Self {
        Self {}
    }
}

impl Encoder<ProtocolHeader> for ProtocolHeaderCodec {
    type Error = Error;

    fn encode(&mut self, item: ProtocolHeader, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let bytes: [u8; PROTOCOL_HEADER_SIZE] = item.into();
        dst.put_slice(&bytes);
        Ok(())
    }
}

impl Decoder for ProtocolHeaderCodec {
    type Item = ProtocolHeader;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < PROTOCOL_HEADER_SIZE {
            src.reserve(PROTOCOL_HEADER_SIZE - src.len());
            return Ok(None);
        }

        let mut buf = [0u8; PROTOCOL_HEADER_SIZE];
        buf.copy_from_slice(&src.split_to(PROTOCOL_HEADER_SIZE));
        ProtocolHeader::try_from(buf)
            .map(Some)
            .map_err(Error::InvalidProtocolHeader)
    }
}
