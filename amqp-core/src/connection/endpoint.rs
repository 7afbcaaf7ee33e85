//! Session endpoints multiplexed over the connection's channels

use std::collections::VecDeque;

use amqp_value::Value;
use bytes::Bytes;

/// Handle on one endpoint of a connection
///
/// An endpoint owns one outgoing channel. Once the peer has answered or initiated a
/// `begin`, it is also bound to the peer's channel for incoming frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub(crate) id: usize,
    pub(crate) outgoing_channel: u16,
}

impl Endpoint {
    /// Identifier of the endpoint, unique among the live endpoints of its connection
    pub fn id(&self) -> usize {
        self.id
    }

    /// Channel our frames for this endpoint are sent on
    pub fn outgoing_channel(&self) -> u16 {
        self.outgoing_channel
    }
}

/// A frame received for an endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointFrame {
    /// The performative as a described value
    pub performative: Value,

    /// Bytes following the performative
    pub payload: Bytes,
}

#[derive(Debug)]
pub(crate) struct EndpointSlot {
    pub outgoing_channel: u16,
    pub incoming_channel: Option<u16>,
    pub incoming: VecDeque<EndpointFrame>,
}

impl EndpointSlot {
    pub fn new(outgoing_channel: u16) -> Self {
        Self {
            outgoing_channel,
            incoming_channel: None,
            incoming: VecDeque::new(),
        }
    }
}
