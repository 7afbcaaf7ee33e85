#![allow(dead_code)]

use std::{collections::VecDeque, sync::Arc};

use amqp_core::{
    connection::{Connection, ConnectionEvents, Endpoint},
    frames::{
        amqp::{Frame, FrameCodec},
        protocol_header::{ProtocolHeader, ProtocolHeaderCodec},
    },
    transport::{IoCompletion, IoResult, Transport, TransportEvents},
    types::{performatives::Performative, states::ConnectionState},
    Error,
};
use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use tokio_util::codec::{Decoder, Encoder};

#[derive(Debug)]
pub struct MockState {
    pub opened: bool,
    pub closed: bool,
    pub open_result: IoResult,
    pub sent: BytesMut,
    pub inbound: VecDeque<Vec<u8>>,
    pub fail_io: bool,
}

/// In-memory transport. The test keeps a [`MockPeer`] on the same state.
#[derive(Debug)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> (Box<dyn Transport>, MockPeer) {
        let state = Arc::new(Mutex::new(MockState {
            opened: false,
            closed: false,
            open_result: IoResult::Ok,
            sent: BytesMut::new(),
            inbound: VecDeque::new(),
            fail_io: false,
        }));
        let transport = Box::new(MockTransport {
            state: state.clone(),
        });
        (transport, MockPeer { state })
    }
}

impl Transport for MockTransport {
    fn open(&mut self) -> Result<IoCompletion, Error> {
        let mut state = self.state.lock();
        state.opened = true;
        Ok(IoCompletion::ready(state.open_result))
    }

    fn close(&mut self) -> Result<IoCompletion, Error> {
        self.state.lock().closed = true;
        Ok(IoCompletion::ready(IoResult::Ok))
    }

    fn send(&mut self, bytes: Bytes) -> Result<IoCompletion, Error> {
        self.state.lock().sent.extend_from_slice(&bytes);
        Ok(IoCompletion::ready(IoResult::Ok))
    }

    fn poll(&mut self, events: &mut dyn TransportEvents) {
        let mut state = self.state.lock();
        while let Some(bytes) = state.inbound.pop_front() {
            events.on_bytes_received(&bytes);
        }
        if std::mem::take(&mut state.fail_io) {
            events.on_io_error();
        }
    }
}

/// The other end of a [`MockTransport`]
#[derive(Debug, Clone)]
pub struct MockPeer {
    state: Arc<Mutex<MockState>>,
}

impl MockPeer {
    pub fn is_opened(&self) -> bool {
        self.state.lock().opened
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn set_open_result(&self, result: IoResult) {
        self.state.lock().open_result = result;
    }

    pub fn fail_io(&self) {
        self.state.lock().fail_io = true;
    }

    pub fn push_bytes(&self, bytes: impl Into<Vec<u8>>) {
        self.state.lock().inbound.push_back(bytes.into());
    }

    pub fn push_header(&self) {
        let header: [u8; 8] = ProtocolHeader::amqp().into();
        self.push_bytes(header.to_vec());
    }

    pub fn push_frame(&self, frame: Frame) {
        let mut buf = BytesMut::new();
        FrameCodec::new(u32::MAX as usize)
            .encode(frame, &mut buf)
            .unwrap();
        self.push_bytes(buf.to_vec());
    }

    pub fn push_performative(&self, channel: u16, performative: Performative) {
        self.push_frame(Frame::new(channel, performative));
    }

    /// Takes everything the connection sent so far
    pub fn take_sent(&self) -> BytesMut {
        std::mem::take(&mut self.state.lock().sent)
    }

    /// Takes the protocol header the connection sent, leaving what followed it
    pub fn take_header(&self) -> ProtocolHeader {
        let mut state = self.state.lock();
        ProtocolHeaderCodec::new()
            .decode(&mut state.sent)
            .unwrap()
            .expect("no protocol header was sent")
    }

    /// Takes the frames the connection sent, which must not include a protocol header
    pub fn take_frames(&self) -> Vec<Frame> {
        let mut sent = self.take_sent();
        let mut codec = FrameCodec::new(u32::MAX as usize);
        let mut frames = Vec::new();
        while let Some(frame) = codec.decode(&mut sent).unwrap() {
            frames.push(frame);
        }
        frames
    }

    /// Takes the performatives the connection sent, skipping empty frames
    pub fn take_performatives(&self) -> Vec<Performative> {
        self.take_frames()
            .into_iter()
            .filter_map(|frame| frame.performative().cloned())
            .collect()
    }
}

/// Handler recording every event
#[derive(Debug, Default)]
pub struct Recorder {
    pub states: Mutex<Vec<(ConnectionState, ConnectionState)>>,
    pub endpoints: Mutex<Vec<Endpoint>>,
    pub io_errors: Mutex<usize>,
    pub accept_endpoints: bool,
}

impl Recorder {
    pub fn accepting() -> Self {
        Self {
            accept_endpoints: true,
            ..Default::default()
        }
    }

    pub fn new_states(&self) -> Vec<ConnectionState> {
        self.states.lock().iter().map(|(new, _)| *new).collect()
    }
}

impl ConnectionEvents for Recorder {
    fn on_connection_state_changed(
        &self,
        _connection: &Connection,
        new_state: ConnectionState,
        previous_state: ConnectionState,
    ) {
        self.states.lock().push((new_state, previous_state));
    }

    fn on_new_endpoint(&self, _connection: &Connection, endpoint: &Endpoint) -> bool {
        self.endpoints.lock().push(*endpoint);
        self.accept_endpoints
    }

    fn on_io_error(&self, _connection: &Connection) {
        *self.io_errors.lock() += 1;
    }
}
