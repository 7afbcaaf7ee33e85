//! Connection engine
//!
//! The engine owns the connection state machine. It is fed received bytes and the current
//! time, queues the bytes to send, and records what happened as [`EngineEvent`]s. It never
//! touches the transport or the event handler; [`Connection`](super::Connection) does.

use std::{
    collections::{BTreeMap, VecDeque},
    time::{Duration, Instant},
};

use amqp_core_types::{
    definitions::{
        self, AmqpError, ConnectionError, ErrorCondition, Fields, Milliseconds,
        MIN_MAX_FRAME_SIZE,
    },
    performatives::{Begin, ChannelMax, Close, MaxFrameSize, Open, Performative},
    states::ConnectionState,
};
use amqp_value::{dump::hex_dump, Value};
use bytes::{Bytes, BytesMut};
use slab::Slab;
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, error, instrument, trace, warn};

use super::{
    endpoint::{Endpoint, EndpointFrame, EndpointSlot},
    heartbeat::{HeartBeat, IdleTimeout},
    options::DEFAULT_EMPTY_FRAME_SEND_RATIO,
};
use crate::{
    frames::{
        self,
        amqp::{Frame, FrameBody, FrameCodec},
        protocol_header::{ProtocolHeader, ProtocolHeaderCodec},
    },
    Error,
};

/// What the engine observed, in order
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum EngineEvent {
    StateChanged {
        new: ConnectionState,
        old: ConnectionState,
    },
    NewEndpoint(Endpoint),
    IoError,
}

#[derive(Debug)]
pub(crate) struct Engine {
    state: ConnectionState,
    local_open: Open,
    remote_open: Option<Open>,
    remote_error: Option<definitions::Error>,
    listening: bool,
    pipeline_open: bool,
    trace: bool,
    empty_frame_send_ratio: f64,

    /// Limited by our max frame size
    decoder: FrameCodec,
    /// Limited by the peer's max frame size
    encoder: FrameCodec,
    incoming: BytesMut,
    /// Set after a framing error, from which the byte stream cannot be resynchronized
    input_broken: bool,
    outgoing: VecDeque<Bytes>,
    events: VecDeque<EngineEvent>,

    endpoints: Slab<EndpointSlot>,
    /// Peer channel to endpoint id
    incoming_channels: BTreeMap<u16, usize>,

    heartbeat: HeartBeat,
    idle_timeout: Option<IdleTimeout>,
}

impl Engine {
    pub fn new(
        container_id: String,
        hostname: Option<String>,
        trace: bool,
        pipeline_open: bool,
        now: Instant,
    ) -> Self {
        let mut local_open = Open::new(container_id);
        local_open.hostname = hostname;
        let decoder = FrameCodec::new(usize::from(local_open.max_frame_size));

        Self {
            state: ConnectionState::Start,
            local_open,
            remote_open: None,
            remote_error: None,
            listening: false,
            pipeline_open,
            trace,
            empty_frame_send_ratio: DEFAULT_EMPTY_FRAME_SEND_RATIO,
            decoder,
            encoder: FrameCodec::new(MIN_MAX_FRAME_SIZE),
            incoming: BytesMut::new(),
            input_broken: false,
            outgoing: VecDeque::new(),
            events: VecDeque::new(),
            endpoints: Slab::new(),
            incoming_channels: BTreeMap::new(),
            heartbeat: HeartBeat::never(now),
            idle_timeout: None,
        }
    }

    /* ------------------------------- accessors ------------------------------- */

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn local_open(&self) -> &Open {
        &self.local_open
    }

    pub fn remote_open(&self) -> Option<&Open> {
        self.remote_open.as_ref()
    }

    pub fn remote_error(&self) -> Option<&definitions::Error> {
        self.remote_error.as_ref()
    }

    /// The peer's max frame size, or the protocol minimum until its open arrives
    pub fn remote_max_frame_size(&self) -> u32 {
        self.encoder.max_frame_size() as u32
    }

    /// Highest channel both sides accept
    pub fn channel_max(&self) -> u16 {
        let local = self.local_open.channel_max.0;
        match &self.remote_open {
            Some(remote) => local.min(remote.channel_max.0),
            None => local,
        }
    }

    pub fn empty_frame_send_ratio(&self) -> f64 {
        self.empty_frame_send_ratio
    }

    pub fn is_trace_enabled(&self) -> bool {
        self.trace
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /* ------------------------------- settings -------------------------------- */

    fn ensure_not_started(&self, what: &str) -> Result<(), Error> {
        match self.state {
            ConnectionState::Start => Ok(()),
            state => Err(Error::runtime(format!(
                "{} cannot be changed in state {}",
                what, state
            ))),
        }
    }

    pub fn set_max_frame_size(&mut self, max_frame_size: u32) -> Result<(), Error> {
        self.ensure_not_started("max-frame-size")?;
        if (max_frame_size as usize) < MIN_MAX_FRAME_SIZE {
            return Err(Error::runtime(format!(
                "max-frame-size {} is below the minimum of {}",
                max_frame_size, MIN_MAX_FRAME_SIZE
            )));
        }
        self.local_open.max_frame_size = MaxFrameSize(max_frame_size);
        self.decoder.set_max_frame_size(max_frame_size as usize);
        Ok(())
    }

    pub fn set_channel_max(&mut self, channel_max: u16) -> Result<(), Error> {
        self.ensure_not_started("channel-max")?;
        self.local_open.channel_max = ChannelMax(channel_max);
        Ok(())
    }

    /// Zero means no idle timeout
    pub fn set_idle_timeout(&mut self, idle_timeout: Milliseconds) -> Result<(), Error> {
        self.ensure_not_started("idle-time-out")?;
        self.local_open.idle_time_out = Some(idle_timeout).filter(|ms| *ms > 0);
        Ok(())
    }

    pub fn set_properties(&mut self, properties: Option<Fields>) -> Result<(), Error> {
        self.ensure_not_started("properties")?;
        self.local_open.properties = properties;
        Ok(())
    }

    pub fn set_empty_frame_send_ratio(&mut self, ratio: f64) -> Result<(), Error> {
        self.ensure_not_started("remote idle timeout empty frame send ratio")?;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(Error::runtime(format!(
                "empty frame send ratio {} is not in (0, 1]",
                ratio
            )));
        }
        self.empty_frame_send_ratio = ratio;
        Ok(())
    }

    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    /* ------------------------------- lifecycle ------------------------------- */

    pub fn listen(&mut self) -> Result<(), Error> {
        self.ensure_not_started("listening mode")?;
        if self.listening {
            return Err(Error::runtime("connection is already listening"));
        }
        self.listening = true;
        Ok(())
    }

    /// The transport is open. A client starts the header exchange, a listener waits for
    /// the peer's header.
    pub fn start(&mut self, now: Instant) {
        if self.state != ConnectionState::Start {
            return;
        }
        self.idle_timeout = self.local_open.idle_time_out.and_then(|ms| {
            IdleTimeout::new(Duration::from_millis(ms as u64), now)
        });
        if self.listening {
            return;
        }

        self.send_header();
        self.set_state(ConnectionState::HeaderSent);
        if self.pipeline_open {
            self.send_open();
        }
    }

    /// Local close
    ///
    /// Before any open is sent there is nothing to tell the peer and the connection ends
    /// immediately.
    pub fn close(&mut self, error: Option<definitions::Error>) -> Result<(), Error> {
        use ConnectionState::*;

        match self.state {
            Start | HeaderReceived | HeaderSent | HeaderExchanged => {
                self.set_state(End);
                Ok(())
            }
            OpenReceived => {
                self.send_open();
                self.send_close(error)
            }
            OpenSent | OpenPipe | Opened | CloseReceived => self.send_close(error),
            state @ (ClosePipe
            | OpenClosePipe
            | CloseSent
            | Discarding
            | End
            | ConnectionState::Error) => Err(crate::Error::logic(format!(
                "connection is already closed or closing ({})",
                state
            ))),
        }
    }

    /// The transport failed
    pub fn on_io_error(&mut self) {
        if !self.state.is_terminal() {
            error!(state = %self.state, "transport error");
            self.fail();
        }
    }

    fn fail(&mut self) {
        self.incoming.clear();
        self.set_state(ConnectionState::Error);
        self.events.push_back(EngineEvent::IoError);
    }

    fn set_state(&mut self, new: ConnectionState) {
        let old = std::mem::replace(&mut self.state, new);
        if old != new {
            debug!(%old, %new, "connection state changed");
            self.events.push_back(EngineEvent::StateChanged { new, old });
        }
    }

    /* -------------------------------- timers --------------------------------- */

    pub fn tick(&mut self, now: Instant) {
        use ConnectionState::*;

        let idle_elapsed = self
            .idle_timeout
            .as_ref()
            .map(|idle| idle.is_elapsed(now))
            .unwrap_or(false);
        if idle_elapsed && matches!(self.state, OpenSent | OpenReceived | Opened) {
            self.idle_timeout = None;
            self.close_with_error(
                AmqpError::ResourceLimitExceeded,
                "local idle timeout expired",
            );
            return;
        }

        if self.state == Opened && self.outgoing.is_empty() && self.heartbeat.is_due(now) {
            trace!("sending empty frame");
            if let Err(err) = self.send_frame(Frame::empty()) {
                error!(?err, "empty frame");
            }
        }
    }

    /* -------------------------------- outgoing ------------------------------- */

    /// Bytes to hand to the transport, in order
    pub fn take_outgoing(&mut self, now: Instant) -> Vec<Bytes> {
        if !self.outgoing.is_empty() {
            self.heartbeat.reset(now);
        }
        self.outgoing.drain(..).collect()
    }

    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        self.events.drain(..).collect()
    }

    fn send_header(&mut self) {
        let header = ProtocolHeader::amqp();
        let mut buf = BytesMut::new();
        if let Err(err) = ProtocolHeaderCodec::new().encode(header, &mut buf) {
            error!(?err, "protocol header");
            return self.fail();
        }
        if self.trace {
            trace!(?header, "SEND header");
        }
        self.outgoing.push_back(buf.freeze());
    }

    #[instrument(name = "SEND", skip_all)]
    fn send_frame(&mut self, frame: Frame) -> Result<(), Error> {
        if self.trace {
            trace!(channel = frame.channel, %frame);
        }
        let mut buf = BytesMut::new();
        self.encoder
            .encode(frame, &mut buf)
            .map_err(|err| Error::runtime(format!("cannot send frame: {}", err)))?;
        if self.trace {
            trace!("\n{}", hex_dump(&buf));
        }
        self.outgoing.push_back(buf.freeze());
        Ok(())
    }

    fn send_open(&mut self) {
        use ConnectionState::*;

        let frame = Frame::new(0, Performative::Open(self.local_open.clone()));
        if let Err(err) = self.send_frame(frame) {
            error!(?err, "open");
            return self.fail();
        }
        match self.state {
            HeaderExchanged => self.set_state(OpenSent),
            OpenReceived => self.set_state(Opened),
            HeaderSent => self.set_state(OpenPipe),
            _ => {}
        }
    }

    fn send_close(&mut self, error: Option<definitions::Error>) -> Result<(), Error> {
        use ConnectionState::*;

        let next = match self.state {
            Opened => CloseSent,
            CloseReceived => End,
            OpenSent => ClosePipe,
            OpenPipe => OpenClosePipe,
            state => {
                return Err(crate::Error::logic(format!(
                    "cannot send close in state {}",
                    state
                )))
            }
        };
        self.send_frame(Frame::new(0, Performative::Close(Close::new(error))))?;
        self.set_state(next);
        Ok(())
    }

    /// Closes because of something the peer did, then ignores everything but its close
    fn close_with_error(
        &mut self,
        condition: impl Into<ErrorCondition>,
        description: impl Into<String>,
    ) {
        use ConnectionState::*;

        let error = definitions::Error::new(condition, Some(description.into()), None::<Fields>);
        warn!(%error, state = %self.state, "closing connection");

        // an open always precedes the close
        if matches!(self.state, HeaderExchanged | OpenReceived) {
            self.send_open();
        }
        if !self.state.is_close_sent() && !self.state.is_terminal() {
            let frame = Frame::new(0, Performative::Close(Close::new(Some(error))));
            if let Err(err) = self.send_frame(frame) {
                error!(?err, "close");
                return self.fail();
            }
        }
        if !self.state.is_terminal() {
            self.set_state(Discarding);
        }
    }

    /* -------------------------------- incoming ------------------------------- */

    #[instrument(name = "RECV", skip_all)]
    pub fn on_bytes_received(&mut self, bytes: &[u8], now: Instant) {
        if self.state.is_terminal() || self.input_broken {
            return;
        }
        if self.trace {
            trace!(len = bytes.len(), "\n{}", hex_dump(bytes));
        }
        if let Some(idle) = &mut self.idle_timeout {
            idle.reset(now);
        }
        self.incoming.extend_from_slice(bytes);

        loop {
            if self.state.is_terminal() || self.input_broken {
                self.incoming.clear();
                return;
            }
            if self.is_awaiting_header() {
                match ProtocolHeaderCodec::new().decode(&mut self.incoming) {
                    Ok(Some(header)) => self.on_protocol_header(header),
                    Ok(None) => return,
                    Err(err) => {
                        error!(?err, "protocol header");
                        return self.fail();
                    }
                }
            } else {
                match self.decoder.decode(&mut self.incoming) {
                    Ok(Some(frame)) => self.on_frame(frame, now),
                    Ok(None) => return,
                    Err(err) => return self.on_framing_error(err),
                }
            }
        }
    }

    fn is_awaiting_header(&self) -> bool {
        use ConnectionState::*;
        matches!(self.state, Start | HeaderSent | OpenPipe | OpenClosePipe)
    }

    fn on_protocol_header(&mut self, header: ProtocolHeader) {
        use ConnectionState::*;

        if self.trace {
            trace!(?header, "RECV header");
        }
        if header != ProtocolHeader::amqp() {
            error!(?header, "unsupported protocol header");
            if self.state == Start {
                // tell the peer which protocol we do speak before giving up
                self.send_header();
            }
            return self.fail();
        }

        match self.state {
            Start => {
                self.set_state(HeaderReceived);
                self.send_header();
                self.set_state(HeaderExchanged);
                if !self.listening {
                    self.send_open();
                }
            }
            HeaderSent => {
                self.set_state(HeaderExchanged);
                self.send_open();
            }
            OpenPipe => self.set_state(OpenSent),
            OpenClosePipe => self.set_state(ClosePipe),
            _ => {}
        }
    }

    fn on_framing_error(&mut self, err: frames::Error) {
        self.input_broken = true;
        self.incoming.clear();
        let description = err.to_string();
        match err {
            frames::Error::Value(_) | frames::Error::Types(_) => {
                self.close_with_error(AmqpError::DecodeError, description)
            }
            _ => self.close_with_error(ConnectionError::FramingError, description),
        }
    }

    fn on_frame(&mut self, frame: Frame, now: Instant) {
        use ConnectionState::*;

        if self.trace {
            trace!(channel = frame.channel, %frame, "RECV");
        }
        let channel = frame.channel;
        let (performative, payload) = match frame.body {
            FrameBody::Performative {
                performative,
                payload,
            } => (performative, payload),
            FrameBody::Empty => return,
        };

        match (self.state, performative) {
            (CloseSent | Discarding, Performative::Close(close)) => {
                self.remote_error = close.error;
                self.set_state(End);
            }
            (CloseSent | Discarding, _) => {}
            (ClosePipe, Performative::Open(open)) => {
                self.on_remote_open(open, now);
                self.set_state(CloseSent);
            }
            (ClosePipe, _) => {}
            (_, Performative::Open(open)) => self.on_open(open, now),
            (_, Performative::Close(close)) => self.on_close(close),
            (_, Performative::Begin(begin)) => self.on_begin(channel, begin),
            (_, performative) => self.on_endpoint_frame(channel, performative, payload),
        }
    }

    fn on_remote_open(&mut self, open: Open, now: Instant) {
        let remote_max_frame_size = open.max_frame_size.0.max(MIN_MAX_FRAME_SIZE as u32);
        self.encoder
            .set_max_frame_size(remote_max_frame_size as usize);

        if let Some(ms) = open.idle_time_out.filter(|ms| *ms > 0) {
            let period = Duration::from_millis(ms as u64).mul_f64(self.empty_frame_send_ratio);
            debug!(?period, "sending empty frames");
            self.heartbeat = HeartBeat::new(period.max(Duration::from_millis(1)), now);
        }
        self.remote_open = Some(open);
    }

    fn on_open(&mut self, open: Open, now: Instant) {
        use ConnectionState::*;

        match self.state {
            HeaderExchanged => {
                self.on_remote_open(open, now);
                self.set_state(OpenReceived);
                self.send_open();
            }
            OpenSent => {
                self.on_remote_open(open, now);
                self.set_state(Opened);
            }
            _ => self.close_with_error(AmqpError::NotAllowed, "unexpected open"),
        }
    }

    fn on_close(&mut self, close: Close) {
        if let Some(error) = &close.error {
            warn!(%error, "peer closed the connection with an error");
        }
        match self.state {
            ConnectionState::Opened => {
                self.remote_error = close.error;
                self.set_state(ConnectionState::CloseReceived);
                if let Err(err) = self.send_close(None) {
                    error!(?err, "close");
                    self.fail();
                }
            }
            _ => {
                self.remote_error = close.error;
                self.close_with_error(AmqpError::NotAllowed, "close before open");
            }
        }
    }

    fn on_begin(&mut self, channel: u16, begin: Begin) {
        if self.state != ConnectionState::Opened {
            return self.close_with_error(AmqpError::NotAllowed, "begin before open");
        }
        if channel > self.channel_max() {
            return self.close_with_error(
                ConnectionError::FramingError,
                format!("channel {} exceeds channel-max {}", channel, self.channel_max()),
            );
        }
        if self.incoming_channels.contains_key(&channel) {
            return self.close_with_error(
                AmqpError::NotAllowed,
                format!("channel {} is already in use", channel),
            );
        }

        let performative = Value::from(&begin);
        let (id, is_new) = match begin.remote_channel {
            Some(outgoing) => match self.endpoints.get(outgoing as usize) {
                Some(slot) if slot.incoming_channel.is_none() => (outgoing as usize, false),
                _ => {
                    return self.close_with_error(
                        AmqpError::NotFound,
                        format!("no endpoint is waiting on channel {}", outgoing),
                    )
                }
            },
            None => match self.allocate_endpoint() {
                Ok(endpoint) => (endpoint.id, true),
                Err(err) => {
                    return self.close_with_error(AmqpError::NotAllowed, err.to_string())
                }
            },
        };

        if let Some(slot) = self.endpoints.get_mut(id) {
            slot.incoming_channel = Some(channel);
            slot.incoming.push_back(EndpointFrame {
                performative,
                payload: Bytes::new(),
            });
            if is_new {
                let endpoint = Endpoint {
                    id,
                    outgoing_channel: slot.outgoing_channel,
                };
                self.events.push_back(EngineEvent::NewEndpoint(endpoint));
            }
        }
        self.incoming_channels.insert(channel, id);
    }

    fn on_endpoint_frame(&mut self, channel: u16, performative: Performative, payload: Bytes) {
        if self.state != ConnectionState::Opened {
            return self.close_with_error(
                AmqpError::NotAllowed,
                format!("{} before open", performative.name()),
            );
        }
        let id = match self.incoming_channels.get(&channel) {
            Some(id) => *id,
            None => {
                return self.close_with_error(
                    AmqpError::NotFound,
                    format!("no endpoint on channel {}", channel),
                )
            }
        };

        let is_end = matches!(performative, Performative::End(_));
        if let Some(slot) = self.endpoints.get_mut(id) {
            slot.incoming.push_back(EndpointFrame {
                performative: Value::from(&performative),
                payload,
            });
            if is_end {
                slot.incoming_channel = None;
            }
        }
        if is_end {
            self.incoming_channels.remove(&channel);
        }
    }

    /* ------------------------------- endpoints ------------------------------- */

    fn allocate_endpoint(&mut self) -> Result<Endpoint, Error> {
        let channel_max = self.channel_max() as usize;
        let entry = self.endpoints.vacant_entry();
        let id = entry.key();
        if id > channel_max {
            return Err(Error::runtime(format!(
                "all {} channels are in use",
                channel_max + 1
            )));
        }
        let outgoing_channel = id as u16;
        entry.insert(EndpointSlot::new(outgoing_channel));
        Ok(Endpoint {
            id,
            outgoing_channel,
        })
    }

    pub fn create_endpoint(&mut self) -> Result<Endpoint, Error> {
        if self.state.is_terminal()
            || self.state.is_close_sent()
            || self.state == ConnectionState::CloseReceived
        {
            return Err(Error::runtime(format!(
                "cannot create an endpoint in state {}",
                self.state
            )));
        }
        self.allocate_endpoint()
    }

    fn slot(&self, endpoint: &Endpoint) -> Result<&EndpointSlot, Error> {
        self.endpoints
            .get(endpoint.id)
            .filter(|slot| slot.outgoing_channel == endpoint.outgoing_channel)
            .ok_or_else(|| Error::logic(format!("unknown endpoint {}", endpoint.id)))
    }

    pub fn destroy_endpoint(&mut self, endpoint: &Endpoint) -> Result<(), Error> {
        let incoming_channel = self.slot(endpoint)?.incoming_channel;
        if let Some(channel) = incoming_channel {
            self.incoming_channels.remove(&channel);
        }
        self.endpoints.remove(endpoint.id);
        Ok(())
    }

    pub fn endpoint_incoming_channel(&self, endpoint: &Endpoint) -> Option<u16> {
        self.slot(endpoint).ok().and_then(|slot| slot.incoming_channel)
    }

    pub fn next_endpoint_frame(&mut self, endpoint: &Endpoint) -> Option<EndpointFrame> {
        self.slot(endpoint).ok()?;
        self.endpoints
            .get_mut(endpoint.id)
            .and_then(|slot| slot.incoming.pop_front())
    }

    pub fn send_endpoint_frame(
        &mut self,
        endpoint: &Endpoint,
        performative: Value,
        payload: Bytes,
    ) -> Result<(), Error> {
        use ConnectionState::*;

        let channel = self.slot(endpoint)?.outgoing_channel;
        if !matches!(self.state, OpenPipe | OpenSent | Opened) {
            return Err(crate::Error::runtime(format!(
                "cannot send endpoint frames in state {}",
                self.state
            )));
        }
        let performative = Performative::try_from(performative)?;
        if matches!(performative, Performative::Open(_) | Performative::Close(_)) {
            return Err(crate::Error::logic(format!(
                "{} belongs to the connection, not to an endpoint",
                performative.name()
            )));
        }
        self.send_frame(Frame::with_payload(channel, performative, payload))
    }

    /// The event handler refused a peer initiated endpoint
    pub fn reject_endpoint(&mut self, endpoint: &Endpoint) {
        if self.destroy_endpoint(endpoint).is_ok() && self.state == ConnectionState::Opened {
            self.close_with_error(AmqpError::NotAllowed, "endpoint rejected");
        }
    }
}
