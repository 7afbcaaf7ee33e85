//! Implements AMQP1.0 Connection
//!
//! A [`Connection`] drives its [`Transport`] and the protocol state machine from
//! [`Connection::poll`]. Nothing happens between polls: bytes are read and written,
//! timers are checked and events are raised only while `poll` runs.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use amqp_core::connection::{Connection, ConnectionEvents, ConnectionOptions};
//! use amqp_core::types::states::ConnectionState;
//!
//! struct Printer;
//!
//! impl ConnectionEvents for Printer {
//!     fn on_connection_state_changed(
//!         &self,
//!         _connection: &Connection,
//!         new: ConnectionState,
//!         old: ConnectionState,
//!     ) {
//!         println!("{} -> {}", old, new);
//!     }
//! }
//!
//! let printer: Arc<dyn ConnectionEvents> = Arc::new(Printer);
//! let options = ConnectionOptions::default().container_id("example");
//! let mut connection =
//!     Connection::from_uri("amqp://localhost", options, Some(Arc::downgrade(&printer)))
//!         .unwrap();
//! connection.open().unwrap();
//! while connection.state() != ConnectionState::Opened {
//!     connection.poll();
//! }
//! connection.close("", "", None).unwrap();
//! while !connection.state().is_terminal() {
//!     connection.poll();
//! }
//! ```

use std::{sync::Weak, time::Instant};

use amqp_core_types::{
    definitions::{self, fields_from_value, fields_to_value, Milliseconds, PORT, SECURE_PORT},
    states::ConnectionState,
};
use amqp_value::Value;
use bytes::{Bytes, BytesMut};
use tracing::{debug, error, instrument, warn};
use url::Url;

use crate::{
    transport::{
        IoCompletion, IoResult, SocketTransport, TlsTransport, Transport, TransportEvents,
    },
    Error,
};

mod endpoint;
mod engine;
mod heartbeat;
mod options;

pub use endpoint::{Endpoint, EndpointFrame};
pub use options::{
    ConnectionOptions, SaslCredentials, DEFAULT_CHANNEL_MAX, DEFAULT_EMPTY_FRAME_SEND_RATIO,
    DEFAULT_MAX_FRAME_SIZE,
};

use engine::{Engine, EngineEvent};

/// Callbacks raised from within [`Connection::poll`]
///
/// The connection only holds a [`Weak`] reference to its handler. Once the handler is
/// dropped or [`Connection::clear_event_handler`] is called, no further events are raised.
pub trait ConnectionEvents: Send + Sync {
    /// The protocol state changed
    fn on_connection_state_changed(
        &self,
        connection: &Connection,
        new_state: ConnectionState,
        previous_state: ConnectionState,
    ) {
        let _ = (connection, new_state, previous_state);
    }

    /// The peer began a session on a channel we did not ask for. Returning `false`
    /// rejects the endpoint and closes the connection with `amqp:not-allowed`.
    fn on_new_endpoint(&self, connection: &Connection, endpoint: &Endpoint) -> bool {
        let _ = (connection, endpoint);
        false
    }

    /// The transport failed. The connection is in [`ConnectionState::Error`].
    fn on_io_error(&self, connection: &Connection) {
        let _ = connection;
    }
}

/// Bytes and failures reported by the transport during one poll
#[derive(Debug, Default)]
struct Inbound {
    bytes: BytesMut,
    io_error: bool,
}

impl TransportEvents for Inbound {
    fn on_bytes_received(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    fn on_io_error(&mut self) {
        self.io_error = true;
    }
}

/// An AMQP 1.0 connection over an exclusively owned transport
pub struct Connection {
    engine: Engine,
    transport: Option<Box<dyn Transport>>,
    options: ConnectionOptions,
    handler: Option<Weak<dyn ConnectionEvents>>,

    open_completion: Option<IoCompletion>,
    send_completions: Vec<IoCompletion>,
    transport_opened: bool,
    transport_closed: bool,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.engine.state())
            .field("container_id", &self.engine.local_open().container_id)
            .field("transport", &self.transport)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

impl Connection {
    /// Creates a connection over a transport the caller built. The transport must not be
    /// open yet; [`Connection::open`] opens it.
    ///
    /// Fails with [`Error::Configuration`] if the options carry SASL credentials.
    pub fn with_transport(
        transport: Box<dyn Transport>,
        options: ConnectionOptions,
        handler: Option<Weak<dyn ConnectionEvents>>,
    ) -> Result<Self, Error> {
        if options.sasl_credentials.is_some() {
            return Err(Error::configuration(
                "SASL credentials cannot be used with a caller provided transport",
            ));
        }
        Ok(Self::new(Some(transport), options, handler))
    }

    /// Creates a connection to the host of `uri`
    ///
    /// `amqp` selects a [`SocketTransport`] on port 5672 by default and `amqps` a
    /// [`TlsTransport`] on port 5671. Any other scheme leaves the connection without a
    /// transport, so that [`Connection::open`] fails. The host name defaults to the host
    /// of the uri.
    pub fn from_uri(
        uri: &str,
        options: ConnectionOptions,
        handler: Option<Weak<dyn ConnectionEvents>>,
    ) -> Result<Self, Error> {
        if options.sasl_credentials.is_some() {
            return Err(Error::configuration("SASL is not supported"));
        }

        let url = Url::parse(uri)?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::configuration(format!("{} has no host", uri)))?
            .to_string();
        let transport: Option<Box<dyn Transport>> = match url.scheme() {
            "amqp" => Some(Box::new(SocketTransport::new(
                host.clone(),
                url.port().unwrap_or(PORT),
            ))),
            "amqps" => Some(Box::new(TlsTransport::new(
                host.clone(),
                url.port().unwrap_or(SECURE_PORT),
            ))),
            scheme => {
                warn!(scheme, "unsupported scheme, the connection has no transport");
                None
            }
        };

        let options = match options.host_name {
            Some(_) => options,
            None => options.host_name(host),
        };
        Ok(Self::new(transport, options, handler))
    }

    fn new(
        transport: Option<Box<dyn Transport>>,
        options: ConnectionOptions,
        handler: Option<Weak<dyn ConnectionEvents>>,
    ) -> Self {
        let container_id = options
            .container_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let engine = Engine::new(
            container_id,
            options.host_name.clone(),
            options.enable_trace,
            options.pipeline_open,
            Instant::now(),
        );

        Self {
            engine,
            transport,
            options,
            handler,
            open_completion: None,
            send_completions: Vec::new(),
            transport_opened: false,
            transport_closed: false,
        }
    }

    /// Applies the negotiable values of the construction options: idle timeout, max frame
    /// size, channel max and properties. Only valid before [`Connection::open`].
    pub fn apply_options(&mut self) -> Result<(), Error> {
        let options = self.options.clone();
        if let Some(idle_timeout) = options.idle_timeout {
            self.engine.set_idle_timeout(idle_timeout)?;
        }
        self.engine.set_max_frame_size(options.max_frame_size)?;
        self.engine.set_channel_max(options.max_channel)?;
        if options.properties.is_some() {
            self.engine.set_properties(options.properties)?;
        }
        Ok(())
    }

    /* ---------------------------------- state --------------------------------- */

    /// Current protocol state
    pub fn state(&self) -> ConnectionState {
        self.engine.state()
    }

    /// Host name sent in our open
    pub fn host_name(&self) -> Option<&str> {
        self.engine.local_open().hostname.as_deref()
    }

    /// Container id sent in our open
    pub fn container_id(&self) -> &str {
        &self.engine.local_open().container_id
    }

    /// Options the connection was constructed with
    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    /// The transport, if any
    pub fn transport(&self) -> Option<&dyn Transport> {
        self.transport.as_deref()
    }

    /// Error carried by the peer's close
    pub fn remote_error(&self) -> Option<&definitions::Error> {
        self.engine.remote_error()
    }

    /// Container id of the peer, once its open arrived
    pub fn remote_container_id(&self) -> Option<&str> {
        self.engine
            .remote_open()
            .map(|open| open.container_id.as_str())
    }

    /* ------------------------------- negotiation ------------------------------ */

    /// Largest frame we accept
    pub fn max_frame_size(&self) -> u32 {
        self.engine.local_open().max_frame_size.0
    }

    /// Sets the largest frame we accept, at least 512
    pub fn set_max_frame_size(&mut self, max_frame_size: u32) -> Result<(), Error> {
        self.engine.set_max_frame_size(max_frame_size)
    }

    /// Largest frame the peer accepts; 512 until the peer's open arrived
    pub fn remote_max_frame_size(&self) -> u32 {
        self.engine.remote_max_frame_size()
    }

    /// Highest channel number we accept
    pub fn max_channel(&self) -> u16 {
        self.engine.local_open().channel_max.0
    }

    /// Sets the highest channel number we accept
    pub fn set_max_channel(&mut self, max_channel: u16) -> Result<(), Error> {
        self.engine.set_channel_max(max_channel)
    }

    /// Our idle timeout in milliseconds, zero if none
    pub fn idle_timeout(&self) -> Milliseconds {
        self.engine.local_open().idle_time_out.unwrap_or(0)
    }

    /// Sets our idle timeout in milliseconds; zero disables it
    pub fn set_idle_timeout(&mut self, idle_timeout: Milliseconds) -> Result<(), Error> {
        self.engine.set_idle_timeout(idle_timeout)
    }

    /// Fraction of the peer's idle timeout after which an empty frame is sent
    pub fn remote_idle_timeout_empty_frame_send_ratio(&self) -> f64 {
        self.engine.empty_frame_send_ratio()
    }

    /// Sets the fraction of the peer's idle timeout after which an empty frame is sent.
    /// Must be in `(0, 1]`.
    pub fn set_remote_idle_timeout_empty_frame_send_ratio(
        &mut self,
        ratio: f64,
    ) -> Result<(), Error> {
        self.engine.set_empty_frame_send_ratio(ratio)
    }

    /// Connection properties sent in our open, as a map value
    pub fn properties(&self) -> Option<Value> {
        self.engine.local_open().properties.as_ref().map(fields_to_value)
    }

    /// Sets the connection properties from a map with symbol keys
    pub fn set_properties(&mut self, properties: &Value) -> Result<(), Error> {
        let fields = fields_from_value(properties)?;
        self.engine.set_properties(Some(fields))
    }

    /// Enables or disables frame tracing
    pub fn set_trace(&mut self, trace: bool) {
        self.engine.set_trace(trace)
    }

    /// Whether frame tracing is enabled
    pub fn is_trace_enabled(&self) -> bool {
        self.engine.is_trace_enabled()
    }

    /* -------------------------------- lifecycle ------------------------------- */

    /// Opens the transport. The handshake starts once the open completes during a later
    /// poll.
    pub fn open(&mut self) -> Result<(), Error> {
        if self.engine.state() != ConnectionState::Start || self.transport_opened {
            return Err(Error::runtime(format!(
                "cannot open a connection in state {}",
                self.engine.state()
            )));
        }
        let transport = self
            .transport
            .as_mut()
            .ok_or_else(|| Error::runtime("connection has no transport"))?;
        let completion = transport
            .open()
            .map_err(|err| Error::runtime(format!("transport open failed: {}", err)))?;
        self.transport_opened = true;
        self.open_completion = Some(completion);
        Ok(())
    }

    /// Whether [`Connection::listen`] was called
    pub fn is_listening(&self) -> bool {
        self.engine.is_listening()
    }

    /// Waits for the peer's protocol header instead of sending ours first. Call before
    /// [`Connection::open`].
    pub fn listen(&mut self) -> Result<(), Error> {
        self.engine.listen()
    }

    /// Closes the connection. An empty `condition` closes without an error; an empty
    /// `description` is omitted.
    pub fn close(
        &mut self,
        condition: &str,
        description: &str,
        info: Option<definitions::Fields>,
    ) -> Result<(), Error> {
        let error = match condition.is_empty() {
            true => None,
            false => Some(definitions::Error::new(
                condition,
                Some(description.to_string()),
                info,
            )),
        };
        self.engine.close(error)
    }

    /// Stops raising events
    pub fn clear_event_handler(&mut self) {
        self.handler = None;
    }

    /// Replaces the event handler
    pub fn set_event_handler(&mut self, handler: Weak<dyn ConnectionEvents>) {
        self.handler = Some(handler);
    }

    /* -------------------------------- endpoints ------------------------------- */

    /// Allocates an endpoint on the lowest free outgoing channel
    pub fn create_endpoint(&mut self) -> Result<Endpoint, Error> {
        self.engine.create_endpoint()
    }

    /// Releases an endpoint and its channels
    pub fn destroy_endpoint(&mut self, endpoint: &Endpoint) -> Result<(), Error> {
        self.engine.destroy_endpoint(endpoint)
    }

    /// Queues a session or link performative, followed by `payload`, on the endpoint's
    /// outgoing channel. It is written to the transport by the next poll.
    pub fn send_endpoint_frame(
        &mut self,
        endpoint: &Endpoint,
        performative: Value,
        payload: Bytes,
    ) -> Result<(), Error> {
        self.engine
            .send_endpoint_frame(endpoint, performative, payload)
    }

    /// Takes the oldest frame the peer sent to the endpoint
    pub fn next_endpoint_frame(&mut self, endpoint: &Endpoint) -> Option<EndpointFrame> {
        self.engine.next_endpoint_frame(endpoint)
    }

    /// Channel the peer sends the endpoint's frames on, once bound
    pub fn endpoint_incoming_channel(&self, endpoint: &Endpoint) -> Option<u16> {
        self.engine.endpoint_incoming_channel(endpoint)
    }

    /* ---------------------------------- poll ---------------------------------- */

    /// Does one round of work: reads and processes what the transport received, checks
    /// timers, writes queued frames and raises events
    pub fn poll(&mut self) {
        self.poll_at(Instant::now())
    }

    /// [`Connection::poll`] with an explicit current time
    #[instrument(skip_all, fields(container_id = %self.engine.local_open().container_id))]
    pub fn poll_at(&mut self, now: Instant) {
        let mut inbound = Inbound::default();
        if let Some(transport) = self.transport.as_mut() {
            transport.poll(&mut inbound);
        }

        self.check_open_completion(now);
        if !inbound.bytes.is_empty() {
            self.engine.on_bytes_received(&inbound.bytes, now);
        }
        if inbound.io_error {
            self.engine.on_io_error();
        }
        self.engine.tick(now);

        self.flush(now);
        self.check_send_completions();
        self.close_transport_if_done();
        self.dispatch_events(now);
    }

    fn check_open_completion(&mut self, now: Instant) {
        let result = match self.open_completion.as_ref().and_then(|c| c.result()) {
            Some(result) => result,
            None => return,
        };
        self.open_completion = None;
        match result {
            IoResult::Ok => {
                debug!("transport open");
                self.engine.start(now);
            }
            result => {
                error!(?result, "transport open failed");
                self.engine.on_io_error();
            }
        }
    }

    fn flush(&mut self, now: Instant) {
        let outgoing = self.engine.take_outgoing(now);
        let transport = match self.transport.as_mut() {
            Some(transport) => transport,
            None => return,
        };
        for bytes in outgoing {
            match transport.send(bytes) {
                Ok(completion) => self.send_completions.push(completion),
                Err(err) => {
                    error!(?err, "transport send failed");
                    self.engine.on_io_error();
                    return;
                }
            }
        }
    }

    fn check_send_completions(&mut self) {
        let mut failed = false;
        self.send_completions
            .retain(|completion| match completion.result() {
                None => true,
                Some(IoResult::Ok) => false,
                Some(result) => {
                    error!(?result, "send failed");
                    failed = true;
                    false
                }
            });
        if failed {
            self.engine.on_io_error();
        }
    }

    fn close_transport_if_done(&mut self) {
        if !self.engine.state().is_terminal() || !self.transport_opened || self.transport_closed
        {
            return;
        }
        self.transport_closed = true;
        if let Some(transport) = self.transport.as_mut() {
            if let Err(err) = transport.close() {
                debug!(?err, "transport close");
            }
        }
    }

    fn dispatch_events(&mut self, now: Instant) {
        loop {
            let events = self.engine.take_events();
            if events.is_empty() {
                return;
            }
            for event in events {
                let handler = self.handler.as_ref().and_then(Weak::upgrade);
                match event {
                    EngineEvent::StateChanged { new, old } => {
                        if let Some(handler) = handler {
                            handler.on_connection_state_changed(self, new, old);
                        }
                    }
                    EngineEvent::NewEndpoint(endpoint) => {
                        let accepted = handler
                            .map(|handler| handler.on_new_endpoint(self, &endpoint))
                            .unwrap_or(false);
                        if !accepted {
                            debug!(id = endpoint.id(), "endpoint rejected");
                            self.engine.reject_endpoint(&endpoint);
                        }
                    }
                    EngineEvent::IoError => {
                        if let Some(handler) = handler {
                            handler.on_io_error(self);
                        }
                    }
                }
            }

            // a rejected endpoint closes the connection
            self.flush(now);
            self.close_transport_if_done();
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.handler = None;
        if self.transport_opened && !self.transport_closed {
            if let Some(transport) = self.transport.as_mut() {
                if let Err(err) = transport.close() {
                    debug!(?err, "transport close on drop");
                }
            }
        }
    }
}
