//! TLS transport
//!
//! With the `rustls` feature, a `rustls` client session is layered over a non-blocking TCP
//! stream and trusts the `webpki-roots` certificates. Without the feature the transport can
//! still be constructed, but opening it completes with [`IoResult::Error`].

use std::collections::VecDeque;

use bytes::Bytes;
use tracing::{error, warn};

use super::{
    completion, socket::Connector, IoCompleter, IoCompletion, IoResult, Transport,
    TransportEvents,
};
use crate::{platform, Error};

#[derive(Debug)]
enum State {
    Idle,
    Connecting(Connector, IoCompleter),
    #[cfg(feature = "rustls")]
    Handshaking(Box<session::Session>, IoCompleter),
    #[cfg(feature = "rustls")]
    Open(Box<session::Session>),
    Failed,
    Closed,
}

#[derive(Debug)]
#[cfg_attr(not(feature = "rustls"), allow(dead_code))]
struct PendingWrite {
    bytes: Bytes,
    completer: IoCompleter,
}

/// Non-blocking TLS transport
#[derive(Debug)]
#[cfg_attr(not(feature = "rustls"), allow(dead_code))]
pub struct TlsTransport {
    host: String,
    port: u16,
    state: State,
    writes: VecDeque<PendingWrite>,
    buf: Box<[u8]>,
}

impl TlsTransport {
    /// Creates a transport that connects to `host:port` and negotiates TLS when opened
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            state: State::Idle,
            writes: VecDeque::new(),
            buf: vec![0u8; 64 * 1024].into_boxed_slice(),
        }
    }

    /// Whether the TLS session is established
    pub fn is_open(&self) -> bool {
        match self.state {
            #[cfg(feature = "rustls")]
            State::Open(_) => true,
            _ => false,
        }
    }

    #[cfg_attr(not(feature = "rustls"), allow(dead_code))]
    fn fail(&mut self, events: &mut dyn TransportEvents) {
        self.writes.clear();
        match std::mem::replace(&mut self.state, State::Failed) {
            #[cfg(feature = "rustls")]
            State::Handshaking(_, completer) => completer.complete(IoResult::Error),
            _ => events.on_io_error(),
        }
    }
}

impl Transport for TlsTransport {
    fn open(&mut self) -> Result<IoCompletion, Error> {
        if !matches!(self.state, State::Idle) {
            return Err(Error::logic("tls transport is already open"));
        }
        if cfg!(not(feature = "rustls")) {
            warn!("TLS requires the `rustls` feature");
            self.state = State::Failed;
            return Ok(IoCompletion::ready(IoResult::Error));
        }
        if !platform::is_initialized() {
            return Err(Error::runtime("platform::init must run before opening TLS"));
        }

        match Connector::resolve(&self.host, self.port) {
            Ok(connector) => {
                let (completer, completion) = completion();
                self.state = State::Connecting(connector, completer);
                Ok(completion)
            }
            Err(err) => {
                error!(host = %self.host, ?err, "cannot resolve host");
                self.state = State::Failed;
                Ok(IoCompletion::ready(IoResult::Error))
            }
        }
    }

    fn close(&mut self) -> Result<IoCompletion, Error> {
        match std::mem::replace(&mut self.state, State::Closed) {
            #[cfg(feature = "rustls")]
            State::Open(mut session) => {
                self.writes.clear();
                session.shutdown();
                Ok(IoCompletion::ready(IoResult::Ok))
            }
            #[cfg(feature = "rustls")]
            State::Handshaking(_, completer) => {
                completer.complete(IoResult::Cancelled);
                Ok(IoCompletion::ready(IoResult::Ok))
            }
            State::Connecting(_, completer) => {
                completer.complete(IoResult::Cancelled);
                Ok(IoCompletion::ready(IoResult::Ok))
            }
            State::Failed => Ok(IoCompletion::ready(IoResult::Ok)),
            state => {
                self.state = state;
                Err(Error::logic("tls transport is not open"))
            }
        }
    }

    fn send(&mut self, bytes: Bytes) -> Result<IoCompletion, Error> {
        match self.is_open() {
            true => {
                let (completer, completion) = completion();
                self.writes.push_back(PendingWrite { bytes, completer });
                Ok(completion)
            }
            false => Err(Error::logic("tls transport is not open")),
        }
    }

    #[cfg(feature = "rustls")]
    fn poll(&mut self, events: &mut dyn TransportEvents) {
        use tracing::debug;

        if let State::Connecting(connector, _) = &mut self.state {
            let connected = match connector.poll() {
                Ok(None) => return,
                Ok(Some(sock)) => session::Session::new(&self.host, sock),
                Err(err) => Err(err),
            };
            let completer = match std::mem::replace(&mut self.state, State::Failed) {
                State::Connecting(_, completer) => completer,
                _ => return,
            };
            match connected {
                Ok(session) => self.state = State::Handshaking(Box::new(session), completer),
                Err(err) => {
                    error!(host = %self.host, port = self.port, ?err, "tls connect failed");
                    completer.complete(IoResult::Error);
                    return;
                }
            }
        }

        let pumped = match &mut self.state {
            State::Handshaking(session, _) | State::Open(session) => {
                session.pump(&mut self.writes, &mut self.buf, events)
            }
            _ => return,
        };
        match pumped {
            Ok(true) => {}
            Ok(false) => {
                debug!("peer closed the tls session");
                return self.fail(events);
            }
            Err(err) => {
                error!(?err, "tls");
                return self.fail(events);
            }
        }

        let handshake_done = match &self.state {
            State::Handshaking(session, _) => !session.is_handshaking(),
            _ => false,
        };
        if handshake_done {
            if let State::Handshaking(session, completer) =
                std::mem::replace(&mut self.state, State::Failed)
            {
                debug!(host = %self.host, "tls handshake complete");
                self.state = State::Open(session);
                completer.complete(IoResult::Ok);
            }
        }
    }

    #[cfg(not(feature = "rustls"))]
    fn poll(&mut self, _events: &mut dyn TransportEvents) {}

    fn host(&self) -> Option<&str> {
        Some(&self.host)
    }

    fn port(&self) -> Option<u16> {
        Some(self.port)
    }

    fn is_secure(&self) -> bool {
        true
    }
}

#[cfg(feature = "rustls")]
mod session {
    use std::{
        collections::VecDeque,
        io::{self, Write},
        net::Shutdown,
        sync::Arc,
    };

    use bytes::Buf;
    use mio::net::TcpStream;
    use librustls::{pki_types::ServerName, ClientConfig, ClientConnection, RootCertStore};

    use super::PendingWrite;
    use crate::transport::{
        socket::{configure, read_available},
        IoResult, TransportEvents,
    };

    #[derive(Debug)]
    pub(super) struct Session {
        conn: ClientConnection,
        sock: TcpStream,
    }

    impl Session {
        /// Starts a client session over a connected stream
        pub(super) fn new(host: &str, sock: TcpStream) -> io::Result<Self> {
            configure(&sock)?;

            let mut root_cert_store = RootCertStore::empty();
            root_cert_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
            let config = ClientConfig::builder()
                .with_root_certificates(root_cert_store)
                .with_no_client_auth();
            let domain = ServerName::try_from(host.to_string())
                .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
            let conn = ClientConnection::new(Arc::new(config), domain)
                .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
            Ok(Self { conn, sock })
        }

        pub(super) fn is_handshaking(&self) -> bool {
            self.conn.is_handshaking()
        }

        /// Hands queued plaintext to the session, then moves records both ways.
        /// Returns `Ok(false)` once the peer has closed.
        pub(super) fn pump(
            &mut self,
            writes: &mut VecDeque<PendingWrite>,
            buf: &mut [u8],
            events: &mut dyn TransportEvents,
        ) -> io::Result<bool> {
            if !self.conn.is_handshaking() {
                while let Some(write) = writes.front_mut() {
                    let n = self.conn.writer().write(&write.bytes)?;
                    if n == 0 && !write.bytes.is_empty() {
                        break;
                    }
                    write.bytes.advance(n);
                    if write.bytes.is_empty() {
                        if let Some(write) = writes.pop_front() {
                            write.completer.complete(IoResult::Ok);
                        }
                    }
                }
            }
            self.flush()?;

            let mut eof = false;
            loop {
                match self.conn.read_tls(&mut self.sock) {
                    Ok(0) => {
                        eof = true;
                        break;
                    }
                    Ok(_) => {
                        self.conn
                            .process_new_packets()
                            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
                    }
                    Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                    Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                    Err(e) => return Err(e),
                }
            }

            let open = read_available(&mut self.conn.reader(), buf, |bytes| {
                events.on_bytes_received(bytes)
            })?;
            self.flush()?;
            Ok(open && !eof)
        }

        fn flush(&mut self) -> io::Result<()> {
            while self.conn.wants_write() {
                match self.conn.write_tls(&mut self.sock) {
                    Ok(_) => {}
                    Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                    Err(e) => return Err(e),
                }
            }
            Ok(())
        }

        pub(super) fn shutdown(&mut self) {
            self.conn.send_close_notify();
            let _ = self.flush();
            let _ = self.sock.shutdown(Shutdown::Both);
        }
    }
}
