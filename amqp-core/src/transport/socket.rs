//! Plain TCP transport over a non-blocking `mio` stream
//!
//! Host names are resolved when the transport is opened. The connect itself never blocks:
//! each poll checks whether the pending attempt has completed and moves on to the next
//! resolved address after a failure or [`CONNECT_TIMEOUT`].

use std::{
    collections::VecDeque,
    io::{self, Read, Write},
    net::{Shutdown, SocketAddr, ToSocketAddrs},
    time::{Duration, Instant},
};

use bytes::{Buf, Bytes};
use mio::net::TcpStream;
use tracing::{debug, error, trace};

use super::{completion, IoCompleter, IoCompletion, IoResult, Transport, TransportEvents};
use crate::Error;

/// Time allowed for a connect attempt to one address
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const READ_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Debug)]
enum State {
    Idle,
    /// Connected by someone else, typically an accepting listener
    Accepted(std::net::TcpStream),
    Connecting(Connector, IoCompleter),
    Open(TcpStream),
    Failed,
    Closed,
}

#[derive(Debug)]
struct PendingWrite {
    bytes: Bytes,
    completer: IoCompleter,
}

/// Non-blocking TCP transport
#[derive(Debug)]
pub struct SocketTransport {
    host: String,
    port: u16,
    state: State,
    writes: VecDeque<PendingWrite>,
    buf: Box<[u8]>,
}

impl SocketTransport {
    /// Creates a transport that connects to `host:port` when opened
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_state(host.into(), port, State::Idle)
    }

    /// Wraps a stream that is already connected, e.g. one returned by
    /// `TcpListener::accept`
    pub fn from_stream(stream: std::net::TcpStream) -> io::Result<Self> {
        let peer = stream.peer_addr()?;
        Ok(Self::with_state(
            peer.ip().to_string(),
            peer.port(),
            State::Accepted(stream),
        ))
    }

    fn with_state(host: String, port: u16, state: State) -> Self {
        Self {
            host,
            port,
            state,
            writes: VecDeque::new(),
            buf: vec![0u8; READ_BUFFER_SIZE].into_boxed_slice(),
        }
    }

    /// Whether the transport has been opened and has not failed or closed since
    pub fn is_open(&self) -> bool {
        matches!(self.state, State::Open(_))
    }

    fn fail(&mut self, events: &mut dyn TransportEvents) {
        // pending writes resolve to cancelled as their completers drop
        self.writes.clear();
        self.state = State::Failed;
        events.on_io_error();
    }
}

/// A TCP connect in progress, trying each resolved address in turn
#[derive(Debug)]
pub(crate) struct Connector {
    addrs: VecDeque<SocketAddr>,
    attempt: Option<(TcpStream, Instant)>,
    last_err: Option<io::Error>,
}

impl Connector {
    /// Resolves `host:port`. The first attempt starts on the first poll.
    pub(crate) fn resolve(host: &str, port: u16) -> io::Result<Self> {
        let addrs: VecDeque<_> = (host, port).to_socket_addrs()?.collect();
        Ok(Self {
            addrs,
            attempt: None,
            last_err: None,
        })
    }

    /// Returns the stream once an attempt has connected, `None` while one is pending, and
    /// the last error once every address has failed.
    pub(crate) fn poll(&mut self) -> io::Result<Option<TcpStream>> {
        loop {
            if let Some((stream, started)) = &self.attempt {
                let status = is_connected(stream);
                let timed_out = started.elapsed() >= CONNECT_TIMEOUT;
                match status {
                    Ok(true) => return Ok(self.attempt.take().map(|(stream, _)| stream)),
                    Ok(false) if !timed_out => return Ok(None),
                    Ok(false) => {
                        self.last_err =
                            Some(io::Error::new(io::ErrorKind::TimedOut, "connect timed out"))
                    }
                    Err(err) => self.last_err = Some(err),
                }
                self.attempt = None;
            }

            let addr = match self.addrs.pop_front() {
                Some(addr) => addr,
                None => {
                    return Err(self.last_err.take().unwrap_or_else(|| {
                        io::Error::new(io::ErrorKind::NotFound, "host resolved to no address")
                    }))
                }
            };
            match TcpStream::connect(addr) {
                Ok(stream) => {
                    trace!(%addr, "connecting");
                    self.attempt = Some((stream, Instant::now()));
                }
                Err(err) => {
                    debug!(%addr, ?err, "connect");
                    self.last_err = Some(err);
                }
            }
        }
    }
}

/// Whether a non-blocking connect has completed. A pending connect has no peer yet.
fn is_connected(stream: &TcpStream) -> io::Result<bool> {
    if let Some(err) = stream.take_error()? {
        return Err(err);
    }
    match stream.peer_addr() {
        Ok(_) => Ok(true),
        Err(ref e) if e.kind() == io::ErrorKind::NotConnected => Ok(false),
        Err(e) => Err(e),
    }
}

/// Prepares a connected stream for polling
pub(crate) fn configure(stream: &TcpStream) -> io::Result<()> {
    stream.set_nodelay(true)
}

/// Reads until the socket would block. Returns `Ok(false)` once the peer has closed.
pub(crate) fn read_available(
    stream: &mut impl Read,
    buf: &mut [u8],
    mut on_bytes: impl FnMut(&[u8]),
) -> io::Result<bool> {
    loop {
        match stream.read(buf) {
            Ok(0) => return Ok(false),
            Ok(n) => on_bytes(&buf[..n]),
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(true),
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
}

impl Transport for SocketTransport {
    fn open(&mut self) -> Result<IoCompletion, Error> {
        match std::mem::replace(&mut self.state, State::Failed) {
            State::Idle => match Connector::resolve(&self.host, self.port) {
                Ok(connector) => {
                    let (completer, completion) = completion();
                    self.state = State::Connecting(connector, completer);
                    Ok(completion)
                }
                Err(err) => {
                    error!(host = %self.host, ?err, "cannot resolve host");
                    Ok(IoCompletion::ready(IoResult::Error))
                }
            },
            State::Accepted(stream) => {
                stream.set_nonblocking(true)?;
                let stream = TcpStream::from_std(stream);
                configure(&stream)?;
                self.state = State::Open(stream);
                Ok(IoCompletion::ready(IoResult::Ok))
            }
            state => {
                self.state = state;
                Err(Error::logic("socket transport is already open"))
            }
        }
    }

    fn close(&mut self) -> Result<IoCompletion, Error> {
        match std::mem::replace(&mut self.state, State::Closed) {
            State::Open(stream) => {
                self.writes.clear();
                if let Err(err) = stream.shutdown(Shutdown::Both) {
                    debug!(?err, "socket shutdown");
                }
                Ok(IoCompletion::ready(IoResult::Ok))
            }
            State::Connecting(_, completer) => {
                completer.complete(IoResult::Cancelled);
                Ok(IoCompletion::ready(IoResult::Ok))
            }
            State::Failed => Ok(IoCompletion::ready(IoResult::Ok)),
            state => {
                self.state = state;
                Err(Error::logic("socket transport is not open"))
            }
        }
    }

    fn send(&mut self, bytes: Bytes) -> Result<IoCompletion, Error> {
        match self.state {
            State::Open(_) => {
                let (completer, completion) = completion();
                self.writes.push_back(PendingWrite { bytes, completer });
                Ok(completion)
            }
            _ => Err(Error::logic("socket transport is not open")),
        }
    }

    fn poll(&mut self, events: &mut dyn TransportEvents) {
        if let State::Connecting(connector, _) = &mut self.state {
            let connected = match connector.poll() {
                Ok(None) => return,
                Ok(Some(stream)) => configure(&stream).map(|_| stream),
                Err(err) => Err(err),
            };
            let completer = match std::mem::replace(&mut self.state, State::Failed) {
                State::Connecting(_, completer) => completer,
                _ => return,
            };
            match connected {
                Ok(stream) => {
                    debug!(host = %self.host, port = self.port, "connected");
                    self.state = State::Open(stream);
                    completer.complete(IoResult::Ok);
                }
                Err(err) => {
                    error!(host = %self.host, port = self.port, ?err, "connect failed");
                    completer.complete(IoResult::Error);
                    return;
                }
            }
        }

        let stream = match &mut self.state {
            State::Open(stream) => stream,
            _ => return,
        };

        while let Some(write) = self.writes.front_mut() {
            match stream.write(&write.bytes) {
                Ok(0) if !write.bytes.is_empty() => {
                    error!("socket accepted no bytes");
                    if let Some(write) = self.writes.pop_front() {
                        write.completer.complete(IoResult::Error);
                    }
                    return self.fail(events);
                }
                Ok(n) => {
                    write.bytes.advance(n);
                    if write.bytes.is_empty() {
                        if let Some(write) = self.writes.pop_front() {
                            write.completer.complete(IoResult::Ok);
                        }
                    }
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => {
                    error!(?err, "socket write");
                    if let Some(write) = self.writes.pop_front() {
                        write.completer.complete(IoResult::Error);
                    }
                    return self.fail(events);
                }
            }
        }

        match read_available(stream, &mut self.buf, |bytes| {
            trace!(len = bytes.len(), "socket read");
            events.on_bytes_received(bytes)
        }) {
            Ok(true) => {}
            Ok(false) => {
                debug!("peer closed the socket");
                self.fail(events)
            }
            Err(err) => {
                error!(?err, "socket read");
                self.fail(events)
            }
        }
    }

    fn host(&self) -> Option<&str> {
        Some(&self.host)
    }

    fn port(&self) -> Option<u16> {
        Some(self.port)
    }
}
