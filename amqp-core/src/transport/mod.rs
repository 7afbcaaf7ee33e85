//! Byte transports consumed by a connection
//!
//! A [`Transport`] moves raw bytes. It does not block on the network: `open`, `close` and
//! `send` only start the operation and hand back an [`IoCompletion`] that resolves during a
//! later [`Transport::poll`]. Received bytes and transport failures are pushed to the
//! [`TransportEvents`] passed to `poll`.

use std::{
    fmt::Debug,
    sync::{Arc, Weak},
};

use bytes::Bytes;
use parking_lot::Mutex;

use crate::Error;

mod socket;
pub use socket::SocketTransport;

mod tls;
pub use tls::TlsTransport;

/// Outcome of an open, send or close
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoResult {
    /// The operation completed
    Ok,

    /// The operation was abandoned before it could complete
    Cancelled,

    /// The operation failed
    Error,

    /// The operation was not valid for the transport
    Invalid,
}

type Slot = Arc<Mutex<Option<IoResult>>>;

/// Handle on the result of a pending operation
///
/// Dropping the handle withdraws interest in the result; the transport still completes the
/// operation.
#[derive(Debug)]
pub struct IoCompletion {
    slot: Slot,
}

impl IoCompletion {
    /// A completion that already holds its result
    pub fn ready(result: IoResult) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(result))),
        }
    }

    /// The result, once the operation has completed
    pub fn result(&self) -> Option<IoResult> {
        *self.slot.lock()
    }

    /// Whether the operation has completed
    pub fn is_complete(&self) -> bool {
        self.slot.lock().is_some()
    }
}

/// The transport side of an [`IoCompletion`]
///
/// Completes exactly once. A completer dropped without completing resolves to
/// [`IoResult::Cancelled`].
#[derive(Debug)]
pub struct IoCompleter {
    slot: Option<Weak<Mutex<Option<IoResult>>>>,
}

impl IoCompleter {
    /// Resolves the completion
    pub fn complete(mut self, result: IoResult) {
        self.resolve(result)
    }

    fn resolve(&mut self, result: IoResult) {
        if let Some(slot) = self.slot.take().and_then(|weak| weak.upgrade()) {
            let mut slot = slot.lock();
            if slot.is_none() {
                *slot = Some(result);
            }
        }
    }
}

impl Drop for IoCompleter {
    fn drop(&mut self) {
        self.resolve(IoResult::Cancelled)
    }
}

/// Creates a pending completion and the completer that resolves it
pub fn completion() -> (IoCompleter, IoCompletion) {
    let slot = Arc::new(Mutex::new(None));
    let completer = IoCompleter {
        slot: Some(Arc::downgrade(&slot)),
    };
    (completer, IoCompletion { slot })
}

/// Receiver of what a transport observed during [`Transport::poll`]
pub trait TransportEvents {
    /// Bytes arrived from the peer
    fn on_bytes_received(&mut self, bytes: &[u8]);

    /// The transport failed and cannot be used any more
    fn on_io_error(&mut self);
}

/// A non-blocking byte transport
pub trait Transport: Debug + Send {
    /// Starts opening the transport
    ///
    /// Opening a transport that is already open is an [`Error::Logic`].
    fn open(&mut self) -> Result<IoCompletion, Error>;

    /// Starts closing the transport. Pending sends are cancelled.
    ///
    /// Closing a transport that was never opened is an [`Error::Logic`].
    fn close(&mut self) -> Result<IoCompletion, Error>;

    /// Queues bytes to be written
    fn send(&mut self, bytes: Bytes) -> Result<IoCompletion, Error>;

    /// Makes as much progress as possible without blocking
    fn poll(&mut self, events: &mut dyn TransportEvents);

    /// Host the transport connects to, if it connects to one
    fn host(&self) -> Option<&str> {
        None
    }

    /// Port the transport connects to, if it connects to one
    fn port(&self) -> Option<u16> {
        None
    }

    /// Whether bytes are encrypted on the wire
    fn is_secure(&self) -> bool {
        false
    }
}
