#![deny(missing_docs, missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! AMQP 1.0 connection core.
//!
//! A [`Connection`](connection::Connection) owns a byte [`Transport`](transport::Transport)
//! and drives the protocol header exchange, the open/close handshake, idle timeouts and
//! endpoint bookkeeping from explicit calls to
//! [`Connection::poll`](connection::Connection::poll). Nothing in this crate spawns a
//! runtime, and apart from resolving a host name in `open` nothing blocks. Progress only
//! happens inside `poll`.
//!
//! ```rust,no_run
//! use amqp_core::connection::{Connection, ConnectionOptions};
//!
//! amqp_core::platform::init();
//! let mut connection =
//!     Connection::from_uri("amqp://localhost", ConnectionOptions::default(), None).unwrap();
//! connection.open().unwrap();
//! loop {
//!     connection.poll();
//!     if connection.state().is_terminal() {
//!         break;
//!     }
//! }
//! ```

pub mod connection;
pub mod error;
pub mod frames;
pub mod platform;
pub mod transport;

pub use error::Error;

pub use amqp_core_types as types;
pub use amqp_value as value;
