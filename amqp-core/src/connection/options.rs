use std::fmt::Debug;

use amqp_core_types::definitions::{Fields, Milliseconds};
use serde::Deserialize;

/// Default max-frame-size
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 64 * 1024;

/// Default channel-max
pub const DEFAULT_CHANNEL_MAX: u16 = u16::MAX;

/// Default fraction of the peer's idle timeout after which an empty frame is sent
pub const DEFAULT_EMPTY_FRAME_SEND_RATIO: f64 = 0.5;

/// Options a [`Connection`](super::Connection) is constructed with
///
/// Only the host name, the container id and the trace flag take effect at construction.
/// The negotiable values are applied by
/// [`Connection::apply_options`](super::Connection::apply_options).
///
/// ## Default configuration
///
/// | Field | Default Value |
/// |-------|---------------|
/// |`host_name`| the host of the request uri, if any |
/// |`container_id`| a random uuid |
/// |`enable_trace`| `false` |
/// |`idle_timeout`| `None` |
/// |`max_frame_size`| [`DEFAULT_MAX_FRAME_SIZE`] |
/// |`max_channel`| [`DEFAULT_CHANNEL_MAX`] |
/// |`properties`| `None` |
/// |`sasl_credentials`| `None` |
/// |`pipeline_open`| `false` |
///
/// The options can be read from any serde format; `properties` can only be set in code.
///
/// ```rust
/// use amqp_core::connection::ConnectionOptions;
///
/// let options = ConnectionOptions::default()
///     .container_id("connection-1")
///     .idle_timeout(30_000)
///     .max_frame_size(16 * 1024);
/// assert_eq!(options.max_channel, 65535);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConnectionOptions {
    /// Host name sent in the open, used by virtual hosting brokers
    pub host_name: Option<String>,

    /// Container id sent in the open
    pub container_id: Option<String>,

    /// Log every frame and the raw bytes exchanged
    pub enable_trace: bool,

    /// Our idle timeout in milliseconds
    pub idle_timeout: Option<Milliseconds>,

    /// Largest frame we accept
    pub max_frame_size: u32,

    /// Highest channel number we accept
    pub max_channel: u16,

    /// Connection properties sent in the open
    #[serde(skip)]
    pub properties: Option<Fields>,

    /// Credentials for a SASL exchange. Neither constructor supports SASL, so setting
    /// this fails construction.
    pub sasl_credentials: Option<SaslCredentials>,

    /// Send our open right after our protocol header instead of waiting for the peer's
    /// header
    pub pipeline_open: bool,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            host_name: None,
            container_id: None,
            enable_trace: false,
            idle_timeout: None,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            max_channel: DEFAULT_CHANNEL_MAX,
            properties: None,
            sasl_credentials: None,
            pipeline_open: false,
        }
    }
}

impl ConnectionOptions {
    /// Sets the host name
    pub fn host_name(mut self, host_name: impl Into<String>) -> Self {
        self.host_name = Some(host_name.into());
        self
    }

    /// Sets the container id
    pub fn container_id(mut self, container_id: impl Into<String>) -> Self {
        self.container_id = Some(container_id.into());
        self
    }

    /// Enables frame tracing
    pub fn enable_trace(mut self, enable_trace: bool) -> Self {
        self.enable_trace = enable_trace;
        self
    }

    /// Sets our idle timeout in milliseconds
    pub fn idle_timeout(mut self, idle_timeout: Milliseconds) -> Self {
        self.idle_timeout = Some(idle_timeout);
        self
    }

    /// Sets the largest frame we accept
    pub fn max_frame_size(mut self, max_frame_size: u32) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    /// Sets the highest channel number we accept
    pub fn max_channel(mut self, max_channel: u16) -> Self {
        self.max_channel = max_channel;
        self
    }

    /// Sets the connection properties
    pub fn properties(mut self, properties: Fields) -> Self {
        self.properties = Some(properties);
        self
    }

    /// Sets SASL credentials
    pub fn sasl_credentials(mut self, credentials: SaslCredentials) -> Self {
        self.sasl_credentials = Some(credentials);
        self
    }

    /// Pipelines our open behind our protocol header
    pub fn pipeline_open(mut self, pipeline_open: bool) -> Self {
        self.pipeline_open = pipeline_open;
        self
    }
}

/// Username and password for SASL PLAIN
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct SaslCredentials {
    /// Username
    pub username: String,

    /// Password
    pub password: String,
}

impl SaslCredentials {
    /// Creates credentials
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl Debug for SaslCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaslCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
