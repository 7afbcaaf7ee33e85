/// the IANA assigned port number for AMQP.
/// The standard AMQP port number that has been assigned
/// by IANA for TCP, UDP, and SCTP.
pub const PORT: u16 = 5672;

/// the IANA assigned port number for secure AMQP (amqps).
/// Implementations listening on this port SHOULD NOT expect a protocol handshake before TLS is negotiated.
pub const SECURE_PORT: u16 = 5671;

/// major protocol version.
pub const MAJOR: u8 = 1;

/// minor protocol version.
pub const MINOR: u8 = 0;

/// protocol revision
pub const REVISION: u8 = 0;

/// the lower bound for the agreed maximum frame size (in bytes).
/// Until the peers have agreed a definitive maximum frame size for the connection,
/// frames of up to this size can always be sent.
pub const MIN_MAX_FRAME_SIZE: usize = 512;
