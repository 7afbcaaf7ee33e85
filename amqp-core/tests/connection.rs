use std::{
    sync::{Arc, Weak},
    time::{Duration, Instant},
};

use amqp_core::{
    connection::{Connection, ConnectionEvents, ConnectionOptions, SaslCredentials},
    frames::amqp::{Frame, FrameBody},
    transport::IoResult,
    types::{
        definitions::{self, AmqpError},
        performatives::{Begin, Close, End, Open, Performative},
        states::ConnectionState,
    },
    value::{primitives::Symbol, Value},
};
use bytes::Bytes;

mod common;

use common::{MockPeer, MockTransport, Recorder};

fn weak(recorder: &Arc<Recorder>) -> Option<Weak<dyn ConnectionEvents>> {
    let handler: Arc<dyn ConnectionEvents> = recorder.clone();
    Some(Arc::downgrade(&handler))
}

fn client(options: ConnectionOptions, recorder: &Arc<Recorder>) -> (Connection, MockPeer) {
    let (transport, peer) = MockTransport::new();
    let connection = Connection::with_transport(transport, options, weak(recorder)).unwrap();
    (connection, peer)
}

fn begin(remote_channel: Option<u16>) -> Performative {
    Performative::Begin(Begin {
        remote_channel,
        next_outgoing_id: 1,
        incoming_window: 2048,
        outgoing_window: 2048,
        handle_max: None,
        offered_capabilities: None,
        desired_capabilities: None,
        properties: None,
    })
}

/// Runs the client side handshake against the mock peer until `Opened`
fn open_client(connection: &mut Connection, peer: &MockPeer, remote: Open, now: Instant) {
    connection.open().unwrap();
    connection.poll_at(now);
    assert!(peer.take_header().is_amqp());

    peer.push_header();
    peer.push_performative(0, Performative::Open(remote));
    connection.poll_at(now);
    assert_eq!(connection.state(), ConnectionState::Opened);

    let sent = peer.take_performatives();
    assert!(matches!(sent.as_slice(), [Performative::Open(_)]));
}

fn close_error(performatives: &[Performative]) -> definitions::Error {
    match performatives.last() {
        Some(Performative::Close(Close { error: Some(error) })) => error.clone(),
        other => panic!("expected a close with an error, found {:?}", other),
    }
}

#[test]
fn sasl_credentials_are_rejected() {
    let options = ConnectionOptions::default()
        .sasl_credentials(SaslCredentials::new("guest", "guest"));

    let (transport, _peer) = MockTransport::new();
    let err = Connection::with_transport(transport, options.clone(), None).unwrap_err();
    assert!(err.is_configuration_error());

    let err = Connection::from_uri("amqp://localhost", options, None).unwrap_err();
    assert!(err.is_configuration_error());
}

#[test]
fn uri_selects_the_transport() {
    let options = ConnectionOptions::default();

    let connection = Connection::from_uri("amqp://broker", options.clone(), None).unwrap();
    let transport = connection.transport().unwrap();
    assert_eq!(transport.port(), Some(5672));
    assert!(!transport.is_secure());
    assert_eq!(connection.host_name(), Some("broker"));

    let connection = Connection::from_uri("amqps://broker", options.clone(), None).unwrap();
    let transport = connection.transport().unwrap();
    assert_eq!(transport.port(), Some(5671));
    assert!(transport.is_secure());

    let connection = Connection::from_uri("amqp://broker:1234", options.clone(), None).unwrap();
    assert_eq!(connection.transport().unwrap().port(), Some(1234));

    let options = options.host_name("virtual-host");
    let mut connection = Connection::from_uri("http://broker", options, None).unwrap();
    assert!(connection.transport().is_none());
    assert_eq!(connection.host_name(), Some("virtual-host"));
    assert!(connection.open().unwrap_err().is_runtime_failure());
}

#[test]
fn container_id_defaults_to_a_unique_id() {
    let a = Connection::from_uri("amqp://broker", ConnectionOptions::default(), None).unwrap();
    let b = Connection::from_uri("amqp://broker", ConnectionOptions::default(), None).unwrap();
    assert!(!a.container_id().is_empty());
    assert_ne!(a.container_id(), b.container_id());

    let options = ConnectionOptions::default().container_id("fixed");
    let c = Connection::from_uri("amqp://broker", options, None).unwrap();
    assert_eq!(c.container_id(), "fixed");
}

#[test]
fn client_handshake_raises_state_changes() {
    let recorder = Arc::new(Recorder::default());
    let options = ConnectionOptions::default().container_id("client");
    let (mut connection, peer) = client(options, &recorder);
    let now = Instant::now();

    open_client(&mut connection, &peer, Open::new("broker"), now);
    assert!(peer.is_opened());
    assert_eq!(connection.remote_container_id(), Some("broker"));
    assert_eq!(
        recorder.new_states(),
        vec![
            ConnectionState::HeaderSent,
            ConnectionState::HeaderExchanged,
            ConnectionState::OpenSent,
            ConnectionState::Opened,
        ]
    );
    assert_eq!(
        recorder.states.lock()[0],
        (ConnectionState::HeaderSent, ConnectionState::Start)
    );
}

#[test]
fn open_is_sent_with_the_negotiated_values() {
    let recorder = Arc::new(Recorder::default());
    let options = ConnectionOptions::default()
        .container_id("client")
        .host_name("vhost")
        .max_frame_size(4096)
        .max_channel(9)
        .idle_timeout(30_000);
    let (mut connection, peer) = client(options, &recorder);
    connection.apply_options().unwrap();
    assert_eq!(connection.max_frame_size(), 4096);
    assert_eq!(connection.max_channel(), 9);
    assert_eq!(connection.idle_timeout(), 30_000);
    assert_eq!(connection.remote_max_frame_size(), 512);

    let now = Instant::now();
    connection.open().unwrap();
    connection.poll_at(now);
    peer.take_header();
    peer.push_header();
    connection.poll_at(now);

    match peer.take_performatives().as_slice() {
        [Performative::Open(open)] => {
            assert_eq!(open.container_id, "client");
            assert_eq!(open.hostname.as_deref(), Some("vhost"));
            assert_eq!(open.max_frame_size.0, 4096);
            assert_eq!(open.channel_max.0, 9);
            assert_eq!(open.idle_time_out, Some(30_000));
        }
        other => panic!("unexpected {:?}", other),
    }

    let mut remote = Open::new("broker");
    remote.max_frame_size = 100_000.into();
    peer.push_performative(0, Performative::Open(remote));
    connection.poll_at(now);
    assert_eq!(connection.remote_max_frame_size(), 100_000);
}

#[test]
fn options_are_not_applied_implicitly() {
    let recorder = Arc::new(Recorder::default());
    let options = ConnectionOptions::default().max_frame_size(4096);
    let (connection, _peer) = client(options, &recorder);
    assert_eq!(connection.max_frame_size(), u32::MAX);
    assert_eq!(connection.idle_timeout(), 0);
}

#[test]
fn pipelined_open() {
    let recorder = Arc::new(Recorder::default());
    let options = ConnectionOptions::default().pipeline_open(true);
    let (mut connection, peer) = client(options, &recorder);
    let now = Instant::now();

    connection.open().unwrap();
    connection.poll_at(now);
    assert_eq!(connection.state(), ConnectionState::OpenPipe);
    peer.take_header();
    assert!(matches!(
        peer.take_performatives().as_slice(),
        [Performative::Open(_)]
    ));

    peer.push_header();
    peer.push_performative(0, Performative::Open(Open::new("broker")));
    connection.poll_at(now);
    assert_eq!(connection.state(), ConnectionState::Opened);
}

#[test]
fn listener_answers_the_peer() {
    let recorder = Arc::new(Recorder::default());
    let options = ConnectionOptions::default().container_id("server");
    let (mut connection, peer) = client(options, &recorder);
    let now = Instant::now();

    connection.listen().unwrap();
    assert!(connection.is_listening());
    assert!(connection.listen().unwrap_err().is_runtime_failure());
    connection.open().unwrap();
    connection.poll_at(now);
    assert!(peer.take_sent().is_empty());
    assert_eq!(connection.state(), ConnectionState::Start);

    peer.push_header();
    connection.poll_at(now);
    assert!(peer.take_header().is_amqp());
    assert!(peer.take_sent().is_empty());
    assert_eq!(connection.state(), ConnectionState::HeaderExchanged);

    peer.push_performative(0, Performative::Open(Open::new("client")));
    connection.poll_at(now);
    assert_eq!(connection.state(), ConnectionState::Opened);
    assert!(matches!(
        peer.take_performatives().as_slice(),
        [Performative::Open(_)]
    ));
    assert_eq!(
        recorder.new_states(),
        vec![
            ConnectionState::HeaderReceived,
            ConnectionState::HeaderExchanged,
            ConnectionState::OpenReceived,
            ConnectionState::Opened,
        ]
    );
}

#[test]
fn close_twice_is_a_logic_error() {
    let recorder = Arc::new(Recorder::default());
    let (mut connection, peer) = client(ConnectionOptions::default(), &recorder);
    let now = Instant::now();
    open_client(&mut connection, &peer, Open::new("broker"), now);

    connection
        .close("amqp:internal-error", "shutting down", None)
        .unwrap();
    assert_eq!(connection.state(), ConnectionState::CloseSent);
    assert!(connection.close("", "", None).unwrap_err().is_logic_error());

    connection.poll_at(now);
    let error = close_error(&peer.take_performatives());
    assert_eq!(error.condition, AmqpError::InternalError.into());
    assert_eq!(error.description.as_deref(), Some("shutting down"));

    peer.push_performative(0, Performative::Close(Close::new(None)));
    connection.poll_at(now);
    assert_eq!(connection.state(), ConnectionState::End);
    assert!(peer.is_closed());
}

#[test]
fn close_before_open_ends_immediately() {
    let recorder = Arc::new(Recorder::default());
    let (mut connection, _peer) = client(ConnectionOptions::default(), &recorder);
    connection.close("", "", None).unwrap();
    assert_eq!(connection.state(), ConnectionState::End);
    assert!(connection.close("", "", None).unwrap_err().is_logic_error());
    assert!(connection.open().unwrap_err().is_runtime_failure());
}

#[test]
fn close_without_condition_sends_no_error() {
    let recorder = Arc::new(Recorder::default());
    let (mut connection, peer) = client(ConnectionOptions::default(), &recorder);
    let now = Instant::now();
    open_client(&mut connection, &peer, Open::new("broker"), now);

    connection.close("", "ignored", None).unwrap();
    connection.poll_at(now);
    assert_eq!(
        peer.take_performatives(),
        vec![Performative::Close(Close::new(None))]
    );
}

#[test]
fn peer_close_is_answered() {
    let recorder = Arc::new(Recorder::default());
    let (mut connection, peer) = client(ConnectionOptions::default(), &recorder);
    let now = Instant::now();
    open_client(&mut connection, &peer, Open::new("broker"), now);

    let error = definitions::Error::new(
        AmqpError::ResourceLimitExceeded,
        Some("too many connections".to_string()),
        None::<definitions::Fields>,
    );
    peer.push_performative(0, Performative::Close(Close::new(Some(error.clone()))));
    connection.poll_at(now);

    assert_eq!(connection.state(), ConnectionState::End);
    assert_eq!(connection.remote_error(), Some(&error));
    assert_eq!(
        peer.take_performatives(),
        vec![Performative::Close(Close::new(None))]
    );
    assert!(peer.is_closed());
    assert!(recorder
        .new_states()
        .ends_with(&[ConnectionState::CloseReceived, ConnectionState::End]));
}

#[test]
fn idle_timeout_closes_the_connection() {
    let recorder = Arc::new(Recorder::default());
    let options = ConnectionOptions::default().idle_timeout(1000);
    let (mut connection, peer) = client(options, &recorder);
    connection.apply_options().unwrap();
    let now = Instant::now();
    open_client(&mut connection, &peer, Open::new("broker"), now);

    connection.poll_at(now + Duration::from_millis(900));
    assert_eq!(connection.state(), ConnectionState::Opened);

    connection.poll_at(now + Duration::from_millis(1100));
    assert_eq!(connection.state(), ConnectionState::Discarding);
    let error = close_error(&peer.take_performatives());
    assert_eq!(error.condition, AmqpError::ResourceLimitExceeded.into());
}

#[test]
fn inbound_frames_keep_the_connection_alive() {
    let recorder = Arc::new(Recorder::default());
    let options = ConnectionOptions::default().idle_timeout(1000);
    let (mut connection, peer) = client(options, &recorder);
    connection.apply_options().unwrap();
    let now = Instant::now();
    open_client(&mut connection, &peer, Open::new("broker"), now);

    peer.push_frame(Frame::empty());
    connection.poll_at(now + Duration::from_millis(900));
    connection.poll_at(now + Duration::from_millis(1500));
    assert_eq!(connection.state(), ConnectionState::Opened);
}

#[test]
fn empty_frames_are_sent_before_the_remote_idle_timeout() {
    let recorder = Arc::new(Recorder::default());
    let (mut connection, peer) = client(ConnectionOptions::default(), &recorder);
    let now = Instant::now();
    let mut remote = Open::new("broker");
    remote.idle_time_out = Some(1000);
    open_client(&mut connection, &peer, remote, now);

    connection.poll_at(now + Duration::from_millis(400));
    assert!(peer.take_sent().is_empty());

    connection.poll_at(now + Duration::from_millis(600));
    let frames = peer.take_frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].body, FrameBody::Empty);

    connection.poll_at(now + Duration::from_millis(700));
    assert!(peer.take_sent().is_empty());
}

#[test]
fn settings_are_fixed_once_opened() {
    let recorder = Arc::new(Recorder::default());
    let (mut connection, _peer) = client(ConnectionOptions::default(), &recorder);

    assert!(connection
        .set_max_frame_size(511)
        .unwrap_err()
        .is_runtime_failure());
    connection.set_max_frame_size(512).unwrap();
    assert!(connection
        .set_remote_idle_timeout_empty_frame_send_ratio(0.0)
        .is_err());
    connection
        .set_remote_idle_timeout_empty_frame_send_ratio(0.25)
        .unwrap();
    assert_eq!(connection.remote_idle_timeout_empty_frame_send_ratio(), 0.25);

    let mut properties = Value::map();
    properties
        .set_map_value(Symbol::from("product"), "amqp-core")
        .unwrap();
    connection.set_properties(&properties).unwrap();
    assert_eq!(connection.properties(), Some(properties.clone()));
    assert!(connection.set_properties(&Value::from(1u32)).is_err());

    connection.open().unwrap();
    connection.poll_at(Instant::now());
    assert!(connection
        .set_max_frame_size(1024)
        .unwrap_err()
        .is_runtime_failure());
    assert!(connection
        .set_max_channel(1)
        .unwrap_err()
        .is_runtime_failure());
    assert!(connection
        .set_idle_timeout(100)
        .unwrap_err()
        .is_runtime_failure());
    assert!(connection
        .set_properties(&properties)
        .unwrap_err()
        .is_runtime_failure());
    assert!(connection.apply_options().unwrap_err().is_runtime_failure());
    assert!(connection.open().unwrap_err().is_runtime_failure());

    connection.set_trace(true);
    assert!(connection.is_trace_enabled());
}

#[test]
fn peer_endpoint_is_offered_to_the_handler() {
    let recorder = Arc::new(Recorder::accepting());
    let (mut connection, peer) = client(ConnectionOptions::default(), &recorder);
    let now = Instant::now();
    open_client(&mut connection, &peer, Open::new("broker"), now);

    peer.push_performative(3, begin(None));
    connection.poll_at(now);
    assert_eq!(connection.state(), ConnectionState::Opened);

    let endpoint = recorder.endpoints.lock()[0];
    assert_eq!(connection.endpoint_incoming_channel(&endpoint), Some(3));
    let frame = connection.next_endpoint_frame(&endpoint).unwrap();
    assert!(matches!(
        Performative::try_from(frame.performative).unwrap(),
        Performative::Begin(Begin {
            remote_channel: None,
            ..
        })
    ));

    let reply = Value::from(&match begin(Some(3)) {
        Performative::Begin(begin) => begin,
        _ => unreachable!(),
    });
    connection
        .send_endpoint_frame(&endpoint, reply, Bytes::new())
        .unwrap();
    connection.poll_at(now);
    let frames = peer.take_frames();
    assert_eq!(frames[0].channel, endpoint.outgoing_channel());
    assert!(matches!(
        frames[0].performative(),
        Some(Performative::Begin(_))
    ));

    peer.push_performative(3, Performative::End(End { error: None }));
    connection.poll_at(now);
    assert!(connection.next_endpoint_frame(&endpoint).is_some());
    assert_eq!(connection.endpoint_incoming_channel(&endpoint), None);

    connection.destroy_endpoint(&endpoint).unwrap();
    assert!(connection
        .destroy_endpoint(&endpoint)
        .unwrap_err()
        .is_logic_error());
}

#[test]
fn rejected_endpoint_closes_the_connection() {
    let recorder = Arc::new(Recorder::default());
    let (mut connection, peer) = client(ConnectionOptions::default(), &recorder);
    let now = Instant::now();
    open_client(&mut connection, &peer, Open::new("broker"), now);

    peer.push_performative(1, begin(None));
    connection.poll_at(now);
    assert_eq!(recorder.endpoints.lock().len(), 1);
    assert_eq!(connection.state(), ConnectionState::Discarding);
    let error = close_error(&peer.take_performatives());
    assert_eq!(error.condition, AmqpError::NotAllowed.into());
    assert_eq!(recorder.new_states().last(), Some(&ConnectionState::Discarding));
}

#[test]
fn local_endpoint_is_bound_by_the_peer_answer() {
    let recorder = Arc::new(Recorder::default());
    let (mut connection, peer) = client(ConnectionOptions::default(), &recorder);
    let now = Instant::now();
    open_client(&mut connection, &peer, Open::new("broker"), now);

    let endpoint = connection.create_endpoint().unwrap();
    let other = connection.create_endpoint().unwrap();
    assert_ne!(endpoint.outgoing_channel(), other.outgoing_channel());

    peer.push_performative(7, begin(Some(other.outgoing_channel())));
    peer.push_frame(Frame::with_payload(
        7,
        Performative::Other(Value::composite_with_code(0x14, 0)),
        Bytes::from_static(b"payload"),
    ));
    connection.poll_at(now);
    assert!(recorder.endpoints.lock().is_empty());
    assert_eq!(connection.endpoint_incoming_channel(&other), Some(7));
    assert!(connection.next_endpoint_frame(&endpoint).is_none());

    connection.next_endpoint_frame(&other).unwrap();
    let transfer = connection.next_endpoint_frame(&other).unwrap();
    assert_eq!(&transfer.payload[..], b"payload");
}

#[test]
fn frame_on_unknown_channel_is_not_found() {
    let recorder = Arc::new(Recorder::default());
    let (mut connection, peer) = client(ConnectionOptions::default(), &recorder);
    let now = Instant::now();
    open_client(&mut connection, &peer, Open::new("broker"), now);

    peer.push_performative(4, Performative::End(End { error: None }));
    connection.poll_at(now);
    assert_eq!(connection.state(), ConnectionState::Discarding);
    let error = close_error(&peer.take_performatives());
    assert_eq!(error.condition, AmqpError::NotFound.into());

    // only the peer's close matters now
    peer.push_performative(4, Performative::End(End { error: None }));
    peer.push_performative(0, Performative::Close(Close::new(None)));
    connection.poll_at(now);
    assert_eq!(connection.state(), ConnectionState::End);
}

#[test]
fn endpoint_frames_cannot_carry_connection_performatives() {
    let recorder = Arc::new(Recorder::default());
    let (mut connection, peer) = client(ConnectionOptions::default(), &recorder);
    let now = Instant::now();
    open_client(&mut connection, &peer, Open::new("broker"), now);

    let endpoint = connection.create_endpoint().unwrap();
    let close = Value::from(&Close::new(None));
    assert!(connection
        .send_endpoint_frame(&endpoint, close, Bytes::new())
        .unwrap_err()
        .is_logic_error());
}

#[test]
fn io_error_is_reported() {
    let recorder = Arc::new(Recorder::default());
    let (mut connection, peer) = client(ConnectionOptions::default(), &recorder);
    let now = Instant::now();
    open_client(&mut connection, &peer, Open::new("broker"), now);

    peer.fail_io();
    connection.poll_at(now);
    assert_eq!(connection.state(), ConnectionState::Error);
    assert_eq!(*recorder.io_errors.lock(), 1);
    assert!(peer.is_closed());
}

#[test]
fn failed_transport_open_is_an_io_error() {
    let recorder = Arc::new(Recorder::default());
    let (mut connection, peer) = client(ConnectionOptions::default(), &recorder);
    peer.set_open_result(IoResult::Error);

    connection.open().unwrap();
    connection.poll_at(Instant::now());
    assert_eq!(connection.state(), ConnectionState::Error);
    assert_eq!(*recorder.io_errors.lock(), 1);
}

#[test]
fn wrong_protocol_header_is_an_io_error() {
    let recorder = Arc::new(Recorder::default());
    let (mut connection, peer) = client(ConnectionOptions::default(), &recorder);
    connection.open().unwrap();
    connection.poll_at(Instant::now());

    peer.push_bytes(b"AMQP\x03\x01\x00\x00".to_vec());
    connection.poll_at(Instant::now());
    assert_eq!(connection.state(), ConnectionState::Error);
    assert_eq!(*recorder.io_errors.lock(), 1);
}

#[test]
fn cleared_handler_receives_no_events() {
    let recorder = Arc::new(Recorder::default());
    let (mut connection, peer) = client(ConnectionOptions::default(), &recorder);
    connection.clear_event_handler();
    open_client(&mut connection, &peer, Open::new("broker"), Instant::now());
    assert!(recorder.states.lock().is_empty());
}

#[test]
fn dropped_handler_receives_no_events() {
    let recorder = Arc::new(Recorder::default());
    let (mut connection, peer) = client(ConnectionOptions::default(), &recorder);
    let probe = Arc::downgrade(&recorder);
    drop(recorder);
    open_client(&mut connection, &peer, Open::new("broker"), Instant::now());
    assert!(probe.upgrade().is_none());
}

#[test]
fn drop_closes_the_transport() {
    let recorder = Arc::new(Recorder::default());
    let (mut connection, peer) = client(ConnectionOptions::default(), &recorder);
    connection.open().unwrap();
    connection.poll_at(Instant::now());
    assert!(!peer.is_closed());
    drop(connection);
    assert!(peer.is_closed());
}

#[test]
fn options_from_json() {
    let options: ConnectionOptions = serde_json::from_str(
        r#"{
            "container_id": "from-config",
            "idle_timeout": 5000,
            "max_frame_size": 4096,
            "pipeline_open": true
        }"#,
    )
    .unwrap();
    assert_eq!(options.container_id.as_deref(), Some("from-config"));
    assert_eq!(options.idle_timeout, Some(5000));
    assert_eq!(options.max_frame_size, 4096);
    assert_eq!(options.max_channel, 65535);
    assert!(options.pipeline_open);
    assert!(!options.enable_trace);

    let options: ConnectionOptions = serde_json::from_str(
        r#"{ "sasl_credentials": { "username": "guest", "password": "secret" } }"#,
    )
    .unwrap();
    assert!(Connection::from_uri("amqp://localhost", options, None)
        .unwrap_err()
        .is_configuration_error());
}
