//! Integration tests — full connection lifecycle, frame round-trips,
//! and error scenarios against a scripted transport, plus a real TCP
//! handshake on localhost.

use std::time::Duration;

use alup_core::protocol::{
    COMMAND_CLEAR, COMMAND_DISCONNECT, CONFIGURATION_ACK, CONFIGURATION_ERROR,
    CONFIGURATION_START, CONNECTION_ACK, CONNECTION_REQUEST, FRAME_ACK, FRAME_ERROR,
    PROTOCOL_VERSION,
};
use alup_core::{
    AlupError, ConfigError, ConnectionState, Device, Led, MockTransport, Phase, ProtocolTimings,
    TcpTransport,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

// ── Helpers ──────────────────────────────────────────────────────

/// Short deadlines so timeout scenarios finish quickly.
fn test_timings() -> ProtocolTimings {
    ProtocolTimings {
        response_timeout: Duration::from_millis(200),
        poll_interval: Duration::from_millis(1),
    }
}

/// Queue a complete, valid peer-side handshake on the mock.
fn preload_handshake(mock: &MockTransport, num_of_leds: i32) {
    mock.push_rx(&[CONNECTION_REQUEST, CONFIGURATION_START]);
    mock.push_rx_string(PROTOCOL_VERSION);
    mock.push_rx_string("test-strip");
    mock.push_rx_int(num_of_leds);
    mock.push_rx_int(6);
    mock.push_rx_int(7);
    mock.push_rx_string("extra");
    mock.push_rx(&[CONFIGURATION_ACK]);
}

/// A device that has completed the handshake against `num_of_leds`
/// LEDs, with the handshake traffic cleared from the capture.
async fn connected_device(num_of_leds: i32) -> (Device<MockTransport>, MockTransport) {
    let mock = MockTransport::new();
    preload_handshake(&mock, num_of_leds);

    let mut device = Device::new(mock.clone()).with_timings(test_timings());
    device.connect().await.expect("scripted handshake failed");
    mock.clear_written();
    (device, mock)
}

// ── Connection lifecycle ─────────────────────────────────────────

#[tokio::test]
async fn handshake_transitions_to_connected() {
    let mock = MockTransport::new();
    preload_handshake(&mock, 60);

    let mut device = Device::new(mock.clone()).with_timings(test_timings());
    assert_eq!(device.state(), ConnectionState::Disconnected);

    device.connect().await.unwrap();

    assert_eq!(device.state(), ConnectionState::Connected);
    assert!(device.is_connected());

    let configuration = device.configuration().unwrap();
    assert_eq!(configuration.protocol_version(), PROTOCOL_VERSION);
    assert_eq!(configuration.device_name(), "test-strip");
    assert_eq!(configuration.num_of_leds(), 60);
    assert_eq!(configuration.data_pin(), 6);
    assert_eq!(configuration.clock_pin(), 7);
    assert_eq!(configuration.extra_values(), "extra");

    // the engine acknowledged the connection and the configuration
    assert_eq!(mock.written(), vec![CONNECTION_ACK, CONFIGURATION_ACK]);
}

#[tokio::test]
async fn connection_request_timeout_stays_disconnected() {
    let mock = MockTransport::new();

    let mut device = Device::new(mock.clone()).with_timings(test_timings());
    let err = device.connect().await.unwrap_err();

    assert!(matches!(
        err,
        AlupError::Timeout {
            phase: Phase::ConnectionRequest,
            ..
        }
    ));
    assert_eq!(device.state(), ConnectionState::Disconnected);
    assert!(device.configuration().is_none());
}

#[tokio::test]
async fn transport_open_failure_propagates() {
    let mock = MockTransport::new();
    mock.fail_next_open();

    let mut device = Device::new(mock.clone()).with_timings(test_timings());
    let err = device.connect().await.unwrap_err();

    assert!(matches!(err, AlupError::Transport(_)));
    assert_eq!(device.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn version_mismatch_signals_configuration_error() {
    let mock = MockTransport::new();
    mock.push_rx(&[CONNECTION_REQUEST, CONFIGURATION_START]);
    mock.push_rx_string("9.9");

    let mut device = Device::new(mock.clone()).with_timings(test_timings());
    let err = device.connect().await.unwrap_err();

    match err {
        AlupError::IncompatibleVersion { device, host } => {
            assert_eq!(device, "9.9");
            assert_eq!(host, PROTOCOL_VERSION);
        }
        other => panic!("expected IncompatibleVersion, got {other:?}"),
    }
    assert_eq!(device.state(), ConnectionState::Disconnected);
    assert_eq!(mock.written(), vec![CONNECTION_ACK, CONFIGURATION_ERROR]);
    // the transport is left open for the caller to decide
    assert!(mock.is_open());
}

#[tokio::test]
async fn invalid_configuration_signals_configuration_error() {
    let mock = MockTransport::new();
    mock.push_rx(&[CONNECTION_REQUEST, CONFIGURATION_START]);
    mock.push_rx_string(PROTOCOL_VERSION);
    mock.push_rx_string("test-strip");
    mock.push_rx_int(0); // num_of_leds must be > 0
    mock.push_rx_int(6);
    mock.push_rx_int(7);
    mock.push_rx_string("");

    let mut device = Device::new(mock.clone()).with_timings(test_timings());
    let err = device.connect().await.unwrap_err();

    assert!(matches!(
        err,
        AlupError::InvalidConfiguration(ConfigError::LedCount(0))
    ));
    assert_eq!(device.state(), ConnectionState::Disconnected);
    assert_eq!(mock.written(), vec![CONNECTION_ACK, CONFIGURATION_ERROR]);
}

#[tokio::test]
async fn missing_peer_configuration_ack_invalidates_connection() {
    let mock = MockTransport::new();
    mock.push_rx(&[CONNECTION_REQUEST, CONFIGURATION_START]);
    mock.push_rx_string(PROTOCOL_VERSION);
    mock.push_rx_string("test-strip");
    mock.push_rx_int(60);
    mock.push_rx_int(6);
    mock.push_rx_int(7);
    mock.push_rx_string("");
    // no CONFIGURATION_ACK from the peer

    let mut device = Device::new(mock.clone()).with_timings(test_timings());
    let err = device.connect().await.unwrap_err();

    assert!(matches!(
        err,
        AlupError::Timeout {
            phase: Phase::ConfigurationAck,
            ..
        }
    ));
    assert_eq!(device.state(), ConnectionState::Disconnected);
    assert!(!mock.is_open());
}

// ── Send ─────────────────────────────────────────────────────────

#[tokio::test]
async fn send_while_disconnected_leaves_transport_untouched() {
    let mock = MockTransport::new();
    let mut device = Device::new(mock.clone()).with_timings(test_timings());
    device.set_leds(vec![Led::new(255, 0, 0)]);

    let err = device.send().await.unwrap_err();

    assert!(matches!(err, AlupError::NotConnected));
    assert!(mock.written().is_empty());
    assert!(!mock.is_open());
}

#[tokio::test]
async fn send_without_pending_frame_is_a_silent_skip() {
    let (mut device, mock) = connected_device(10).await;

    device.send().await.unwrap();

    assert!(mock.written().is_empty());
    assert!(device.is_connected());
}

#[tokio::test]
async fn send_transmits_header_and_payload() {
    let (mut device, mock) = connected_device(10).await;
    mock.push_rx(&[FRAME_ACK]);

    device
        .send_leds(vec![Led::new(1, 2, 3), Led::new(4, 5, 6)])
        .await
        .unwrap();

    assert_eq!(
        mock.written(),
        vec![0, 0, 0, 6, 0, 0, 0, 0, COMMAND_CLEAR, 1, 2, 3, 4, 5, 6]
    );
}

#[tokio::test]
async fn oversized_payload_truncates_to_strip_length() {
    let (mut device, mock) = connected_device(5).await;
    mock.push_rx(&[FRAME_ACK]);

    let leds: Vec<Led> = (0..8).map(|i| Led::new(i, i, i)).collect();
    device.send_leds(leds).await.unwrap();

    let written = mock.written();
    // body size = 5 LEDs * 3 bytes, not 8 * 3
    assert_eq!(&written[0..4], &[0, 0, 0, 15]);
    assert_eq!(written.len(), 9 + 15);
    // no rejection was raised and the payload kept its front
    assert_eq!(device.leds().len(), 5);
    assert_eq!(device.leds()[0], Led::new(0, 0, 0));
    assert_eq!(device.leds()[4], Led::new(4, 4, 4));
}

#[tokio::test]
async fn negative_offset_clamps_payload_then_offset() {
    let (mut device, mock) = connected_device(10).await;
    mock.push_rx(&[FRAME_ACK]);

    let leds: Vec<Led> = (0..3).map(|i| Led::new(i, i, i)).collect();
    device.send_leds_at(leds, -2).await.unwrap();

    let written = mock.written();
    // payload clamped with the pre-clamp offset: fit(10, 3, -2) = 1
    assert_eq!(&written[0..4], &[0, 0, 0, 3]);
    // then the offset clamped to 0
    assert_eq!(&written[4..8], &[0, 0, 0, 0]);
    assert_eq!(device.leds(), &[Led::new(0, 0, 0)]);
    assert_eq!(device.offset(), 0);
}

#[tokio::test]
async fn frame_response_timeout_invalidates_connection() {
    let (mut device, mock) = connected_device(10).await;
    // no FRAME_ACK / FRAME_ERROR queued

    let err = device.send_leds(vec![Led::WHITE]).await.unwrap_err();

    assert!(matches!(
        err,
        AlupError::Timeout {
            phase: Phase::FrameResponse,
            ..
        }
    ));
    assert_eq!(device.state(), ConnectionState::Disconnected);
    assert!(device.configuration().is_none());
    assert!(!mock.is_open());
}

#[tokio::test]
async fn frame_error_is_non_fatal() {
    let (mut device, mock) = connected_device(10).await;
    mock.push_rx(&[FRAME_ERROR]);

    let err = device.send_leds(vec![Led::WHITE]).await.unwrap_err();

    assert!(matches!(err, AlupError::FrameRejected));
    // the peer refused one frame; the connection survives
    assert!(device.is_connected());
    assert!(mock.is_open());

    mock.push_rx(&[FRAME_ACK]);
    device.send().await.unwrap();
}

#[tokio::test]
async fn acknowledged_send_records_round_trip() {
    let (mut device, mock) = connected_device(10).await;
    assert_eq!(device.ping(), Duration::ZERO);

    mock.push_rx(&[FRAME_ACK]);
    device.send_leds(vec![Led::WHITE]).await.unwrap();

    assert!(device.ping() > Duration::ZERO);
    assert_eq!(device.ping_ms(), device.ping().as_millis() as u64);
}

// ── Clear / disconnect ───────────────────────────────────────────

#[tokio::test]
async fn clear_sends_empty_clear_frame() {
    let (mut device, mock) = connected_device(10).await;
    mock.push_rx(&[FRAME_ACK]);

    device.clear().await.unwrap();

    assert_eq!(
        mock.written(),
        vec![0, 0, 0, 0, 0, 0, 0, 0, COMMAND_CLEAR]
    );
}

#[tokio::test]
async fn disconnect_notifies_and_closes() {
    let (mut device, mock) = connected_device(10).await;

    device.disconnect().await;

    assert_eq!(
        mock.written(),
        vec![0, 0, 0, 0, 0, 0, 0, 0, COMMAND_DISCONNECT]
    );
    assert_eq!(device.state(), ConnectionState::Disconnected);
    assert!(device.configuration().is_none());
    assert!(!mock.is_open());
}

#[tokio::test]
async fn disconnect_from_disconnected_is_best_effort() {
    let mock = MockTransport::new();
    let mut device = Device::new(mock.clone()).with_timings(test_timings());

    // write fails on the closed transport and is ignored
    device.disconnect().await;

    assert_eq!(device.state(), ConnectionState::Disconnected);
    assert!(mock.written().is_empty());
}

// ── TCP loopback ─────────────────────────────────────────────────

/// A scripted ALUP device on a localhost socket: performs the
/// handshake, acknowledges one frame, and returns the frame bytes it
/// received.
async fn run_scripted_peer(listener: TcpListener, num_of_leds: i32) -> Vec<u8> {
    let (mut socket, _) = listener.accept().await.unwrap();

    socket.write_all(&[CONNECTION_REQUEST]).await.unwrap();
    let mut byte = [0u8; 1];
    socket.read_exact(&mut byte).await.unwrap();
    assert_eq!(byte[0], CONNECTION_ACK);

    let mut config = Vec::new();
    config.push(CONFIGURATION_START);
    config.extend_from_slice(PROTOCOL_VERSION.as_bytes());
    config.push(0);
    config.extend_from_slice(b"loopback-strip\0");
    config.extend_from_slice(&num_of_leds.to_be_bytes());
    config.extend_from_slice(&6i32.to_be_bytes());
    config.extend_from_slice(&0i32.to_be_bytes());
    config.push(0); // empty extra values
    socket.write_all(&config).await.unwrap();

    socket.read_exact(&mut byte).await.unwrap();
    assert_eq!(byte[0], CONFIGURATION_ACK);
    socket.write_all(&[CONFIGURATION_ACK]).await.unwrap();

    // one frame: 9-byte header, then body_size payload bytes
    let mut header = [0u8; 9];
    socket.read_exact(&mut header).await.unwrap();
    let body_size = u32::from_be_bytes(header[0..4].try_into().unwrap()) as usize;
    let mut body = vec![0u8; body_size];
    socket.read_exact(&mut body).await.unwrap();
    socket.write_all(&[FRAME_ACK]).await.unwrap();

    let mut frame = header.to_vec();
    frame.extend_from_slice(&body);
    frame
}

#[tokio::test]
async fn tcp_handshake_and_frame_roundtrip() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let peer = tokio::spawn(run_scripted_peer(listener, 3));

    let transport = TcpTransport::new(addr.to_string());
    let mut device = Device::new(transport).with_timings(ProtocolTimings {
        response_timeout: Duration::from_secs(5),
        poll_interval: Duration::from_millis(1),
    });

    device.connect().await.unwrap();
    let configuration = device.configuration().unwrap();
    assert_eq!(configuration.device_name(), "loopback-strip");
    assert_eq!(configuration.num_of_leds(), 3);

    device
        .send_leds(vec![Led::new(255, 0, 0), Led::new(0, 255, 0)])
        .await
        .unwrap();
    assert!(device.ping() > Duration::ZERO);

    let frame = peer.await.unwrap();
    assert_eq!(
        frame,
        vec![0, 0, 0, 6, 0, 0, 0, 0, COMMAND_CLEAR, 255, 0, 0, 0, 255, 0]
    );

    device.disconnect().await;
    assert_eq!(device.state(), ConnectionState::Disconnected);
}
