//! The master-side protocol engine.
//!
//! Owns one [`ByteTransport`] for the lifetime of a connection and
//! drives the ALUP handshake, configuration exchange and frame
//! send/acknowledge cycle against it.
//!
//! ```text
//!  Disconnected ──► Connecting ──► Connected
//!       ▲               │              │
//!       └───────────────┴──────────────┘
//! ```
//!
//! Every wait is an active poll loop: check the transport's receive
//! count, consume and compare one byte at a time, sleep one tick,
//! until a monotonic deadline elapses. Deadline and tick come from
//! [`ProtocolTimings`] so tests can run with short deadlines.
//!
//! Single caller model: all protocol operations take `&mut self` and
//! are meant to be invoked sequentially by one caller per engine
//! instance. Cancellation is timeout-only; closing the transport out
//! of band surfaces as a transport error inside the active poll.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::color::Led;
use crate::config::DeviceConfiguration;
use crate::error::{AlupError, Phase, RangeError};
use crate::frame::Frame;
use crate::protocol::{
    COMMAND_CLEAR, COMMAND_DISCONNECT, CONFIGURATION_ACK, CONFIGURATION_ERROR,
    CONFIGURATION_START, CONNECTION_ACK, CONNECTION_REQUEST, FRAME_ACK, FRAME_ERROR,
    PROTOCOL_VERSION,
};
use crate::convert;
use crate::transport::{ByteTransport, SerialTransport, TcpTransport};

// ── ConnectionState ──────────────────────────────────────────────

/// The connection lifecycle state of a device.
///
/// Mutated only by the engine; externally read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No active connection. Initial / terminal state.
    #[default]
    Disconnected,
    /// Transport opened; performing the protocol handshake.
    Connecting,
    /// Handshake complete; ready for frames.
    Connected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
        }
    }
}

// ── ProtocolTimings ──────────────────────────────────────────────

/// Deadline and poll tick for every protocol wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolTimings {
    /// How long to wait for an expected byte before giving up.
    pub response_timeout: Duration,
    /// Sleep between availability polls.
    pub poll_interval: Duration,
}

impl Default for ProtocolTimings {
    /// 10 000 ms deadline, 1 ms tick.
    fn default() -> Self {
        Self {
            response_timeout: Duration::from_millis(10_000),
            poll_interval: Duration::from_millis(1),
        }
    }
}

// ── Payload clamping ─────────────────────────────────────────────

/// Fit `len` LEDs at `offset` into `0..max_len`.
///
/// Returns the number of elements to keep: `<= len` and `>= 0`,
/// depending on which end of the range the payload exceeds.
pub(crate) fn fit_len(max_len: i32, len: i32, offset: i32) -> i32 {
    let (max_len, len, offset) = (max_len as i64, len as i64, offset as i64);
    let fitted = if len + offset > max_len {
        (max_len - offset).max(0)
    } else if offset < 0 {
        (len + offset).max(0)
    } else {
        len
    };
    fitted.min(i32::MAX as i64) as i32
}

/// Trim a payload whose negative offset pushes it past the strip
/// start. Keeps the first `fit_len` elements — the tail is discarded,
/// not the out-of-range head; devices depend on this exact behavior.
fn trim_start(leds: &mut Vec<Led>, offset: i32, max_leds: i32) {
    if offset >= 0 {
        return;
    }
    let keep = fit_len(max_leds, leds.len() as i32, offset).max(0) as usize;
    leds.truncate(keep);
}

/// Trim a payload that runs past the strip end. Keeps the first
/// `fit_len` elements.
fn trim_end(leds: &mut Vec<Led>, offset: i32, max_leds: i32) {
    if offset as i64 + leds.len() as i64 <= max_leds as i64 {
        return;
    }
    let keep = fit_len(max_leds, leds.len() as i32, offset).max(0) as usize;
    leds.truncate(keep);
}

/// Clamp a payload into the strip using the pre-clamp offset.
pub(crate) fn clamp_leds(leds: &mut Vec<Led>, offset: i32, max_leds: i32) {
    trim_start(leds, offset, max_leds);
    trim_end(leds, offset, max_leds);
}

/// Clamp an offset into `0..=max_leds`.
pub(crate) fn clamp_offset(offset: i32, max_leds: i32) -> i32 {
    offset.max(0).min(max_leds)
}

// ── Device ───────────────────────────────────────────────────────

/// A device driven over a serial line.
pub type SerialDevice = Device<SerialTransport>;
/// A device driven over a TCP socket.
pub type TcpDevice = Device<TcpTransport>;

/// The protocol engine for one connected device.
///
/// Holds at most one pending [`Frame`], which is serialized (not
/// consumed) on each [`send`](Device::send); callers mutate the
/// pending payload, offset and command freely between sends.
pub struct Device<T: ByteTransport> {
    transport: T,
    configuration: Option<DeviceConfiguration>,
    frame: Option<Frame>,
    state: ConnectionState,
    timings: ProtocolTimings,
    /// Round trip of the last acknowledged frame; zero before the
    /// first send.
    ping: Duration,
}

impl<T: ByteTransport> Device<T> {
    /// Create an engine over `transport`. The transport does not have
    /// to be open.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            configuration: None,
            frame: None,
            state: ConnectionState::Disconnected,
            timings: ProtocolTimings::default(),
            ping: Duration::ZERO,
        }
    }

    /// Override the default wait deadline and poll tick.
    pub fn with_timings(mut self, timings: ProtocolTimings) -> Self {
        self.timings = timings;
        self
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// `true` once the handshake has completed.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// The negotiated configuration, or `None` until a connection was
    /// established.
    pub fn configuration(&self) -> Option<&DeviceConfiguration> {
        self.configuration.as_ref()
    }

    /// Round-trip time of the last acknowledged frame.
    pub fn ping(&self) -> Duration {
        self.ping
    }

    /// Round-trip time of the last acknowledged frame in milliseconds.
    pub fn ping_ms(&self) -> u64 {
        self.ping.as_millis() as u64
    }

    /// The pending frame's LED payload; empty if no frame is pending.
    pub fn leds(&self) -> &[Led] {
        self.frame.as_ref().map(Frame::leds).unwrap_or(&[])
    }

    /// The pending frame's offset; 0 if no frame is pending.
    pub fn offset(&self) -> i32 {
        self.frame.as_ref().map(Frame::offset).unwrap_or(0)
    }

    // ── Pending frame mutation ───────────────────────────────────

    /// Set the LED payload of the pending frame, creating the frame if
    /// there is none. Oversized payloads are cut down at send time.
    pub fn set_leds(&mut self, leds: Vec<Led>) {
        self.frame_mut().set_leds(leds);
    }

    /// Like [`set_leds`](Device::set_leds) for sequences with absent
    /// elements; every `None` becomes black.
    pub fn set_leds_opt(&mut self, leds: &[Option<Led>]) {
        self.frame_mut().set_leds_opt(leds);
    }

    /// Set the pending frame's offset. Negative and over-length values
    /// are accepted and made safe at send time.
    pub fn set_offset(&mut self, offset: i32) {
        self.frame_mut().set_offset(offset);
    }

    /// Select the device subprogram to execute on the next send.
    pub fn set_subcommand(&mut self, id: u8) -> Result<(), RangeError> {
        self.frame_mut().set_subcommand(id)
    }

    /// Select a reserved protocol command for the next send.
    pub fn set_protocol_command(&mut self, id: u8) -> Result<(), RangeError> {
        self.frame_mut().set_protocol_command(id)
    }

    fn frame_mut(&mut self) -> &mut Frame {
        self.frame.get_or_insert_with(Frame::new)
    }

    // ── Connect ──────────────────────────────────────────────────

    /// Open the transport and perform the connection handshake.
    ///
    /// Blocks (polling) until the device sends `CONNECTION_REQUEST`,
    /// acknowledges it, and exchanges the configuration. On success
    /// the engine is `Connected` and [`configuration`](Device::configuration)
    /// is available.
    ///
    /// On failure the engine stays `Disconnected`. The transport is
    /// left open for the caller to inspect or close — except on a
    /// configuration-acknowledgement timeout, which invalidates the
    /// connection and closes the transport.
    pub async fn connect(&mut self) -> Result<(), AlupError> {
        self.transport.open().await?;
        self.state = ConnectionState::Connecting;

        match self.handshake().await {
            Ok(configuration) => {
                info!(
                    device = %configuration.device_name(),
                    leds = configuration.num_of_leds(),
                    "device connected"
                );
                self.configuration = Some(configuration);
                self.state = ConnectionState::Connected;
                Ok(())
            }
            Err(err) => {
                self.state = ConnectionState::Disconnected;
                Err(err)
            }
        }
    }

    async fn handshake(&mut self) -> Result<DeviceConfiguration, AlupError> {
        if !self.wait_for_byte(CONNECTION_REQUEST).await? {
            return Err(self.timeout(Phase::ConnectionRequest));
        }
        self.transport.write(&[CONNECTION_ACK]).await?;
        self.receive_configuration().await
    }

    /// Receive and validate the configuration payload, acknowledging
    /// both ways.
    async fn receive_configuration(&mut self) -> Result<DeviceConfiguration, AlupError> {
        if !self.wait_for_byte(CONFIGURATION_START).await? {
            return Err(self.timeout(Phase::ConfigurationStart));
        }

        let protocol_version = self.read_string().await?;
        if protocol_version != PROTOCOL_VERSION {
            self.transport.write(&[CONFIGURATION_ERROR]).await?;
            return Err(AlupError::IncompatibleVersion {
                device: protocol_version,
                host: PROTOCOL_VERSION,
            });
        }

        let device_name = self.read_string().await?;
        let num_of_leds = self.read_int().await?;
        let data_pin = self.read_int().await?;
        let clock_pin = self.read_int().await?;
        let extra_values = self.read_string().await?;

        let configuration = match DeviceConfiguration::new(
            protocol_version,
            device_name,
            num_of_leds,
            data_pin,
            clock_pin,
            extra_values,
        ) {
            Ok(configuration) => configuration,
            Err(err) => {
                self.transport.write(&[CONFIGURATION_ERROR]).await?;
                return Err(err.into());
            }
        };

        self.transport.write(&[CONFIGURATION_ACK]).await?;

        // the device confirms it applied the configuration; without
        // that confirmation the connection is unusable
        if !self.wait_for_byte(CONFIGURATION_ACK).await? {
            self.invalidate_connection().await;
            return Err(self.timeout(Phase::ConfigurationAck));
        }

        Ok(configuration)
    }

    // ── Send ─────────────────────────────────────────────────────

    /// Transmit the pending frame and wait for the device's response.
    ///
    /// Payload and offset are clamped into the strip first — payload
    /// with the pre-clamp offset, then the offset itself; the clamped
    /// values are written back into the pending frame. If no frame is
    /// pending, returns successfully without sending anything.
    ///
    /// A `FRAME_ERROR` response fails with
    /// [`AlupError::FrameRejected`] but leaves the connection up; a
    /// missing response invalidates the connection.
    pub async fn send(&mut self) -> Result<(), AlupError> {
        if self.state != ConnectionState::Connected {
            return Err(AlupError::NotConnected);
        }
        let Some(configuration) = self.configuration.as_ref() else {
            return Err(AlupError::NotConnected);
        };
        let max_leds = configuration.num_of_leds();

        let Some(frame) = self.frame.as_mut() else {
            return Ok(());
        };

        let offset = frame.offset();
        let mut leds = frame.leds().to_vec();
        clamp_leds(&mut leds, offset, max_leds);
        frame.set_leds(leds);
        frame.set_offset(clamp_offset(offset, max_leds));

        debug!(
            body_size = frame.header().body_size(),
            offset = frame.offset(),
            command = frame.header().command(),
            "sending frame"
        );

        let start = Instant::now();
        let bytes = self.frame.as_ref().map(Frame::to_bytes).unwrap_or_default();
        self.transport.write(&bytes).await?;

        match self.wait_for_one_of(&[FRAME_ACK, FRAME_ERROR]).await? {
            None => {
                warn!("no frame response; invalidating connection");
                self.invalidate_connection().await;
                Err(self.timeout(Phase::FrameResponse))
            }
            Some(0) => {
                self.ping = start.elapsed();
                debug!(ping = ?self.ping, "frame acknowledged");
                Ok(())
            }
            Some(_) => {
                warn!("frame rejected by device");
                Err(AlupError::FrameRejected)
            }
        }
    }

    /// Apply `leds` to the pending frame and send it.
    pub async fn send_leds(&mut self, leds: Vec<Led>) -> Result<(), AlupError> {
        self.set_leds(leds);
        self.send().await
    }

    /// Apply `leds` and `offset` to the pending frame and send it.
    pub async fn send_leds_at(&mut self, leds: Vec<Led>, offset: i32) -> Result<(), AlupError> {
        self.set_leds(leds);
        self.set_offset(offset);
        self.send().await
    }

    /// Request the device blank all LEDs: an empty payload with the
    /// `COMMAND_CLEAR` protocol command.
    pub async fn clear(&mut self) -> Result<(), AlupError> {
        let mut frame = Frame::new();
        let _ = frame.set_protocol_command(COMMAND_CLEAR);
        self.frame = Some(frame);
        self.send().await
    }

    // ── Disconnect ───────────────────────────────────────────────

    /// Notify the device and tear the connection down.
    ///
    /// The `DISCONNECT` frame is best-effort; I/O failures during the
    /// notification are ignored. The transport is closed, the
    /// configuration dropped and the state forced to `Disconnected`
    /// unconditionally.
    pub async fn disconnect(&mut self) {
        let mut frame = Frame::new();
        let _ = frame.set_protocol_command(COMMAND_DISCONNECT);
        if let Err(err) = self.transport.write(&frame.to_bytes()).await {
            debug!(%err, "disconnect notification failed");
        }
        self.invalidate_connection().await;
        info!("device disconnected");
    }

    /// Tear down a connection that timed out or was torn down by the
    /// caller: close the transport, drop the configuration, force
    /// `Disconnected`.
    async fn invalidate_connection(&mut self) {
        self.transport.close().await;
        self.configuration = None;
        self.state = ConnectionState::Disconnected;
    }

    // ── Wire reading primitives ──────────────────────────────────

    /// Poll for one of `candidates` until the response deadline.
    ///
    /// Consumes and compares one byte per poll; non-matching bytes are
    /// discarded. Returns the index of the matched candidate, or
    /// `None` when the deadline elapsed.
    async fn wait_for_one_of(&mut self, candidates: &[u8]) -> Result<Option<usize>, AlupError> {
        let deadline = Instant::now() + self.timings.response_timeout;
        loop {
            if self.transport.bytes_available() > 0 {
                let mut byte = [0u8; 1];
                self.transport.read_exact(&mut byte).await?;
                if let Some(index) = candidates.iter().position(|&c| c == byte[0]) {
                    return Ok(Some(index));
                }
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(self.timings.poll_interval).await;
        }
    }

    /// Poll for a single expected byte; `true` when it arrived before
    /// the deadline.
    async fn wait_for_byte(&mut self, byte: u8) -> Result<bool, AlupError> {
        Ok(self.wait_for_one_of(&[byte]).await?.is_some())
    }

    /// Read a null-terminated UTF-8 string, one byte per poll.
    async fn read_string(&mut self) -> Result<String, AlupError> {
        let mut buf = Vec::new();
        loop {
            if self.transport.bytes_available() == 0 {
                tokio::time::sleep(self.timings.poll_interval).await;
                continue;
            }
            let mut byte = [0u8; 1];
            self.transport.read_exact(&mut byte).await?;
            if byte[0] == 0x00 {
                break;
            }
            buf.push(byte[0]);
        }
        Ok(String::from_utf8(buf)?)
    }

    /// Read a 4-byte big-endian integer once all 4 bytes are readable.
    async fn read_int(&mut self) -> Result<i32, AlupError> {
        loop {
            if self.transport.bytes_available() >= 4 {
                let mut bytes = [0u8; 4];
                self.transport.read_exact(&mut bytes).await?;
                return convert::bytes_to_int(&bytes);
            }
            tokio::time::sleep(self.timings.poll_interval).await;
        }
    }

    fn timeout(&self, phase: Phase) -> AlupError {
        AlupError::Timeout {
            phase,
            timeout: self.timings.response_timeout,
        }
    }
}

impl<T: ByteTransport> std::fmt::Debug for Device<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("state", &self.state)
            .field("configuration", &self.configuration)
            .field("ping", &self.ping)
            .field("pending_frame", &self.frame.is_some())
            .finish()
    }
}

// ── Tests ────────────────────────────────────────────────────────
