//! Domain-specific error types for the ALUP master engine.
//!
//! Expected protocol outcomes (timeouts, rejected frames, version
//! mismatches) live in [`AlupError`] so callers can pattern-match them
//! without catching broad error types. Programmer misuse (out-of-range
//! constructor arguments) is a separate [`RangeError`], and received
//! configuration validation failures are a [`ConfigError`].

use std::time::Duration;
use thiserror::Error;

// ── Phase ────────────────────────────────────────────────────────

/// The protocol phase a timeout occurred in.
///
/// Carried inside [`AlupError::Timeout`] so a desynchronized device is
/// diagnosable from the error alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the device's `CONNECTION_REQUEST` byte.
    ConnectionRequest,
    /// Waiting for the `CONFIGURATION_START` byte.
    ConfigurationStart,
    /// Waiting for the device's `CONFIGURATION_ACK` byte.
    ConfigurationAck,
    /// Waiting for a `FRAME_ACK` / `FRAME_ERROR` response.
    FrameResponse,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionRequest => write!(f, "connection request"),
            Self::ConfigurationStart => write!(f, "configuration start"),
            Self::ConfigurationAck => write!(f, "configuration acknowledgement"),
            Self::FrameResponse => write!(f, "frame response"),
        }
    }
}

// ── AlupError ────────────────────────────────────────────────────

/// The canonical error type for protocol operations.
#[derive(Debug, Error)]
pub enum AlupError {
    /// The expected byte did not arrive within the deadline.
    #[error("timed out waiting for {phase} after {timeout:?}")]
    Timeout { phase: Phase, timeout: Duration },

    /// The device's protocol version string does not match ours.
    #[error("protocol version mismatch: device reports '{device}', host implements '{host}'")]
    IncompatibleVersion { device: String, host: &'static str },

    /// The received configuration failed validation.
    #[error("invalid configuration received: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    /// A send was attempted without an established connection.
    #[error("device is not connected")]
    NotConnected,

    /// The device answered a frame with `FRAME_ERROR`. Non-fatal; the
    /// connection stays up.
    #[error("frame rejected by device")]
    FrameRejected,

    /// The byte-stream transport reported an I/O error.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// A received configuration string was not valid UTF-8.
    #[error("invalid utf-8 in configuration string: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// An integer field could not be decoded from the wire.
    #[error("integer decode requires 4 bytes, got {0}")]
    TruncatedInt(usize),
}

// ── ConfigError ──────────────────────────────────────────────────

/// Validation failure for a received device configuration.
///
/// Always triggers a `CONFIGURATION_ERROR` wire signal before being
/// propagated to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("protocol version string is empty")]
    EmptyVersion,

    #[error("num_of_leds must be > 0, got {0}")]
    LedCount(i32),

    #[error("data_pin must be >= 0, got {0}")]
    DataPin(i32),

    #[error("clock_pin must be >= 0, got {0}")]
    ClockPin(i32),
}

// ── RangeError ───────────────────────────────────────────────────

/// An argument outside its documented range.
///
/// Raised by constructors and setters, never by protocol I/O; getting
/// one of these means the calling code is wrong, not the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RangeError {
    /// A color channel value outside 0-255.
    #[error("{channel} channel value {value} is not within 0-255")]
    Channel { channel: &'static str, value: i32 },

    /// A frame body size that is not a whole number of LEDs.
    #[error("body size {0} is not a multiple of 3")]
    BodySize(u32),

    /// A protocol command id outside 0-7.
    #[error("protocol command id {0} is not within 0-7")]
    ProtocolCommand(u8),

    /// A subcommand id outside 0-247.
    #[error("subcommand id {0} is not within 0-247")]
    Subcommand(u8),
}
