//! # alup-core
//!
//! Master-side engine for the ALUP v0.1 protocol: drive addressable
//! LED strips attached to a microcontroller over a byte-stream
//! transport (serial line or TCP socket).
//!
//! This crate contains:
//! - **Protocol engine**: [`Device`] — handshake, configuration
//!   exchange, frame send/acknowledge cycle, payload clamping,
//!   round-trip timing
//! - **Data model**: [`Led`], [`Frame`], [`Header`],
//!   [`DeviceConfiguration`]
//! - **Transports**: the [`ByteTransport`] capability with serial,
//!   TCP and in-memory mock implementations
//! - **Effects**: generative lighting payloads (solid, rainbow, shine,
//!   lightning, blend)
//! - **Error**: [`AlupError`] / [`RangeError`] — typed,
//!   `thiserror`-based error hierarchy

pub mod color;
pub mod config;
pub mod convert;
pub mod device;
pub mod effects;
pub mod error;
pub mod frame;
pub mod header;
pub mod protocol;
pub mod transport;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use color::Led;
pub use config::DeviceConfiguration;
pub use device::{ConnectionState, Device, ProtocolTimings, SerialDevice, TcpDevice};
pub use error::{AlupError, ConfigError, Phase, RangeError};
pub use frame::Frame;
pub use header::{HEADER_SIZE, Header};
pub use transport::{ByteTransport, MockTransport, SerialTransport, TcpTransport};
