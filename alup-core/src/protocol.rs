//! Wire-level constants of the ALUP protocol v0.1.
//!
//! Single-byte signals exchanged during the handshake and the frame
//! acknowledgement cycle, plus the command-byte space of the frame
//! header. Values are stable across the protocol and must match the
//! device firmware exactly.

/// Exact-match protocol version string, exchanged null-terminated
/// during the configuration handshake.
pub const PROTOCOL_VERSION: &str = "0.1 (internal)";

// ── Handshake / response bytes ───────────────────────────────────

/// Sent by the device to initiate a connection.
pub const CONNECTION_REQUEST: u8 = 255;
/// Sent by the master to accept a connection request.
pub const CONNECTION_ACK: u8 = 254;
/// Sent by the device before the configuration payload.
pub const CONFIGURATION_START: u8 = 253;
/// Acknowledges the configuration; sent by both sides, phase-dependent.
pub const CONFIGURATION_ACK: u8 = 252;
/// Sent by the master when the received configuration cannot be applied.
pub const CONFIGURATION_ERROR: u8 = 251;
/// Sent by the device after applying a frame.
pub const FRAME_ACK: u8 = 250;
/// Sent by the device when a frame could not be applied.
pub const FRAME_ERROR: u8 = 249;

// ── Command byte space ───────────────────────────────────────────
//
// Values 0-7 are reserved protocol commands; values 8-255 address
// user-defined subprograms on the device as `subcommand id + 8`.

/// No command; apply the frame body only.
pub const COMMAND_NONE: u8 = 0;
/// Blank all LEDs not covered by the frame body.
pub const COMMAND_CLEAR: u8 = 1;
/// Terminate the connection.
pub const COMMAND_DISCONNECT: u8 = 2;

/// Highest valid protocol command id.
pub const MAX_PROTOCOL_COMMAND: u8 = 7;
/// Added to a subcommand id to form its command byte.
pub const SUBCOMMAND_OFFSET: u8 = 8;
/// Highest valid subcommand id (247).
pub const MAX_SUBCOMMAND: u8 = u8::MAX - SUBCOMMAND_OFFSET;
