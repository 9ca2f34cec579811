//! The 9-byte frame header.
//!
//! ## Wire format
//!
//! ```text
//! body_size:    u32  (4, big-endian; bytes per channel, 3 per LED)
//! body_offset:  i32  (4, big-endian, raw two's complement)
//! command:      u8   (1)
//! ```
//!
//! The offset is serialized as its raw 4-byte two's-complement pattern
//! even though only non-negative, clamped offsets are ever sent;
//! devices interpret it per their own addressing rules.

use crate::error::RangeError;
use crate::protocol;

/// Encoded header size on the wire.
pub const HEADER_SIZE: usize = 9;

/// The envelope preceding a frame's LED payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Payload size in bytes; always a multiple of 3.
    body_size: u32,
    /// Payload position on the strip, in LEDs. May be negative or
    /// over-length until send-time clamping.
    body_offset: i32,
    /// Command byte: 0-7 protocol commands, 8-255 subcommands.
    command: u8,
}

impl Default for Header {
    /// Body size 0, offset 0, command `COMMAND_CLEAR` — unchanged LEDs
    /// get blanked unless the caller selects another command.
    fn default() -> Self {
        Self {
            body_size: 0,
            body_offset: 0,
            command: protocol::COMMAND_CLEAR,
        }
    }
}

impl Header {
    /// Create a header, validating the body size.
    pub fn new(body_size: u32, body_offset: i32, command: u8) -> Result<Self, RangeError> {
        let mut header = Self {
            body_size: 0,
            body_offset,
            command,
        };
        header.set_body_size(body_size)?;
        Ok(header)
    }

    pub fn body_size(&self) -> u32 {
        self.body_size
    }

    pub fn offset(&self) -> i32 {
        self.body_offset
    }

    pub fn command(&self) -> u8 {
        self.command
    }

    /// Set the body size; fails unless it is a whole number of LEDs.
    pub fn set_body_size(&mut self, body_size: u32) -> Result<(), RangeError> {
        if body_size % 3 != 0 {
            return Err(RangeError::BodySize(body_size));
        }
        self.body_size = body_size;
        Ok(())
    }

    /// Set the body size from an LED count.
    pub(crate) fn set_led_count(&mut self, leds: usize) {
        self.body_size = (leds * 3) as u32;
    }

    /// Set the body offset. Never fails; out-of-range values are
    /// corrected by send-time clamping so callers may freely use
    /// negative or over-length offsets.
    pub fn set_offset(&mut self, body_offset: i32) {
        self.body_offset = body_offset;
    }

    /// Set the raw command byte.
    pub fn set_command(&mut self, command: u8) {
        self.command = command;
    }

    /// Serialize to the 9 wire bytes.
    pub fn serialize(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.body_size.to_be_bytes());
        bytes[4..8].copy_from_slice(&self.body_offset.to_be_bytes());
        bytes[8] = self.command;
        bytes
    }
}
