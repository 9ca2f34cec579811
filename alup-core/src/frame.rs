//! The mutable pending-frame abstraction.
//!
//! A frame owns exactly one [`Header`] and one ordered LED payload;
//! insertion order is strip position order. Setting the payload always
//! recomputes the header's body size. A zero-LED frame is valid and
//! sends only the header/command.

use bytes::{BufMut, Bytes, BytesMut};

use crate::color::{self, Led};
use crate::error::RangeError;
use crate::header::{HEADER_SIZE, Header};
use crate::protocol;

/// One protocol message: header plus LED payload, master → device.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    header: Header,
    leds: Vec<Led>,
}

impl Frame {
    /// An empty frame with the default header.
    pub fn new() -> Self {
        Self::default()
    }

    /// A frame carrying the given payload and a default header.
    pub fn with_leds(leds: Vec<Led>) -> Self {
        let mut frame = Self::default();
        frame.set_leds(leds);
        frame
    }

    /// A frame selecting the given subprogram with an empty payload.
    pub fn with_subcommand(id: u8) -> Result<Self, RangeError> {
        let mut frame = Self::default();
        frame.set_subcommand(id)?;
        Ok(frame)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn leds(&self) -> &[Led] {
        &self.leds
    }

    pub fn offset(&self) -> i32 {
        self.header.offset()
    }

    /// Replace the LED payload, recomputing the header body size.
    pub fn set_leds(&mut self, leds: Vec<Led>) {
        self.header.set_led_count(leds.len());
        self.leds = leds;
    }

    /// Replace the LED payload from a sequence with absent elements;
    /// every `None` is normalized to black.
    pub fn set_leds_opt(&mut self, leds: &[Option<Led>]) {
        self.set_leds(color::normalize_leds(leds));
    }

    /// Set the payload offset. Not range-checked; the engine clamps at
    /// send time.
    pub fn set_offset(&mut self, offset: i32) {
        self.header.set_offset(offset);
    }

    /// Select a reserved protocol command (0-7), overriding any other
    /// command.
    pub fn set_protocol_command(&mut self, id: u8) -> Result<(), RangeError> {
        if id > protocol::MAX_PROTOCOL_COMMAND {
            return Err(RangeError::ProtocolCommand(id));
        }
        self.header.set_command(id);
        Ok(())
    }

    /// Select the device subprogram to run when this frame is applied,
    /// overriding any other command. Valid ids are 0-247; the command
    /// byte becomes `id + 8`.
    pub fn set_subcommand(&mut self, id: u8) -> Result<(), RangeError> {
        if id > protocol::MAX_SUBCOMMAND {
            return Err(RangeError::Subcommand(id));
        }
        self.header.set_command(id + protocol::SUBCOMMAND_OFFSET);
        Ok(())
    }

    /// Serialize header and payload to contiguous wire bytes.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE + self.leds.len() * 3);
        buf.put_slice(&self.header.serialize());
        for led in &self.leds {
            buf.put_slice(&led.to_bytes());
        }
        buf.freeze()
    }
}
