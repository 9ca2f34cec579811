//! RGB color values and the LED-array wire codec.
//!
//! One LED is three unsigned byte channels; an array of LEDs
//! serializes to `3 * n` wire bytes in strip order (R,G,B,R,G,B,…).

use crate::error::RangeError;

// ── Led ──────────────────────────────────────────────────────────

/// A single RGB LED value with 0-255 channel semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Led {
    red: u8,
    green: u8,
    blue: u8,
}

impl Led {
    /// All channels off.
    pub const BLACK: Led = Led::new(0, 0, 0);
    /// All channels at full brightness.
    pub const WHITE: Led = Led::new(255, 255, 255);

    /// Create an LED value. Channels are `u8`, so the 0-255 constraint
    /// holds by construction.
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Create an LED value from wider integers, validating each channel
    /// against the 0-255 range.
    ///
    /// This is the constructor computed effect math and external input
    /// go through.
    pub fn try_new(red: i32, green: i32, blue: i32) -> Result<Self, RangeError> {
        Ok(Self {
            red: channel(red, "red")?,
            green: channel(green, "green")?,
            blue: channel(blue, "blue")?,
        })
    }

    pub fn red(&self) -> u8 {
        self.red
    }

    pub fn green(&self) -> u8 {
        self.green
    }

    pub fn blue(&self) -> u8 {
        self.blue
    }

    /// Set the red channel, validating the 0-255 range.
    pub fn set_red(&mut self, value: i32) -> Result<(), RangeError> {
        self.red = channel(value, "red")?;
        Ok(())
    }

    /// Set the green channel, validating the 0-255 range.
    pub fn set_green(&mut self, value: i32) -> Result<(), RangeError> {
        self.green = channel(value, "green")?;
        Ok(())
    }

    /// Set the blue channel, validating the 0-255 range.
    pub fn set_blue(&mut self, value: i32) -> Result<(), RangeError> {
        self.blue = channel(value, "blue")?;
        Ok(())
    }

    /// Replace all three channels at once.
    pub fn set_rgb(&mut self, red: i32, green: i32, blue: i32) -> Result<(), RangeError> {
        *self = Self::try_new(red, green, blue)?;
        Ok(())
    }

    /// Serialize to 3 wire bytes. Identity, no transform.
    pub fn to_bytes(self) -> [u8; 3] {
        [self.red, self.green, self.blue]
    }
}

fn channel(value: i32, name: &'static str) -> Result<u8, RangeError> {
    u8::try_from(value).map_err(|_| RangeError::Channel {
        channel: name,
        value,
    })
}

// ── Array codec ──────────────────────────────────────────────────

/// Serialize an ordered LED sequence to `3 * n` wire bytes in strip
/// order.
pub fn serialize_leds(leds: &[Led]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(leds.len() * 3);
    for led in leds {
        bytes.extend_from_slice(&led.to_bytes());
    }
    bytes
}

/// Normalize a sequence with absent elements: every `None` becomes
/// black. Returns a normalized copy; the wire output is identical to
/// normalizing in place.
pub fn normalize_leds(leds: &[Option<Led>]) -> Vec<Led> {
    leds.iter().map(|led| led.unwrap_or(Led::BLACK)).collect()
}
