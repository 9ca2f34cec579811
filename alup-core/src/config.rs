//! Negotiated device configuration.

use crate::error::ConfigError;

/// Immutable parameters received from the device during the
/// configuration handshake.
///
/// Constructed exactly once per successful handshake and held for the
/// engine's connected lifetime; dropped on disconnect or invalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfiguration {
    protocol_version: String,
    device_name: String,
    num_of_leds: i32,
    data_pin: i32,
    clock_pin: i32,
    extra_values: String,
}

impl DeviceConfiguration {
    /// Validate and build a configuration from received fields.
    pub fn new(
        protocol_version: String,
        device_name: String,
        num_of_leds: i32,
        data_pin: i32,
        clock_pin: i32,
        extra_values: String,
    ) -> Result<Self, ConfigError> {
        if protocol_version.is_empty() {
            return Err(ConfigError::EmptyVersion);
        }
        if num_of_leds <= 0 {
            return Err(ConfigError::LedCount(num_of_leds));
        }
        if data_pin < 0 {
            return Err(ConfigError::DataPin(data_pin));
        }
        if clock_pin < 0 {
            return Err(ConfigError::ClockPin(clock_pin));
        }

        Ok(Self {
            protocol_version,
            device_name,
            num_of_leds,
            data_pin,
            clock_pin,
            extra_values,
        })
    }

    pub fn protocol_version(&self) -> &str {
        &self.protocol_version
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Number of LEDs addressable on the connected strip.
    pub fn num_of_leds(&self) -> i32 {
        self.num_of_leds
    }

    /// Digital pin carrying the data signal on the device.
    pub fn data_pin(&self) -> i32 {
        self.data_pin
    }

    /// Digital pin carrying the clock signal, where the strip uses one.
    pub fn clock_pin(&self) -> i32 {
        self.clock_pin
    }

    /// Free-form extra values for application use.
    pub fn extra_values(&self) -> &str {
        &self.extra_values
    }
}
