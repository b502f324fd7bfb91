//! Single-field vendor update commands.

use crate::capability::{TargetHeaterCoolerState, TemperatureRange};
use crate::status::{KEY_MODE, KEY_POWER, MODE_ECO, MODE_MANUAL};
use serde::{Deserialize, Serialize};

/// Vendor field written by a target temperature command.
pub const KEY_TARGET_TEMPERATURE: &str = "tmpT";

/// One vendor API call setting exactly one named field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCommand {
    /// Vendor field name (`name` query parameter)
    pub name: String,
    /// New value (`set` query parameter)
    pub value: String,
}

impl DeviceCommand {
    /// Switch the heater on or off.
    #[must_use]
    pub fn power(on: bool) -> Self {
        Self {
            name: KEY_POWER.to_string(),
            value: if on { "on" } else { "off" }.to_string(),
        }
    }

    /// Select auto (eco) or heat (manual) mode.
    #[must_use]
    pub fn mode(target: TargetHeaterCoolerState) -> Self {
        let code = match target {
            TargetHeaterCoolerState::Auto => MODE_ECO,
            TargetHeaterCoolerState::Heat => MODE_MANUAL,
        };
        Self {
            name: KEY_MODE.to_string(),
            value: code.to_string(),
        }
    }

    /// Set the target temperature, clamped into `range`.
    ///
    /// Returns the command and the clamped value that will be sent.
    #[must_use]
    pub fn target_temperature(value: f64, range: TemperatureRange) -> (Self, f64) {
        let clamped = range.clamp(value);
        let command = Self {
            name: KEY_TARGET_TEMPERATURE.to_string(),
            value: clamped.to_string(),
        };
        (command, clamped)
    }
}

impl std::fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}
