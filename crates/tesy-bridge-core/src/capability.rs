//! Standardized home-automation capabilities.
//!
//! Values mirror the HomeKit `HeaterCooler` service: numeric codes are kept
//! so a host binding can forward them unchanged.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Whether the heater is switched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Active {
    /// Switched off
    #[default]
    Inactive,
    /// Switched on
    Active,
}

impl Active {
    /// Numeric capability code.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Inactive => 0,
            Self::Active => 1,
        }
    }

    /// Whether this is `Active`.
    #[must_use]
    pub fn is_active(self) -> bool {
        self == Self::Active
    }
}

impl From<bool> for Active {
    fn from(on: bool) -> Self {
        if on {
            Self::Active
        } else {
            Self::Inactive
        }
    }
}

/// What the heater is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CurrentHeaterCoolerState {
    /// No state reported yet
    #[default]
    Inactive,
    /// Water is at temperature
    Idle,
    /// Element is heating
    Heating,
    /// Never derived for a water heater, kept for completeness of the surface
    Cooling,
}

impl CurrentHeaterCoolerState {
    /// Numeric capability code.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Inactive => 0,
            Self::Idle => 1,
            Self::Heating => 2,
            Self::Cooling => 3,
        }
    }
}

/// The operating mode requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TargetHeaterCoolerState {
    /// Vendor eco mode
    #[default]
    Auto,
    /// Vendor manual mode
    Heat,
}

impl TargetHeaterCoolerState {
    /// Numeric capability code.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Auto => 0,
            Self::Heat => 1,
        }
    }

    /// Map a numeric capability code, clamping into the supported range.
    ///
    /// `0` is auto; anything above is heat (cool is not offered).
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        if code == 0 {
            Self::Auto
        } else {
            Self::Heat
        }
    }
}

/// Named capabilities exposed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// On/off, read/write
    Active,
    /// Current temperature, read only
    CurrentTemperature,
    /// Heating threshold, writes set the target temperature
    HeatingThresholdTemperature,
    /// Cooling threshold, alias of the heating threshold
    CoolingThresholdTemperature,
    /// Idle/heating, read only
    CurrentHeaterCoolerState,
    /// Auto/heat, read/write
    TargetHeaterCoolerState,
    /// Static display name
    Name,
}

impl Capability {
    /// Every capability, in registration order.
    pub const ALL: [Capability; 7] = [
        Capability::Active,
        Capability::CurrentTemperature,
        Capability::HeatingThresholdTemperature,
        Capability::CoolingThresholdTemperature,
        Capability::CurrentHeaterCoolerState,
        Capability::TargetHeaterCoolerState,
        Capability::Name,
    ];

    /// Stable snake_case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::CurrentTemperature => "current_temperature",
            Self::HeatingThresholdTemperature => "heating_threshold_temperature",
            Self::CoolingThresholdTemperature => "cooling_threshold_temperature",
            Self::CurrentHeaterCoolerState => "current_heater_cooler_state",
            Self::TargetHeaterCoolerState => "target_heater_cooler_state",
            Self::Name => "name",
        }
    }

    /// Parse a capability from its snake_case name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    /// Whether the host may write this capability.
    #[must_use]
    pub fn is_writable(self) -> bool {
        matches!(
            self,
            Self::Active
                | Self::HeatingThresholdTemperature
                | Self::CoolingThresholdTemperature
                | Self::TargetHeaterCoolerState
        )
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change of one standardized value, announced to the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "capability", content = "value", rename_all = "snake_case")]
pub enum CapabilityChange {
    /// Power changed
    Active(Active),
    /// Current temperature changed
    CurrentTemperature(f64),
    /// Target temperature changed (both threshold capabilities)
    TargetTemperature(f64),
    /// Heater activity changed
    CurrentHeaterCoolerState(CurrentHeaterCoolerState),
    /// Requested mode changed
    TargetHeaterCoolerState(TargetHeaterCoolerState),
}

impl CapabilityChange {
    /// Capabilities whose value this change updates.
    #[must_use]
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Self::Active(_) => &[Capability::Active],
            Self::CurrentTemperature(_) => &[Capability::CurrentTemperature],
            Self::TargetTemperature(_) => &[
                Capability::HeatingThresholdTemperature,
                Capability::CoolingThresholdTemperature,
            ],
            Self::CurrentHeaterCoolerState(_) => &[Capability::CurrentHeaterCoolerState],
            Self::TargetHeaterCoolerState(_) => &[Capability::TargetHeaterCoolerState],
        }
    }

    /// JSON form of the new value, as numeric capability codes.
    #[must_use]
    pub fn value_json(&self) -> serde_json::Value {
        match *self {
            Self::Active(v) => v.code().into(),
            Self::CurrentTemperature(v) | Self::TargetTemperature(v) => v.into(),
            Self::CurrentHeaterCoolerState(v) => v.code().into(),
            Self::TargetHeaterCoolerState(v) => v.code().into(),
        }
    }
}

/// Receiver of capability change notifications.
///
/// The host binding implements this; the bridge calls it after every
/// translated change and after successful optimistic writes.
pub trait CapabilitySink: Send + Sync {
    /// Deliver one change. Must not block.
    fn publish(&self, change: &CapabilityChange);
}

impl<T: CapabilitySink + ?Sized> CapabilitySink for Arc<T> {
    fn publish(&self, change: &CapabilityChange) {
        (**self).publish(change);
    }
}

/// Static accessory metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessoryInfo {
    /// Display name
    pub name: String,
    /// Manufacturer
    pub manufacturer: String,
    /// Model
    pub model: String,
    /// Serial number
    pub serial_number: String,
}

impl Default for AccessoryInfo {
    fn default() -> Self {
        Self {
            name: "Water Heater".to_string(),
            manufacturer: "Tesy".to_string(),
            model: "Model".to_string(),
            serial_number: "Serial Number".to_string(),
        }
    }
}

/// Inclusive bounds for the target temperature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRange {
    min: f64,
    max: f64,
}

impl TemperatureRange {
    /// Create a range.
    ///
    /// # Errors
    ///
    /// Returns error if a bound is not finite or `min > max`.
    pub fn new(min: f64, max: f64) -> Result<Self, RangeError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(RangeError::NotFinite);
        }
        if min > max {
            return Err(RangeError::Inverted { min, max });
        }
        Ok(Self { min, max })
    }

    /// Lower bound.
    #[must_use]
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Clamp a value into the range. NaN clamps to the lower bound.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

impl Default for TemperatureRange {
    fn default() -> Self {
        Self { min: 0.0, max: 4.0 }
    }
}

/// Errors for temperature range construction.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum RangeError {
    /// A bound is NaN or infinite
    #[error("temperature bounds must be finite")]
    NotFinite,
    /// Lower bound above upper bound
    #[error("minimum temperature {min} is above maximum {max}")]
    Inverted {
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },
}
