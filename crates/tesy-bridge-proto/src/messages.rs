//! Bus payloads for capability state and host commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tesy_bridge_core::{Capability, CapabilityChange, TargetHeaterCoolerState};

/// Availability payload while the bridge is running.
pub const AVAILABILITY_ONLINE: &str = "online";
/// Availability payload registered as the MQTT last will.
pub const AVAILABILITY_OFFLINE: &str = "offline";

/// Retained value of one capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatePayload {
    /// Capability value (numeric codes for enumerations)
    pub value: Value,
    /// When the bridge published the value
    pub updated_at: DateTime<Utc>,
}

impl StatePayload {
    /// Create a payload stamped with the current time.
    #[must_use]
    pub fn now(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            updated_at: Utc::now(),
        }
    }

    /// Payload for a capability change.
    #[must_use]
    pub fn from_change(change: &CapabilityChange) -> Self {
        Self::now(change.value_json())
    }

    /// Serialize to JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> Result<Vec<u8>, MessageError> {
        serde_json::to_vec(self).map_err(|e| MessageError::Serialize(e.to_string()))
    }

    /// Deserialize from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns error if deserialization fails.
    pub fn from_json(bytes: &[u8]) -> Result<Self, MessageError> {
        serde_json::from_slice(bytes).map_err(|e| MessageError::Deserialize(e.to_string()))
    }
}

/// A host write to a writable capability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandRequest {
    /// Switch on/off
    SetActive(bool),
    /// Select auto/heat
    SetTargetState(TargetHeaterCoolerState),
    /// Set the target temperature (either threshold)
    SetTargetTemperature(f64),
}

impl CommandRequest {
    /// Parse a command payload addressed to `capability`.
    ///
    /// Payloads are plain text or JSON scalars:
    /// - `active`: `on|off|1|0|true|false`
    /// - `target_heater_cooler_state`: `auto|heat|0|1`
    /// - `*_threshold_temperature`: a number
    ///
    /// # Errors
    ///
    /// Returns error if the capability is read-only or the payload does not
    /// fit it.
    pub fn parse(capability: Capability, payload: &[u8]) -> Result<Self, MessageError> {
        let text = std::str::from_utf8(payload)
            .map_err(|e| MessageError::Deserialize(e.to_string()))?
            .trim()
            .trim_matches('"')
            .to_ascii_lowercase();

        let invalid = || MessageError::InvalidPayload {
            capability,
            payload: text.clone(),
        };

        match capability {
            Capability::Active => match text.as_str() {
                "on" | "1" | "true" => Ok(Self::SetActive(true)),
                "off" | "0" | "false" => Ok(Self::SetActive(false)),
                _ => Err(invalid()),
            },
            Capability::TargetHeaterCoolerState => match text.as_str() {
                "auto" | "0" => Ok(Self::SetTargetState(TargetHeaterCoolerState::Auto)),
                "heat" | "1" => Ok(Self::SetTargetState(TargetHeaterCoolerState::Heat)),
                _ => Err(invalid()),
            },
            Capability::HeatingThresholdTemperature | Capability::CoolingThresholdTemperature => {
                text.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .map(Self::SetTargetTemperature)
                    .ok_or_else(invalid)
            }
            Capability::CurrentTemperature
            | Capability::CurrentHeaterCoolerState
            | Capability::Name => Err(MessageError::ReadOnly(capability)),
        }
    }
}

/// Errors for message serialization/deserialization.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MessageError {
    /// Serialization failed
    #[error("serialization failed: {0}")]
    Serialize(String),
    /// Deserialization failed
    #[error("deserialization failed: {0}")]
    Deserialize(String),
    /// Payload does not fit the capability
    #[error("invalid payload for {capability}: {payload:?}")]
    InvalidPayload {
        /// Addressed capability
        capability: Capability,
        /// Normalized payload text
        payload: String,
    },
    /// Capability cannot be written
    #[error("{0} is read-only")]
    ReadOnly(Capability),
}
