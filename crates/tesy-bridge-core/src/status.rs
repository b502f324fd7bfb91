//! Raw vendor status snapshot.
//!
//! The Tesy cloud reports device state as a flat object of vendor field
//! names. Values arrive as strings or numbers depending on firmware; the
//! snapshot stores everything in string form so downstream parsing is
//! uniform.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Operating mode field.
pub const KEY_MODE: &str = "mode";
/// Current temperature proxy (number of showers currently available).
pub const KEY_CURRENT_SHOWERS: &str = "cur_shower";
/// Target temperature proxy (number of showers requested).
pub const KEY_TARGET_SHOWERS: &str = "ref_shower";
/// Power switch field (`on` / `off`).
pub const KEY_POWER: &str = "power_sw";
/// Heater activity field (`READY` when idle).
pub const KEY_HEATER_STATE: &str = "heater_state";

/// Vendor mode code for manual operation.
pub const MODE_MANUAL: i64 = 1;
/// Vendor mode code for eco operation.
pub const MODE_ECO: i64 = 5;

/// Snapshot of vendor status fields for a single device.
///
/// Replaced wholesale on every successful poll; never merged field by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceStatus {
    fields: BTreeMap<String, String>,
}

impl DeviceStatus {
    /// Create an empty status.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a status from the vendor's `DeviceStatus` JSON object.
    ///
    /// Scalar values are stringified; nested objects, arrays, and nulls are
    /// skipped since none of the translated fields use them.
    ///
    /// # Errors
    ///
    /// Returns error if the value is not a JSON object.
    pub fn from_json(value: &Value) -> Result<Self, StatusError> {
        let object = value.as_object().ok_or(StatusError::NotAnObject)?;

        let fields = object
            .iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    Value::Null | Value::Array(_) | Value::Object(_) => return None,
                };
                Some((key.clone(), text))
            })
            .collect();

        Ok(Self { fields })
    }

    /// Get a raw field value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Overwrite a raw field value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Number of fields in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the snapshot has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Raw power switch value.
    #[must_use]
    pub fn power(&self) -> Option<&str> {
        self.get(KEY_POWER)
    }

    /// Raw heater state value.
    #[must_use]
    pub fn heater_state(&self) -> Option<&str> {
        self.get(KEY_HEATER_STATE)
    }

    /// Current temperature, parsed from the current-showers field.
    #[must_use]
    pub fn current_temperature(&self) -> Option<f64> {
        self.number(KEY_CURRENT_SHOWERS)
    }

    /// Target temperature, parsed from the target-showers field.
    #[must_use]
    pub fn target_temperature(&self) -> Option<f64> {
        self.number(KEY_TARGET_SHOWERS)
    }

    /// Raw mode field, if present.
    #[must_use]
    pub fn raw_mode(&self) -> Option<&str> {
        self.get(KEY_MODE)
    }

    /// Mode code, if the field is present and an integer.
    #[must_use]
    pub fn mode(&self) -> Option<i64> {
        self.raw_mode().and_then(|raw| raw.trim().parse().ok())
    }

    fn number(&self, key: &str) -> Option<f64> {
        self.get(key)
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|value| value.is_finite())
    }
}

impl<K, V> FromIterator<(K, V)> for DeviceStatus
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Errors that can occur when reading a status snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusError {
    /// The status payload was not a JSON object
    #[error("device status is not a JSON object")]
    NotAnObject,
}
