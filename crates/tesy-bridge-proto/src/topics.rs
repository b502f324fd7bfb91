//! MQTT topic scheme for capability exposure.
//!
//! Topic structure: `{prefix}/v1/{device_id}/{capability}`
//!
//! - `.../{capability}`: retained state
//! - `.../{capability}/set`: host writes
//! - `.../info`: accessory metadata
//! - `.../availability`: `online` / `offline`

use serde::{Deserialize, Serialize};
use tesy_bridge_core::Capability;

/// Protocol version for topic scheme.
pub const PROTOCOL_VERSION: &str = "v1";

const SET_SUFFIX: &str = "set";

/// Topic scheme configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicScheme {
    /// Topic prefix (default: "tesy")
    pub prefix: String,
    /// Vendor device identifier
    pub device_id: String,
}

impl TopicScheme {
    /// Create a new topic scheme for a device.
    #[must_use]
    pub fn new(prefix: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            device_id: device_id.into(),
        }
    }

    /// Build the base topic path.
    fn base(&self) -> String {
        format!("{}/{}/{}", self.prefix, PROTOCOL_VERSION, self.device_id)
    }

    /// Retained state topic of a capability.
    #[must_use]
    pub fn state(&self, capability: Capability) -> String {
        format!("{}/{}", self.base(), capability)
    }

    /// Command topic of a capability.
    #[must_use]
    pub fn command(&self, capability: Capability) -> String {
        format!("{}/{}/{SET_SUFFIX}", self.base(), capability)
    }

    /// Accessory information topic.
    #[must_use]
    pub fn info(&self) -> String {
        format!("{}/info", self.base())
    }

    /// Availability topic.
    #[must_use]
    pub fn availability(&self) -> String {
        format!("{}/availability", self.base())
    }

    /// Wildcard subscription for every command topic of the device.
    #[must_use]
    pub fn command_wildcard(&self) -> String {
        format!("{}/+/{SET_SUFFIX}", self.base())
    }

    /// Parse a command topic.
    ///
    /// Returns the targeted capability if the topic is a command topic of
    /// this device for a writable capability.
    #[must_use]
    pub fn parse_command(&self, topic: &str) -> Option<Capability> {
        let remainder = topic.strip_prefix(&self.base())?.strip_prefix('/')?;
        let (name, suffix) = remainder.split_once('/')?;
        if suffix != SET_SUFFIX {
            return None;
        }
        Capability::parse(name).filter(|c| c.is_writable())
    }
}
