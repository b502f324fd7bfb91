//! # Tesy Bridge Protocol
//!
//! MQTT topic scheme and JSON payloads used to expose one water heater's
//! capabilities on a local automation bus.
//!
//! ## Messages
//!
//! - `StatePayload`: retained capability value with its update time
//! - `CommandRequest`: a host write to a writable capability
//! - Accessory metadata (`AccessoryInfo` from the core crate), published on connect
//!
//! ## MQTT Topics
//!
//! Topic scheme: `{prefix}/v1/{device_id}/{capability}[/set]`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod messages;
pub mod topics;

pub use messages::{
    CommandRequest, MessageError, StatePayload, AVAILABILITY_OFFLINE, AVAILABILITY_ONLINE,
};
pub use topics::TopicScheme;
