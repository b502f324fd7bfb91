//! # Tesy Bridge Core
//!
//! Domain model shared by the vendor adapter, the bridge runtime, and the CLI.
//!
//! This crate provides:
//! - `DeviceStatus`: the raw vendor status snapshot of one water heater
//! - Standardized capability types (Active, heater/cooler states, thresholds)
//! - A change-detecting translator from vendor fields to capability values
//! - Single-field vendor commands (power, mode, target temperature)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod capability;
pub mod command;
pub mod status;
pub mod translate;

pub use capability::{
    AccessoryInfo, Active, Capability, CapabilityChange, CapabilitySink,
    CurrentHeaterCoolerState, RangeError, TargetHeaterCoolerState, TemperatureRange,
};
pub use command::DeviceCommand;
pub use status::{DeviceStatus, StatusError};
pub use translate::{StandardizedState, StatusTranslator};
