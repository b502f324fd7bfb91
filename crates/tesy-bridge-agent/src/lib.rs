//! # Tesy Bridge Agent
//!
//! Runtime that keeps one Tesy water heater in sync with a local
//! automation bus.
//!
//! ## Architecture
//!
//! The agent runs three concurrent loops around a shared [`Bridge`]:
//! 1. **Poll**: refreshes the device status on every scheduler tick
//! 2. **Login retry**: re-establishes a lost session on a slower cadence
//! 3. **Bus**: drives MQTT, applying host commands as they arrive
//!
//! All vendor calls share one session and one fetch gate; at most one is in
//! flight at any time.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bridge;
pub mod bus;
pub mod config;
pub mod scheduler;
pub mod session;
pub mod supervisor;

pub use bridge::{Bridge, BridgeSettings, CommandError, PollOutcome};
pub use bus::{Bus, BusError, MqttSink};
pub use config::{BridgeConfig, BusConfig, ConfigError};
pub use scheduler::{PollScheduler, PollTicks};
pub use session::SessionManager;
pub use supervisor::{LoginRetrySupervisor, Reauthenticate, RetryPolicy, SupervisorState};
