//! Vendor API surface used by the bridge.
//!
//! [`WaterHeaterApi`] is the seam between the coordination runtime and the
//! network: [`crate::TesyClient`] implements it over HTTP, tests implement
//! it in memory.

use crate::client::ClientError;
use crate::session::{Credentials, Session};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tesy_bridge_core::{DeviceCommand, DeviceStatus};

/// Literal success marker in command replies.
pub const STAT_OK: &str = "ok";

/// One device from the account's device list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    /// Vendor device id
    pub id: String,
    /// Status snapshot
    pub status: DeviceStatus,
}

impl DeviceRecord {
    /// Parse the `device` object of a device-list reply.
    ///
    /// Entries without a usable `DeviceStatus` object are skipped. A missing
    /// or non-object `device` field yields an empty list.
    #[must_use]
    pub fn list_from_json(body: &Value) -> Vec<Self> {
        let Some(devices) = body.get("device").and_then(Value::as_object) else {
            return Vec::new();
        };

        devices
            .iter()
            .filter_map(|(key, device)| {
                let id = match device.get("id") {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    _ => key.clone(),
                };

                let status = device.get("DeviceStatus").map(DeviceStatus::from_json);
                match status {
                    Some(Ok(status)) => Some(Self { id, status }),
                    Some(Err(e)) => {
                        tracing::warn!(device_id = %id, error = %e, "Skipping device with invalid status");
                        None
                    }
                    None => {
                        tracing::warn!(device_id = %id, "Skipping device without status");
                        None
                    }
                }
            })
            .collect()
    }
}

/// Reply to a single-field update command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandReply {
    /// Raw JSON body
    pub body: Value,
}

impl CommandReply {
    /// The `stat` field, if it is a string.
    #[must_use]
    pub fn stat(&self) -> Option<&str> {
        self.body.get("stat").and_then(Value::as_str)
    }

    /// Whether the vendor accepted the command.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.stat() == Some(STAT_OK)
    }
}

/// Authenticated operations against the vendor cloud.
#[async_trait]
pub trait WaterHeaterApi: Send + Sync {
    /// Log in and return fresh session artifacts.
    async fn login(&self, credentials: &Credentials) -> Result<Session, ClientError>;

    /// Fetch every device on the account.
    async fn devices(&self, session: &Session) -> Result<Vec<DeviceRecord>, ClientError>;

    /// Set one field on one device.
    async fn send_command(
        &self,
        session: &Session,
        device_id: &str,
        command: &DeviceCommand,
    ) -> Result<CommandReply, ClientError>;
}

#[async_trait]
impl<T: WaterHeaterApi + ?Sized> WaterHeaterApi for Arc<T> {
    async fn login(&self, credentials: &Credentials) -> Result<Session, ClientError> {
        (**self).login(credentials).await
    }

    async fn devices(&self, session: &Session) -> Result<Vec<DeviceRecord>, ClientError> {
        (**self).devices(session).await
    }

    async fn send_command(
        &self,
        session: &Session,
        device_id: &str,
        command: &DeviceCommand,
    ) -> Result<CommandReply, ClientError> {
        (**self).send_command(session, device_id, command).await
    }
}
