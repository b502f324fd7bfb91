//! MQTT binding of the capability surface.

use crate::bridge::{Bridge, CommandError};
use crate::config::BusConfig;
use rumqttc::{AsyncClient, Event, EventLoop, LastWill, MqttOptions, Packet, QoS};
use std::sync::Arc;
use std::time::Duration;
use tesy_bridge_adapter_tesy::WaterHeaterApi;
use tesy_bridge_core::{Capability, CapabilityChange, CapabilitySink};
use tesy_bridge_proto::{
    CommandRequest, StatePayload, TopicScheme, AVAILABILITY_OFFLINE, AVAILABILITY_ONLINE,
};
use url::Url;

/// MQTT connection exposing one bridge.
#[derive(Debug, Clone)]
pub struct Bus {
    client: AsyncClient,
    topics: TopicScheme,
}

/// Capability sink publishing retained state messages.
#[derive(Debug, Clone)]
pub struct MqttSink {
    client: AsyncClient,
    topics: TopicScheme,
}

impl Bus {
    /// Create the MQTT client. Nothing is sent until the event loop is polled.
    ///
    /// The availability topic is registered as last will with `offline`.
    ///
    /// # Errors
    ///
    /// Returns error if the broker URL is invalid.
    pub fn new(config: &BusConfig, device_id: &str) -> Result<(Self, EventLoop), BusError> {
        let (host, port) = parse_mqtt_url(&config.mqtt_broker)?;
        let topics = TopicScheme::new(&config.topic_prefix, device_id);
        let client_id = format!("tesy-bridge-{}", uuid::Uuid::new_v4());

        let mut mqtt_options = MqttOptions::new(client_id, host, port);
        mqtt_options.set_keep_alive(Duration::from_secs(30));
        mqtt_options.set_last_will(LastWill::new(
            topics.availability(),
            AVAILABILITY_OFFLINE,
            QoS::AtLeastOnce,
            true,
        ));

        let (client, eventloop) = AsyncClient::new(mqtt_options, 100);
        Ok((Self { client, topics }, eventloop))
    }

    /// Topic scheme in use.
    #[must_use]
    pub fn topics(&self) -> &TopicScheme {
        &self.topics
    }

    /// Sink to hand to the bridge.
    #[must_use]
    pub fn sink(&self) -> MqttSink {
        MqttSink {
            client: self.client.clone(),
            topics: self.topics.clone(),
        }
    }

    /// Subscribe to every command topic of the device.
    ///
    /// # Errors
    ///
    /// Returns error if the subscription cannot be queued.
    pub async fn subscribe(&self) -> Result<(), BusError> {
        let topic = self.topics.command_wildcard();
        tracing::info!(topic, "Subscribing to command topics");

        self.client
            .subscribe(&topic, QoS::AtLeastOnce)
            .await
            .map_err(|e| BusError::Subscribe(e.to_string()))
    }

    /// Publish accessory info, availability and every current value.
    ///
    /// # Errors
    ///
    /// Returns error if a message cannot be serialized or queued.
    pub async fn announce<A, S>(&self, bridge: &Bridge<A, S>) -> Result<(), BusError>
    where
        A: WaterHeaterApi,
        S: CapabilitySink,
    {
        let info = serde_json::to_vec(bridge.accessory_info())
            .map_err(|e| BusError::Serialize(e.to_string()))?;
        self.publish(self.topics.info(), info).await?;

        let name = StatePayload::now(bridge.name())
            .to_json()
            .map_err(|e| BusError::Serialize(e.to_string()))?;
        self.publish(self.topics.state(Capability::Name), name)
            .await?;

        self.publish(self.topics.availability(), AVAILABILITY_ONLINE)
            .await?;

        let view = bridge.view().await;
        let changes = [
            CapabilityChange::Active(view.active),
            CapabilityChange::CurrentTemperature(view.current_temperature),
            CapabilityChange::TargetTemperature(view.target_temperature),
            CapabilityChange::CurrentHeaterCoolerState(view.current_heater_cooler_state),
            CapabilityChange::TargetHeaterCoolerState(view.target_heater_cooler_state),
        ];
        for change in &changes {
            let payload = StatePayload::from_change(change)
                .to_json()
                .map_err(|e| BusError::Serialize(e.to_string()))?;
            for capability in change.capabilities() {
                self.publish(self.topics.state(*capability), payload.clone())
                    .await?;
            }
        }

        tracing::info!(device_id = %bridge.device_id(), "Announced accessory");
        Ok(())
    }

    async fn publish(&self, topic: String, payload: impl Into<Vec<u8>>) -> Result<(), BusError> {
        self.client
            .publish(topic, QoS::AtLeastOnce, true, payload)
            .await
            .map_err(|e| BusError::Publish(e.to_string()))
    }

    /// Drive the MQTT event loop and apply incoming commands.
    ///
    /// On every (re)connect the command topics are subscribed again and the
    /// accessory is announced. Each command runs on its own task.
    pub async fn serve<A, S>(self, mut eventloop: EventLoop, bridge: Arc<Bridge<A, S>>)
    where
        A: WaterHeaterApi + 'static,
        S: CapabilitySink + 'static,
    {
        let bus = Arc::new(self);

        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    tracing::info!("Connected to MQTT broker");
                    let bus = Arc::clone(&bus);
                    let bridge = Arc::clone(&bridge);
                    tokio::spawn(async move {
                        if let Err(e) = bus.subscribe().await {
                            tracing::warn!(error = %e, "Failed to subscribe");
                        }
                        if let Err(e) = bus.announce(&bridge).await {
                            tracing::warn!(error = %e, "Failed to announce accessory");
                        }
                    });
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    let Some(capability) = bus.topics.parse_command(&publish.topic) else {
                        continue;
                    };

                    let request = match CommandRequest::parse(capability, &publish.payload) {
                        Ok(request) => request,
                        Err(e) => {
                            tracing::warn!(topic = %publish.topic, error = %e, "Ignoring command");
                            continue;
                        }
                    };

                    tracing::debug!(%capability, ?request, "Received command");
                    let bridge = Arc::clone(&bridge);
                    tokio::spawn(async move {
                        match apply(&bridge, request).await {
                            Ok(()) => tracing::info!(%capability, ?request, "Command applied"),
                            Err(e) => {
                                tracing::warn!(%capability, ?request, error = %e, "Command failed");
                            }
                        }
                    });
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, "MQTT error");
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
            }
        }
    }
}

/// Route a host command to the matching bridge setter.
///
/// # Errors
///
/// Returns the bridge's command error.
pub async fn apply<A, S>(bridge: &Bridge<A, S>, request: CommandRequest) -> Result<(), CommandError>
where
    A: WaterHeaterApi,
    S: CapabilitySink,
{
    match request {
        CommandRequest::SetActive(active) => bridge.set_active(active).await,
        CommandRequest::SetTargetState(target) => bridge.set_target_state(target).await,
        CommandRequest::SetTargetTemperature(value) => {
            bridge.set_target_temperature(value).await.map(|_| ())
        }
    }
}

impl CapabilitySink for MqttSink {
    fn publish(&self, change: &CapabilityChange) {
        let payload = match StatePayload::from_change(change).to_json() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(?change, error = %e, "Failed to encode state");
                return;
            }
        };

        for capability in change.capabilities() {
            let topic = self.topics.state(*capability);
            tracing::debug!(topic, "Publishing state");
            if let Err(e) = self
                .client
                .try_publish(topic, QoS::AtLeastOnce, true, payload.clone())
            {
                tracing::warn!(%capability, error = %e, "Failed to publish state");
            }
        }
    }
}

/// Parse MQTT URL into host and port.
fn parse_mqtt_url(input: &str) -> Result<(String, u16), BusError> {
    if input.contains("://") {
        let url =
            Url::parse(input).map_err(|e| BusError::InvalidBrokerUrl(format!("{input}: {e}")))?;

        match url.scheme() {
            "tcp" | "mqtt" => {}
            scheme => {
                return Err(BusError::InvalidBrokerUrl(format!(
                    "{input}: unsupported scheme '{scheme}'"
                )));
            }
        }

        let host = url
            .host_str()
            .ok_or_else(|| BusError::InvalidBrokerUrl(format!("{input}: missing host")))?;
        let port = url.port().unwrap_or(1883);

        return Ok((host.to_string(), port));
    }

    let (host, port) = match input.split_once(':') {
        None => (input, None),
        Some((host, port)) => (host, Some(port)),
    };
    if host.is_empty() {
        return Err(BusError::InvalidBrokerUrl(format!("{input}: missing host")));
    }
    let port = match port {
        None => 1883,
        Some(port) => port.parse().map_err(|_| {
            BusError::InvalidBrokerUrl(format!("{input}: invalid port '{port}'"))
        })?,
    };

    Ok((host.to_string(), port))
}

/// Errors for the MQTT binding.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BusError {
    /// Invalid MQTT broker URL
    #[error("invalid MQTT broker URL: {0}")]
    InvalidBrokerUrl(String),
    /// Subscription failed
    #[error("subscription error: {0}")]
    Subscribe(String),
    /// Publish failed
    #[error("publish error: {0}")]
    Publish(String),
    /// Serialization failed
    #[error("serialize error: {0}")]
    Serialize(String),
}
