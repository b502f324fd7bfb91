//! Per-device bridge: polling, commands and the capability surface.
//!
//! Every network call goes through the fetch gate, so at most one poll or
//! command is in flight. Each call is also bracketed by
//! [`PollScheduler::stop`] / [`PollScheduler::start`]; the timer can never
//! fire while a fetch is running, and the next poll is always a full
//! interval after the last fetch settled.

use crate::scheduler::{PollScheduler, PollTicks};
use crate::session::SessionManager;
use crate::supervisor::{LoginRetrySupervisor, Reauthenticate, RetryPolicy};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tesy_bridge_adapter_tesy::{Credentials, WaterHeaterApi};
use tesy_bridge_core::status::{KEY_MODE, KEY_POWER, KEY_TARGET_SHOWERS};
use tesy_bridge_core::{
    AccessoryInfo, Active, CapabilityChange, CapabilitySink, CurrentHeaterCoolerState,
    DeviceCommand, DeviceStatus, StandardizedState, StatusTranslator, TargetHeaterCoolerState,
    TemperatureRange,
};
use tokio::sync::Mutex;

/// Static settings of one bridge instance.
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    /// Vendor device id to follow
    pub device_id: String,
    /// Account credentials
    pub credentials: Credentials,
    /// Accessory metadata
    pub info: AccessoryInfo,
    /// Target temperature bounds
    pub range: TemperatureRange,
    /// Poll interval
    pub poll_interval: Duration,
}

/// Result of one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Status loaded; number of capability changes announced
    Updated(usize),
    /// No session; nothing fetched
    NotReady,
    /// Device list empty or without the configured device
    DeviceMissing,
    /// Fetch failed; session invalidated
    Failed,
}

/// Errors returned to the host for capability writes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// No session; nothing was sent
    #[error("bridge is not logged in")]
    NotReady,
    /// Vendor answered without `stat: ok`
    #[error("command rejected: {0}")]
    Rejected(String),
    /// Request failed; session invalidated
    #[error("command transport error: {0}")]
    Transport(String),
}

#[derive(Debug)]
struct DeviceState {
    status: Option<DeviceStatus>,
    translator: StatusTranslator,
}

/// Bridge between one vendor device and a capability sink.
pub struct Bridge<A, S> {
    api: A,
    sink: S,
    device_id: String,
    info: AccessoryInfo,
    range: TemperatureRange,
    session: SessionManager,
    scheduler: PollScheduler,
    fetch_gate: Mutex<()>,
    state: Mutex<DeviceState>,
}

impl<A: WaterHeaterApi, S: CapabilitySink> Bridge<A, S> {
    /// Create a bridge and the tick source of its poll timer.
    ///
    /// The bridge starts logged out with the timer stopped.
    #[must_use]
    pub fn new(settings: BridgeSettings, api: A, sink: S) -> (Self, PollTicks) {
        let (scheduler, ticks) = PollScheduler::new(settings.poll_interval);
        let initial = StandardizedState::initial(settings.range.max());

        let bridge = Self {
            api,
            sink,
            device_id: settings.device_id,
            info: settings.info,
            range: settings.range,
            session: SessionManager::new(settings.credentials),
            scheduler,
            fetch_gate: Mutex::new(()),
            state: Mutex::new(DeviceState {
                status: None,
                translator: StatusTranslator::new(initial),
            }),
        };
        (bridge, ticks)
    }

    /// Log in. Returns whether the bridge is now ready.
    pub async fn login(&self) -> bool {
        let _gate = self.fetch_gate.lock().await;
        self.scheduler.stop();
        let ready = self.session.login(&self.api).await;
        self.scheduler.start();
        ready
    }

    /// Fetch the device list and announce what changed.
    pub async fn refresh(&self) -> PollOutcome {
        let _gate = self.fetch_gate.lock().await;

        let Some(session) = self.session.session().await else {
            tracing::debug!(device_id = %self.device_id, "Not logged in, skipping refresh");
            self.scheduler.start();
            return PollOutcome::NotReady;
        };

        self.scheduler.stop();
        let result = self.api.devices(&session).await;
        self.scheduler.start();

        let devices = match result {
            Ok(devices) => devices,
            Err(e) => {
                tracing::error!(device_id = %self.device_id, error = %e, "Failed to fetch devices");
                self.session.invalidate().await;
                return PollOutcome::Failed;
            }
        };

        if devices.is_empty() {
            tracing::warn!(device_id = %self.device_id, "No devices on account");
            return PollOutcome::DeviceMissing;
        }

        let Some(record) = devices.into_iter().find(|d| d.id == self.device_id) else {
            tracing::warn!(device_id = %self.device_id, "Device not found on account");
            return PollOutcome::DeviceMissing;
        };

        let changes = {
            let mut state = self.state.lock().await;
            let changes = state.translator.apply(&record.status);
            state.status = Some(record.status);
            changes
        };

        for change in &changes {
            self.sink.publish(change);
        }

        tracing::debug!(
            device_id = %self.device_id,
            changes = changes.len(),
            "Device status refreshed"
        );
        PollOutcome::Updated(changes.len())
    }

    async fn dispatch(&self, command: &DeviceCommand) -> Result<(), CommandError> {
        let _gate = self.fetch_gate.lock().await;

        let Some(session) = self.session.session().await else {
            tracing::debug!(device_id = %self.device_id, %command, "Not logged in, dropping command");
            self.scheduler.start();
            return Err(CommandError::NotReady);
        };

        tracing::info!(device_id = %self.device_id, %command, "Sending command");

        self.scheduler.stop();
        let result = self
            .api
            .send_command(&session, &self.device_id, command)
            .await;
        self.scheduler.start();

        match result {
            Ok(reply) if reply.is_ok() => Ok(()),
            Ok(reply) => {
                tracing::warn!(
                    device_id = %self.device_id,
                    %command,
                    reply = %reply.body,
                    "Command rejected"
                );
                Err(CommandError::Rejected(reply.body.to_string()))
            }
            Err(e) => {
                tracing::error!(device_id = %self.device_id, %command, error = %e, "Command failed");
                self.session.invalidate().await;
                Err(CommandError::Transport(e.to_string()))
            }
        }
    }

    /// Store a written value and announce it if it changed.
    async fn commit(&self, change: CapabilityChange, key: &str, value: &str) {
        let announced = {
            let mut state = self.state.lock().await;
            if let Some(status) = state.status.as_mut() {
                status.set(key, value);
            }
            state.translator.record(change)
        };

        if let Some(change) = announced {
            tracing::info!(device_id = %self.device_id, ?change, "Changing capability");
            self.sink.publish(&change);
        }
    }

    /// Switch the heater on or off.
    ///
    /// # Errors
    ///
    /// Returns error if not ready, rejected, or the request failed.
    pub async fn set_active(&self, active: bool) -> Result<(), CommandError> {
        let command = DeviceCommand::power(active);
        self.dispatch(&command).await?;
        self.commit(
            CapabilityChange::Active(Active::from(active)),
            KEY_POWER,
            &command.value,
        )
        .await;
        Ok(())
    }

    /// Select auto or heat mode.
    ///
    /// # Errors
    ///
    /// Returns error if not ready, rejected, or the request failed.
    pub async fn set_target_state(
        &self,
        target: TargetHeaterCoolerState,
    ) -> Result<(), CommandError> {
        let command = DeviceCommand::mode(target);
        self.dispatch(&command).await?;
        self.commit(
            CapabilityChange::TargetHeaterCoolerState(target),
            KEY_MODE,
            &command.value,
        )
        .await;
        Ok(())
    }

    /// Set the target temperature, clamped into the configured range.
    ///
    /// Returns the value actually sent.
    ///
    /// # Errors
    ///
    /// Returns error if not ready, rejected, or the request failed.
    pub async fn set_target_temperature(&self, value: f64) -> Result<f64, CommandError> {
        let (command, clamped) = DeviceCommand::target_temperature(value, self.range);
        self.dispatch(&command).await?;
        self.commit(
            CapabilityChange::TargetTemperature(clamped),
            KEY_TARGET_SHOWERS,
            &command.value,
        )
        .await;
        Ok(clamped)
    }

    /// Heating threshold write; same as [`Self::set_target_temperature`].
    ///
    /// # Errors
    ///
    /// See [`Self::set_target_temperature`].
    pub async fn set_heating_threshold_temperature(&self, value: f64) -> Result<f64, CommandError> {
        self.set_target_temperature(value).await
    }

    /// Cooling threshold write; same as [`Self::set_target_temperature`].
    ///
    /// # Errors
    ///
    /// See [`Self::set_target_temperature`].
    pub async fn set_cooling_threshold_temperature(&self, value: f64) -> Result<f64, CommandError> {
        self.set_target_temperature(value).await
    }

    /// Current standardized state.
    ///
    /// Reads through the loaded status, falling back to the last announced
    /// values where a field is missing or no status is loaded.
    pub async fn view(&self) -> StandardizedState {
        let state = self.state.lock().await;
        state.translator.view(state.status.as_ref())
    }

    /// Loaded status snapshot, if any.
    pub async fn status(&self) -> Option<DeviceStatus> {
        self.state.lock().await.status.clone()
    }

    /// Power state.
    pub async fn active(&self) -> Active {
        self.view().await.active
    }

    /// Current temperature.
    pub async fn current_temperature(&self) -> f64 {
        self.view().await.current_temperature
    }

    /// Target temperature.
    pub async fn target_temperature(&self) -> f64 {
        self.view().await.target_temperature
    }

    /// Heater activity.
    pub async fn current_state(&self) -> CurrentHeaterCoolerState {
        self.view().await.current_heater_cooler_state
    }

    /// Requested mode.
    pub async fn target_state(&self) -> TargetHeaterCoolerState {
        self.view().await.target_heater_cooler_state
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Accessory metadata.
    #[must_use]
    pub fn accessory_info(&self) -> &AccessoryInfo {
        &self.info
    }

    /// Target temperature bounds.
    #[must_use]
    pub fn range(&self) -> TemperatureRange {
        self.range
    }

    /// Followed device id.
    #[must_use]
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Whether a session is held.
    pub async fn is_ready(&self) -> bool {
        self.session.is_ready().await
    }

    /// Poll timer handle.
    #[must_use]
    pub fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }
}

impl<A, S> Bridge<A, S>
where
    A: WaterHeaterApi + 'static,
    S: CapabilitySink + 'static,
{
    /// Log in, poll once, then poll on every tick until the timer is gone.
    ///
    /// The login-retry supervisor runs alongside on its own task.
    pub async fn run(self: Arc<Self>, mut ticks: PollTicks, retry: RetryPolicy) {
        tracing::info!(
            device_id = %self.device_id,
            interval = ?self.scheduler.interval(),
            "Starting bridge"
        );

        if self.login().await {
            self.refresh().await;
        }

        let supervisor = LoginRetrySupervisor::new(Arc::clone(&self), retry);
        tokio::spawn(supervisor.run());

        while ticks.tick().await {
            self.refresh().await;
        }
    }
}

#[async_trait]
impl<A: WaterHeaterApi, S: CapabilitySink> Reauthenticate for Bridge<A, S> {
    async fn is_ready(&self) -> bool {
        self.session.is_ready().await
    }

    async fn reauthenticate(&self) -> bool {
        self.login().await
    }
}

impl<A, S> std::fmt::Debug for Bridge<A, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("device_id", &self.device_id)
            .field("info", &self.info)
            .field("range", &self.range)
            .field("scheduler_started", &self.scheduler.is_started())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tesy_bridge_adapter_tesy::{ClientError, CommandReply, DeviceRecord, Session};
    use tesy_bridge_core::status::{KEY_CURRENT_SHOWERS, KEY_HEATER_STATE};

    #[derive(Default)]
    struct FakeApi {
        login_ok: AtomicBool,
        devices: std::sync::Mutex<Option<Vec<DeviceRecord>>>,
        reply: std::sync::Mutex<Option<Value>>,
        sent: std::sync::Mutex<Vec<DeviceCommand>>,
        logins: AtomicUsize,
        fetches: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        scheduler: std::sync::Mutex<Option<PollScheduler>>,
        started_during_call: AtomicBool,
    }

    impl FakeApi {
        async fn enter(&self) {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if let Some(scheduler) = self.scheduler.lock().unwrap().as_ref() {
                if scheduler.is_started() {
                    self.started_during_call.store(true, Ordering::SeqCst);
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        fn leave(&self) {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl WaterHeaterApi for FakeApi {
        async fn login(&self, _credentials: &Credentials) -> Result<Session, ClientError> {
            self.logins.fetch_add(1, Ordering::SeqCst);
            self.enter().await;
            self.leave();
            if self.login_ok.load(Ordering::SeqCst) {
                Session::new("php", "alt", "sess")
            } else {
                Err(ClientError::ApiError {
                    status: 401,
                    message: "denied".to_string(),
                })
            }
        }

        async fn devices(&self, _session: &Session) -> Result<Vec<DeviceRecord>, ClientError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.enter().await;
            self.leave();
            self.devices
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| ClientError::Request("connection reset".to_string()))
        }

        async fn send_command(
            &self,
            _session: &Session,
            _device_id: &str,
            command: &DeviceCommand,
        ) -> Result<CommandReply, ClientError> {
            self.sent.lock().unwrap().push(command.clone());
            self.enter().await;
            self.leave();
            self.reply
                .lock()
                .unwrap()
                .clone()
                .map(|body| CommandReply { body })
                .ok_or_else(|| ClientError::ApiError {
                    status: 500,
                    message: String::new(),
                })
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        changes: std::sync::Mutex<Vec<CapabilityChange>>,
    }

    impl CapabilitySink for RecordingSink {
        fn publish(&self, change: &CapabilityChange) {
            self.changes.lock().unwrap().push(*change);
        }
    }

    impl RecordingSink {
        fn take(&self) -> Vec<CapabilityChange> {
            std::mem::take(&mut *self.changes.lock().unwrap())
        }
    }

    fn record(
        id: &str,
        power: &str,
        cur: &str,
        target: &str,
        mode: &str,
        heater: &str,
    ) -> DeviceRecord {
        DeviceRecord {
            id: id.to_string(),
            status: [
                (KEY_POWER, power),
                (KEY_CURRENT_SHOWERS, cur),
                (KEY_TARGET_SHOWERS, target),
                (KEY_MODE, mode),
                (KEY_HEATER_STATE, heater),
            ]
            .into_iter()
            .collect(),
        }
    }

    type TestBridge = Bridge<Arc<FakeApi>, Arc<RecordingSink>>;

    fn bridge() -> (Arc<TestBridge>, Arc<FakeApi>, Arc<RecordingSink>, PollTicks) {
        let api = Arc::new(FakeApi::default());
        api.login_ok.store(true, Ordering::SeqCst);
        *api.devices.lock().unwrap() = Some(vec![record("42", "on", "2", "3", "1", "ready")]);
        *api.reply.lock().unwrap() = Some(json!({"stat": "ok"}));

        let sink = Arc::new(RecordingSink::default());
        let settings = BridgeSettings {
            device_id: "42".to_string(),
            credentials: Credentials::new("alice", "s3cret"),
            info: AccessoryInfo::default(),
            range: TemperatureRange::new(0.0, 4.0).unwrap(),
            poll_interval: Duration::from_secs(30),
        };
        let (bridge, ticks) = Bridge::new(settings, api.clone(), sink.clone());
        *api.scheduler.lock().unwrap() = Some(bridge.scheduler().clone());
        (Arc::new(bridge), api, sink, ticks)
    }

    #[tokio::test]
    async fn login_brackets_and_readies() {
        let (bridge, api, _, _) = bridge();

        assert!(!bridge.scheduler().is_started());
        assert!(bridge.login().await);
        assert!(bridge.is_ready().await);
        assert!(bridge.scheduler().is_started());
        assert!(!api.started_during_call.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn failed_login_still_restarts_scheduler() {
        let (bridge, api, _, _) = bridge();
        api.login_ok.store(false, Ordering::SeqCst);

        assert!(!bridge.login().await);
        assert!(!bridge.is_ready().await);
        assert!(bridge.scheduler().is_started());
    }

    #[tokio::test]
    async fn first_refresh_announces_all_changes() {
        let (bridge, api, sink, _) = bridge();
        bridge.login().await;

        assert_eq!(bridge.refresh().await, PollOutcome::Updated(5));
        assert!(!api.started_during_call.load(Ordering::SeqCst));
        assert!(bridge.scheduler().is_started());

        assert_eq!(bridge.active().await, Active::Active);
        assert!((bridge.current_temperature().await - 2.0).abs() < f64::EPSILON);
        assert!((bridge.target_temperature().await - 3.0).abs() < f64::EPSILON);
        assert_eq!(bridge.current_state().await, CurrentHeaterCoolerState::Idle);
        assert_eq!(bridge.target_state().await, TargetHeaterCoolerState::Heat);
        assert_eq!(sink.take().len(), 5);

        assert_eq!(bridge.refresh().await, PollOutcome::Updated(0));
        assert!(sink.take().is_empty());
    }

    #[tokio::test]
    async fn refresh_without_session_makes_no_call() {
        let (bridge, api, _, _) = bridge();

        assert_eq!(bridge.refresh().await, PollOutcome::NotReady);
        assert_eq!(api.fetches.load(Ordering::SeqCst), 0);
        assert!(bridge.scheduler().is_started());
    }

    #[tokio::test]
    async fn failed_refresh_invalidates_session() {
        let (bridge, api, _, _) = bridge();
        bridge.login().await;
        *api.devices.lock().unwrap() = None;

        assert_eq!(bridge.refresh().await, PollOutcome::Failed);
        assert!(!bridge.is_ready().await);
        assert!(bridge.scheduler().is_started());
    }

    #[tokio::test]
    async fn missing_device_keeps_session() {
        let (bridge, api, sink, _) = bridge();
        bridge.login().await;

        *api.devices.lock().unwrap() = Some(Vec::new());
        assert_eq!(bridge.refresh().await, PollOutcome::DeviceMissing);

        *api.devices.lock().unwrap() = Some(vec![record("7", "on", "2", "3", "1", "ready")]);
        assert_eq!(bridge.refresh().await, PollOutcome::DeviceMissing);

        assert!(bridge.is_ready().await);
        assert!(sink.take().is_empty());
        assert!(bridge.status().await.is_none());
    }

    #[tokio::test]
    async fn getters_before_first_poll_are_defaults() {
        let (bridge, _, _, _) = bridge();

        assert_eq!(bridge.active().await, Active::Inactive);
        assert_eq!(bridge.current_state().await, CurrentHeaterCoolerState::Inactive);
        assert_eq!(bridge.target_state().await, TargetHeaterCoolerState::Auto);
        assert!((bridge.target_temperature().await - 4.0).abs() < f64::EPSILON);
        assert_eq!(bridge.name(), "Water Heater");
        assert_eq!(bridge.accessory_info().manufacturer, "Tesy");
    }

    #[tokio::test]
    async fn command_when_not_ready() {
        let (bridge, api, _, _) = bridge();

        assert_eq!(bridge.set_active(true).await, Err(CommandError::NotReady));
        assert!(api.sent.lock().unwrap().is_empty());
        assert!(bridge.scheduler().is_started());
    }

    #[tokio::test]
    async fn temperature_is_clamped_and_stored() {
        let (bridge, api, sink, _) = bridge();
        bridge.login().await;
        bridge.refresh().await;
        sink.take();

        let sent = bridge.set_target_temperature(10.0).await.unwrap();

        assert!((sent - 4.0).abs() < f64::EPSILON);
        assert_eq!(
            api.sent.lock().unwrap().last().map(ToString::to_string),
            Some("tmpT=4".to_string())
        );
        assert_eq!(
            bridge.status().await.unwrap().get(KEY_TARGET_SHOWERS),
            Some("4")
        );
        assert!((bridge.target_temperature().await - 4.0).abs() < f64::EPSILON);
        assert_eq!(sink.take(), vec![CapabilityChange::TargetTemperature(4.0)]);
        assert!(!api.started_during_call.load(Ordering::SeqCst));

        // the next poll reporting the written value is silent
        *api.devices.lock().unwrap() = Some(vec![record("42", "on", "2", "4", "1", "ready")]);
        assert_eq!(bridge.refresh().await, PollOutcome::Updated(0));
    }

    #[tokio::test]
    async fn threshold_aliases_send_target_temperature() {
        let (bridge, api, _, _) = bridge();
        bridge.login().await;

        bridge.set_heating_threshold_temperature(-1.0).await.unwrap();
        bridge.set_cooling_threshold_temperature(2.5).await.unwrap();

        let sent: Vec<String> = api
            .sent
            .lock()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(sent, vec!["tmpT=0", "tmpT=2.5"]);
    }

    #[tokio::test]
    async fn mode_and_power_commands() {
        let (bridge, api, sink, _) = bridge();
        bridge.login().await;
        bridge.refresh().await;
        sink.take();

        bridge.set_target_state(TargetHeaterCoolerState::Auto).await.unwrap();
        bridge.set_active(false).await.unwrap();

        let sent: Vec<String> = api
            .sent
            .lock()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(sent, vec!["mode=5", "power_sw=off"]);
        assert_eq!(bridge.target_state().await, TargetHeaterCoolerState::Auto);
        assert_eq!(bridge.active().await, Active::Inactive);
        assert_eq!(
            sink.take(),
            vec![
                CapabilityChange::TargetHeaterCoolerState(TargetHeaterCoolerState::Auto),
                CapabilityChange::Active(Active::Inactive),
            ]
        );
    }

    #[tokio::test]
    async fn rejected_command_keeps_session() {
        let (bridge, api, sink, _) = bridge();
        bridge.login().await;
        *api.reply.lock().unwrap() = Some(json!({"stat": "fail"}));

        let result = bridge.set_active(true).await;

        assert!(matches!(result, Err(CommandError::Rejected(_))));
        assert!(bridge.is_ready().await);
        assert!(bridge.scheduler().is_started());
        assert!(sink.take().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_invalidates_session() {
        let (bridge, api, _, _) = bridge();
        bridge.login().await;
        *api.reply.lock().unwrap() = None;

        let result = bridge.set_target_state(TargetHeaterCoolerState::Heat).await;

        assert!(matches!(result, Err(CommandError::Transport(_))));
        assert!(!bridge.is_ready().await);
        assert!(bridge.scheduler().is_started());
    }

    #[tokio::test]
    async fn concurrent_fetches_never_overlap() {
        let (bridge, api, _, _) = bridge();
        bridge.login().await;

        let tasks: Vec<_> = (0..4)
            .map(|i| {
                let bridge = Arc::clone(&bridge);
                tokio::spawn(async move {
                    if i % 2 == 0 {
                        bridge.refresh().await;
                    } else {
                        let _ = bridge.set_target_temperature(f64::from(i)).await;
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(api.max_in_flight.load(Ordering::SeqCst), 1);
        assert!(!api.started_during_call.load(Ordering::SeqCst));
        assert!(bridge.scheduler().is_started());
    }

    #[tokio::test(start_paused = true)]
    async fn run_polls_on_every_interval() {
        let (bridge, api, _, ticks) = bridge();

        let runner = tokio::spawn(Arc::clone(&bridge).run(ticks, RetryPolicy::default()));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(api.logins.load(Ordering::SeqCst), 1);
        assert_eq!(api.fetches.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(api.fetches.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(api.fetches.load(Ordering::SeqCst), 3);
        assert!(!api.started_during_call.load(Ordering::SeqCst));

        runner.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn supervisor_recovers_lost_session() {
        let (bridge, api, _, ticks) = bridge();
        api.login_ok.store(false, Ordering::SeqCst);

        let retry = RetryPolicy {
            interval: Duration::from_secs(300),
            max_attempts: 100,
        };
        let runner = tokio::spawn(Arc::clone(&bridge).run(ticks, retry));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!bridge.is_ready().await);
        assert_eq!(api.fetches.load(Ordering::SeqCst), 0);

        api.login_ok.store(true, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert!(bridge.is_ready().await);
        assert_eq!(api.logins.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(api.fetches.load(Ordering::SeqCst) >= 1);

        runner.abort();
    }
}
