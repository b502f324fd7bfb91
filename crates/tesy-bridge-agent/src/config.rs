//! Bridge configuration.

use crate::bridge::BridgeSettings;
use crate::scheduler::DEFAULT_POLL_INTERVAL;
use crate::supervisor::RetryPolicy;
use std::str::FromStr;
use std::time::Duration;
use tesy_bridge_adapter_tesy::{Credentials, TesyClientConfig};
use tesy_bridge_core::{AccessoryInfo, TemperatureRange};

/// Default MQTT broker.
pub const DEFAULT_MQTT_BROKER: &str = "tcp://localhost:1883";
/// Default bus topic prefix.
pub const DEFAULT_TOPIC_PREFIX: &str = "tesy";

/// Full bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Device, account and polling settings
    pub bridge: BridgeSettings,

    /// Vendor HTTP client configuration
    pub client: TesyClientConfig,

    /// Login retry policy
    pub retry: RetryPolicy,

    /// Automation bus configuration
    pub bus: BusConfig,
}

/// Automation bus configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    /// MQTT broker URL
    pub mqtt_broker: String,

    /// Topic prefix
    pub topic_prefix: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            mqtt_broker: DEFAULT_MQTT_BROKER.to_string(),
            topic_prefix: DEFAULT_TOPIC_PREFIX.to_string(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `TESY_DEVICE_ID`, `TESY_USERNAME`, `TESY_PASSWORD`: required
    /// - `TESY_NAME`, `TESY_MANUFACTURER`, `TESY_MODEL`, `TESY_SERIAL_NUMBER`
    /// - `TESY_POLL_INTERVAL_SECS`: poll interval (default 30)
    /// - `TESY_MIN_TEMP` / `TESY_MAX_TEMP`: target bounds (default 0 / 4)
    /// - `TESY_LOGIN_RETRY_INTERVAL_SECS`: retry interval (default 300)
    /// - `TESY_MAX_LOGIN_ATTEMPTS`: retry budget (default 100)
    /// - `TESY_BASE_URL`: vendor API base
    /// - `TESY_HTTP_TIMEOUT_SECS`: request timeout (default 30)
    /// - `TESY_MQTT_BROKER`: MQTT broker URL
    /// - `TESY_TOPIC_PREFIX`: bus topic prefix
    ///
    /// # Errors
    ///
    /// Returns error if a required variable is missing or a value is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through a variable lookup.
    ///
    /// Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns error if a required variable is missing or a value is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let required = |var: &'static str| get(var).ok_or(ConfigError::Missing(var));

        let device_id = required("TESY_DEVICE_ID")?;
        let username = required("TESY_USERNAME")?;
        let password = required("TESY_PASSWORD")?;

        let defaults = AccessoryInfo::default();
        let info = AccessoryInfo {
            name: get("TESY_NAME").unwrap_or(defaults.name),
            manufacturer: get("TESY_MANUFACTURER").unwrap_or(defaults.manufacturer),
            model: get("TESY_MODEL").unwrap_or(defaults.model),
            serial_number: get("TESY_SERIAL_NUMBER").unwrap_or(defaults.serial_number),
        };

        let default_range = TemperatureRange::default();
        let min = parse_or(&get, "TESY_MIN_TEMP", default_range.min())?;
        let max = parse_or(&get, "TESY_MAX_TEMP", default_range.max())?;
        let range = TemperatureRange::new(min, max).map_err(|e| ConfigError::Invalid {
            var: "TESY_MIN_TEMP",
            reason: e.to_string(),
        })?;

        let poll_interval = seconds_or(&get, "TESY_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL)?;

        let default_retry = RetryPolicy::default();
        let retry = RetryPolicy {
            interval: seconds_or(
                &get,
                "TESY_LOGIN_RETRY_INTERVAL_SECS",
                default_retry.interval,
            )?,
            max_attempts: parse_or(&get, "TESY_MAX_LOGIN_ATTEMPTS", default_retry.max_attempts)?,
        };

        let default_client = TesyClientConfig::default();
        let client = TesyClientConfig {
            base_url: get("TESY_BASE_URL").unwrap_or(default_client.base_url),
            timeout: seconds_or(&get, "TESY_HTTP_TIMEOUT_SECS", default_client.timeout)?,
        };

        let default_bus = BusConfig::default();
        let bus = BusConfig {
            mqtt_broker: get("TESY_MQTT_BROKER").unwrap_or(default_bus.mqtt_broker),
            topic_prefix: get("TESY_TOPIC_PREFIX").unwrap_or(default_bus.topic_prefix),
        };

        Ok(Self {
            bridge: BridgeSettings {
                device_id,
                credentials: Credentials::new(username, password),
                info,
                range,
                poll_interval,
            },
            client,
            retry,
            bus,
        })
    }
}

fn parse_or<T, G>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: format!("{raw:?}: {e}"),
        }),
    }
}

fn seconds_or<G>(get: &G, var: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let secs: u64 = parse_or(get, var, default.as_secs())?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            var,
            reason: "must be at least 1 second".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

/// Errors for configuration loading.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Required variable unset or empty
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    /// Variable set to an unusable value
    #[error("invalid {var}: {reason}")]
    Invalid {
        /// Variable name
        var: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<BridgeConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        BridgeConfig::from_lookup(|var| vars.get(var).cloned())
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("TESY_DEVICE_ID", "12345"),
        ("TESY_USERNAME", "alice@example.com"),
        ("TESY_PASSWORD", "s3cret"),
    ];

    #[test]
    fn defaults() {
        let config = load(&REQUIRED).unwrap();

        assert_eq!(config.bridge.device_id, "12345");
        assert_eq!(config.bridge.credentials.username, "alice@example.com");
        assert_eq!(config.bridge.credentials.password.expose_secret(), "s3cret");
        assert_eq!(config.bridge.info, AccessoryInfo::default());
        assert_eq!(config.bridge.range, TemperatureRange::default());
        assert_eq!(config.bridge.poll_interval, Duration::from_secs(30));
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.client.base_url, "https://www.mytesy.com/v3/");
        assert_eq!(config.client.timeout, Duration::from_secs(30));
        assert_eq!(config.bus, BusConfig::default());
    }

    #[test]
    fn missing_required() {
        let result = load(&REQUIRED[..2]);
        assert_eq!(result.unwrap_err(), ConfigError::Missing("TESY_PASSWORD"));

        let mut vars = REQUIRED.to_vec();
        vars[0].1 = "  ";
        assert_eq!(
            load(&vars).unwrap_err(),
            ConfigError::Missing("TESY_DEVICE_ID")
        );
    }

    #[test]
    fn overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("TESY_NAME", "Boiler"),
            ("TESY_POLL_INTERVAL_SECS", "10"),
            ("TESY_MIN_TEMP", "1"),
            ("TESY_MAX_TEMP", "3.5"),
            ("TESY_LOGIN_RETRY_INTERVAL_SECS", "60"),
            ("TESY_MAX_LOGIN_ATTEMPTS", "5"),
            ("TESY_MQTT_BROKER", "mqtt://broker:1884"),
            ("TESY_TOPIC_PREFIX", "home"),
        ]);

        let config = load(&vars).unwrap();

        assert_eq!(config.bridge.info.name, "Boiler");
        assert_eq!(config.bridge.info.model, "Model");
        assert_eq!(config.bridge.poll_interval, Duration::from_secs(10));
        assert_eq!(config.bridge.range, TemperatureRange::new(1.0, 3.5).unwrap());
        assert_eq!(config.retry.interval, Duration::from_secs(60));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.bus.mqtt_broker, "mqtt://broker:1884");
        assert_eq!(config.bus.topic_prefix, "home");
    }

    #[test]
    fn invalid_values() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("TESY_MAX_LOGIN_ATTEMPTS", "many"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { var: "TESY_MAX_LOGIN_ATTEMPTS", .. })
        ));

        let mut vars = REQUIRED.to_vec();
        vars.push(("TESY_POLL_INTERVAL_SECS", "0"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { var: "TESY_POLL_INTERVAL_SECS", .. })
        ));

        let mut vars = REQUIRED.to_vec();
        vars.extend([("TESY_MIN_TEMP", "5"), ("TESY_MAX_TEMP", "4")]);
        assert!(matches!(load(&vars), Err(ConfigError::Invalid { .. })));
    }
}
