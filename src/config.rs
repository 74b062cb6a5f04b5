use crate::error::ConfigError;
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;

/// Upper bound on `interval`; keeps every slot representable on the wall clock
pub const MAX_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Timing parameters for the queue and its dispatcher.
///
/// `interval` is fixed once the queue is built.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchConfig {
    /// Spacing between consecutive dispatch slots
    pub interval: Duration,
    /// Longest the dispatcher sleeps before re-checking for stop
    pub poll_interval: Duration,
    pub actuator_timeout: Duration,
    pub notify_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(20),
            poll_interval: Duration::from_millis(500),
            actuator_timeout: Duration::from_secs(5),
            notify_timeout: Duration::from_secs(2),
        }
    }
}

impl DispatchConfig {
    /// Defaults around `interval`. The notify timeout is capped at half the
    /// interval so one announcement is settled before the next slot.
    pub fn with_interval(interval: Duration) -> Self {
        let defaults = Self::default();
        Self {
            interval,
            notify_timeout: defaults.notify_timeout.min(interval / 2),
            ..defaults
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::invalid("interval", "must be positive"));
        }
        if self.interval > MAX_INTERVAL {
            return Err(ConfigError::invalid("interval", "must be at most 24h"));
        }
        if self.poll_interval.is_zero() || self.poll_interval > Duration::from_secs(1) {
            return Err(ConfigError::invalid("poll_interval", "must be between 0 and 1s"));
        }
        if self.actuator_timeout.is_zero() {
            return Err(ConfigError::invalid("actuator_timeout", "must be positive"));
        }
        if self.notify_timeout.is_zero() {
            return Err(ConfigError::invalid("notify_timeout", "must be positive"));
        }
        if self.notify_timeout >= self.interval {
            return Err(ConfigError::invalid(
                "notify_timeout",
                "must be shorter than interval",
            ));
        }
        Ok(())
    }

    /// Read from a JSON object; missing keys keep their defaults.
    ///
    /// Keys: `interval_secs`, `poll_interval_ms`, `actuator_timeout_secs`,
    /// `notify_timeout_secs`.
    pub fn from_json(config: &Value) -> Result<Self, ConfigError> {
        let mut out = Self::default();

        if let Some(secs) = config["interval_secs"].as_f64() {
            out.interval = secs_to_duration("interval_secs", secs)?;
        }
        if let Some(ms) = config["poll_interval_ms"].as_u64() {
            out.poll_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = config["actuator_timeout_secs"].as_f64() {
            out.actuator_timeout = secs_to_duration("actuator_timeout_secs", secs)?;
        }
        if let Some(secs) = config["notify_timeout_secs"].as_f64() {
            out.notify_timeout = secs_to_duration("notify_timeout_secs", secs)?;
        }

        out.validate()?;
        Ok(out)
    }

    /// Read `PACELIGHT_INTERVAL_SECS`, `PACELIGHT_POLL_MS`,
    /// `PACELIGHT_ACTUATOR_TIMEOUT_SECS` and `PACELIGHT_NOTIFY_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut out = Self::default();

        if let Some(secs) = env_parse::<f64>("PACELIGHT_INTERVAL_SECS")? {
            out.interval = secs_to_duration("PACELIGHT_INTERVAL_SECS", secs)?;
        }
        if let Some(ms) = env_parse::<u64>("PACELIGHT_POLL_MS")? {
            out.poll_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = env_parse::<f64>("PACELIGHT_ACTUATOR_TIMEOUT_SECS")? {
            out.actuator_timeout = secs_to_duration("PACELIGHT_ACTUATOR_TIMEOUT_SECS", secs)?;
        }
        if let Some(secs) = env_parse::<f64>("PACELIGHT_NOTIFY_TIMEOUT_SECS")? {
            out.notify_timeout = secs_to_duration("PACELIGHT_NOTIFY_TIMEOUT_SECS", secs)?;
        }

        out.validate()?;
        Ok(out)
    }
}

fn secs_to_duration(key: &'static str, secs: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs).map_err(|e| ConfigError::invalid(key, e.to_string()))
}

/// Parse an environment variable; unset or empty yields `None`
pub(crate) fn env_parse<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Parse { key, value }),
        _ => Ok(None),
    }
}

pub(crate) fn env_bool(key: &'static str) -> Result<Option<bool>, ConfigError> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Some(true)),
            "false" | "0" | "no" => Ok(Some(false)),
            _ => Err(ConfigError::Parse { key, value }),
        },
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = DispatchConfig::default();
        assert_eq!(config.interval, Duration::from_secs(20));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json() {
        let config = DispatchConfig::from_json(&serde_json::json!({
            "interval_secs": 2.5,
            "poll_interval_ms": 100
        }))
        .unwrap();

        assert_eq!(config.interval, Duration::from_millis(2500));
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.actuator_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_from_json_rejects_bad_values() {
        assert!(DispatchConfig::from_json(&serde_json::json!({"interval_secs": 0.0})).is_err());
        assert!(DispatchConfig::from_json(&serde_json::json!({"interval_secs": -1.0})).is_err());
        assert!(DispatchConfig::from_json(&serde_json::json!({"poll_interval_ms": 5000})).is_err());
    }

    #[test]
    fn test_interval_upper_bound() {
        assert!(DispatchConfig::from_json(&serde_json::json!({"interval_secs": 1e13})).is_err());
        assert!(DispatchConfig::with_interval(MAX_INTERVAL).validate().is_ok());
        assert!(DispatchConfig::with_interval(MAX_INTERVAL + Duration::from_secs(1))
            .validate()
            .is_err());
    }

    #[test]
    fn test_notify_timeout_must_be_shorter_than_interval() {
        let config = DispatchConfig {
            interval: Duration::from_secs(1),
            notify_timeout: Duration::from_secs(2),
            ..DispatchConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key: "notify_timeout", .. })
        ));

        let err = DispatchConfig::from_json(&serde_json::json!({
            "interval_secs": 3.0,
            "notify_timeout_secs": 3.0
        }));
        assert!(err.is_err());
    }

    #[test]
    fn test_with_interval_caps_notify_timeout() {
        let short = DispatchConfig::with_interval(Duration::from_secs(1));
        assert_eq!(short.notify_timeout, Duration::from_millis(500));
        assert!(short.validate().is_ok());

        let long = DispatchConfig::with_interval(Duration::from_secs(20));
        assert_eq!(long.notify_timeout, Duration::from_secs(2));
    }
}
