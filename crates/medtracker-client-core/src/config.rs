use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::latency::{DEFAULT_LATENCY, SimulatedLatency};

pub const STATE_DIR_ENV: &str = "MEDTRACKER_STATE_DIR";
pub const LATENCY_MS_ENV: &str = "MEDTRACKER_LATENCY_MS";
pub const SEED_DEMO_DATA_ENV: &str = "MEDTRACKER_SEED_DEMO_DATA";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid MEDTRACKER_LATENCY_MS: {0}")]
    InvalidLatencyMs(String),
    #[error("invalid MEDTRACKER_SEED_DEMO_DATA: {0}")]
    InvalidSeedDemoData(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    /// Directory for the durable session blob. `None` keeps it in memory.
    pub state_dir: Option<PathBuf>,
    pub latency: SimulatedLatency,
    pub seed_demo_data: bool,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            state_dir: None,
            latency: SimulatedLatency::default(),
            seed_demo_data: true,
        }
    }
}

impl PortalConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let state_dir = read(STATE_DIR_ENV).map(PathBuf::from);

        let latency = match read(LATENCY_MS_ENV) {
            Some(raw) => {
                let millis = raw
                    .parse::<u64>()
                    .map_err(|error| ConfigError::InvalidLatencyMs(format!("{raw}: {error}")))?;
                SimulatedLatency::new(Duration::from_millis(millis))
            }
            None => SimulatedLatency::new(DEFAULT_LATENCY),
        };

        let seed_demo_data = match read(SEED_DEMO_DATA_ENV) {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::InvalidSeedDemoData(raw))?,
            None => true,
        };

        Ok(Self {
            state_dir,
            latency,
            seed_demo_data,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::latency::MAX_LATENCY;

    fn config(vars: &[(&str, &str)]) -> Result<PortalConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        PortalConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset_or_empty() {
        assert_eq!(config(&[]).expect("defaults"), PortalConfig::default());
        assert_eq!(
            config(&[(STATE_DIR_ENV, "  "), (LATENCY_MS_ENV, "")]).expect("empty"),
            PortalConfig::default()
        );
    }

    #[test]
    fn values_are_parsed_and_latency_is_clamped() {
        let parsed = config(&[
            (STATE_DIR_ENV, "/var/lib/medtracker"),
            (LATENCY_MS_ENV, "0"),
            (SEED_DEMO_DATA_ENV, "off"),
        ])
        .expect("valid");
        assert_eq!(parsed.state_dir, Some(PathBuf::from("/var/lib/medtracker")));
        assert_eq!(parsed.latency.delay(), Duration::ZERO);
        assert!(!parsed.seed_demo_data);

        let slow = config(&[(LATENCY_MS_ENV, "600000")]).expect("valid");
        assert_eq!(slow.latency.delay(), MAX_LATENCY);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            config(&[(LATENCY_MS_ENV, "fast")]),
            Err(ConfigError::InvalidLatencyMs(_))
        ));
        assert_eq!(
            config(&[(SEED_DEMO_DATA_ENV, "maybe")]),
            Err(ConfigError::InvalidSeedDemoData("maybe".to_string()))
        );
    }
}
