use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunables for a face and its event loop. Every field has a default, so a configuration file only needs the values
/// it wants to change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceConfig {
    /// How often the event loop calls [`crate::Node::process_events`].
    pub process_events_interval_ms: u64,
    /// How often the event loop polls the predicate given to [`crate::ThreadsafeFace::stop_when`].
    pub stop_when_interval_ms: u64,
    /// Lifetime given to interests that don't carry one.
    pub default_interest_lifetime_ms: u64,
    /// Encoded interests, data and raw sends larger than this are refused.
    pub max_ndn_packet_size: usize,
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self {
            process_events_interval_ms: 10,
            stop_when_interval_ms: 500,
            default_interest_lifetime_ms: 4000,
            max_ndn_packet_size: 8800,
        }
    }
}

impl FaceConfig {
    /// Load the configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config = serde_yml::from_str(&contents)?;
        Ok(config)
    }

    pub fn process_events_interval(&self) -> Duration {
        Duration::from_millis(self.process_events_interval_ms)
    }

    pub fn stop_when_interval(&self) -> Duration {
        Duration::from_millis(self.stop_when_interval_ms)
    }

    pub fn default_interest_lifetime(&self) -> Duration {
        Duration::from_millis(self.default_interest_lifetime_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "stop_when_interval_ms: 50\nmax_ndn_packet_size: 1024").unwrap();
        let config = FaceConfig::load(file.path()).unwrap();
        assert_eq!(config.stop_when_interval(), Duration::from_millis(50));
        assert_eq!(config.max_ndn_packet_size, 1024);
        assert_eq!(config.process_events_interval(), Duration::from_millis(10));
        assert_eq!(config.default_interest_lifetime(), Duration::from_secs(4));
    }

    #[test]
    fn missing_and_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = FaceConfig::load(dir.path().join("nope.yml"));
        assert!(matches!(missing, Err(ConfigError::IoError(_))));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "stop_when_interval_ms: [not, a, number]").unwrap();
        assert!(matches!(FaceConfig::load(file.path()), Err(ConfigError::InvalidConfig(_))));
    }
}
