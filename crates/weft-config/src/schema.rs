//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub coroutine: CoroutineSection,

    #[serde(default)]
    pub channel: ChannelSection,

    #[serde(default)]
    pub backend: BackendSection,

    #[serde(default)]
    pub worker: WorkerSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

/// Coroutine stepping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoroutineSection {
    /// How long a single resume may run before it is reported as a deadlock.
    #[serde(default = "default_resume_deadline_ms")]
    pub resume_deadline_ms: u64,
}

impl CoroutineSection {
    pub fn resume_deadline(&self) -> Duration {
        Duration::from_millis(self.resume_deadline_ms)
    }
}

impl Default for CoroutineSection {
    fn default() -> Self {
        Self {
            resume_deadline_ms: default_resume_deadline_ms(),
        }
    }
}

fn default_resume_deadline_ms() -> u64 {
    2000
}

/// Channel defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelSection {
    /// Buffer size for channels created without an explicit capacity.
    #[serde(default)]
    pub default_capacity: usize,
}

/// Scheduling store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSection {
    /// SQLite database file. `~` is expanded by the loader.
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,

    /// How long a polled activity stays invisible to other workers.
    #[serde(default = "default_lease_secs")]
    pub lease_secs: u64,
}

impl BackendSection {
    pub fn lease(&self) -> Duration {
        Duration::from_secs(self.lease_secs)
    }
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            sqlite_path: default_sqlite_path(),
            lease_secs: default_lease_secs(),
        }
    }
}

fn default_sqlite_path() -> String {
    "~/.weft/weft.db".to_string()
}

fn default_lease_secs() -> u64 {
    30
}

/// Activity worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerSection {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl WorkerSection {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for WorkerSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    500
}

/// Log output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.coroutine.resume_deadline(), Duration::from_secs(2));
        assert_eq!(config.channel.default_capacity, 0);
        assert_eq!(config.backend.sqlite_path, "~/.weft/weft.db");
        assert_eq!(config.backend.lease(), Duration::from_secs(30));
        assert_eq!(config.worker.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [backend]
            lease_secs = 5
        "#,
        )
        .unwrap();
        assert_eq!(config.backend.lease_secs, 5);
        assert_eq!(config.backend.sqlite_path, "~/.weft/weft.db");
    }

    #[test]
    fn test_log_format_is_lowercase() {
        let config: Config = toml::from_str(
            r#"
            [logging]
            format = "json"
        "#,
        )
        .unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let mut config = Config::default();
        config.coroutine.resume_deadline_ms = 250;
        let text = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.coroutine.resume_deadline_ms, 250);
    }
}
