//! Application configuration.

use crate::error::{AppError, AppResult};
use fuse_oracle::ProtocolConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix for environment overrides (`FUSE_EVENT_LOG`, `FUSE_OUTPUT_DIR`, ...).
pub const ENV_PREFIX: &str = "FUSE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// JSON Lines file of `{meta, event}` records in chain order.
    #[serde(default = "default_event_log")]
    pub event_log: PathBuf,
    /// Recorded contract call results (`{"calls": [...]}`).
    #[serde(default = "default_chain_state")]
    pub chain_state: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Snapshot file label. Today's UTC date when unset.
    #[serde(default)]
    pub snapshot_label: Option<String>,
    /// Entities buffered before each snapshot flush.
    #[serde(default = "default_snapshot_buffer")]
    pub snapshot_buffer: usize,
    #[serde(default)]
    pub protocol: ProtocolConfig,
}

fn default_event_log() -> PathBuf {
    PathBuf::from("data/events.jsonl")
}

fn default_chain_state() -> PathBuf {
    PathBuf::from("data/chain_state.json")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/snapshots")
}

fn default_snapshot_buffer() -> usize {
    1_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            event_log: default_event_log(),
            chain_state: default_chain_state(),
            output_dir: default_output_dir(),
            snapshot_label: None,
            snapshot_buffer: default_snapshot_buffer(),
            protocol: ProtocolConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists (defaults otherwise), then apply
    /// `FUSE_*` environment overrides.
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            Self::default()
        };

        let env = ::config::Config::builder()
            .add_source(::config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to read environment: {e}")))?;
        config.apply_overrides(&env);
        config.validate()?;
        Ok(config)
    }

    /// Overwrite path and label settings present in `overrides`.
    pub fn apply_overrides(&mut self, overrides: &::config::Config) {
        if let Ok(v) = overrides.get_string("event_log") {
            self.event_log = PathBuf::from(v);
        }
        if let Ok(v) = overrides.get_string("chain_state") {
            self.chain_state = PathBuf::from(v);
        }
        if let Ok(v) = overrides.get_string("output_dir") {
            self.output_dir = PathBuf::from(v);
        }
        if let Ok(v) = overrides.get_string("snapshot_label") {
            self.snapshot_label = Some(v);
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.snapshot_buffer == 0 {
            return Err(AppError::Config("snapshot_buffer must be positive".to_string()));
        }
        self.protocol
            .schedule()
            .map_err(|e| AppError::Config(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuse_oracle::Denomination;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.snapshot_label.is_none());
        assert_eq!(config.protocol.oracle_schedule.len(), 3);
    }

    #[test]
    fn test_partial_toml() {
        let toml_str = r#"
            event_log = "fixtures/events.jsonl"
            snapshot_label = "nightly"

            [protocol]
            [[protocol.oracle_schedule]]
            activation_block = 0
            oracle = "0x1887118e49e0f4a78bd71b792a49de03504a764d"
            convention = "market_address_scaled"
            denomination = "usd"
        "#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.event_log, PathBuf::from("fixtures/events.jsonl"));
        assert_eq!(config.output_dir, default_output_dir());
        assert_eq!(config.snapshot_label.as_deref(), Some("nightly"));
        assert_eq!(config.protocol.oracle_schedule.len(), 1);
        assert_eq!(config.protocol.oracle_schedule[0].denomination, Denomination::Usd);
        assert_eq!(config.protocol.base_asset.symbol, "ETH");
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("event_log"));
        assert!(toml_str.contains("oracle_schedule"));
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_overrides() {
        let overrides = ::config::Config::builder()
            .set_override("output_dir", "/tmp/out")
            .unwrap()
            .set_override("snapshot_label", "ci")
            .unwrap()
            .build()
            .unwrap();

        let mut config = AppConfig::default();
        config.apply_overrides(&overrides);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.snapshot_label.as_deref(), Some("ci"));
        assert_eq!(config.event_log, default_event_log());
    }

    #[test]
    fn test_invalid_schedule_rejected() {
        let mut config = AppConfig::default();
        config.protocol.oracle_schedule.clear();
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }
}
