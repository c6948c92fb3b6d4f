//! Engine configuration loaded from defaults, an optional file, and env vars.

use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::policy::{EscalationPolicy, PolicyError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid escalation policy: {0}")]
    Policy(#[from] PolicyError),
}

/// Tunables for the whole engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds a lead may wait before the response counts as out of target.
    pub sla_seconds: u64,
    pub policy: EscalationPolicy,
    /// How long finished alerts stay readable after their last transition.
    pub store_grace_seconds: u64,
    pub gateway_timeout_ms: u64,
    pub directory_timeout_ms: u64,
    pub send_retries: u32,
    pub retry_backoff_ms: u64,
    /// Minimum response window granted after the final tier fires.
    pub expiry_margin_seconds: u64,
    /// Escalation worker tasks draining the tick queue.
    pub workers: usize,
    pub bind_addr: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            sla_seconds: 120,
            policy: EscalationPolicy::default(),
            store_grace_seconds: 3600,
            gateway_timeout_ms: 3000,
            directory_timeout_ms: 2000,
            send_retries: 1,
            retry_backoff_ms: 2000,
            expiry_margin_seconds: 60,
            workers: 2,
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

impl EngineConfig {
    /// Layered load: built-in defaults, then `alert-engine.toml` if present,
    /// then `ALERT_ENGINE__*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Config::try_from(&EngineConfig::default())?;
        let merged = Config::builder()
            .add_source(defaults)
            .add_source(File::with_name("alert-engine").required(false))
            .add_source(Environment::with_prefix("ALERT_ENGINE").separator("__"))
            .build()?;
        let config: EngineConfig = merged.try_deserialize()?;
        config.policy.validate()?;
        Ok(config)
    }

    pub fn sla(&self) -> Duration {
        Duration::from_secs(self.sla_seconds)
    }

    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_millis(self.gateway_timeout_ms)
    }

    pub fn directory_timeout(&self) -> Duration {
        Duration::from_millis(self.directory_timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn expiry_margin(&self) -> Duration {
        Duration::from_secs(self.expiry_margin_seconds)
    }

    /// Store TTL covering the full escalation span plus the read-back grace.
    pub fn store_ttl(&self) -> Duration {
        Duration::from_secs(
            self.sla_seconds
                + self.policy.span_seconds()
                + self.expiry_margin_seconds
                + self.store_grace_seconds,
        )
    }
}
