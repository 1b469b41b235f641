//! Environment-based configuration.

use std::time::Duration;

use thiserror::Error;

use meshrelay_orchestrator::FailoverPolicy;
use meshrelay_provider::{ProviderSettings, TierConfig};

/// Fatal configuration problem. Never echoes credential values.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
}

/// Everything the service reads from the environment, resolved once at
/// startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub provider: ProviderSettings,
    pub failover: FailoverPolicy,
    /// Upper bound on the decoded size of a submitted image.
    pub max_image_bytes: u64,
    /// Age past which job records are reaped.
    pub retention: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let provider = ProviderSettings {
            primary: TierConfig {
                base_url: require("MESHRELAY_PRIMARY_API_BASE")?,
                api_key: require("MESHRELAY_PRIMARY_API_KEY")?,
            },
            secondary: TierConfig {
                base_url: require("MESHRELAY_SECONDARY_API_BASE")?,
                api_key: require("MESHRELAY_SECONDARY_API_KEY")?,
            },
            call_timeout: Duration::from_millis(env_u64("MESHRELAY_PROVIDER_TIMEOUT_MS", 30_000)),
        };

        let failover = FailoverPolicy {
            threshold: Duration::from_millis(env_u64("MESHRELAY_FALLBACK_THRESHOLD_MS", 16_000)),
            disabled: env_flag("MESHRELAY_DISABLE_FALLBACK"),
        };

        if failover.disabled {
            tracing::warn!("failover disabled via MESHRELAY_DISABLE_FALLBACK");
        }

        Ok(Self {
            provider,
            failover,
            max_image_bytes: env_u64("MESHRELAY_MAX_IMAGE_BYTES", 3_000_000),
            retention: Duration::from_millis(env_u64("MESHRELAY_JOB_RETENTION_MS", 60 * 60 * 1000)),
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|v| v == "true" || v == "1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credentials_error_names_the_variable_not_the_value() {
        let err = ConfigError::Missing("MESHRELAY_PRIMARY_API_KEY");
        let rendered = err.to_string();
        assert!(rendered.contains("MESHRELAY_PRIMARY_API_KEY"));
    }
}
