use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::{RetryPolicy, RetryableMarkers, DEFAULT_RETRYABLE_MARKERS};
use crate::stats::OrphanPolicy;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub initial_delay_ms: u64,
    /// Maximum backoff delay in milliseconds.
    pub max_delay_ms: u64,
    /// Growth factor per attempt (must be > 1).
    pub backoff_multiplier: f64,
    /// Case-insensitive substrings that mark an error as transient.
    #[serde(default = "default_markers")]
    pub retryable_markers: Vec<String>,
}

fn default_markers() -> Vec<String> {
    DEFAULT_RETRYABLE_MARKERS
        .iter()
        .map(|m| m.to_string())
        .collect()
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 10_000,
            backoff_multiplier: 2.0,
            retryable_markers: default_markers(),
        }
    }
}

impl RetryConfig {
    /// Build a validated policy from these values.
    pub fn to_policy(&self) -> Result<RetryPolicy> {
        let policy = RetryPolicy {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            backoff_multiplier: self.backoff_multiplier,
            retryable_markers: RetryableMarkers::new(&self.retryable_markers),
        };
        policy.validate()?;
        Ok(policy)
    }
}

/// Statistics options (optional section in config.toml).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatisticsConfig {
    /// How an individually targeted record counts a member that no longer exists.
    #[serde(default)]
    pub orphan_policy: OrphanPolicy,
}

/// Global configuration loaded from `~/.config/mcm/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McmConfig {
    /// Rows per page in list views.
    pub page_size: u32,
    /// Database file; defaults to `~/.local/state/mcm/club.db`.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    #[serde(default)]
    pub statistics: Option<StatisticsConfig>,
}

impl Default for McmConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            database_path: None,
            retry: None,
            statistics: None,
        }
    }
}

impl McmConfig {
    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        self.retry.clone().unwrap_or_default().to_policy()
    }

    pub fn orphan_policy(&self) -> OrphanPolicy {
        self.statistics
            .as_ref()
            .map(|s| s.orphan_policy)
            .unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mcm")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<McmConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = McmConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: McmConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = McmConfig::default();
        assert_eq!(cfg.page_size, 20);
        assert!(cfg.database_path.is_none());
        let policy = cfg.retry_policy().unwrap();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.initial_delay, Duration::from_millis(1000));
        assert_eq!(policy.max_delay, Duration::from_millis(10_000));
        assert_eq!(cfg.orphan_policy(), OrphanPolicy::CountAsOne);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = McmConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: McmConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.page_size, cfg.page_size);
        assert!(parsed.retry.is_none());
    }

    #[test]
    fn config_toml_retry_and_statistics() {
        let toml = r#"
            page_size = 50
            database_path = "/tmp/club.db"

            [retry]
            max_retries = 5
            initial_delay_ms = 200
            max_delay_ms = 3000
            backoff_multiplier = 1.5

            [statistics]
            orphan_policy = "count_as_zero"
        "#;
        let cfg: McmConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.page_size, 50);
        assert_eq!(cfg.database_path, Some(PathBuf::from("/tmp/club.db")));
        let retry = cfg.retry.as_ref().unwrap();
        assert_eq!(retry.max_retries, 5);
        assert_eq!(retry.retryable_markers.len(), DEFAULT_RETRYABLE_MARKERS.len());
        let policy = cfg.retry_policy().unwrap();
        assert_eq!(policy.delay(1), Duration::from_millis(300));
        assert_eq!(cfg.orphan_policy(), OrphanPolicy::CountAsZero);
    }

    #[test]
    fn invalid_multiplier_rejected() {
        let toml = r#"
            page_size = 10

            [retry]
            max_retries = 1
            initial_delay_ms = 100
            max_delay_ms = 1000
            backoff_multiplier = 0.5
        "#;
        let cfg: McmConfig = toml::from_str(toml).unwrap();
        assert!(cfg.retry_policy().is_err());
    }

    #[test]
    fn custom_markers_replace_defaults() {
        let toml = r#"
            page_size = 10

            [retry]
            max_retries = 1
            initial_delay_ms = 100
            max_delay_ms = 1000
            backoff_multiplier = 2.0
            retryable_markers = ["Service Unavailable"]
        "#;
        let cfg: McmConfig = toml::from_str(toml).unwrap();
        let policy = cfg.retry_policy().unwrap();
        let markers: Vec<&str> = policy.retryable_markers.iter().collect();
        assert_eq!(markers, vec!["service unavailable"]);
    }
}
