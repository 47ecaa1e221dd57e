use crate::paths;
use anyhow::{Context, Result};
use reconcile::StabilizationPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Config
// ============================================================================

/// Effective settings for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub stabilization: StabilizationConfig,
}

/// Where and how to reach the provisioning API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Full endpoint URL; derived from `region` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub region: String,
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: "us-east-1".to_string(),
            timeout_seconds: 30,
        }
    }
}

/// Retry window for resources that are not ready yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizationConfig {
    pub delay_seconds: u64,
    pub max_wait_minutes: u64,
}

impl Default for StabilizationConfig {
    fn default() -> Self {
        Self {
            delay_seconds: 10,
            max_wait_minutes: 25,
        }
    }
}

impl Config {
    /// Load config.toml from the config directory
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_file()?)
    }

    /// Load a config file, falling back to defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config format in {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply command-line overrides
    pub fn with_overrides(mut self, endpoint: Option<String>, region: Option<String>) -> Self {
        if let Some(region) = region {
            self.api.region = region;
        }
        if endpoint.is_some() {
            self.api.endpoint = endpoint;
        }
        self
    }

    /// Endpoint URL, derived from the region unless set explicitly
    pub fn endpoint(&self) -> String {
        self.api
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("https://wafv2.{}.amazonaws.com", self.api.region))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_seconds)
    }

    /// Retry policy derived from the stabilization window
    pub fn policy(&self) -> StabilizationPolicy {
        StabilizationPolicy::from_window(
            Duration::from_secs(self.stabilization.delay_seconds),
            Duration::from_secs(self.stabilization.max_wait_minutes.saturating_mul(60)),
        )
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Could not render config")
    }
}
