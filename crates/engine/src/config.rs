// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration
//!
//! ```toml
//! [registration]
//! max_attempts = 5
//!
//! [observer]
//! channel_capacity = 256
//! max_attempts = 5
//!
//! [monitor]
//! enabled = true
//! interval = "30s"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level engine configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub registration: RegistrationConfig,
    pub observer: ObserverConfig,
    pub monitor: MonitorConfig,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn with_registration(mut self, registration: RegistrationConfig) -> Self {
        self.registration = registration;
        self
    }

    pub fn with_observer(mut self, observer: ObserverConfig) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_monitor(mut self, monitor: MonitorConfig) -> Self {
        self.monitor = monitor;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.registration.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "registration.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.observer.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "observer.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.observer.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "observer.channel_capacity must be at least 1".to_string(),
            ));
        }
        if self.monitor.interval.is_zero() {
            return Err(ConfigError::Invalid(
                "monitor.interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Consumer registration settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Compare-and-swap attempts before giving up
    pub max_attempts: u32,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self { max_attempts: 5 }
    }
}

impl RegistrationConfig {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

/// Reconciliation observer settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    /// Pending requests before new ones are dropped
    pub channel_capacity: usize,
    /// Compare-and-swap attempts per unit
    pub max_attempts: u32,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            max_attempts: 5,
        }
    }
}

impl ObserverConfig {
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

/// Persistence monitor settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub enabled: bool,
    /// How often to sweep units with waiting consumers
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(30),
        }
    }
}

impl MonitorConfig {
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
