// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `FleetConfig`: the TOML-loadable tunables shared by `fleetctl` and
//! `fleet-agentd` — substrate connection, namespace, heartbeat interval,
//! per-operation timeout, and the JetStream/consumer defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// NATS connection settings. Absent when the config targets the in-process
/// substrate (no `[substrate]` table, or `url` unset).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubstrateConfig {
    pub url: String,
    #[serde(default)]
    pub credentials_path: Option<String>,
}

impl Default for SubstrateConfig {
    fn default() -> Self {
        Self {
            url: "nats://127.0.0.1:4222".to_string(),
            credentials_path: None,
        }
    }
}

/// JetStream stream/consumer knobs, matching the §6.6 defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamDefaults {
    pub ack_wait_secs: u64,
    pub max_deliver: i64,
    pub max_ack_pending: i64,
    pub max_age_secs: u64,
    pub max_msgs: i64,
}

impl Default for StreamDefaults {
    fn default() -> Self {
        Self {
            ack_wait_secs: 30,
            max_deliver: 3,
            max_ack_pending: 10,
            max_age_secs: 24 * 60 * 60,
            max_msgs: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    pub substrate: SubstrateConfig,
    /// Prefix prepended to every subject and KV key, or empty for none.
    pub namespace: String,
    pub heartbeat_interval_secs: u64,
    pub heartbeat_staleness_secs: u64,
    pub handler_timeout_secs: u64,
    pub max_concurrent_jobs: usize,
    pub stream: StreamDefaults,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            substrate: SubstrateConfig::default(),
            namespace: String::new(),
            heartbeat_interval_secs: 30,
            heartbeat_staleness_secs: 90,
            handler_timeout_secs: 30,
            max_concurrent_jobs: 5,
            stream: StreamDefaults::default(),
        }
    }
}

impl FleetConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn heartbeat_staleness(&self) -> Duration {
        Duration::from_secs(self.heartbeat_staleness_secs)
    }

    pub fn handler_timeout(&self) -> Duration {
        Duration::from_secs(self.handler_timeout_secs)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
