// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::constants::{self, poll};

/// Client configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Explicit kubeconfig; in-cluster or default discovery is used when unset
    pub kubeconfig: Option<PathBuf>,
    pub log_filter: String,
    /// Default interval for wait helpers that do not pin their own
    pub poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            kubeconfig: None,
            log_filter: constants::DEFAULT_LOG_FILTER.to_string(),
            poll_interval: poll::DEFAULT_INTERVAL,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    /// An empty `KUBECONFIG` counts as unset; a zero poll interval is rejected.
    pub fn from_env() -> Result<Self> {
        let kubeconfig = env::var_os(constants::env::KUBECONFIG)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let log_filter = env::var(constants::env::LOG_FILTER)
            .unwrap_or_else(|_| constants::DEFAULT_LOG_FILTER.to_string());

        let poll_interval = match env::var(constants::env::POLL_INTERVAL_SECS) {
            Ok(raw) => {
                let secs: u64 = raw.parse().with_context(|| {
                    format!("{} must be a number of seconds, got {:?}", constants::env::POLL_INTERVAL_SECS, raw)
                })?;
                if secs == 0 {
                    anyhow::bail!("{} must be at least 1 second", constants::env::POLL_INTERVAL_SECS);
                }
                Duration::from_secs(secs)
            }
            Err(_) => poll::DEFAULT_INTERVAL,
        };

        Ok(Config {
            kubeconfig,
            log_filter,
            poll_interval,
        })
    }
}

/// Install a global fmt subscriber driven by the configured filter.
/// Returns an error when a subscriber is already installed.
pub fn init_tracing(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_new(&config.log_filter)
        .with_context(|| format!("invalid log filter {:?}", config.log_filter))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))
}
