// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Client settings shared by every resource builder

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Resource};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::fake::FakeApiServer;
use super::scheme::Scheme;
use crate::config::Config;
use crate::constants::poll;
use crate::error::{BuilderError, Result};

/// Connection to a cluster plus the registry of kinds attached to it.
///
/// Cloning is cheap and every clone shares the same client and scheme.
#[derive(Clone)]
pub struct Settings {
    client: Client,
    scheme: Scheme,
    poll_interval: Duration,
    fake: Option<FakeApiServer>,
}

impl Settings {
    /// Connect using an explicit kubeconfig when configured, or the default
    /// in-cluster / `~/.kube/config` discovery otherwise.
    #[instrument(skip(config), fields(kubeconfig = ?config.kubeconfig))]
    pub async fn new(config: &Config) -> Result<Self> {
        let client = match &config.kubeconfig {
            Some(path) => create_client_from_kubeconfig_file(path).await?,
            None => Client::try_default()
                .await
                .map_err(|e| BuilderError::Kubeconfig(format!("Failed to create client: {}", e)))?,
        };

        info!("Connected to Kubernetes cluster");
        Ok(Self {
            poll_interval: config.poll_interval,
            ..Self::from_client(client)
        })
    }

    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            scheme: Scheme::default(),
            poll_interval: poll::DEFAULT_INTERVAL,
            fake: None,
        }
    }

    pub(crate) fn from_fake(server: FakeApiServer, scheme: Scheme) -> Self {
        Self {
            client: server.clone().into_client(),
            scheme,
            poll_interval: poll::DEFAULT_INTERVAL,
            fake: Some(server),
        }
    }

    pub fn client(&self) -> Client {
        self.client.clone()
    }

    /// Register `K` with this client. Safe to call repeatedly and from many
    /// tasks; returns true only for the call that added it.
    pub fn attach_scheme<K: Resource<DynamicType = ()>>(&self) -> bool {
        let added = self.scheme.add::<K>();
        if added {
            debug!(
                "Attached scheme {}/{}",
                K::api_version(&()),
                K::kind(&())
            );
        }
        added
    }

    /// Default interval between two polls of the wait helpers.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    /// The in-memory server behind a test client, if any.
    pub fn fake(&self) -> Option<&FakeApiServer> {
        self.fake.as_ref()
    }
}

/// Create a Kubernetes client from a kubeconfig file
async fn create_client_from_kubeconfig_file(path: &Path) -> Result<Client> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        BuilderError::Kubeconfig(format!("Failed to read kubeconfig {}: {}", path.display(), e))
    })?;

    let kubeconfig_parsed: Kubeconfig = serde_yaml::from_str(&raw)
        .map_err(|e| BuilderError::Kubeconfig(format!("Failed to parse kubeconfig: {}", e)))?;

    let client_config =
        kube::Config::from_custom_kubeconfig(kubeconfig_parsed, &KubeConfigOptions::default())
            .await
            .map_err(|e| BuilderError::Kubeconfig(format!("Failed to create config: {}", e)))?;

    Client::try_from(client_config)
        .map_err(|e| BuilderError::Kubeconfig(format!("Failed to create client: {}", e)))
}
