// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::api::Api;
use kube::core::GroupVersionResource;
use kube::Client;
use std::time::Duration;
use tracing::info;

use crate::builder::wait::Conditioned;
use crate::builder::{kind_gvr, Builder, ManagedResource};
use crate::clients::Settings;
use crate::constants::{conditions, poll, singleton};
use crate::error::{BuilderError, Result};
use crate::types::kubeapiserver::{KubeAPIServer, KubeAPIServerSpec};
use crate::types::Condition;

pub type KubeApiServerBuilder = Builder<KubeAPIServer>;

impl ManagedResource for KubeAPIServer {
    const NAMESPACED: bool = false;

    fn api(client: Client, _namespace: &str) -> Api<Self> {
        Api::all(client)
    }
}

impl Conditioned for KubeAPIServer {
    fn conditions(&self) -> &[Condition] {
        self.status.as_ref().map(|s| s.conditions.as_slice()).unwrap_or_default()
    }
}

impl KubeApiServerBuilder {
    /// Fetch the cluster-wide `cluster` singleton.
    pub async fn pull(api_client: &Settings) -> Result<Self> {
        Builder::pull_definition(
            api_client,
            KubeAPIServer::new(singleton::CLUSTER, KubeAPIServerSpec::default()),
        )
        .await
    }

    /// Wait until every control plane node runs the latest installed revision.
    pub async fn wait_all_nodes_at_the_latest_revision(&mut self, timeout: Duration) -> Result<()> {
        info!("Waiting for all kube-apiserver nodes to reach the latest revision");
        self.wait_until_condition_reason(
            conditions::NODE_INSTALLER_PROGRESSING,
            conditions::ALL_NODES_AT_LATEST_REVISION,
            poll::ROLLOUT_INTERVAL,
            timeout,
        )
        .await
    }

    /// Latest revision the operator made available, from the last observed object.
    pub fn latest_available_revision(&self) -> Result<i32> {
        let object = self
            .object
            .as_ref()
            .ok_or_else(|| BuilderError::not_found("KubeAPIServer", self.name(), None))?;

        object
            .status
            .as_ref()
            .and_then(|s| s.latest_available_revision)
            .ok_or_else(|| BuilderError::Missing("latestAvailableRevision is not reported yet".to_string()))
    }
}

pub fn get_kube_api_server_gvr() -> GroupVersionResource {
    kind_gvr::<KubeAPIServer>()
}
