// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::api::Api;
use kube::core::GroupVersionResource;
use kube::Client;
use std::time::Duration;

use crate::builder::wait::{ConditionStatus, Conditioned};
use crate::builder::{kind_gvr, Builder, ManagedResource};
use crate::clients::Settings;
use crate::constants::{conditions, singleton};
use crate::error::Result;
use crate::types::network::{Network, NetworkSpec};
use crate::types::Condition;

pub type NetworkOperatorBuilder = Builder<Network>;

const LOG_LEVELS: [&str; 4] = ["Normal", "Debug", "Trace", "TraceAll"];

impl ManagedResource for Network {
    const NAMESPACED: bool = false;

    fn api(client: Client, _namespace: &str) -> Api<Self> {
        Api::all(client)
    }
}

impl Conditioned for Network {
    fn conditions(&self) -> &[Condition] {
        self.status.as_ref().map(|s| s.conditions.as_slice()).unwrap_or_default()
    }
}

impl NetworkOperatorBuilder {
    pub async fn pull(api_client: &Settings) -> Result<Self> {
        Builder::pull_definition(api_client, Network::new(singleton::CLUSTER, NetworkSpec::default())).await
    }

    pub fn with_multi_network_policy(mut self, enabled: bool) -> Self {
        if self.has_error() {
            return self;
        }
        self.definition.spec.use_multi_network_policy = Some(enabled);
        self
    }

    pub fn with_log_level(mut self, level: &str) -> Self {
        if self.has_error() {
            return self;
        }
        if !LOG_LEVELS.contains(&level) {
            self.set_error(format!(
                "invalid logLevel {}, must be one of {}",
                level,
                LOG_LEVELS.join(", ")
            ));
            return self;
        }

        self.definition.spec.log_level = Some(level.to_string());
        self
    }

    pub async fn wait_until_in_condition(
        &mut self,
        condition_type: &str,
        status: ConditionStatus,
        timeout: Duration,
    ) -> Result<()> {
        let interval = self.settings().poll_interval();
        self.wait_until_condition(condition_type, status, interval, timeout)
            .await
    }

    pub async fn wait_until_reason(&mut self, condition_type: &str, reason: &str, timeout: Duration) -> Result<()> {
        let interval = self.settings().poll_interval();
        self.wait_until_condition_reason(condition_type, reason, interval, timeout)
            .await
    }

    /// Wait until the operator has rolled out the last change: `Progressing`
    /// is `False` with reason `AsExpected`.
    pub async fn wait_until_progressed(&mut self, timeout: Duration) -> Result<()> {
        let expected = ConditionStatus::False.as_str();
        let interval = self.settings().poll_interval();
        self.poll_condition(conditions::PROGRESSING, interval, timeout, |condition| {
            let Some(condition) = condition else {
                return Err(format!("the {} condition not found exists", conditions::PROGRESSING));
            };
            if condition.status != expected {
                return Err(format!(
                    "the {} condition has status {}",
                    conditions::PROGRESSING,
                    condition.status
                ));
            }
            match condition.reason.as_deref() {
                Some(conditions::AS_EXPECTED) => Ok(()),
                other => Err(format!(
                    "the {} condition has reason {}",
                    conditions::PROGRESSING,
                    other.unwrap_or_default()
                )),
            }
        })
        .await
    }
}

pub fn get_network_gvr() -> GroupVersionResource {
    kind_gvr::<Network>()
}
