// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::api::{Api, ListParams};
use kube::core::GroupVersionResource;
use kube::{Client, ResourceExt};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use crate::builder::{kind_gvr, list, scoped_api, Builder, ManagedResource};
use crate::clients::Settings;
use crate::error::Result;
use crate::types::pfstatus::{PFLACPMonitor, PFLACPMonitorSpec};

pub type PfStatusConfigurationBuilder = Builder<PFLACPMonitor>;

/// Accepted polling interval, in milliseconds
const POLLING_INTERVAL_RANGE: RangeInclusive<u32> = 100..=65535;

impl ManagedResource for PFLACPMonitor {
    const NAMESPACED: bool = true;
    const VALIDATES_PEERS: bool = true;

    fn api(client: Client, namespace: &str) -> Api<Self> {
        scoped_api(client, namespace)
    }

    /// Two monitors selecting the same nodes may not watch the same interface.
    fn peer_conflict(&self, peer: &Self) -> Option<String> {
        if self.spec.node_selector != peer.spec.node_selector {
            return None;
        }

        let shared: Vec<&str> = self
            .spec
            .interfaces
            .iter()
            .filter(|iface| peer.spec.interfaces.contains(*iface))
            .map(String::as_str)
            .collect();
        if shared.is_empty() {
            return None;
        }

        Some(format!(
            "interfaces [{}] conflict with the ones from PFLACPMonitor {}",
            shared.join(" "),
            peer.name_any()
        ))
    }
}

fn monitor(name: &str, namespace: &str) -> PFLACPMonitor {
    let mut monitor = PFLACPMonitor::new(name, PFLACPMonitorSpec::default());
    monitor.metadata.namespace = Some(namespace.to_string());
    monitor
}

impl PfStatusConfigurationBuilder {
    pub fn new(api_client: &Settings, name: &str, namespace: &str) -> Self {
        Builder::from_definition(api_client, monitor(name, namespace))
    }

    pub async fn pull(api_client: &Settings, name: &str, namespace: &str) -> Result<Self> {
        Builder::pull_definition(api_client, monitor(name, namespace)).await
    }

    pub fn with_interface(mut self, interface: &str) -> Self {
        if self.has_error() {
            return self;
        }
        if interface.is_empty() {
            self.set_error("PFLACPMonitor 'interface' cannot be empty");
            return self;
        }
        if self.definition.spec.interfaces.iter().any(|i| i == interface) {
            self.set_error(format!("interface {} is already monitored", interface));
            return self;
        }

        self.definition.spec.interfaces.push(interface.to_string());
        self
    }

    pub fn with_polling_interval(mut self, millis: u32) -> Self {
        if self.has_error() {
            return self;
        }
        if !POLLING_INTERVAL_RANGE.contains(&millis) {
            self.set_error("pollingInterval value is not valid");
            return self;
        }

        self.definition.spec.polling_interval = Some(millis);
        self
    }

    pub fn with_node_selector(mut self, labels: BTreeMap<String, String>) -> Self {
        if self.has_error() {
            return self;
        }
        if labels.is_empty() {
            self.set_error("PFLACPMonitor 'nodeSelector' cannot be empty");
            return self;
        }

        self.definition.spec.node_selector = Some(labels);
        self
    }
}

pub async fn list_pf_status_configurations(
    api_client: &Settings,
    namespace: &str,
    options: &[ListParams],
) -> Result<Vec<PfStatusConfigurationBuilder>> {
    list::list_namespaced(api_client, namespace, options).await
}

pub fn get_pf_status_gvr() -> GroupVersionResource {
    kind_gvr::<PFLACPMonitor>()
}
