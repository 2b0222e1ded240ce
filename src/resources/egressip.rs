// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::api::{Api, ListParams};
use kube::core::GroupVersionResource;
use kube::Client;
use std::collections::BTreeMap;
use std::net::IpAddr;
use tracing::debug;

use crate::builder::{kind_gvr, list, Builder, ManagedResource};
use crate::clients::Settings;
use crate::error::{BuilderError, Result};
use crate::types::egressip::{EgressIP, EgressIPSpec};

pub type EgressIpBuilder = Builder<EgressIP>;

impl ManagedResource for EgressIP {
    const NAMESPACED: bool = false;

    fn api(client: Client, _namespace: &str) -> Api<Self> {
        Api::all(client)
    }
}

fn selector(labels: BTreeMap<String, String>) -> LabelSelector {
    LabelSelector {
        match_labels: Some(labels),
        ..Default::default()
    }
}

impl EgressIpBuilder {
    pub fn new(api_client: &Settings, name: &str) -> Self {
        Builder::from_definition(api_client, EgressIP::new(name, EgressIPSpec::default()))
    }

    pub async fn pull(api_client: &Settings, name: &str) -> Result<Self> {
        Builder::pull_definition(api_client, EgressIP::new(name, EgressIPSpec::default())).await
    }

    /// Replace the requested egress addresses; each must parse as IPv4 or IPv6.
    pub fn with_egress_ips(mut self, ips: &[&str]) -> Self {
        if self.has_error() {
            return self;
        }
        if ips.is_empty() {
            self.set_error("egressIPs cannot be empty");
            return self;
        }
        if let Some(bad) = ips.iter().find(|ip| ip.parse::<IpAddr>().is_err()) {
            self.set_error(format!("invalid egress IP address {}", bad));
            return self;
        }

        self.definition.spec.egress_ips = ips.iter().map(|ip| ip.to_string()).collect();
        self
    }

    pub fn with_namespace_selector(mut self, labels: BTreeMap<String, String>) -> Self {
        if self.has_error() {
            return self;
        }
        if labels.is_empty() {
            self.set_error("EgressIP 'namespaceSelector' cannot be empty");
            return self;
        }

        self.definition.spec.namespace_selector = selector(labels);
        self
    }

    pub fn with_pod_selector(mut self, labels: BTreeMap<String, String>) -> Self {
        if self.has_error() {
            return self;
        }
        if labels.is_empty() {
            self.set_error("EgressIP 'podSelector' cannot be empty");
            return self;
        }

        self.definition.spec.pod_selector = Some(selector(labels));
        self
    }

    /// Node name to egress address, as assigned by the network plugin.
    pub async fn get_assigned_egress_ip_map(&mut self) -> Result<BTreeMap<String, String>> {
        let object = self.get().await?;
        let items = object.status.as_ref().map(|s| s.items.clone()).unwrap_or_default();
        self.object = Some(object);

        if items.is_empty() {
            debug!("EgressIP {} has no node assignment yet", self.name());
            return Err(BuilderError::Missing("nodes assignment does not exist".to_string()));
        }

        Ok(items.into_iter().map(|item| (item.node, item.egress_ip)).collect())
    }
}

pub async fn list_egress_ips(api_client: &Settings, options: &[ListParams]) -> Result<Vec<EgressIpBuilder>> {
    list::list_all(api_client, options).await
}

pub fn get_egress_ip_gvr() -> GroupVersionResource {
    kind_gvr::<EgressIP>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{get_test_clients, TestClientParams};
    use crate::types::egressip::{EgressIPStatus, EgressIPStatusItem};

    fn qa() -> BTreeMap<String, String> {
        [("env".to_string(), "qa".to_string())].into()
    }

    #[tokio::test]
    async fn test_egress_ip_lifecycle() {
        let settings = get_test_clients(TestClientParams::new());
        let fake = settings.fake().unwrap().clone();

        let mut builder = EgressIpBuilder::new(&settings, "egress-test")
            .with_egress_ips(&["1.1.1.2", "1.1.1.3"])
            .with_namespace_selector(qa())
            .with_pod_selector(qa());
        builder.create().await.unwrap();

        let stored: EgressIP = fake.get_object("egress-test", None).unwrap();
        assert_eq!(stored.spec.egress_ips, vec!["1.1.1.2", "1.1.1.3"]);
        assert_eq!(stored.spec.namespace_selector.match_labels, Some(qa()));
        assert_eq!(stored.spec.pod_selector.unwrap().match_labels, Some(qa()));

        let err = builder.get_assigned_egress_ip_map().await.unwrap_err();
        assert_eq!(err.to_string(), "nodes assignment does not exist");

        let mut assigned = builder.object.clone().unwrap();
        assigned.status = Some(EgressIPStatus {
            items: vec![
                EgressIPStatusItem::new("node-1", "1.1.1.2"),
                EgressIPStatusItem::new("node-2", "1.1.1.3"),
            ],
        });
        fake.insert(&assigned);

        let map = builder.get_assigned_egress_ip_map().await.unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["node-1"], "1.1.1.2");
        assert_eq!(map["node-2"], "1.1.1.3");
    }

    #[tokio::test]
    async fn test_assigned_map_of_absent_object() {
        let settings = get_test_clients(TestClientParams::new());
        let mut builder = EgressIpBuilder::new(&settings, "egress-test");

        let err = builder.get_assigned_egress_ip_map().await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "EgressIP object egress-test does not exist");
    }

    #[tokio::test]
    async fn test_with_egress_ips_validation() {
        let settings = get_test_clients(TestClientParams::new());

        let builder = EgressIpBuilder::new(&settings, "egress").with_egress_ips(&[]);
        assert_eq!(builder.error_msg(), Some("egressIPs cannot be empty"));

        let builder = EgressIpBuilder::new(&settings, "egress")
            .with_egress_ips(&["1.1.1.2", "fd00::1", "not-an-ip"])
            .with_pod_selector(qa());
        assert_eq!(builder.error_msg(), Some("invalid egress IP address not-an-ip"));
        assert!(builder.definition.spec.pod_selector.is_none());
    }

    #[tokio::test]
    async fn test_selectors_reject_empty_labels() {
        let settings = get_test_clients(TestClientParams::new());

        let builder = EgressIpBuilder::new(&settings, "egress").with_namespace_selector(BTreeMap::new());
        assert_eq!(builder.error_msg(), Some("EgressIP 'namespaceSelector' cannot be empty"));

        let builder = EgressIpBuilder::new(&settings, "egress").with_pod_selector(BTreeMap::new());
        assert_eq!(builder.error_msg(), Some("EgressIP 'podSelector' cannot be empty"));
    }

    #[tokio::test]
    async fn test_invalid_definition_never_reaches_cluster() {
        let settings = get_test_clients(TestClientParams::new());
        let fake = settings.fake().unwrap().clone();

        let mut builder = EgressIpBuilder::new(&settings, "egress").with_egress_ips(&["1.1.1.2", "300.1.1.1"]);
        let err = builder.create().await.err().unwrap();
        assert_eq!(err.to_string(), "invalid egress IP address 300.1.1.1");

        let mut builder = EgressIpBuilder::new(&settings, "egress")
            .with_egress_ips(&["1.1.1.2"])
            .with_namespace_selector(BTreeMap::new());
        let err = builder.update(true).await.err().unwrap();
        assert_eq!(err.to_string(), "EgressIP 'namespaceSelector' cannot be empty");

        assert_eq!(fake.request_count(), 0);
    }

    #[tokio::test]
    async fn test_list_egress_ips() {
        let settings = get_test_clients(
            TestClientParams::new()
                .with_object(EgressIP::new("a", EgressIPSpec::default()))
                .with_object(EgressIP::new("b", EgressIPSpec::default())),
        );

        let listed = list_egress_ips(&settings, &[]).await.unwrap();
        let names: Vec<&str> = listed.iter().map(|b| b.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_egress_ip_gvr() {
        assert_eq!(get_egress_ip_gvr().resource, "egressips");
    }
}
