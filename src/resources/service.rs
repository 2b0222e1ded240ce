// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::{Api, ListParams};
use kube::core::GroupVersionResource;
use kube::Client;
use std::collections::BTreeMap;

use crate::builder::{kind_gvr, list, scoped_api, Builder, ManagedResource};
use crate::clients::Settings;
use crate::error::{BuilderError, Result};

pub type ServiceBuilder = Builder<Service>;

const PROTOCOLS: [&str; 3] = ["TCP", "UDP", "SCTP"];
const TRAFFIC_POLICIES: [&str; 2] = ["Cluster", "Local"];
const IP_FAMILIES: [&str; 2] = ["IPv4", "IPv6"];
const IP_FAMILY_POLICIES: [&str; 3] = ["SingleStack", "PreferDualStack", "RequireDualStack"];

impl ManagedResource for Service {
    const NAMESPACED: bool = true;

    fn api(client: Client, namespace: &str) -> Api<Self> {
        scoped_api(client, namespace)
    }
}

fn valid_port(port: i32) -> bool {
    (1..=65535).contains(&port)
}

/// Build a service port, rejecting out-of-range ports and unknown protocols.
pub fn define_service_port(port: i32, target_port: i32, protocol: &str) -> Result<ServicePort> {
    if !valid_port(port) {
        return Err(BuilderError::InvalidInput(format!("invalid port number {}", port)));
    }
    if !valid_port(target_port) {
        return Err(BuilderError::InvalidInput(format!("invalid target port number {}", target_port)));
    }
    if !PROTOCOLS.contains(&protocol) {
        return Err(BuilderError::InvalidInput(format!("invalid protocol {}", protocol)));
    }

    Ok(ServicePort {
        protocol: Some(protocol.to_string()),
        port,
        target_port: Some(IntOrString::Int(target_port)),
        ..Default::default()
    })
}

impl ServiceBuilder {
    pub fn new(
        api_client: &Settings,
        name: &str,
        namespace: &str,
        selector: BTreeMap<String, String>,
        port: ServicePort,
    ) -> Self {
        let empty_selector = selector.is_empty();
        let definition = Service {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            spec: Some(ServiceSpec {
                selector: Some(selector),
                ports: Some(vec![port]),
                ..Default::default()
            }),
            ..Default::default()
        };

        let mut builder = Builder::from_definition(api_client, definition);
        if empty_selector {
            builder.set_error("Service 'selector' cannot be empty");
        }
        builder
    }

    pub async fn pull(api_client: &Settings, name: &str, namespace: &str) -> Result<Self> {
        let definition = Service {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        Builder::pull_definition(api_client, definition).await
    }

    fn spec_mut(&mut self) -> &mut ServiceSpec {
        self.definition.spec.get_or_insert_with(Default::default)
    }

    /// Expose the first port on every node, on the same port number.
    pub fn with_node_port(mut self) -> Self {
        if self.has_error() {
            return self;
        }

        let spec = self.spec_mut();
        spec.type_ = Some("NodePort".to_string());
        if let Some(port) = spec.ports.as_mut().and_then(|ports| ports.first_mut()) {
            port.node_port = Some(port.port);
            return self;
        }

        self.set_error("service does not have the available ports");
        self
    }

    /// Only valid on NodePort and LoadBalancer services.
    pub fn with_external_traffic_policy(mut self, policy: &str) -> Self {
        if self.has_error() {
            return self;
        }
        if !TRAFFIC_POLICIES.contains(&policy) {
            self.set_error(format!("invalid external traffic policy {}", policy));
            return self;
        }

        let service_type = self.definition.spec.as_ref().and_then(|s| s.type_.as_deref());
        if !matches!(service_type, Some("NodePort") | Some("LoadBalancer")) {
            self.set_error("ExternalTrafficPolicy can only be set on NodePort and LoadBalancer service");
            return self;
        }

        self.spec_mut().external_traffic_policy = Some(policy.to_string());
        self
    }

    pub fn with_ip_families(mut self, families: &[&str], policy: &str) -> Self {
        if self.has_error() {
            return self;
        }
        if families.is_empty() {
            self.set_error("failed to set empty ipFamilies");
            return self;
        }
        if let Some(bad) = families.iter().find(|f| !IP_FAMILIES.contains(f)) {
            self.set_error(format!("invalid ipFamily {}", bad));
            return self;
        }
        if !IP_FAMILY_POLICIES.contains(&policy) {
            self.set_error(format!("invalid ipFamilyPolicy {}", policy));
            return self;
        }

        let spec = self.spec_mut();
        spec.ip_families = Some(families.iter().map(|f| f.to_string()).collect());
        spec.ip_family_policy = Some(policy.to_string());
        self
    }
}

pub async fn list_services(
    api_client: &Settings,
    namespace: &str,
    options: &[ListParams],
) -> Result<Vec<ServiceBuilder>> {
    list::list_namespaced(api_client, namespace, options).await
}

pub fn get_service_gvr() -> GroupVersionResource {
    kind_gvr::<Service>()
}
