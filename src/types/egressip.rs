// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::CustomResource;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[kube(group = "k8s.ovn.org", version = "v1", kind = "EgressIP", plural = "egressips")]
#[kube(status = "EgressIPStatus", derive = "PartialEq")]
#[serde(rename_all = "camelCase")]
pub struct EgressIPSpec {
    #[serde(rename = "egressIPs", default)]
    pub egress_ips: Vec<String>,
    #[serde(default)]
    pub namespace_selector: LabelSelector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_selector: Option<LabelSelector>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
pub struct EgressIPStatus {
    #[serde(default)]
    pub items: Vec<EgressIPStatusItem>,
}

/// Node an egress address was assigned to
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
pub struct EgressIPStatusItem {
    pub node: String,
    #[serde(rename = "egressIP")]
    pub egress_ip: String,
}

impl EgressIPStatusItem {
    pub fn new(node: &str, egress_ip: &str) -> Self {
        Self {
            node: node.to_string(),
            egress_ip: egress_ip.to_string(),
        }
    }
}
