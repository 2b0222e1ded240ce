// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::CustomResource;
use serde::{Deserialize, Serialize};

use super::Condition;

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[kube(group = "operator.openshift.io", version = "v1", kind = "KubeAPIServer", plural = "kubeapiservers")]
#[kube(status = "KubeAPIServerStatus", derive = "PartialEq")]
#[serde(rename_all = "camelCase")]
pub struct KubeAPIServerSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator_log_level: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KubeAPIServerStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_available_revision: Option<i32>,
    #[serde(default)]
    pub node_statuses: Vec<NodeStatus>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatus {
    pub node_name: String,
    #[serde(default)]
    pub current_revision: i32,
    #[serde(default)]
    pub target_revision: i32,
}
