// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Schemas of the custom resources the builders manage.

pub mod egressip;
pub mod kubeapiserver;
pub mod machineconfig;
pub mod network;
pub mod pfstatus;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Status condition as reported by OpenShift operators
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

impl Condition {
    pub fn new(condition_type: &str, status: &str, reason: Option<&str>) -> Self {
        Condition {
            condition_type: condition_type.to_string(),
            status: status.to_string(),
            reason: reason.map(str::to_string),
            ..Default::default()
        }
    }
}
