// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Machine config operator kinds: `MachineConfig` and `KubeletConfig`.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::api::{Api, ListParams};
use kube::core::GroupVersionResource;
use kube::Client;
use serde_json::{json, Map, Value};

use crate::builder::wait::Conditioned;
use crate::builder::{kind_gvr, list, Builder, ManagedResource};
use crate::clients::Settings;
use crate::error::Result;
use crate::types::machineconfig::{KubeletConfig, KubeletConfigSpec, MachineConfig, MachineConfigSpec};
use crate::types::Condition;

pub type MachineConfigBuilder = Builder<MachineConfig>;
pub type KubeletConfigBuilder = Builder<KubeletConfig>;

const KERNEL_TYPES: [&str; 3] = ["default", "realtime", "64k-pages"];

impl ManagedResource for MachineConfig {
    const NAMESPACED: bool = false;

    fn api(client: Client, _namespace: &str) -> Api<Self> {
        Api::all(client)
    }
}

impl ManagedResource for KubeletConfig {
    const NAMESPACED: bool = false;

    fn api(client: Client, _namespace: &str) -> Api<Self> {
        Api::all(client)
    }
}

impl Conditioned for KubeletConfig {
    fn conditions(&self) -> &[Condition] {
        self.status.as_ref().map(|s| s.conditions.as_slice()).unwrap_or_default()
    }
}

impl MachineConfigBuilder {
    pub fn new(api_client: &Settings, name: &str) -> Self {
        Builder::from_definition(api_client, MachineConfig::new(name, MachineConfigSpec::default()))
    }

    pub async fn pull(api_client: &Settings, name: &str) -> Result<Self> {
        Builder::pull_definition(api_client, MachineConfig::new(name, MachineConfigSpec::default())).await
    }

    pub fn with_kernel_arguments(mut self, args: &[&str]) -> Self {
        if self.has_error() {
            return self;
        }
        if args.is_empty() {
            self.set_error("MachineConfig 'kernelArguments' cannot be empty");
            return self;
        }
        if args.iter().any(|arg| arg.trim().is_empty()) {
            self.set_error("MachineConfig kernel argument cannot be blank");
            return self;
        }

        self.definition
            .spec
            .kernel_arguments
            .extend(args.iter().map(|arg| arg.to_string()));
        self
    }

    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        if self.has_error() {
            return self;
        }
        if extensions.is_empty() {
            self.set_error("MachineConfig 'extensions' cannot be empty");
            return self;
        }

        self.definition
            .spec
            .extensions
            .extend(extensions.iter().map(|ext| ext.to_string()));
        self
    }

    pub fn with_kernel_type(mut self, kernel_type: &str) -> Self {
        if self.has_error() {
            return self;
        }
        if !KERNEL_TYPES.contains(&kernel_type) {
            self.set_error(format!(
                "invalid kernelType {}, must be one of {}",
                kernel_type,
                KERNEL_TYPES.join(", ")
            ));
            return self;
        }

        self.definition.spec.kernel_type = Some(kernel_type.to_string());
        self
    }

    pub fn with_fips(mut self, enabled: bool) -> Self {
        if self.has_error() {
            return self;
        }
        self.definition.spec.fips = Some(enabled);
        self
    }
}

impl KubeletConfigBuilder {
    pub fn new(api_client: &Settings, name: &str) -> Self {
        Builder::from_definition(api_client, KubeletConfig::new(name, KubeletConfigSpec::default()))
    }

    pub async fn pull(api_client: &Settings, name: &str) -> Result<Self> {
        Builder::pull_definition(api_client, KubeletConfig::new(name, KubeletConfigSpec::default())).await
    }

    /// Target machine config pools carrying label `key=value`.
    pub fn with_mcp_selector(mut self, key: &str, value: &str) -> Self {
        if self.has_error() {
            return self;
        }
        if key.is_empty() {
            self.set_error("KubeletConfig machineConfigPoolSelector key cannot be empty");
            return self;
        }

        self.definition
            .spec
            .machine_config_pool_selector
            .get_or_insert_with(LabelSelector::default)
            .match_labels
            .get_or_insert_with(Default::default)
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_system_reserved(mut self, cpu: &str, memory: &str) -> Self {
        if self.has_error() {
            return self;
        }
        if cpu.is_empty() || memory.is_empty() {
            self.set_error("KubeletConfig systemReserved cpu and memory cannot be empty");
            return self;
        }

        let mut overrides = Map::new();
        overrides.insert("systemReserved".to_string(), json!({ "cpu": cpu, "memory": memory }));
        self.merge_kubelet_config(overrides);
        self
    }

    /// Merge raw kubelet configuration fields; `overrides` must be a JSON object.
    pub fn with_kubelet_config(mut self, overrides: Value) -> Self {
        if self.has_error() {
            return self;
        }

        match overrides {
            Value::Object(fields) if !fields.is_empty() => self.merge_kubelet_config(fields),
            _ => self.set_error("KubeletConfig kubeletConfig must be a non-empty object"),
        }
        self
    }

    fn merge_kubelet_config(&mut self, overrides: Map<String, Value>) {
        let config = self
            .definition
            .spec
            .kubelet_config
            .get_or_insert_with(|| Value::Object(Map::new()));
        match config {
            Value::Object(existing) => existing.extend(overrides),
            other => *other = Value::Object(overrides),
        }
    }
}

pub async fn list_machine_configs(api_client: &Settings, options: &[ListParams]) -> Result<Vec<MachineConfigBuilder>> {
    list::list_all(api_client, options).await
}

pub async fn list_kubelet_configs(api_client: &Settings, options: &[ListParams]) -> Result<Vec<KubeletConfigBuilder>> {
    list::list_all(api_client, options).await
}

pub fn get_machine_config_gvr() -> GroupVersionResource {
    kind_gvr::<MachineConfig>()
}

pub fn get_kubelet_config_gvr() -> GroupVersionResource {
    kind_gvr::<KubeletConfig>()
}
