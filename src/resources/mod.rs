// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Per-kind builders: constructors, mutators, list wrappers and derived reads.

pub mod egressip;
pub mod kubeapiserver;
pub mod mco;
pub mod network;
pub mod pfstatus;
pub mod service;

pub use egressip::EgressIpBuilder;
pub use kubeapiserver::KubeApiServerBuilder;
pub use mco::{KubeletConfigBuilder, MachineConfigBuilder};
pub use network::NetworkOperatorBuilder;
pub use pfstatus::PfStatusConfigurationBuilder;
pub use service::ServiceBuilder;
