// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Environment variables read by `Config::from_env`
pub mod env {
    pub const KUBECONFIG: &str = "KUBECONFIG";
    pub const LOG_FILTER: &str = "KINFRA_LOG";
    pub const POLL_INTERVAL_SECS: &str = "KINFRA_POLL_INTERVAL_SECS";
}

/// Default tracing filter when `KINFRA_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "kinfra=info";

/// Namespace handed to `kube::Client` when none is configured
pub const DEFAULT_NAMESPACE: &str = "default";

/// Wait helper polling configuration
pub mod poll {
    use std::time::Duration;

    /// Default interval between two condition checks
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);
    /// Interval used for slow-moving operator rollouts
    pub const ROLLOUT_INTERVAL: Duration = Duration::from_secs(3);
}

/// Names of cluster singletons owned by OpenShift operators
pub mod singleton {
    pub const CLUSTER: &str = "cluster";
}

/// Condition types and reasons reported by OpenShift operators
pub mod conditions {
    pub const NODE_INSTALLER_PROGRESSING: &str = "NodeInstallerProgressing";
    pub const ALL_NODES_AT_LATEST_REVISION: &str = "AllNodesAtLatestRevision";
    pub const PROGRESSING: &str = "Progressing";
    pub const AVAILABLE: &str = "Available";
    pub const AS_EXPECTED: &str = "AsExpected";
}
