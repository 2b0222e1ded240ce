// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuilderError {
    /// Deferred builder errors and argument validation failures.
    #[error("{0}")]
    InvalidInput(String),

    #[error("{}{}", crate::msg::does_not_exist(kind, name), namespace.as_ref().map(|ns| format!(" in namespace {}", ns)).unwrap_or_default())]
    NotFound {
        kind: String,
        name: String,
        namespace: Option<String>,
    },

    /// A derived read found the object but not the status it needs.
    #[error("{0}")]
    Missing(String),

    #[error("{reason}: context deadline exceeded")]
    DeadlineExceeded { reason: String },

    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Failed to load kubeconfig: {0}")]
    Kubeconfig(String),
}

impl BuilderError {
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>, namespace: Option<&str>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
            namespace: namespace.filter(|ns| !ns.is_empty()).map(str::to_string),
        }
    }

    /// True for the typed variant and for a 404 returned by the API server.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Kube(err) => is_api_not_found(err),
            _ => false,
        }
    }

    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Self::DeadlineExceeded { .. })
    }
}

pub(crate) fn is_api_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(resp) if resp.code == 404)
}

pub type Result<T> = std::result::Result<T, BuilderError>;
