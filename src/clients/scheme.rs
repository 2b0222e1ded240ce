// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Registry of the resource kinds a client has been told about

use kube::core::{ApiResource, GroupVersionKind};
use kube::Resource;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Shared, thread-safe set of registered kinds keyed by `apiVersion/kind`.
#[derive(Clone, Debug, Default)]
pub struct Scheme {
    kinds: Arc<RwLock<BTreeMap<String, ApiResource>>>,
}

impl Scheme {
    /// Register `K`. Returns false when it was already known.
    pub fn add<K: Resource<DynamicType = ()>>(&self) -> bool {
        self.add_resource(ApiResource::erase::<K>(&()))
    }

    pub fn add_resource(&self, resource: ApiResource) -> bool {
        let key = scheme_key(&resource.api_version, &resource.kind);
        let mut kinds = self.kinds.write().unwrap_or_else(PoisonError::into_inner);
        if kinds.contains_key(&key) {
            return false;
        }
        kinds.insert(key, resource);
        true
    }

    pub fn contains<K: Resource<DynamicType = ()>>(&self) -> bool {
        let key = scheme_key(&K::api_version(&()), &K::kind(&()));
        self.kinds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&key)
    }

    /// Look up a registered kind by the coordinates used in REST paths.
    pub fn resource_for(&self, group: &str, version: &str, plural: &str) -> Option<ApiResource> {
        self.kinds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .find(|ar| ar.group == group && ar.version == version && ar.plural == plural)
            .cloned()
    }

    pub fn recognizes(&self, group: &str, version: &str, plural: &str) -> bool {
        self.resource_for(group, version, plural).is_some()
    }

    pub fn kinds(&self) -> Vec<GroupVersionKind> {
        self.kinds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|ar| GroupVersionKind::gvk(&ar.group, &ar.version, &ar.kind))
            .collect()
    }
}

fn scheme_key(api_version: &str, kind: &str) -> String {
    format!("{}/{}", api_version, kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::Service;
    use std::thread;

    #[test]
    fn test_add_is_idempotent() {
        let scheme = Scheme::default();
        assert!(scheme.add::<Service>());
        assert!(!scheme.add::<Service>());
        assert_eq!(scheme.kinds().len(), 1);
        assert!(scheme.contains::<Service>());
    }

    #[test]
    fn test_recognizes_core_group_by_plural() {
        let scheme = Scheme::default();
        scheme.add::<Service>();
        assert!(scheme.recognizes("", "v1", "services"));
        assert!(!scheme.recognizes("", "v1", "pods"));
    }

    #[test]
    fn test_concurrent_registration() {
        let scheme = Scheme::default();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let scheme = scheme.clone();
                thread::spawn(move || scheme.add::<Service>())
            })
            .collect();

        let added = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|added| *added)
            .count();

        assert_eq!(added, 1);
        assert_eq!(scheme.kinds().len(), 1);
    }
}
