// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Uniform resource-builder facade over `kube::Api`.
//!
//! A `Builder<K>` pairs the desired state of an object (`definition`) with
//! the last state observed in the cluster (`object`). Mutators record input
//! errors instead of returning them; the first cluster-facing call surfaces
//! the recorded error without sending any request.

pub mod list;
pub mod wait;

use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, DeleteParams, ListParams, PostParams};
use kube::core::GroupVersionResource;
use kube::runtime::reflector::ObjectRef;
use kube::{Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, instrument, warn};

use crate::clients::Settings;
use crate::error::{is_api_not_found, BuilderError, Result};
use crate::msg;

/// A kind the facade knows how to address.
pub trait ManagedResource:
    Resource<DynamicType = ()> + Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const NAMESPACED: bool;

    /// Api handle for this kind. Cluster-scoped kinds ignore `namespace`;
    /// namespaced kinds span all namespaces when it is empty.
    fn api(client: Client, namespace: &str) -> Api<Self>;

    /// Whether `create` must check `peer_conflict` against existing objects
    /// in the same scope.
    const VALIDATES_PEERS: bool = false;

    /// Reason `self` cannot coexist with `peer`, if any.
    fn peer_conflict(&self, _peer: &Self) -> Option<String> {
        None
    }
}

/// Api for a namespaced kind; empty namespace means all namespaces.
pub fn scoped_api<K>(client: Client, namespace: &str) -> Api<K>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
{
    if namespace.is_empty() {
        Api::all(client)
    } else {
        Api::namespaced(client, namespace)
    }
}

pub fn kind_of<K: Resource<DynamicType = ()>>() -> String {
    K::kind(&()).into_owned()
}

/// (group, version, resource) address of `K`, as used by generic cleanup tools.
pub fn kind_gvr<K: Resource<DynamicType = ()>>() -> GroupVersionResource {
    GroupVersionResource::gvr(&K::group(&()), &K::version(&()), &K::plural(&()))
}

pub struct Builder<K: ManagedResource> {
    /// Desired state
    pub definition: K,
    /// Last state observed in the cluster
    pub object: Option<K>,
    api_client: Settings,
    error_msg: Option<String>,
}

impl<K: ManagedResource> Builder<K> {
    /// Wrap a desired state. Empty identity is recorded as a deferred error.
    pub(crate) fn from_definition(api_client: &Settings, definition: K) -> Self {
        api_client.attach_scheme::<K>();

        let mut builder = Self {
            definition,
            object: None,
            api_client: api_client.clone(),
            error_msg: None,
        };

        let kind = kind_of::<K>();
        if builder.name().is_empty() {
            builder.set_error(msg::name_empty(&kind));
        } else if K::NAMESPACED && builder.namespace().is_empty() {
            builder.set_error(msg::namespace_empty(&kind));
        }

        builder
    }

    /// Wrap an object already read from the cluster.
    pub(crate) fn from_observed(api_client: &Settings, object: K) -> Self {
        Self {
            definition: object.clone(),
            object: Some(object),
            api_client: api_client.clone(),
            error_msg: None,
        }
    }

    /// Fetch the object named by `definition` and adopt it as both desired
    /// and observed state.
    #[instrument(skip_all, fields(kind = %kind_of::<K>(), name = %definition.name_any()))]
    pub(crate) async fn pull_definition(api_client: &Settings, definition: K) -> Result<Self> {
        let mut builder = Self::from_definition(api_client, definition);
        if let Some(msg) = builder.error_msg.take() {
            return Err(BuilderError::InvalidInput(msg));
        }

        debug!("Pulling existing {} from cluster", builder.object_ref());

        let object = builder.get().await?;
        builder.definition = object.clone();
        builder.object = Some(object);

        Ok(builder)
    }

    pub fn name(&self) -> &str {
        self.definition.meta().name.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> &str {
        self.definition.meta().namespace.as_deref().unwrap_or_default()
    }

    pub fn error_msg(&self) -> Option<&str> {
        self.error_msg.as_deref()
    }

    pub fn settings(&self) -> &Settings {
        &self.api_client
    }

    pub fn gvr(&self) -> GroupVersionResource {
        kind_gvr::<K>()
    }

    fn object_ref(&self) -> ObjectRef<K> {
        let reference = ObjectRef::new(self.name());
        if K::NAMESPACED {
            reference.within(self.namespace())
        } else {
            reference
        }
    }

    fn api(&self) -> Api<K> {
        K::api(self.api_client.client(), self.namespace())
    }

    /// Record a deferred error. The first one wins.
    pub(crate) fn set_error(&mut self, message: impl Into<String>) {
        if self.error_msg.is_none() {
            let message = message.into();
            debug!("{} builder recorded error: {}", kind_of::<K>(), message);
            self.error_msg = Some(message);
        }
    }

    pub(crate) fn has_error(&self) -> bool {
        self.error_msg.is_some()
    }

    /// Guard run first by every cluster-facing operation.
    pub(crate) fn validate(&self) -> Result<()> {
        if let Some(message) = &self.error_msg {
            debug!("The {} builder has error message: {}", kind_of::<K>(), message);
            return Err(BuilderError::InvalidInput(message.clone()));
        }
        Ok(())
    }

    fn map_api_error(&self, err: kube::Error) -> BuilderError {
        if is_api_not_found(&err) {
            BuilderError::not_found(kind_of::<K>(), self.name(), Some(self.namespace()))
        } else {
            err.into()
        }
    }

    /// Set a label on the definition.
    pub fn with_label(mut self, key: &str, value: &str) -> Self {
        if self.has_error() {
            return self;
        }
        if key.is_empty() {
            self.set_error(format!("{} label key cannot be empty", kind_of::<K>()));
            return self;
        }

        self.definition
            .labels_mut()
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Apply an arbitrary mutation to the definition; an `Err` is recorded
    /// as the deferred error.
    pub fn with_options<F>(mut self, option: F) -> Self
    where
        F: FnOnce(&mut K) -> std::result::Result<(), String>,
    {
        if self.has_error() {
            return self;
        }
        if let Err(message) = option(&mut self.definition) {
            self.set_error(message);
        }
        self
    }

    /// Read the object from the cluster. Does not touch `object`.
    #[instrument(skip(self), fields(resource = %self.object_ref()))]
    pub async fn get(&self) -> Result<K> {
        self.validate()?;
        debug!("Getting {}", self.object_ref());

        let result = self.api().get(self.name()).await;
        result.map_err(|e| self.map_api_error(e))
    }

    /// Refresh `object` and report whether the object may exist.
    ///
    /// Only a not-found answer counts as absence: any other failure reports
    /// true so that callers never create over an object they could not see.
    #[instrument(skip(self), fields(resource = %self.object_ref()))]
    pub async fn exists(&mut self) -> bool {
        if self.validate().is_err() {
            return false;
        }

        match self.get().await {
            Ok(object) => {
                self.object = Some(object);
                true
            }
            Err(e) if e.is_not_found() => {
                self.object = None;
                false
            }
            Err(e) => {
                warn!("Failed to check if {} exists, assuming it does: {}", self.object_ref(), e);
                true
            }
        }
    }

    /// Create the object unless it already exists.
    #[instrument(skip(self), fields(resource = %self.object_ref()))]
    pub async fn create(&mut self) -> Result<&mut Self> {
        self.validate()?;

        if self.exists().await {
            debug!("{} already exists, nothing to create", self.object_ref());
            return Ok(self);
        }

        if K::VALIDATES_PEERS {
            self.check_peers().await?;
        }

        debug!("Creating {}", self.object_ref());
        let result = self.api().create(&PostParams::default(), &self.definition).await;
        let created = result.map_err(|e| self.map_api_error(e))?;
        self.definition.meta_mut().resource_version = created.resource_version();
        self.object = Some(created);

        Ok(self)
    }

    async fn check_peers(&self) -> Result<()> {
        let peers = self.api().list(&ListParams::default()).await?;

        for peer in peers.items.iter().filter(|p| p.name_any() != self.name()) {
            if let Some(conflict) = self.definition.peer_conflict(peer) {
                return Err(BuilderError::InvalidInput(conflict));
            }
        }

        Ok(())
    }

    /// Replace the object with `definition`. With `force`, a rejected update
    /// falls back to delete + create.
    ///
    /// A definition without a resourceVersion takes the one of the last
    /// observed object, so custom resources accept the update.
    #[instrument(skip(self), fields(resource = %self.object_ref()))]
    pub async fn update(&mut self, force: bool) -> Result<&mut Self> {
        self.validate()?;
        let kind = kind_of::<K>();

        if self.definition.resource_version().is_none() {
            let observed = self.object.as_ref().and_then(|o| o.resource_version());
            self.definition.meta_mut().resource_version = observed;
        }

        debug!("Updating {}", self.object_ref());
        let result = self
            .api()
            .replace(self.name(), &PostParams::default(), &self.definition)
            .await;

        match result {
            Ok(updated) => {
                self.definition.meta_mut().resource_version = updated.resource_version();
                self.object = Some(updated);
                Ok(self)
            }
            Err(err) if force => {
                warn!(
                    "{}: {}",
                    msg::fail_to_update_notification(&kind, self.name(), Some(self.namespace())),
                    err
                );

                self.delete().await?;
                self.create().await
            }
            Err(err) => {
                debug!("{}", msg::fail_to_update_error(&kind, self.name()));
                Err(self.map_api_error(err))
            }
        }
    }

    /// Delete the object. Deleting an absent object succeeds.
    #[instrument(skip(self), fields(resource = %self.object_ref()))]
    pub async fn delete(&mut self) -> Result<&mut Self> {
        self.validate()?;

        if !self.exists().await {
            debug!("{} does not exist, nothing to delete", self.object_ref());
            self.object = None;
            self.definition.meta_mut().resource_version = None;
            return Ok(self);
        }

        debug!("Deleting {}", self.object_ref());
        let result = self.api().delete(self.name(), &DeleteParams::default()).await;
        match result {
            Ok(_) => {}
            Err(err) if is_api_not_found(&err) => {}
            Err(err) => return Err(err.into()),
        }

        self.object = None;
        self.definition.meta_mut().resource_version = None;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{get_test_clients, Reaction, TestClientParams};
    use crate::resources::egressip::EgressIpBuilder;
    use crate::resources::pfstatus::PfStatusConfigurationBuilder;
    use crate::types::egressip::{EgressIP, EgressIPSpec};
    use crate::types::pfstatus::{PFLACPMonitor, PFLACPMonitorSpec};
    use http::Method;

    fn make_egress_ip(name: &str, ips: &[&str]) -> EgressIP {
        EgressIP::new(
            name,
            EgressIPSpec {
                egress_ips: ips.iter().map(|ip| ip.to_string()).collect(),
                ..Default::default()
            },
        )
    }

    fn make_monitor(name: &str, namespace: &str) -> PFLACPMonitor {
        let mut monitor = PFLACPMonitor::new(
            name,
            PFLACPMonitorSpec {
                interfaces: vec!["ens1f0".to_string()],
                ..Default::default()
            },
        );
        monitor.metadata.namespace = Some(namespace.to_string());
        monitor
    }

    #[tokio::test]
    async fn test_deferred_error_blocks_every_operation() {
        let settings = get_test_clients(TestClientParams::new());
        let fake = settings.fake().unwrap().clone();

        let cases = [("", "ns", "PFLACPMonitor 'name' cannot be empty"), ("m", "", "PFLACPMonitor 'nsname' cannot be empty")];
        for (name, namespace, expected) in cases {
            let mut builder = PfStatusConfigurationBuilder::new(&settings, name, namespace);
            assert_eq!(builder.error_msg(), Some(expected));

            assert_eq!(builder.get().await.unwrap_err().to_string(), expected);
            assert!(!builder.exists().await);
            assert_eq!(builder.create().await.err().unwrap().to_string(), expected);
            assert_eq!(builder.update(true).await.err().unwrap().to_string(), expected);
            assert_eq!(builder.delete().await.err().unwrap().to_string(), expected);
        }

        assert_eq!(fake.request_count(), 0);
    }

    #[tokio::test]
    async fn test_first_recorded_error_wins() {
        let settings = get_test_clients(TestClientParams::new());
        let builder = EgressIpBuilder::new(&settings, "egress")
            .with_label("", "x")
            .with_options(|_| Err("second".to_string()));

        assert_eq!(builder.error_msg(), Some("EgressIP label key cannot be empty"));
    }

    #[tokio::test]
    async fn test_pull_round_trip() {
        let seeded = make_monitor("m", "ns");
        let settings = get_test_clients(TestClientParams::new().with_object(seeded.clone()));

        let builder = PfStatusConfigurationBuilder::pull(&settings, "m", "ns").await.unwrap();
        let mut fetched = builder.get().await.unwrap();
        fetched.metadata.resource_version = None;

        assert_eq!(fetched, seeded);
        assert_eq!(builder.definition.spec, seeded.spec);
        assert!(builder.object.is_some());
    }

    #[tokio::test]
    async fn test_pull_distinguishes_failures() {
        let settings = get_test_clients(TestClientParams::new());

        let err = PfStatusConfigurationBuilder::pull(&settings, "", "ns").await.err().unwrap();
        assert!(matches!(err, BuilderError::InvalidInput(_)));

        let err = PfStatusConfigurationBuilder::pull(&settings, "m", "").await.err().unwrap();
        assert_eq!(err.to_string(), "PFLACPMonitor 'nsname' cannot be empty");

        let err = PfStatusConfigurationBuilder::pull(&settings, "m", "ns").await.err().unwrap();
        assert!(matches!(err, BuilderError::NotFound { .. }));
        assert_eq!(err.to_string(), "PFLACPMonitor object m does not exist in namespace ns");
    }

    #[tokio::test]
    async fn test_pull_surfaces_transient_errors() {
        let settings = get_test_clients(
            TestClientParams::new()
                .with_object(make_monitor("m", "ns"))
                .with_reaction(Reaction::new(Method::GET, 500, "InternalError")),
        );

        let err = PfStatusConfigurationBuilder::pull(&settings, "m", "ns").await.err().unwrap();
        assert!(matches!(err, BuilderError::Kube(_)));
    }

    #[tokio::test]
    async fn test_create_is_idempotent() {
        let seeded = make_egress_ip("egress", &["10.0.0.1"]);
        let settings = get_test_clients(TestClientParams::new().with_object(seeded));
        let fake = settings.fake().unwrap().clone();

        let mut builder = EgressIpBuilder::new(&settings, "egress").with_egress_ips(&["10.0.0.9"]);
        builder.create().await.unwrap();
        builder.create().await.unwrap();

        assert_eq!(fake.count_of(&Method::POST), 0);
        let stored: EgressIP = fake.get_object("egress", None).unwrap();
        assert_eq!(stored.spec.egress_ips, vec!["10.0.0.1"]);
        assert_eq!(builder.object.unwrap().spec.egress_ips, vec!["10.0.0.1"]);
    }

    #[tokio::test]
    async fn test_create_then_create_again() {
        let settings = get_test_clients(TestClientParams::new());
        let fake = settings.fake().unwrap().clone();

        let mut builder = EgressIpBuilder::new(&settings, "egress").with_egress_ips(&["10.0.0.1"]);
        builder.create().await.unwrap().create().await.unwrap();

        assert_eq!(fake.count_of(&Method::POST), 1);
        assert_eq!(fake.object_count(), 1);
        assert!(builder.object.is_some());
    }

    #[tokio::test]
    async fn test_delete_absent_is_success() {
        let settings = get_test_clients(TestClientParams::new());
        let fake = settings.fake().unwrap().clone();

        let mut builder = EgressIpBuilder::new(&settings, "egress");
        builder.object = Some(make_egress_ip("egress", &[]));
        builder.delete().await.unwrap();

        assert!(builder.object.is_none());
        assert_eq!(fake.count_of(&Method::DELETE), 0);
    }

    #[tokio::test]
    async fn test_delete_then_recreate_from_definition() {
        let settings = get_test_clients(TestClientParams::new());
        let fake = settings.fake().unwrap().clone();

        let mut builder = EgressIpBuilder::new(&settings, "egress").with_egress_ips(&["10.0.0.1"]);
        builder.create().await.unwrap();
        builder.delete().await.unwrap();
        assert!(builder.object.is_none());
        assert_eq!(fake.object_count(), 0);

        builder.create().await.unwrap();
        assert_eq!(fake.object_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_object() {
        let settings = get_test_clients(
            TestClientParams::new()
                .with_object(make_egress_ip("egress", &["10.0.0.1"]))
                .with_reaction(Reaction::new(Method::DELETE, 500, "InternalError")),
        );

        let mut builder = EgressIpBuilder::pull(&settings, "egress").await.unwrap();
        assert!(builder.delete().await.is_err());
        assert!(builder.object.is_some());
    }

    #[tokio::test]
    async fn test_exists_treats_transient_error_as_present() {
        let settings = get_test_clients(
            TestClientParams::new().with_reaction(Reaction::new(Method::GET, 500, "InternalError")),
        );
        let fake = settings.fake().unwrap().clone();

        let mut builder = EgressIpBuilder::new(&settings, "egress").with_egress_ips(&["10.0.0.1"]);
        assert!(builder.exists().await);

        builder.create().await.unwrap();
        assert_eq!(fake.count_of(&Method::POST), 0);
    }

    #[tokio::test]
    async fn test_exists_false_on_not_found() {
        let settings = get_test_clients(TestClientParams::new());
        let mut builder = EgressIpBuilder::new(&settings, "egress");
        assert!(!builder.exists().await);
        assert!(builder.object.is_none());
    }

    #[tokio::test]
    async fn test_update_without_force_surfaces_error() {
        let settings = get_test_clients(
            TestClientParams::new()
                .with_object(make_egress_ip("egress", &["10.0.0.1"]))
                .with_reaction(Reaction::new(Method::PUT, 409, "Conflict")),
        );
        let fake = settings.fake().unwrap().clone();

        let mut builder = EgressIpBuilder::pull(&settings, "egress").await.unwrap();
        builder.definition.spec.egress_ips = vec!["10.0.0.2".to_string()];

        let err = builder.update(false).await.err().unwrap();
        assert!(matches!(err, BuilderError::Kube(_)));
        assert_eq!(fake.count_of(&Method::DELETE), 0);

        let stored: EgressIP = fake.get_object("egress", None).unwrap();
        assert_eq!(stored.spec.egress_ips, vec!["10.0.0.1"]);
        assert_eq!(builder.object.unwrap().spec.egress_ips, vec!["10.0.0.1"]);
    }

    #[tokio::test]
    async fn test_forced_update_recreates_object() {
        let settings = get_test_clients(
            TestClientParams::new()
                .with_object(make_egress_ip("egress", &["10.0.0.1"]))
                .with_reaction(Reaction::new(Method::PUT, 422, "Invalid")),
        );
        let fake = settings.fake().unwrap().clone();

        let mut builder = EgressIpBuilder::pull(&settings, "egress").await.unwrap();
        builder.definition.spec.egress_ips = vec!["10.0.0.2".to_string()];
        builder.update(true).await.unwrap();

        assert_eq!(fake.count_of(&Method::DELETE), 1);
        assert_eq!(fake.count_of(&Method::POST), 1);
        let stored: EgressIP = fake.get_object("egress", None).unwrap();
        assert_eq!(stored.spec.egress_ips, vec!["10.0.0.2"]);
        assert_eq!(builder.object.unwrap().spec.egress_ips, vec!["10.0.0.2"]);
    }

    #[tokio::test]
    async fn test_forced_update_stops_when_delete_fails() {
        let settings = get_test_clients(
            TestClientParams::new()
                .with_object(make_egress_ip("egress", &["10.0.0.1"]))
                .with_reaction(Reaction::new(Method::PUT, 409, "Conflict"))
                .with_reaction(Reaction::new(Method::DELETE, 500, "InternalError")),
        );
        let fake = settings.fake().unwrap().clone();

        let mut builder = EgressIpBuilder::pull(&settings, "egress").await.unwrap();
        builder.definition.spec.egress_ips = vec!["10.0.0.2".to_string()];

        assert!(builder.update(true).await.is_err());
        assert_eq!(fake.count_of(&Method::POST), 0);
    }

    #[tokio::test]
    async fn test_update_after_pull_tracks_resource_version() {
        let settings = get_test_clients(TestClientParams::new().with_object(make_egress_ip("egress", &["10.0.0.1"])));

        let mut builder = EgressIpBuilder::pull(&settings, "egress").await.unwrap();
        builder.update(false).await.unwrap();
        builder.definition.spec.egress_ips.push("10.0.0.2".to_string());
        builder.update(false).await.unwrap();

        assert_eq!(builder.object.unwrap().spec.egress_ips.len(), 2);
    }

    #[tokio::test]
    async fn test_update_after_create_carries_resource_version() {
        let settings = get_test_clients(TestClientParams::new());
        let fake = settings.fake().unwrap().clone();

        let mut builder = EgressIpBuilder::new(&settings, "egress").with_egress_ips(&["10.0.0.1"]);
        builder.create().await.unwrap();
        assert!(builder.definition.resource_version().is_some());

        builder.definition.spec.egress_ips.push("10.0.0.2".to_string());
        builder.update(false).await.unwrap();

        assert_eq!(fake.count_of(&Method::DELETE), 0);
        let stored: EgressIP = fake.get_object("egress", None).unwrap();
        assert_eq!(stored.spec.egress_ips, vec!["10.0.0.1", "10.0.0.2"]);
    }

    #[tokio::test]
    async fn test_update_adopts_observed_resource_version() {
        let settings = get_test_clients(TestClientParams::new().with_object(make_egress_ip("egress", &["10.0.0.1"])));
        let fake = settings.fake().unwrap().clone();

        // Exists but was never created by this builder.
        let mut builder = EgressIpBuilder::new(&settings, "egress").with_egress_ips(&["10.0.0.3"]);
        builder.create().await.unwrap();
        assert_eq!(fake.count_of(&Method::POST), 0);

        builder.update(false).await.unwrap();
        let stored: EgressIP = fake.get_object("egress", None).unwrap();
        assert_eq!(stored.spec.egress_ips, vec!["10.0.0.3"]);
    }

    #[tokio::test]
    async fn test_delete_clears_resource_version() {
        let settings = get_test_clients(TestClientParams::new());

        let mut builder = EgressIpBuilder::new(&settings, "egress").with_egress_ips(&["10.0.0.1"]);
        builder.create().await.unwrap();
        builder.delete().await.unwrap();
        assert!(builder.definition.resource_version().is_none());
    }

    #[test]
    fn test_kind_gvr() {
        let gvr = kind_gvr::<EgressIP>();
        assert_eq!(gvr.group, "k8s.ovn.org");
        assert_eq!(gvr.version, "v1");
        assert_eq!(gvr.resource, "egressips");
    }
}
