// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Client settings, the kind registry and the in-memory test double.

pub mod fake;
pub mod scheme;
pub mod settings;

pub use fake::{FakeApiServer, Reaction, RecordedRequest};
pub use scheme::Scheme;
pub use settings::Settings;

use kube::core::ApiResource;
use kube::Resource;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Seed for `get_test_clients`: objects to preload, extra kinds to
/// register and failures to inject.
#[derive(Default)]
pub struct TestClientParams {
    objects: Vec<(ApiResource, Value)>,
    schemes: Vec<ApiResource>,
    reactions: Vec<Reaction>,
}

impl TestClientParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload an object; its kind is registered as well.
    pub fn with_object<K>(mut self, obj: K) -> Self
    where
        K: Resource<DynamicType = ()> + Serialize,
    {
        let resource = ApiResource::erase::<K>(&());
        match serde_json::to_value(&obj) {
            Ok(value) => self.objects.push((resource, value)),
            Err(e) => warn!("Dropping unserializable {} test object: {}", resource.kind, e),
        }
        self
    }

    /// Register a kind without seeding any object of it.
    pub fn with_scheme<K: Resource<DynamicType = ()>>(mut self) -> Self {
        self.schemes.push(ApiResource::erase::<K>(&()));
        self
    }

    pub fn with_reaction(mut self, reaction: Reaction) -> Self {
        self.reactions.push(reaction);
        self
    }
}

/// Build client settings backed by an in-memory API server.
///
/// Must be called inside a tokio runtime.
pub fn get_test_clients(params: TestClientParams) -> Settings {
    let scheme = Scheme::default();
    let server = FakeApiServer::new(scheme.clone());

    for resource in params.schemes {
        scheme.add_resource(resource);
    }
    for (resource, value) in params.objects {
        server.insert_value(resource, value);
    }
    for reaction in params.reactions {
        server.add_reaction(reaction);
    }

    Settings::from_fake(server, scheme)
}
