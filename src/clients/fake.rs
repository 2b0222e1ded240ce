// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! In-memory API server used as the test double behind `get_test_clients`.
//!
//! The server speaks enough of the Kubernetes REST dialect for `kube::Api`:
//! item get/replace/delete, collection list/create and the status
//! subresource. It keeps the not-found and conflict distinctions of a real
//! API server and only serves kinds registered in its `Scheme`.

use futures::future::BoxFuture;
use http::{header, Method, Request, Response, StatusCode};
use http_body_util::BodyExt;
use kube::client::Body;
use kube::core::ApiResource;
use kube::{Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tower::Service;
use tracing::{debug, warn};

use super::scheme::Scheme;
use crate::constants::DEFAULT_NAMESPACE;

/// A request as seen by the fake server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
}

/// Canned failure answered instead of dispatching a matching request.
#[derive(Debug, Clone)]
pub struct Reaction {
    verb: Method,
    plural: Option<String>,
    code: u16,
    reason: String,
    times: Option<usize>,
}

impl Reaction {
    pub fn new(verb: Method, code: u16, reason: &str) -> Self {
        Self {
            verb,
            plural: None,
            code,
            reason: reason.to_string(),
            times: None,
        }
    }

    /// Restrict the reaction to one resource collection, e.g. `egressips`.
    pub fn for_resource(mut self, plural: &str) -> Self {
        self.plural = Some(plural.to_string());
        self
    }

    /// Stop reacting after `n` matches. `times(0)` never fires.
    pub fn times(mut self, n: usize) -> Self {
        self.times = Some(n);
        self
    }

    fn matches(&self, method: &Method, plural: &str) -> bool {
        self.times != Some(0)
            && self.verb == *method
            && self.plural.as_deref().map_or(true, |p| p == plural)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ObjectKey {
    group: String,
    version: String,
    plural: String,
    namespace: Option<String>,
    name: String,
}

#[derive(Default)]
struct Store {
    objects: BTreeMap<ObjectKey, Value>,
    reactions: Vec<Reaction>,
    requests: Vec<RecordedRequest>,
    resource_version: u64,
}

impl Store {
    fn next_resource_version(&mut self) -> String {
        self.resource_version += 1;
        self.resource_version.to_string()
    }

    fn take_reaction(&mut self, method: &Method, plural: &str) -> Option<(u16, String)> {
        let idx = self.reactions.iter().position(|r| r.matches(method, plural))?;
        let reaction = &mut self.reactions[idx];
        let answer = (reaction.code, reaction.reason.clone());
        if let Some(times) = reaction.times.as_mut() {
            *times = times.saturating_sub(1);
            if *times == 0 {
                self.reactions.remove(idx);
            }
        }
        Some(answer)
    }
}

/// Parsed REST path: `/api/v1/...` or `/apis/{group}/{version}/...`.
#[derive(Debug, PartialEq)]
struct Target {
    group: String,
    version: String,
    namespace: Option<String>,
    plural: String,
    name: Option<String>,
    subresource: Option<String>,
}

impl Target {
    fn key(&self, name: &str) -> ObjectKey {
        ObjectKey {
            group: self.group.clone(),
            version: self.version.clone(),
            plural: self.plural.clone(),
            namespace: self.namespace.clone(),
            name: name.to_string(),
        }
    }

    fn resource_name(&self) -> String {
        if self.group.is_empty() {
            self.plural.clone()
        } else {
            format!("{}.{}", self.plural, self.group)
        }
    }

    fn selects(&self, key: &ObjectKey) -> bool {
        key.group == self.group
            && key.version == self.version
            && key.plural == self.plural
            && (self.namespace.is_none() || key.namespace == self.namespace)
    }
}

fn parse_path(path: &str) -> Option<Target> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let (group, version, rest) = match segments.as_slice() {
        ["api", version, rest @ ..] => (String::new(), version.to_string(), rest),
        ["apis", group, version, rest @ ..] => (group.to_string(), version.to_string(), rest),
        _ => return None,
    };

    let (namespace, rest) = match rest {
        ["namespaces", ns, tail @ ..] if !tail.is_empty() => (Some(ns.to_string()), tail),
        _ => (None, rest),
    };

    let (plural, name, subresource) = match rest {
        [plural] => (plural, None, None),
        [plural, name] => (plural, Some(name.to_string()), None),
        [plural, name, sub] => (plural, Some(name.to_string()), Some(sub.to_string())),
        _ => return None,
    };

    Some(Target {
        group,
        version,
        namespace,
        plural: plural.to_string(),
        name,
        subresource,
    })
}

fn failure(code: StatusCode, reason: &str, message: String) -> (StatusCode, Value) {
    (
        code,
        json!({
            "kind": "Status",
            "apiVersion": "v1",
            "metadata": {},
            "status": "Failure",
            "message": message,
            "reason": reason,
            "code": code.as_u16(),
        }),
    )
}

fn unknown_resource() -> (StatusCode, Value) {
    failure(
        StatusCode::NOT_FOUND,
        "NotFound",
        "the server could not find the requested resource".to_string(),
    )
}

fn meta_str<'a>(obj: &'a Value, field: &str) -> Option<&'a str> {
    obj.get("metadata")?.get(field)?.as_str()
}

fn meta_mut(obj: &mut Value) -> Option<&mut Map<String, Value>> {
    obj.as_object_mut()?
        .entry("metadata")
        .or_insert_with(|| json!({}))
        .as_object_mut()
}

/// Evaluate a comma-separated equality selector (`k=v`, `k==v`, `k!=v`, `k`, `!k`).
fn matches_label_selector(obj: &Value, selector: &str) -> bool {
    let labels = obj.pointer("/metadata/labels").and_then(Value::as_object);
    let label = |key: &str| labels.and_then(|l| l.get(key)).and_then(Value::as_str);

    selector
        .split(',')
        .map(str::trim)
        .filter(|req| !req.is_empty())
        .all(|req| {
            if let Some(key) = req.strip_prefix('!') {
                label(key.trim()).is_none()
            } else if let Some((key, value)) = req.split_once("!=") {
                label(key.trim()) != Some(value.trim())
            } else if let Some((key, value)) = req.split_once("==") {
                label(key.trim()) == Some(value.trim())
            } else if let Some((key, value)) = req.split_once('=') {
                label(key.trim()) == Some(value.trim())
            } else {
                label(req).is_some()
            }
        })
}

fn matches_field_selector(obj: &Value, selector: &str) -> bool {
    let field = |path: &str| {
        let pointer = format!("/{}", path.trim().replace('.', "/"));
        obj.pointer(&pointer).and_then(Value::as_str).map(str::to_string)
    };

    selector
        .split(',')
        .map(str::trim)
        .filter(|req| !req.is_empty())
        .all(|req| {
            if let Some((path, value)) = req.split_once("!=") {
                field(path).as_deref() != Some(value.trim())
            } else if let Some((path, value)) = req.split_once("==").or_else(|| req.split_once('=')) {
                field(path).as_deref() == Some(value.trim())
            } else {
                true
            }
        })
}

/// Cloneable handle on the in-memory store; every clone serves the same objects.
#[derive(Clone)]
pub struct FakeApiServer {
    scheme: Scheme,
    store: Arc<Mutex<Store>>,
}

impl FakeApiServer {
    pub fn new(scheme: Scheme) -> Self {
        Self {
            scheme,
            store: Arc::new(Mutex::new(Store::default())),
        }
    }

    /// Build a kube Client from this server. Must be called inside a tokio runtime.
    pub fn into_client(self) -> Client {
        Client::new(self, DEFAULT_NAMESPACE)
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or overwrite an object, registering its kind on the way.
    pub fn insert<K>(&self, obj: &K)
    where
        K: Resource<DynamicType = ()> + Serialize,
    {
        let resource = ApiResource::erase::<K>(&());
        match serde_json::to_value(obj) {
            Ok(value) => self.insert_value(resource, value),
            Err(e) => warn!("Dropping unserializable {} seed object: {}", resource.kind, e),
        }
    }

    pub(crate) fn insert_value(&self, resource: ApiResource, mut value: Value) {
        self.scheme.add_resource(resource.clone());

        let Some(name) = meta_str(&value, "name").map(str::to_string) else {
            warn!("Dropping {} seed object without a name", resource.kind);
            return;
        };
        let namespace = meta_str(&value, "namespace").map(str::to_string);

        let mut store = self.lock();
        let rv = store.next_resource_version();
        if let Some(meta) = meta_mut(&mut value) {
            meta.entry("resourceVersion").or_insert_with(|| json!(rv));
        }

        let key = ObjectKey {
            group: resource.group,
            version: resource.version,
            plural: resource.plural,
            namespace,
            name,
        };
        store.objects.insert(key, value);
    }

    /// Read an object straight from the store, bypassing the client.
    pub fn get_object<K>(&self, name: &str, namespace: Option<&str>) -> Option<K>
    where
        K: Resource<DynamicType = ()> + DeserializeOwned,
    {
        let resource = ApiResource::erase::<K>(&());
        let key = ObjectKey {
            group: resource.group,
            version: resource.version,
            plural: resource.plural,
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
        };
        let value = self.lock().objects.get(&key).cloned()?;
        serde_json::from_value(value).ok()
    }

    pub fn object_count(&self) -> usize {
        self.lock().objects.len()
    }

    pub fn add_reaction(&self, reaction: Reaction) {
        self.lock().reactions.push(reaction);
    }

    pub fn clear_reactions(&self) {
        self.lock().reactions.clear();
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// Number of recorded requests using the given verb.
    pub fn count_of(&self, method: &Method) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.method == *method)
            .count()
    }

    pub fn clear_requests(&self) {
        self.lock().requests.clear();
    }

    fn handle(&self, method: &Method, path: &str, query: Option<&str>, body: &[u8]) -> (StatusCode, Value) {
        let mut store = self.lock();
        store.requests.push(RecordedRequest {
            method: method.clone(),
            path: path.to_string(),
            query: query.map(str::to_string),
        });

        let Some(target) = parse_path(path) else {
            return unknown_resource();
        };
        let Some(resource) = self.scheme.resource_for(&target.group, &target.version, &target.plural) else {
            debug!("Fake API server has no kind registered for {}", path);
            return unknown_resource();
        };

        if let Some((code, reason)) = store.take_reaction(method, &target.plural) {
            let code = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return failure(code, &reason, format!("injected {} for {} {}", reason, method, path));
        }

        let parse_body = || serde_json::from_slice::<Value>(body);

        match (method, target.name.as_deref()) {
            (&Method::GET, Some(name)) => Self::get(&store, &target, name),
            (&Method::GET, None) => Self::list(&store, &target, &resource, query),
            (&Method::POST, None) => match parse_body() {
                Ok(obj) => Self::create(&mut store, &target, obj),
                Err(e) => failure(StatusCode::BAD_REQUEST, "BadRequest", e.to_string()),
            },
            (&Method::PUT, Some(name)) => match parse_body() {
                Ok(obj) => Self::replace(&mut store, &target, name, obj),
                Err(e) => failure(StatusCode::BAD_REQUEST, "BadRequest", e.to_string()),
            },
            (&Method::DELETE, Some(name)) => Self::delete(&mut store, &target, name),
            _ => failure(
                StatusCode::METHOD_NOT_ALLOWED,
                "MethodNotAllowed",
                format!("{} is not supported on {}", method, path),
            ),
        }
    }

    fn not_found(target: &Target, name: &str) -> (StatusCode, Value) {
        failure(
            StatusCode::NOT_FOUND,
            "NotFound",
            format!("{} \"{}\" not found", target.resource_name(), name),
        )
    }

    fn get(store: &Store, target: &Target, name: &str) -> (StatusCode, Value) {
        match store.objects.get(&target.key(name)) {
            Some(obj) => (StatusCode::OK, obj.clone()),
            None => Self::not_found(target, name),
        }
    }

    fn list(store: &Store, target: &Target, resource: &ApiResource, query: Option<&str>) -> (StatusCode, Value) {
        let mut label_selector = None;
        let mut field_selector = None;
        let mut limit = None;
        let mut offset = 0usize;
        for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                "labelSelector" => label_selector = Some(value.into_owned()),
                "fieldSelector" => field_selector = Some(value.into_owned()),
                "limit" => limit = value.parse::<usize>().ok().filter(|l| *l > 0),
                "continue" => offset = value.parse::<usize>().unwrap_or(0),
                _ => {}
            }
        }

        let matching: Vec<&Value> = store
            .objects
            .iter()
            .filter(|(key, _)| target.selects(key))
            .map(|(_, obj)| obj)
            .filter(|obj| label_selector.as_deref().map_or(true, |s| matches_label_selector(obj, s)))
            .filter(|obj| field_selector.as_deref().map_or(true, |s| matches_field_selector(obj, s)))
            .collect();

        let total = matching.len();
        let items: Vec<Value> = matching
            .into_iter()
            .skip(offset)
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();

        let mut metadata = json!({ "resourceVersion": store.resource_version.to_string() });
        let next = offset + items.len();
        if next < total {
            metadata["continue"] = json!(next.to_string());
        }

        (
            StatusCode::OK,
            json!({
                "apiVersion": resource.api_version,
                "kind": format!("{}List", resource.kind),
                "metadata": metadata,
                "items": items,
            }),
        )
    }

    fn create(store: &mut Store, target: &Target, mut obj: Value) -> (StatusCode, Value) {
        let Some(name) = meta_str(&obj, "name").filter(|n| !n.is_empty()).map(str::to_string) else {
            return failure(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Invalid",
                format!("{} is invalid: metadata.name: Required value", target.resource_name()),
            );
        };

        let key = target.key(&name);
        if store.objects.contains_key(&key) {
            return failure(
                StatusCode::CONFLICT,
                "AlreadyExists",
                format!("{} \"{}\" already exists", target.resource_name(), name),
            );
        }

        let rv = store.next_resource_version();
        if let Some(meta) = meta_mut(&mut obj) {
            if let Some(ns) = &target.namespace {
                meta.insert("namespace".to_string(), json!(ns));
            }
            meta.insert("resourceVersion".to_string(), json!(rv));
        }

        store.objects.insert(key, obj.clone());
        (StatusCode::CREATED, obj)
    }

    fn replace(store: &mut Store, target: &Target, name: &str, mut obj: Value) -> (StatusCode, Value) {
        let key = target.key(name);
        let Some(current) = store.objects.get(&key).cloned() else {
            return Self::not_found(target, name);
        };

        let current_rv = meta_str(&current, "resourceVersion").unwrap_or_default();
        let sent_rv = meta_str(&obj, "resourceVersion").unwrap_or_default();
        // Custom resources refuse unconditional updates; core kinds accept them.
        if sent_rv.is_empty() && !target.group.is_empty() {
            return failure(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Invalid",
                format!(
                    "{} \"{}\" is invalid: metadata.resourceVersion: Invalid value: 0x0: must be specified for an update",
                    target.resource_name(),
                    name
                ),
            );
        }
        if !sent_rv.is_empty() && sent_rv != current_rv {
            return failure(
                StatusCode::CONFLICT,
                "Conflict",
                format!(
                    "Operation cannot be fulfilled on {} \"{}\": the object has been modified; please apply your changes to the latest version and try again",
                    target.resource_name(),
                    name
                ),
            );
        }

        if target.subresource.as_deref() == Some("status") {
            let status = obj.get("status").cloned().unwrap_or(Value::Null);
            obj = current;
            obj["status"] = status;
        }

        let rv = store.next_resource_version();
        if let Some(meta) = meta_mut(&mut obj) {
            meta.insert("name".to_string(), json!(name));
            if let Some(ns) = &target.namespace {
                meta.insert("namespace".to_string(), json!(ns));
            }
            meta.insert("resourceVersion".to_string(), json!(rv));
        }

        store.objects.insert(key, obj.clone());
        (StatusCode::OK, obj)
    }

    fn delete(store: &mut Store, target: &Target, name: &str) -> (StatusCode, Value) {
        match store.objects.remove(&target.key(name)) {
            Some(obj) => (StatusCode::OK, obj),
            None => Self::not_found(target, name),
        }
    }
}

impl Service<Request<Body>> for FakeApiServer {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let server = self.clone();

        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let bytes = body.collect().await?.to_bytes();

            let (code, payload) = server.handle(&parts.method, parts.uri.path(), parts.uri.query(), &bytes);
            debug!("Fake API server: {} {} -> {}", parts.method, parts.uri.path(), code);

            let response = Response::builder()
                .status(code)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&payload)?))?;
            Ok(response)
        })
    }
}
