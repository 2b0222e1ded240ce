// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::api::ListParams;
use tracing::{debug, instrument};

use super::{kind_of, Builder, ManagedResource};
use crate::clients::Settings;
use crate::error::{BuilderError, Result};

/// List objects of `K` in `namespace` and wrap each in a builder.
#[instrument(skip(api_client, options), fields(kind = %kind_of::<K>()))]
pub async fn list_namespaced<K: ManagedResource>(
    api_client: &Settings,
    namespace: &str,
    options: &[ListParams],
) -> Result<Vec<Builder<K>>> {
    let kind = kind_of::<K>();
    if namespace.is_empty() {
        return Err(BuilderError::InvalidInput(format!(
            "failed to list {} objects, 'nsname' parameter is empty",
            kind
        )));
    }

    list_in(api_client, namespace, options).await
}

/// List objects of `K` across the cluster. For namespaced kinds this spans
/// all namespaces.
#[instrument(skip(api_client, options), fields(kind = %kind_of::<K>()))]
pub async fn list_all<K: ManagedResource>(api_client: &Settings, options: &[ListParams]) -> Result<Vec<Builder<K>>> {
    list_in(api_client, "", options).await
}

async fn list_in<K: ManagedResource>(
    api_client: &Settings,
    namespace: &str,
    options: &[ListParams],
) -> Result<Vec<Builder<K>>> {
    let params = single_option(options)?;
    api_client.attach_scheme::<K>();

    let objects = K::api(api_client.client(), namespace).list(&params).await?;
    debug!("Listed {} {} objects", objects.items.len(), kind_of::<K>());

    Ok(objects
        .items
        .into_iter()
        .map(|object| Builder::from_observed(api_client, object))
        .collect())
}

fn single_option(options: &[ListParams]) -> Result<ListParams> {
    match options {
        [] => Ok(ListParams::default()),
        [params] => Ok(params.clone()),
        _ => Err(BuilderError::InvalidInput(
            "error: more than one ListOptions was passed".to_string(),
        )),
    }
}
