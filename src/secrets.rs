//! Connection-detail publishing
//!
//! Reconcilers extract connection details (endpoints, client credentials)
//! as string-keyed byte values; the publisher persists them as a Kubernetes
//! Secret at the location the record's spec names. Server-side apply keeps
//! repeated publication idempotent.

use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client};
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::crd::SecretRef;
use crate::reconciler::ConnectionDetails;
use crate::{Error, FIELD_MANAGER};

/// Trait abstracting connection-secret publication
///
/// This trait allows capturing published details in tests while the real
/// implementation writes Kubernetes Secrets.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ConnectionSecretPublisher: Send + Sync {
    /// Persist the given details at the referenced secret location
    async fn publish(&self, target: &SecretRef, details: &ConnectionDetails) -> Result<(), Error>;
}

/// Publisher writing connection details via server-side apply
pub struct KubeSecretPublisher {
    client: Client,
}

impl KubeSecretPublisher {
    /// Create a publisher over the given Kubernetes client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ConnectionSecretPublisher for KubeSecretPublisher {
    async fn publish(&self, target: &SecretRef, details: &ConnectionDetails) -> Result<(), Error> {
        let data: BTreeMap<String, ByteString> = details
            .iter()
            .map(|(key, value)| (key.clone(), ByteString(value.clone())))
            .collect();

        // Apply patches must carry their own type meta.
        let secret = serde_json::json!({
            "apiVersion": "v1",
            "kind": "Secret",
            "metadata": {
                "name": target.name,
                "namespace": target.namespace,
            },
            "data": data,
        });

        let api: Api<Secret> = Api::namespaced(self.client.clone(), &target.namespace);
        api.patch(
            &target.name,
            &PatchParams::apply(FIELD_MANAGER).force(),
            &Patch::Apply(&secret),
        )
        .await?;

        debug!(
            secret = %target.name,
            namespace = %target.namespace,
            keys = details.len(),
            "connection details published"
        );
        Ok(())
    }
}
