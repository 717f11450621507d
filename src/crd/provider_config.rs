//! ProviderConfig Custom Resource Definition
//!
//! A ProviderConfig names the Kubernetes Secret holding console API
//! credentials. Managed resources reference a ProviderConfig by name; the
//! connector resolves the chain into raw credential bytes each tick.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Specification for a ProviderConfig
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "camunda.io",
    version = "v1alpha1",
    kind = "ProviderConfig",
    plural = "providerconfigs",
    shortname = "pc",
    printcolumn = r#"{"name":"Secret","type":"string","jsonPath":".spec.credentials.secretRef.name"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigSpec {
    /// Where the console API credentials live
    pub credentials: CredentialsSource,
}

/// Source of raw credential bytes
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsSource {
    /// Secret holding a JSON object with client_id/client_secret
    pub secret_ref: SecretKeySelector,
}

/// Selects one key of one Kubernetes Secret
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecretKeySelector {
    /// Name of the secret
    pub name: String,

    /// Namespace of the secret
    pub namespace: String,

    /// Key within the secret's data
    pub key: String,
}
