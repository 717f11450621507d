//! CamundaClient Custom Resource Definition
//!
//! A CamundaClient represents one API client scoped to a Camunda 8 SaaS
//! cluster. The client secret is returned by the console exactly once, at
//! creation time, and is published to the connection secret immediately.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{Availability, Condition, SecretRef};

/// Specification for a CamundaClient
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "camunda.io",
    version = "v1alpha1",
    kind = "CamundaClient",
    plural = "camundaclients",
    shortname = "ccli",
    status = "CamundaClientStatus",
    printcolumn = r#"{"name":"Ready","type":"string","jsonPath":".status.conditions[?(@.type=='Ready')].reason"}"#,
    printcolumn = r#"{"name":"Client-Id","type":"string","jsonPath":".status.clientId"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct CamundaClientSpec {
    /// Desired client parameters
    pub for_provider: ClientParameters,

    /// Name of the ProviderConfig holding console API credentials
    pub provider_config_ref: String,

    /// Where to publish connection details (client id/secret, addresses)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_secret_ref: Option<SecretRef>,
}

/// Parameters of an API client
///
/// The display name sent to the console is the record's metadata name.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientParameters {
    /// External identifier of the owning cluster
    pub cluster_id: String,
}

impl CamundaClientSpec {
    /// Validate the client specification
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.provider_config_ref.is_empty() {
            return Err(crate::Error::validation("providerConfigRef must not be empty"));
        }
        if self.for_provider.cluster_id.is_empty() {
            return Err(crate::Error::validation("clusterId must not be empty"));
        }
        Ok(())
    }
}

/// Observed connection coordinates of an API client
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientObservation {
    /// OAuth2 client id issued by the console
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zeebe_client_id: Option<String>,

    /// Zeebe gateway address for this client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zeebe_address: Option<String>,

    /// Authorization server the client authenticates against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zeebe_authorization_server_url: Option<String>,
}

/// Status for a CamundaClient
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CamundaClientStatus {
    /// Identifier assigned by the console at creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Last-observed connection coordinates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<ClientObservation>,

    /// Conditions representing the external resource state
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl CamundaClientStatus {
    /// Create a status carrying the freshly assigned client identifier
    pub fn with_client_id(client_id: impl Into<String>) -> Self {
        let id = client_id.into();
        Self {
            client_id: Some(id.clone()),
            at_provider: Some(ClientObservation {
                zeebe_client_id: Some(id),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Set the observation block and return self for chaining
    pub fn at_provider(mut self, observed: ClientObservation) -> Self {
        self.at_provider = Some(observed);
        self
    }

    /// Set the availability condition and return self for chaining
    pub fn availability(mut self, availability: Availability) -> Self {
        self.condition(availability.condition())
    }

    /// Add a condition and return self for chaining
    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.retain(|c| c.type_ != condition.type_);
        self.conditions.push(condition);
        self
    }
}

impl CamundaClient {
    /// Identifier assigned by the console, if the client was ever created
    pub fn external_id(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|s| s.client_id.as_deref())
            .filter(|id| !id.is_empty())
    }
}
