//! Wire types of the Camunda Console customer API
//!
//! Only the subset the reconcilers touch is modeled. Unknown fields are
//! ignored on deserialization so console-side additions do not break ticks.

use serde::{Deserialize, Serialize};

/// Zeebe status enumeration reported by the console for a cluster
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ZeebeStatus {
    /// Cluster is up and serving
    Healthy,
    /// Cluster is being provisioned
    Creating,
    /// Cluster exists but is degraded
    Unhealthy,
    /// Cluster is applying an update
    Updating,
    /// Any status value this operator does not know about
    #[serde(other)]
    Unknown,
}

/// A catalog entry reference as reported on an observed cluster
///
/// The console reports both the entry's id and its display name; desired
/// specs may use either form.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct CatalogRef {
    /// Catalog entry id
    #[serde(default)]
    pub uuid: String,

    /// Catalog entry display name
    #[serde(default)]
    pub name: String,
}

/// Status block of an observed cluster
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStatusBlock {
    /// Zeebe status, absent while the console has not evaluated the cluster
    #[serde(default)]
    pub zeebe_status: Option<ZeebeStatus>,
}

/// Component endpoints of an observed cluster
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ClusterLinks {
    /// Operate web UI endpoint
    #[serde(default)]
    pub operate: Option<String>,

    /// Optimize web UI endpoint
    #[serde(default)]
    pub optimize: Option<String>,

    /// Tasklist web UI endpoint
    #[serde(default)]
    pub tasklist: Option<String>,

    /// Zeebe gateway address
    #[serde(default)]
    pub zeebe: Option<String>,
}

/// An observed cluster as returned by `GET /clusters/{id}`
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDetails {
    /// Cluster identifier
    #[serde(default)]
    pub uuid: String,

    /// Cluster display name
    #[serde(default)]
    pub name: String,

    /// Status block
    #[serde(default)]
    pub status: ClusterStatusBlock,

    /// Component endpoints, absent until provisioning exposes them
    #[serde(default)]
    pub links: ClusterLinks,

    /// Plan type catalog reference
    #[serde(default)]
    pub plan_type: Option<CatalogRef>,

    /// Region catalog reference
    #[serde(default)]
    pub region: Option<CatalogRef>,

    /// Channel catalog reference
    #[serde(default)]
    pub channel: Option<CatalogRef>,

    /// Generation catalog reference
    #[serde(default)]
    pub generation: Option<CatalogRef>,
}

/// Creation request body for `POST /clusters`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateClusterRequest {
    /// Cluster display name
    pub name: String,

    /// Plan type catalog id
    pub plan_type_id: String,

    /// Channel catalog id
    pub channel_id: String,

    /// Generation catalog id
    pub generation_id: String,

    /// Region catalog id
    pub region_id: String,
}

/// Response body of `POST /clusters`
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatedCluster {
    /// Identifier assigned to the new cluster
    pub cluster_id: String,
}

/// An observed API client as returned by `GET /clusters/{id}/clients/{clientId}`
///
/// The console reports connection coordinates under SCREAMING_SNAKE keys.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ClientDetails {
    /// Client display name
    #[serde(default)]
    pub name: String,

    /// OAuth2 client id
    #[serde(rename = "ZEEBE_CLIENT_ID", default)]
    pub zeebe_client_id: String,

    /// Zeebe gateway address
    #[serde(rename = "ZEEBE_ADDRESS", default)]
    pub zeebe_address: String,

    /// Authorization server URL
    #[serde(rename = "ZEEBE_AUTHORIZATION_SERVER_URL", default)]
    pub zeebe_authorization_server_url: String,
}

/// Creation request body for `POST /clusters/{id}/clients`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientRequest {
    /// Client display name
    pub client_name: String,
}

/// Response body of `POST /clusters/{id}/clients`
///
/// The secret is returned exactly once; it cannot be fetched again later.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatedClient {
    /// Identifier assigned to the new client
    pub client_id: String,

    /// Client secret, only available in this response
    pub client_secret: String,
}
