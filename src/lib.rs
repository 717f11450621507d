//! Camunda operator - Kubernetes operator for Camunda 8 SaaS resources
//!
//! The operator keeps Camunda 8 SaaS clusters and their API clients in sync
//! with desired state expressed as custom resources. Each reconciliation tick
//! authenticates against the Camunda Console API, observes the remote
//! resource, and creates or deletes it to close the gap, recording the
//! assigned identifier, observed endpoints, and connection credentials back
//! into the cluster.
//!
//! # Modules
//!
//! - [`crd`] - Custom Resource Definitions (CamundaCluster, CamundaClient, ProviderConfig)
//! - [`console`] - Camunda Console API surface and REST client
//! - [`auth`] - Credential parsing and OAuth2 token provider
//! - [`connector`] - Credential resolution and console handle construction
//! - [`reconciler`] - The Observe/Create/Update/Delete contract per resource kind
//! - [`status`] - Projection of remote status onto the availability condition
//! - [`controller`] - Kubernetes controller reconciliation loops
//! - [`secrets`] - Connection-detail publishing into Kubernetes Secrets
//! - [`error`] - Error types for the operator

#![deny(missing_docs)]

pub mod auth;
pub mod connector;
pub mod console;
pub mod controller;
pub mod crd;
pub mod error;
pub mod reconciler;
pub mod secrets;
pub mod status;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Default Configuration Constants
// =============================================================================
// Well-known endpoints of the Camunda SaaS control plane. Credentials may
// override both, e.g. to target a non-production console.

/// Default OAuth2 token endpoint used when credentials carry no override
pub const DEFAULT_TOKEN_URL: &str = "https://login.cloud.camunda.io/oauth/token";

/// Default token audience, doubling as the console API host
pub const DEFAULT_AUDIENCE: &str = "api.cloud.camunda.io";

/// Field manager name used for all server-side apply patches
pub const FIELD_MANAGER: &str = "camunda-operator";
