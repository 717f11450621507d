//! Custom Resource Definitions for the Camunda operator
//!
//! Two managed resource kinds (CamundaCluster, CamundaClient) plus the
//! ProviderConfig that points reconciliation at console API credentials.

mod client;
mod cluster;
mod provider_config;
mod types;

pub use client::{CamundaClient, CamundaClientSpec, CamundaClientStatus, ClientObservation, ClientParameters};
pub use cluster::{
    CamundaCluster, CamundaClusterSpec, CamundaClusterStatus, ClusterObservation, ClusterParameters,
};
pub use provider_config::{CredentialsSource, ProviderConfig, ProviderConfigSpec, SecretKeySelector};
pub use types::{Availability, Condition, ConditionStatus, SecretRef};
