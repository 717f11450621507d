//! CamundaCluster Custom Resource Definition
//!
//! A CamundaCluster represents one Camunda 8 SaaS cluster. The spec carries
//! the catalog choices (region, channel, generation, plan type); the status
//! records the identifier assigned by the console at creation time, the
//! observed component endpoints, and the availability condition.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{Availability, Condition, SecretRef};

/// Specification for a CamundaCluster
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "camunda.io",
    version = "v1alpha1",
    kind = "CamundaCluster",
    plural = "camundaclusters",
    shortname = "ccl",
    status = "CamundaClusterStatus",
    printcolumn = r#"{"name":"Ready","type":"string","jsonPath":".status.conditions[?(@.type=='Ready')].reason"}"#,
    printcolumn = r#"{"name":"Cluster-Id","type":"string","jsonPath":".status.clusterId"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct CamundaClusterSpec {
    /// Desired cluster parameters sent to the console at creation time
    pub for_provider: ClusterParameters,

    /// Name of the ProviderConfig holding console API credentials
    pub provider_config_ref: String,

    /// Where to publish connection details (component endpoints)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_secret_ref: Option<SecretRef>,
}

/// Catalog choices for a cluster
///
/// Each field names an entry of the console's catalog, by id or by display
/// name (the console reports both on observation).
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterParameters {
    /// Release channel (e.g. stable)
    pub channel: String,

    /// Software generation within the channel
    pub generation: String,

    /// Region the cluster is provisioned in
    pub region: String,

    /// Plan type (e.g. free, enterprise)
    pub plan_type: String,
}

impl CamundaClusterSpec {
    /// Validate the cluster specification
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.provider_config_ref.is_empty() {
            return Err(crate::Error::validation("providerConfigRef must not be empty"));
        }
        self.for_provider.validate()
    }
}

impl ClusterParameters {
    /// Validates that every catalog choice is present
    pub fn validate(&self) -> Result<(), crate::Error> {
        for (field, value) in [
            ("channel", &self.channel),
            ("generation", &self.generation),
            ("region", &self.region),
            ("planType", &self.plan_type),
        ] {
            if value.is_empty() {
                return Err(crate::Error::validation(format!(
                    "cluster parameter '{field}' must not be empty"
                )));
            }
        }
        Ok(())
    }
}

/// Observed component endpoints of a cluster
///
/// Mirrored from the console's link block on every observation. Absent until
/// the cluster has been provisioned far enough to expose endpoints.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterObservation {
    /// Operate web UI endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operate: Option<String>,

    /// Optimize web UI endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimize: Option<String>,

    /// Tasklist web UI endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasklist: Option<String>,

    /// Zeebe gateway address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zeebe: Option<String>,
}

/// Status for a CamundaCluster
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CamundaClusterStatus {
    /// Identifier assigned by the console at creation time
    ///
    /// Unset means the cluster is assumed not to exist externally; once set
    /// it is the sole addressing key for observe/delete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,

    /// Last-observed component endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<ClusterObservation>,

    /// Conditions representing the external resource state
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl CamundaClusterStatus {
    /// Create a status carrying the freshly assigned cluster identifier
    pub fn with_cluster_id(cluster_id: impl Into<String>) -> Self {
        Self {
            cluster_id: Some(cluster_id.into()),
            ..Default::default()
        }
    }

    /// Set the observation block and return self for chaining
    pub fn at_provider(mut self, observed: ClusterObservation) -> Self {
        self.at_provider = Some(observed);
        self
    }

    /// Set the availability condition and return self for chaining
    pub fn availability(mut self, availability: Availability) -> Self {
        self.condition(availability.condition())
    }

    /// Add a condition and return self for chaining
    pub fn condition(mut self, condition: Condition) -> Self {
        // Remove existing condition of the same type
        self.conditions.retain(|c| c.type_ != condition.type_);
        self.conditions.push(condition);
        self
    }
}

impl CamundaCluster {
    /// Identifier assigned by the console, if the cluster was ever created
    pub fn external_id(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|s| s.cluster_id.as_deref())
            .filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::ConditionStatus;

    fn sample_spec() -> CamundaClusterSpec {
        CamundaClusterSpec {
            for_provider: ClusterParameters {
                channel: "stable".to_string(),
                generation: "1.0".to_string(),
                region: "us-east".to_string(),
                plan_type: "free".to_string(),
            },
            provider_config_ref: "default".to_string(),
            connection_secret_ref: None,
        }
    }

    mod validation {
        use super::*;

        #[test]
        fn test_valid_spec_passes() {
            assert!(sample_spec().validate().is_ok());
        }

        #[test]
        fn test_empty_catalog_field_is_rejected() {
            let mut spec = sample_spec();
            spec.for_provider.region = String::new();
            let err = spec.validate().unwrap_err();
            assert!(err.to_string().contains("region"));
        }

        #[test]
        fn test_missing_provider_config_ref_is_rejected() {
            let mut spec = sample_spec();
            spec.provider_config_ref = String::new();
            assert!(spec.validate().is_err());
        }
    }

    mod status_helpers {
        use super::*;

        #[test]
        fn test_with_cluster_id_sets_only_the_identifier() {
            let status = CamundaClusterStatus::with_cluster_id("abc123");
            assert_eq!(status.cluster_id.as_deref(), Some("abc123"));
            assert!(status.conditions.is_empty());
            assert!(status.at_provider.is_none());
        }

        #[test]
        fn test_availability_replaces_previous_ready_condition() {
            let status = CamundaClusterStatus::default()
                .availability(Availability::Creating)
                .availability(Availability::Available);
            assert_eq!(status.conditions.len(), 1);
            assert_eq!(status.conditions[0].status, ConditionStatus::True);
        }
    }

    mod external_id {
        use super::*;
        use kube::api::ObjectMeta;

        fn cluster_with_status(status: Option<CamundaClusterStatus>) -> CamundaCluster {
            CamundaCluster {
                metadata: ObjectMeta {
                    name: Some("test".to_string()),
                    ..Default::default()
                },
                spec: sample_spec(),
                status,
            }
        }

        #[test]
        fn test_unset_before_creation() {
            assert_eq!(cluster_with_status(None).external_id(), None);
        }

        #[test]
        fn test_empty_identifier_counts_as_unset() {
            let status = CamundaClusterStatus {
                cluster_id: Some(String::new()),
                ..Default::default()
            };
            assert_eq!(cluster_with_status(Some(status)).external_id(), None);
        }

        #[test]
        fn test_set_after_creation() {
            let status = CamundaClusterStatus::with_cluster_id("abc123");
            assert_eq!(
                cluster_with_status(Some(status)).external_id(),
                Some("abc123")
            );
        }
    }
}
