//! Supporting types shared by the Camunda CRDs

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Three-valued availability of an external Camunda resource
///
/// Projected from the remote status enumeration on every observation;
/// a record that has never been created externally carries no condition.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum Availability {
    /// The external resource is reachable and healthy
    Available,
    /// The external resource is still being provisioned
    Creating,
    /// The external resource exists but is degraded, updating, or in an unknown state
    Unavailable,
}

impl Availability {
    /// Render this availability as a Ready condition
    pub fn condition(self) -> Condition {
        match self {
            Self::Available => Condition::new(
                "Ready",
                ConditionStatus::True,
                "Available",
                "external resource is available",
            ),
            Self::Creating => Condition::new(
                "Ready",
                ConditionStatus::False,
                "Creating",
                "external resource is being created",
            ),
            Self::Unavailable => Condition::new(
                "Ready",
                ConditionStatus::False,
                "Unavailable",
                "external resource is not available",
            ),
        }
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available => write!(f, "Available"),
            Self::Creating => write!(f, "Creating"),
            Self::Unavailable => write!(f, "Unavailable"),
        }
    }
}

/// Status of a condition (True, False, Unknown)
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionStatus {
    /// The condition holds
    True,
    /// The condition does not hold
    False,
    /// The condition state cannot be determined
    Unknown,
}

/// A status condition attached to a managed resource
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct Condition {
    /// Type of condition (e.g., Ready)
    #[serde(rename = "type")]
    pub type_: String,

    /// Status of the condition (True, False, Unknown)
    pub status: ConditionStatus,

    /// Machine-readable reason for the condition
    pub reason: String,

    /// Human-readable message
    pub message: String,

    /// Last time the condition transitioned
    #[serde(rename = "lastTransitionTime")]
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    /// Create a new condition with the current timestamp
    pub fn new(
        type_: impl Into<String>,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            type_: type_.into(),
            status,
            reason: reason.into(),
            message: message.into(),
            last_transition_time: Utc::now(),
        }
    }
}

/// Reference to a Kubernetes Secret where connection details are published
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct SecretRef {
    /// Name of the secret
    pub name: String,

    /// Namespace of the secret
    pub namespace: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    mod availability {
        use super::*;

        #[test]
        fn test_available_maps_to_ready_true() {
            let cond = Availability::Available.condition();
            assert_eq!(cond.type_, "Ready");
            assert_eq!(cond.status, ConditionStatus::True);
            assert_eq!(cond.reason, "Available");
        }

        #[test]
        fn test_creating_and_unavailable_map_to_ready_false() {
            let creating = Availability::Creating.condition();
            assert_eq!(creating.status, ConditionStatus::False);
            assert_eq!(creating.reason, "Creating");

            let unavailable = Availability::Unavailable.condition();
            assert_eq!(unavailable.status, ConditionStatus::False);
            assert_eq!(unavailable.reason, "Unavailable");
        }

        #[test]
        fn test_display_matches_reason() {
            assert_eq!(Availability::Available.to_string(), "Available");
            assert_eq!(Availability::Creating.to_string(), "Creating");
            assert_eq!(Availability::Unavailable.to_string(), "Unavailable");
        }
    }

    mod condition {
        use super::*;

        #[test]
        fn test_serializes_with_kubernetes_field_names() {
            let cond = Condition::new("Ready", ConditionStatus::True, "Available", "ok");
            let json = serde_json::to_value(&cond).unwrap();
            assert_eq!(json["type"], "Ready");
            assert_eq!(json["status"], "True");
            assert!(json.get("lastTransitionTime").is_some());
        }
    }
}
