//! Projection of remote console status onto the availability condition
//!
//! Clusters carry a status enumeration owned by the console; clients have
//! none, so their availability is derived structurally from the observed
//! name.

use crate::console::ZeebeStatus;
use crate::crd::Availability;

/// Project a cluster's reported Zeebe status onto the availability model
///
/// An absent or unrecognized status is treated as Unavailable rather than
/// guessed at.
pub fn project_cluster_status(status: Option<ZeebeStatus>) -> Availability {
    match status {
        Some(ZeebeStatus::Healthy) => Availability::Available,
        Some(ZeebeStatus::Creating) => Availability::Creating,
        Some(ZeebeStatus::Unhealthy)
        | Some(ZeebeStatus::Updating)
        | Some(ZeebeStatus::Unknown)
        | None => Availability::Unavailable,
    }
}

/// Derive a client's availability from its observed display name
///
/// Clients expose no status enumeration; a client whose remote name matches
/// the desired name is considered available.
pub fn project_client_availability(desired_name: &str, observed_name: &str) -> Availability {
    if desired_name == observed_name {
        Availability::Available
    } else {
        Availability::Unavailable
    }
}
