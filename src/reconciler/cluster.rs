//! Reconciler for the cluster kind

use std::sync::Arc;

use async_trait::async_trait;
use kube::ResourceExt;
use tracing::{debug, info, warn};

use super::{ConnectionDetails, Creation, ExternalResource, Observation, Update};
use crate::console::{CatalogRef, ClusterDetails, ConsoleApi, CreateClusterRequest};
use crate::crd::{CamundaCluster, ClusterObservation, ClusterParameters};
use crate::status::project_cluster_status;
use crate::Error;

/// External-resource implementation for [`CamundaCluster`] records
pub struct ClusterExternal {
    console: Arc<dyn ConsoleApi>,
}

impl ClusterExternal {
    /// Create a cluster reconciler over an authenticated console handle
    pub fn new(console: Arc<dyn ConsoleApi>) -> Self {
        Self { console }
    }
}

#[async_trait]
impl ExternalResource for ClusterExternal {
    type Record = CamundaCluster;
    type Observed = ClusterObservation;

    async fn observe(
        &self,
        record: &CamundaCluster,
    ) -> Result<Observation<ClusterObservation>, Error> {
        // No identifier assigned yet: the cluster was never created.
        let Some(cluster_id) = record.external_id() else {
            return Ok(Observation::absent());
        };

        let Some(remote) = self.console.get_cluster(cluster_id).await? else {
            debug!(cluster_id, "cluster not found in console");
            return Ok(Observation::absent());
        };

        let up_to_date = cluster_matches(&record.name_any(), &record.spec.for_provider, &remote);
        let availability = project_cluster_status(remote.status.zeebe_status);

        let mut details = ConnectionDetails::new();
        let links = &remote.links;
        for (key, value) in [
            ("operate", &links.operate),
            ("optimize", &links.optimize),
            ("tasklist", &links.tasklist),
            ("zeebe", &links.zeebe),
        ] {
            if let Some(value) = value {
                details.insert(key.to_string(), value.clone().into_bytes());
            }
        }

        let observed = ClusterObservation {
            operate: links.operate.clone(),
            optimize: links.optimize.clone(),
            tasklist: links.tasklist.clone(),
            zeebe: links.zeebe.clone(),
        };

        Ok(Observation {
            exists: true,
            up_to_date,
            availability: Some(availability),
            connection_details: details,
            observed: Some(observed),
        })
    }

    async fn create(&self, record: &CamundaCluster) -> Result<Creation, Error> {
        let params = &record.spec.for_provider;
        let request = CreateClusterRequest {
            name: record.name_any(),
            plan_type_id: params.plan_type.clone(),
            channel_id: params.channel.clone(),
            generation_id: params.generation.clone(),
            region_id: params.region.clone(),
        };

        let created = self.console.create_cluster(&request).await?;
        info!(cluster_id = %created.cluster_id, "cluster created in console");

        // Cluster creation returns no one-time secrets; connection endpoints
        // become observable once provisioning exposes them.
        Ok(Creation {
            external_id: created.cluster_id,
            connection_details: ConnectionDetails::new(),
        })
    }

    async fn update(&self, record: &CamundaCluster) -> Result<Update, Error> {
        // The console offers no in-place cluster mutation; drift can only be
        // resolved by recreating the cluster out-of-band.
        warn!(
            cluster = %record.name_any(),
            "cluster drifted from spec but the console offers no update call; leaving as-is"
        );
        Ok(Update::default())
    }

    async fn delete(&self, record: &CamundaCluster) -> Result<(), Error> {
        let Some(cluster_id) = record.external_id() else {
            // Never created: nothing to tear down remotely.
            return Ok(());
        };
        info!(cluster_id, "deleting cluster in console");
        self.console.delete_cluster(cluster_id).await
    }
}

/// Structural comparison of the desired spec against an observed cluster
///
/// Catalog references on the remote side carry both id and display name;
/// a desired value matches if it equals either. A field the console did not
/// report cannot witness drift.
fn cluster_matches(desired_name: &str, params: &ClusterParameters, remote: &ClusterDetails) -> bool {
    remote.name == desired_name
        && catalog_matches(remote.region.as_ref(), &params.region)
        && catalog_matches(remote.channel.as_ref(), &params.channel)
        && catalog_matches(remote.generation.as_ref(), &params.generation)
        && catalog_matches(remote.plan_type.as_ref(), &params.plan_type)
}

fn catalog_matches(remote: Option<&CatalogRef>, desired: &str) -> bool {
    match remote {
        Some(entry) => entry.uuid == desired || entry.name == desired,
        None => true,
    }
}
