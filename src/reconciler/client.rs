//! Reconciler for the API client kind

use std::sync::Arc;

use async_trait::async_trait;
use kube::ResourceExt;
use tracing::{debug, info, warn};

use super::{ConnectionDetails, Creation, ExternalResource, Observation, Update};
use crate::console::{ConsoleApi, CreateClientRequest};
use crate::crd::{CamundaClient, ClientObservation};
use crate::status::project_client_availability;
use crate::Error;

/// External-resource implementation for [`CamundaClient`] records
///
/// Clients are addressed by (owning cluster id, client id); the owning
/// cluster id comes from the spec, the client id from the status.
pub struct ClientExternal {
    console: Arc<dyn ConsoleApi>,
}

impl ClientExternal {
    /// Create a client reconciler over an authenticated console handle
    pub fn new(console: Arc<dyn ConsoleApi>) -> Self {
        Self { console }
    }
}

#[async_trait]
impl ExternalResource for ClientExternal {
    type Record = CamundaClient;
    type Observed = ClientObservation;

    async fn observe(
        &self,
        record: &CamundaClient,
    ) -> Result<Observation<ClientObservation>, Error> {
        let Some(client_id) = record.external_id() else {
            return Ok(Observation::absent());
        };
        let cluster_id = &record.spec.for_provider.cluster_id;

        let Some(remote) = self.console.get_client(cluster_id, client_id).await? else {
            debug!(cluster_id, client_id, "client not found in console");
            return Ok(Observation::absent());
        };

        let desired_name = record.name_any();
        let availability = project_client_availability(&desired_name, &remote.name);
        let up_to_date = remote.name == desired_name;

        let mut details = ConnectionDetails::new();
        details.insert(
            "ZEEBE_CLIENT_ID".to_string(),
            remote.zeebe_client_id.clone().into_bytes(),
        );
        details.insert(
            "ZEEBE_ADDRESS".to_string(),
            remote.zeebe_address.clone().into_bytes(),
        );
        details.insert(
            "ZEEBE_AUTHORIZATION_SERVER_URL".to_string(),
            remote.zeebe_authorization_server_url.clone().into_bytes(),
        );

        let observed = ClientObservation {
            zeebe_client_id: Some(remote.zeebe_client_id),
            zeebe_address: Some(remote.zeebe_address),
            zeebe_authorization_server_url: Some(remote.zeebe_authorization_server_url),
        };

        Ok(Observation {
            exists: true,
            up_to_date,
            availability: Some(availability),
            connection_details: details,
            observed: Some(observed),
        })
    }

    async fn create(&self, record: &CamundaClient) -> Result<Creation, Error> {
        let cluster_id = &record.spec.for_provider.cluster_id;
        let request = CreateClientRequest {
            client_name: record.name_any(),
        };

        let created = self.console.create_client(cluster_id, &request).await?;
        info!(cluster_id, client_id = %created.client_id, "client created in console");

        // The client secret exists only in this response; it is published to
        // the connection secret now or lost until an out-of-band rotation.
        let mut details = ConnectionDetails::new();
        details.insert(
            "ZEEBE_CLIENT_ID".to_string(),
            created.client_id.clone().into_bytes(),
        );
        details.insert(
            "ZEEBE_CLIENT_SECRET".to_string(),
            created.client_secret.into_bytes(),
        );

        Ok(Creation {
            external_id: created.client_id,
            connection_details: details,
        })
    }

    async fn update(&self, record: &CamundaClient) -> Result<Update, Error> {
        // The console offers no client mutation; a rename can only be
        // resolved by recreating the client.
        warn!(
            client = %record.name_any(),
            "client drifted from spec but the console offers no update call; leaving as-is"
        );
        Ok(Update::default())
    }

    async fn delete(&self, record: &CamundaClient) -> Result<(), Error> {
        let Some(client_id) = record.external_id() else {
            return Ok(());
        };
        let cluster_id = &record.spec.for_provider.cluster_id;
        info!(cluster_id, client_id, "deleting client in console");
        self.console.delete_client(cluster_id, client_id).await
    }
}
