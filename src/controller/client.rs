//! CamundaClient controller implementation
//!
//! Mirrors the cluster controller for the API client kind. The one extra
//! obligation here is the creation-time client secret: the console returns
//! it exactly once, so the tick that creates a client must publish it before
//! returning.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kube::api::{Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::{Api, Client, ResourceExt};
use tracing::{debug, error, info, instrument, warn};

#[cfg(test)]
use mockall::automock;

use crate::connector::Connect;
use crate::crd::{CamundaClient, CamundaClientStatus};
use crate::reconciler::{ClientExternal, ConnectionDetails, ExternalResource};
use crate::secrets::ConnectionSecretPublisher;
use crate::{Error, FIELD_MANAGER};

/// Finalizer guaranteeing external cleanup runs before a record disappears
pub const CLIENT_FINALIZER: &str = "camunda.io/client-cleanup";

/// Trait abstracting store writes for CamundaClient records
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClientRecords: Send + Sync {
    /// Patch the status of a CamundaClient
    async fn patch_status(&self, name: &str, status: &CamundaClientStatus) -> Result<(), Error>;

    /// Add the cleanup finalizer if it is not present yet
    async fn ensure_finalizer(&self, name: &str) -> Result<(), Error>;

    /// Remove the cleanup finalizer, releasing the record for deletion
    async fn remove_finalizer(&self, name: &str) -> Result<(), Error>;
}

/// Real store-writer implementation
pub struct ClientRecordsImpl {
    client: Client,
}

impl ClientRecordsImpl {
    /// Create a new ClientRecordsImpl wrapping the given kube Client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClientRecords for ClientRecordsImpl {
    async fn patch_status(&self, name: &str, status: &CamundaClientStatus) -> Result<(), Error> {
        let api: Api<CamundaClient> = Api::all(self.client.clone());

        let status_patch = serde_json::json!({
            "status": status
        });

        api.patch_status(
            name,
            &PatchParams::apply(FIELD_MANAGER),
            &Patch::Merge(&status_patch),
        )
        .await?;

        Ok(())
    }

    async fn ensure_finalizer(&self, name: &str) -> Result<(), Error> {
        let api: Api<CamundaClient> = Api::all(self.client.clone());
        let record = api.get(name).await?;

        let mut finalizers = record.metadata.finalizers.unwrap_or_default();
        if finalizers.iter().any(|f| f == CLIENT_FINALIZER) {
            return Ok(());
        }
        finalizers.push(CLIENT_FINALIZER.to_string());

        let patch = serde_json::json!({
            "metadata": { "finalizers": finalizers }
        });
        api.patch(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    async fn remove_finalizer(&self, name: &str) -> Result<(), Error> {
        let api: Api<CamundaClient> = Api::all(self.client.clone());
        let record = api.get(name).await?;

        let mut finalizers = record.metadata.finalizers.unwrap_or_default();
        finalizers.retain(|f| f != CLIENT_FINALIZER);

        let patch = serde_json::json!({
            "metadata": { "finalizers": finalizers }
        });
        api.patch(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }
}

/// Controller context for the client kind
pub struct ClientContext {
    /// Connector producing authenticated console handles
    pub connector: Arc<dyn Connect>,
    /// Store writer for status and finalizer patches
    pub records: Arc<dyn ClientRecords>,
    /// Publisher for connection details
    pub secrets: Arc<dyn ConnectionSecretPublisher>,
}

impl ClientContext {
    /// Create a new controller context
    pub fn new(
        connector: Arc<dyn Connect>,
        records: Arc<dyn ClientRecords>,
        secrets: Arc<dyn ConnectionSecretPublisher>,
    ) -> Self {
        Self {
            connector,
            records,
            secrets,
        }
    }
}

/// Reconcile a CamundaClient resource
#[instrument(skip(record, ctx), fields(client = %record.name_any()))]
pub async fn reconcile(
    record: Arc<CamundaClient>,
    ctx: Arc<ClientContext>,
) -> Result<Action, Error> {
    let name = record.name_any();
    info!("reconciling client");

    if let Err(e) = record.spec.validate() {
        warn!(error = %e, "client validation failed");
        return Ok(Action::await_change());
    }

    let console = ctx
        .connector
        .connect(&record.spec.provider_config_ref)
        .await?;
    let external = ClientExternal::new(console);

    if record.metadata.deletion_timestamp.is_some() {
        info!("deletion requested, revoking external client");
        external.delete(record.as_ref()).await?;
        ctx.records.remove_finalizer(&name).await?;
        return Ok(Action::await_change());
    }

    ctx.records.ensure_finalizer(&name).await?;

    let observation = external.observe(record.as_ref()).await?;

    if !observation.exists {
        info!("external client absent, creating");
        let creation = external.create(record.as_ref()).await?;

        let status = CamundaClientStatus::with_client_id(&creation.external_id);
        ctx.records.patch_status(&name, &status).await?;

        // The secret in these details cannot be fetched again later.
        publish_details(&record, &creation.connection_details, &ctx).await?;
        return Ok(Action::requeue(Duration::from_secs(15)));
    }

    let mut status = CamundaClientStatus::default();
    status.client_id = record.status.as_ref().and_then(|s| s.client_id.clone());
    if let Some(observed) = observation.observed {
        status = status.at_provider(observed);
    }
    if let Some(availability) = observation.availability {
        status = status.availability(availability);
    }
    ctx.records.patch_status(&name, &status).await?;

    publish_details(&record, &observation.connection_details, &ctx).await?;

    if !observation.up_to_date {
        debug!("client drifted from spec");
        let update = external.update(record.as_ref()).await?;
        publish_details(&record, &update.connection_details, &ctx).await?;
    }

    Ok(Action::requeue(Duration::from_secs(60)))
}

/// Publish connection details to the record's connection secret, if any
async fn publish_details(
    record: &CamundaClient,
    details: &ConnectionDetails,
    ctx: &ClientContext,
) -> Result<(), Error> {
    if details.is_empty() {
        return Ok(());
    }
    match &record.spec.connection_secret_ref {
        Some(target) => ctx.secrets.publish(target, details).await,
        None => {
            warn!("connection details available but spec names no connection secret");
            Ok(())
        }
    }
}

/// Error policy for the client controller
pub fn error_policy(record: Arc<CamundaClient>, error: &Error, _ctx: Arc<ClientContext>) -> Action {
    error!(
        ?error,
        client = %record.name_any(),
        "reconciliation failed"
    );

    Action::requeue(Duration::from_secs(5))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::MockConnect;
    use crate::console::{ClientDetails, ConsoleApi, CreatedClient, MockConsoleApi};
    use crate::crd::{CamundaClientSpec, ClientParameters, ConditionStatus, SecretRef};
    use crate::secrets::MockConnectionSecretPublisher;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
    use kube::api::ObjectMeta;
    use std::sync::Mutex;

    fn sample_client(name: &str) -> CamundaClient {
        CamundaClient {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            spec: CamundaClientSpec {
                for_provider: ClientParameters {
                    cluster_id: "abc123".to_string(),
                },
                provider_config_ref: "default".to_string(),
                connection_secret_ref: Some(SecretRef {
                    name: "worker-conn".to_string(),
                    namespace: "default".to_string(),
                }),
            },
            status: None,
        }
    }

    fn created_client(name: &str, id: &str) -> CamundaClient {
        let mut client = sample_client(name);
        client.status = Some(CamundaClientStatus::with_client_id(id));
        client
    }

    fn connector_for(console: MockConsoleApi) -> Arc<MockConnect> {
        let console: Arc<dyn ConsoleApi> = Arc::new(console);
        let mut connect = MockConnect::new();
        connect
            .expect_connect()
            .returning(move |_| Ok(console.clone()));
        Arc::new(connect)
    }

    /// Story: creating a client publishes the one-time secret
    ///
    /// The ZEEBE_CLIENT_SECRET only exists in the creation response; the
    /// creating tick must both persist the identifier and publish the
    /// secret before it ends.
    #[tokio::test]
    async fn story_creation_persists_identifier_and_publishes_secret() {
        let mut console = MockConsoleApi::new();
        console.expect_create_client().times(1).returning(|_, _| {
            Ok(CreatedClient {
                client_id: "client-1".to_string(),
                client_secret: "one-time-secret".to_string(),
            })
        });

        let patched: Arc<Mutex<Vec<CamundaClientStatus>>> = Arc::default();
        let patched_clone = patched.clone();
        let mut records = MockClientRecords::new();
        records.expect_ensure_finalizer().returning(|_| Ok(()));
        records.expect_patch_status().returning(move |_, status| {
            patched_clone.lock().unwrap().push(status.clone());
            Ok(())
        });

        let published: Arc<Mutex<Vec<ConnectionDetails>>> = Arc::default();
        let published_clone = published.clone();
        let mut secrets = MockConnectionSecretPublisher::new();
        secrets
            .expect_publish()
            .withf(|target, _| target.name == "worker-conn")
            .returning(move |_, details| {
                published_clone.lock().unwrap().push(details.clone());
                Ok(())
            });

        let ctx = Arc::new(ClientContext::new(
            connector_for(console),
            Arc::new(records),
            Arc::new(secrets),
        ));

        let action = reconcile(Arc::new(sample_client("worker")), ctx)
            .await
            .unwrap();

        assert_eq!(action, Action::requeue(Duration::from_secs(15)));
        assert_eq!(
            patched.lock().unwrap().last().unwrap().client_id.as_deref(),
            Some("client-1")
        );
        let published = published.lock().unwrap();
        assert_eq!(
            published[0].get("ZEEBE_CLIENT_SECRET"),
            Some(&b"one-time-secret".to_vec())
        );
    }

    /// Story: an observed matching client reports Available
    #[tokio::test]
    async fn story_observed_client_reports_available() {
        let mut console = MockConsoleApi::new();
        console.expect_get_client().returning(|_, _| {
            Ok(Some(ClientDetails {
                name: "worker".to_string(),
                zeebe_client_id: "cid".to_string(),
                zeebe_address: "abc123.zeebe.example.test:443".to_string(),
                zeebe_authorization_server_url: "https://login.example.test/oauth/token"
                    .to_string(),
            }))
        });

        let patched: Arc<Mutex<Vec<CamundaClientStatus>>> = Arc::default();
        let patched_clone = patched.clone();
        let mut records = MockClientRecords::new();
        records.expect_ensure_finalizer().returning(|_| Ok(()));
        records.expect_patch_status().returning(move |_, status| {
            patched_clone.lock().unwrap().push(status.clone());
            Ok(())
        });

        let mut secrets = MockConnectionSecretPublisher::new();
        secrets.expect_publish().returning(|_, _| Ok(()));

        let ctx = Arc::new(ClientContext::new(
            connector_for(console),
            Arc::new(records),
            Arc::new(secrets),
        ));

        let action = reconcile(Arc::new(created_client("worker", "client-1")), ctx)
            .await
            .unwrap();

        assert_eq!(action, Action::requeue(Duration::from_secs(60)));
        let patched = patched.lock().unwrap();
        let status = patched.last().unwrap();
        assert_eq!(status.conditions[0].status, ConditionStatus::True);
        assert_eq!(
            status
                .at_provider
                .as_ref()
                .and_then(|o| o.zeebe_address.as_deref()),
            Some("abc123.zeebe.example.test:443")
        );
    }

    /// Story: deletion revokes the client before releasing the finalizer
    #[tokio::test]
    async fn story_deletion_revokes_client_and_releases_finalizer() {
        let mut console = MockConsoleApi::new();
        console
            .expect_delete_client()
            .times(1)
            .returning(|_, _| Ok(()));

        let mut records = MockClientRecords::new();
        records
            .expect_remove_finalizer()
            .times(1)
            .returning(|_| Ok(()));

        let ctx = Arc::new(ClientContext::new(
            connector_for(console),
            Arc::new(records),
            Arc::new(MockConnectionSecretPublisher::new()),
        ));

        let mut record = created_client("worker", "client-1");
        record.metadata.deletion_timestamp = Some(Time(chrono::Utc::now()));
        record.metadata.finalizers = Some(vec![CLIENT_FINALIZER.to_string()]);

        let action = reconcile(Arc::new(record), ctx).await.unwrap();
        assert_eq!(action, Action::await_change());
    }

    /// Story: a spec without an owning cluster waits for a spec change
    #[tokio::test]
    async fn story_invalid_spec_awaits_change() {
        let mut connect = MockConnect::new();
        connect.expect_connect().times(0);

        let ctx = Arc::new(ClientContext::new(
            Arc::new(connect),
            Arc::new(MockClientRecords::new()),
            Arc::new(MockConnectionSecretPublisher::new()),
        ));

        let mut record = sample_client("worker");
        record.spec.for_provider.cluster_id = String::new();

        let action = reconcile(Arc::new(record), ctx).await.unwrap();
        assert_eq!(action, Action::await_change());
    }
}
