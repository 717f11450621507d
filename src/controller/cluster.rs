//! CamundaCluster controller implementation
//!
//! One reconciliation tick connects to the console, observes the external
//! cluster, and closes the gap: create it if absent, refresh status and
//! connection details if present, tear it down when the record is being
//! deleted. The tick is stateless; everything it learns is patched back
//! onto the record or published as a secret before it ends.

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
use crate::crd::{Availability, CamundaCluster, CamundaClusterStatus};
use crate::reconciler::{ClusterExternal, ConnectionDetails, ExternalResource};
use crate::secrets::ConnectionSecretPublisher;
use crate::{Error, FIELD_MANAGER};

/// Finalizer guaranteeing external cleanup runs before a record disappears
pub const CLUSTER_FINALIZER: &str = "camunda.io/cluster-cleanup";

/// Trait abstracting store writes for CamundaCluster records
///
/// This trait allows capturing status patches in tests while using the
/// real Kubernetes client in production.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterRecords: Send + Sync {
    /// Patch the status of a CamundaCluster
    async fn patch_status(&self, name: &str, status: &CamundaClusterStatus) -> Result<(), Error>;

    /// Add the cleanup finalizer if it is not present yet
    async fn ensure_finalizer(&self, name: &str) -> Result<(), Error>;

    /// Remove the cleanup finalizer, releasing the record for deletion
    async fn remove_finalizer(&self, name: &str) -> Result<(), Error>;
}

/// Real store-writer implementation
pub struct ClusterRecordsImpl {
    client: Client,
}

impl ClusterRecordsImpl {
    /// Create a new ClusterRecordsImpl wrapping the given kube Client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClusterRecords for ClusterRecordsImpl {
    async fn patch_status(&self, name: &str, status: &CamundaClusterStatus) -> Result<(), Error> {
        let api: Api<CamundaCluster> = Api::all(self.client.clone());

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
        let api: Api<CamundaCluster> = Api::all(self.client.clone());
        let record = api.get(name).await?;

        let mut finalizers = record.metadata.finalizers.unwrap_or_default();
        if finalizers.iter().any(|f| f == CLUSTER_FINALIZER) {
            return Ok(());
        }
        finalizers.push(CLUSTER_FINALIZER.to_string());

        let patch = serde_json::json!({
            "metadata": { "finalizers": finalizers }
        });
        api.patch(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    async fn remove_finalizer(&self, name: &str) -> Result<(), Error> {
        let api: Api<CamundaCluster> = Api::all(self.client.clone());
        let record = api.get(name).await?;

        let mut finalizers = record.metadata.finalizers.unwrap_or_default();
        finalizers.retain(|f| f != CLUSTER_FINALIZER);

        let patch = serde_json::json!({
            "metadata": { "finalizers": finalizers }
        });
        api.patch(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }
}

/// Controller context containing shared collaborators
///
/// Shared across all reconciliation calls; the connector carries the shared
/// token provider so ticks reuse one token until it nears expiry.
pub struct Context {
    /// Connector producing authenticated console handles
    pub connector: Arc<dyn Connect>,
    /// Store writer for status and finalizer patches
    pub records: Arc<dyn ClusterRecords>,
    /// Publisher for connection details
    pub secrets: Arc<dyn ConnectionSecretPublisher>,
}

impl Context {
    /// Create a new controller context
    pub fn new(
        connector: Arc<dyn Connect>,
        records: Arc<dyn ClusterRecords>,
        secrets: Arc<dyn ConnectionSecretPublisher>,
    ) -> Self {
        Self {
            connector,
            records,
            secrets,
        }
    }
}

/// Reconcile a CamundaCluster resource
///
/// # Arguments
///
/// * `record` - The CamundaCluster resource to reconcile
/// * `ctx` - Shared controller context
///
/// # Returns
///
/// Returns an `Action` indicating when to requeue the resource, or an error
/// if the tick failed and should be retried with backoff.
#[instrument(skip(record, ctx), fields(cluster = %record.name_any()))]
pub async fn reconcile(record: Arc<CamundaCluster>, ctx: Arc<Context>) -> Result<Action, Error> {
    let name = record.name_any();
    info!("reconciling cluster");

    if let Err(e) = record.spec.validate() {
        warn!(error = %e, "cluster validation failed");
        // Don't requeue for validation errors - they require spec changes
        return Ok(Action::await_change());
    }

    // Pure setup: credential resolution and token acquisition, no mutation.
    let console = ctx
        .connector
        .connect(&record.spec.provider_config_ref)
        .await?;
    let external = ClusterExternal::new(console);

    if record.metadata.deletion_timestamp.is_some() {
        info!("deletion requested, tearing down external cluster");
        external.delete(record.as_ref()).await?;
        ctx.records.remove_finalizer(&name).await?;
        return Ok(Action::await_change());
    }

    ctx.records.ensure_finalizer(&name).await?;

    let observation = external.observe(record.as_ref()).await?;

    if !observation.exists {
        info!("external cluster absent, creating");
        let creation = external.create(record.as_ref()).await?;

        // The identifier must be durable before this tick ends; it is the
        // only guard against creating a second cluster on the next tick.
        let status = CamundaClusterStatus::with_cluster_id(&creation.external_id)
            .availability(Availability::Creating);
        ctx.records.patch_status(&name, &status).await?;

        publish_details(&record, &creation.connection_details, &ctx).await?;
        return Ok(Action::requeue(Duration::from_secs(15)));
    }

    let mut status = CamundaClusterStatus::default();
    status.cluster_id = record.status.as_ref().and_then(|s| s.cluster_id.clone());
    if let Some(observed) = observation.observed {
        status = status.at_provider(observed);
    }
    if let Some(availability) = observation.availability {
        status = status.availability(availability);
    }
    ctx.records.patch_status(&name, &status).await?;

    publish_details(&record, &observation.connection_details, &ctx).await?;

    if !observation.up_to_date {
        debug!("cluster drifted from spec");
        let update = external.update(record.as_ref()).await?;
        publish_details(&record, &update.connection_details, &ctx).await?;
    }

    Ok(Action::requeue(Duration::from_secs(60)))
}

/// Publish connection details to the record's connection secret, if any
async fn publish_details(
    record: &CamundaCluster,
    details: &ConnectionDetails,
    ctx: &Context,
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

/// Error policy for the controller
///
/// Called when a tick fails; every failure class is retried with backoff
/// because credential, auth, and console failures may all recover.
pub fn error_policy(record: Arc<CamundaCluster>, error: &Error, _ctx: Arc<Context>) -> Action {
    error!(
        ?error,
        cluster = %record.name_any(),
        "reconciliation failed"
    );

    Action::requeue(Duration::from_secs(5))
}
