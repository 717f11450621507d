//! Camunda operator - manages Camunda 8 SaaS clusters and API clients

use std::sync::Arc;

use clap::Parser;
use futures::StreamExt;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::Controller;
use kube::{Api, Client, CustomResourceExt};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use camunda_operator::auth::{HttpTokenExchanger, TokenProvider};
use camunda_operator::connector::{Connector, SecretCredentialsResolver};
use camunda_operator::controller::{
    client_error_policy, client_reconcile, error_policy, reconcile, ClientContext,
    ClientRecordsImpl, ClusterRecordsImpl, Context,
};
use camunda_operator::crd::{CamundaClient, CamundaCluster, ProviderConfig};
use camunda_operator::secrets::KubeSecretPublisher;
use camunda_operator::FIELD_MANAGER;

/// Camunda operator - keeps Camunda 8 SaaS resources in sync with CRDs
#[derive(Parser, Debug)]
#[command(name = "camunda-operator", version, about, long_about = None)]
struct Cli {
    /// Generate CRD manifests and exit
    #[arg(long)]
    crd: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.crd {
        // Generate CRD YAML for all managed kinds
        for crd in [
            serde_yaml::to_string(&CamundaCluster::crd()),
            serde_yaml::to_string(&CamundaClient::crd()),
            serde_yaml::to_string(&ProviderConfig::crd()),
        ] {
            let crd = crd.map_err(|e| anyhow::anyhow!("Failed to serialize CRD: {}", e))?;
            println!("---\n{crd}");
        }
        return Ok(());
    }

    run_controller().await
}

/// Ensure all operator CRDs are installed
///
/// The operator installs its own CRDs on startup using server-side apply,
/// so the CRD versions always match the operator version.
async fn ensure_crds_installed(client: &Client) -> anyhow::Result<()> {
    use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
    use kube::api::{Patch, PatchParams};

    let crds: Api<CustomResourceDefinition> = Api::all(client.clone());
    let params = PatchParams::apply(FIELD_MANAGER).force();

    tracing::info!("Installing CamundaCluster CRD...");
    crds.patch(
        "camundaclusters.camunda.io",
        &params,
        &Patch::Apply(&CamundaCluster::crd()),
    )
    .await
    .map_err(|e| anyhow::anyhow!("Failed to install CamundaCluster CRD: {}", e))?;

    tracing::info!("Installing CamundaClient CRD...");
    crds.patch(
        "camundaclients.camunda.io",
        &params,
        &Patch::Apply(&CamundaClient::crd()),
    )
    .await
    .map_err(|e| anyhow::anyhow!("Failed to install CamundaClient CRD: {}", e))?;

    tracing::info!("Installing ProviderConfig CRD...");
    crds.patch(
        "providerconfigs.camunda.io",
        &params,
        &Patch::Apply(&ProviderConfig::crd()),
    )
    .await
    .map_err(|e| anyhow::anyhow!("Failed to install ProviderConfig CRD: {}", e))?;

    tracing::info!("All operator CRDs installed/updated");
    Ok(())
}

/// Run in controller mode - manages Camunda SaaS resources
async fn run_controller() -> anyhow::Result<()> {
    tracing::info!("Camunda operator starting...");

    // Create Kubernetes client
    let client = Client::try_default()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create Kubernetes client: {}", e))?;

    // Operator installs its own CRDs on startup
    ensure_crds_installed(&client).await?;

    // One token provider for the whole process: every reconciliation unit
    // shares the cached token until it nears expiry.
    let tokens = Arc::new(TokenProvider::new(Arc::new(HttpTokenExchanger::new())));
    let resolver = Arc::new(SecretCredentialsResolver::new(client.clone()));
    let connector = Arc::new(Connector::new(resolver, tokens));
    let secrets = Arc::new(KubeSecretPublisher::new(client.clone()));

    let cluster_ctx = Arc::new(Context::new(
        connector.clone(),
        Arc::new(ClusterRecordsImpl::new(client.clone())),
        secrets.clone(),
    ));
    let client_ctx = Arc::new(ClientContext::new(
        connector,
        Arc::new(ClientRecordsImpl::new(client.clone())),
        secrets,
    ));

    // Create APIs for the managed kinds (cluster-scoped)
    let clusters: Api<CamundaCluster> = Api::all(client.clone());
    let clients: Api<CamundaClient> = Api::all(client);

    tracing::info!("Starting controllers...");
    tracing::info!("  - CamundaCluster controller");
    tracing::info!("  - CamundaClient controller");

    let cluster_controller = Controller::new(clusters, WatcherConfig::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, cluster_ctx)
        .for_each(|result| async move {
            match result {
                Ok(action) => {
                    tracing::debug!(?action, "Cluster reconciliation completed");
                }
                Err(e) => {
                    tracing::error!(error = ?e, "Cluster reconciliation error");
                }
            }
        });

    let client_controller = Controller::new(clients, WatcherConfig::default())
        .shutdown_on_signal()
        .run(client_reconcile, client_error_policy, client_ctx)
        .for_each(|result| async move {
            match result {
                Ok(action) => {
                    tracing::debug!(?action, "Client reconciliation completed");
                }
                Err(e) => {
                    tracing::error!(error = ?e, "Client reconciliation error");
                }
            }
        });

    // Run both controllers concurrently
    tokio::select! {
        _ = cluster_controller => {
            tracing::info!("Cluster controller completed");
        }
        _ = client_controller => {
            tracing::info!("Client controller completed");
        }
    }

    tracing::info!("Camunda operator shutting down");
    Ok(())
}
