//! Camunda Console API surface
//!
//! [`ConsoleApi`] models exactly the calls the reconcilers make; [`Console`]
//! is the bearer-token REST implementation. Lookups map a structured 404 to
//! `Ok(None)` so absence is never conflated with transport or auth failure.
//! No retry or backoff lives here; that is the controller harness's job.

mod types;

pub use types::{
    CatalogRef, ClientDetails, ClusterDetails, ClusterLinks, ClusterStatusBlock,
    CreateClientRequest, CreateClusterRequest, CreatedClient, CreatedCluster, ZeebeStatus,
};

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

#[cfg(test)]
use mockall::automock;

use crate::Error;

/// The subset of the Camunda Console customer API the reconcilers call
///
/// This trait allows mocking the console in tests while using the real
/// REST client in production.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ConsoleApi: Send + Sync {
    /// Fetch one cluster; `Ok(None)` if the console reports it absent
    async fn get_cluster(&self, cluster_id: &str) -> Result<Option<ClusterDetails>, Error>;

    /// Create a cluster, returning its assigned identifier
    async fn create_cluster(&self, request: &CreateClusterRequest)
        -> Result<CreatedCluster, Error>;

    /// Delete a cluster; deleting an already-gone cluster succeeds
    async fn delete_cluster(&self, cluster_id: &str) -> Result<(), Error>;

    /// Fetch one API client of a cluster; `Ok(None)` if absent
    async fn get_client(
        &self,
        cluster_id: &str,
        client_id: &str,
    ) -> Result<Option<ClientDetails>, Error>;

    /// Create an API client, returning its identifier and one-time secret
    async fn create_client(
        &self,
        cluster_id: &str,
        request: &CreateClientRequest,
    ) -> Result<CreatedClient, Error>;

    /// Delete an API client; deleting an already-gone client succeeds
    async fn delete_client(&self, cluster_id: &str, client_id: &str) -> Result<(), Error>;
}

/// Bearer-token REST client for the Camunda Console
///
/// Stateless beyond the token it was bound with at connect time.
pub struct Console {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl Console {
    /// Create a console handle for the given API host and access token
    pub fn new(api_host: &str, token: impl Into<String>) -> Self {
        Self::with_base_url(format!("https://{api_host}"), token)
    }

    /// Create a console handle against an explicit base URL
    ///
    /// Test servers are plain HTTP; production hosts come through
    /// [`Console::new`].
    pub fn with_base_url(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Decode a lookup response, mapping 404 to None
    async fn read_lookup<T: DeserializeOwned>(
        op: &str,
        response: Response,
    ) -> Result<Option<T>, Error> {
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = Self::read_success(op, response).await?;
        let parsed = serde_json::from_str(&body)
            .map_err(|e| Error::serialization(format!("{op}: {e}")))?;
        Ok(Some(parsed))
    }

    /// Require a success status and return the body text
    async fn read_success(op: &str, response: Response) -> Result<String, Error> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::api(format!("{op}: {e}")))?;
        if !status.is_success() {
            return Err(Error::api(format!(
                "{op}: status={} body={}",
                status.as_u16(),
                body
            )));
        }
        Ok(body)
    }
}

#[async_trait]
impl ConsoleApi for Console {
    async fn get_cluster(&self, cluster_id: &str) -> Result<Option<ClusterDetails>, Error> {
        let op = format!("GET /clusters/{cluster_id}");
        let response = self
            .http
            .get(self.url(&format!("/clusters/{cluster_id}")))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Error::api(format!("{op}: {e}")))?;
        Self::read_lookup(&op, response).await
    }

    async fn create_cluster(
        &self,
        request: &CreateClusterRequest,
    ) -> Result<CreatedCluster, Error> {
        let op = "POST /clusters";
        let response = self
            .http
            .post(self.url("/clusters"))
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::api(format!("{op}: {e}")))?;
        let body = Self::read_success(op, response).await?;
        serde_json::from_str(&body).map_err(|e| Error::serialization(format!("{op}: {e}")))
    }

    async fn delete_cluster(&self, cluster_id: &str) -> Result<(), Error> {
        let op = format!("DELETE /clusters/{cluster_id}");
        let response = self
            .http
            .delete(self.url(&format!("/clusters/{cluster_id}")))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Error::api(format!("{op}: {e}")))?;
        // Delete is idempotent: a cluster that is already gone is deleted.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::read_success(&op, response).await.map(|_| ())
    }

    async fn get_client(
        &self,
        cluster_id: &str,
        client_id: &str,
    ) -> Result<Option<ClientDetails>, Error> {
        let op = format!("GET /clusters/{cluster_id}/clients/{client_id}");
        let response = self
            .http
            .get(self.url(&format!("/clusters/{cluster_id}/clients/{client_id}")))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Error::api(format!("{op}: {e}")))?;
        Self::read_lookup(&op, response).await
    }

    async fn create_client(
        &self,
        cluster_id: &str,
        request: &CreateClientRequest,
    ) -> Result<CreatedClient, Error> {
        let op = format!("POST /clusters/{cluster_id}/clients");
        let response = self
            .http
            .post(self.url(&format!("/clusters/{cluster_id}/clients")))
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::api(format!("{op}: {e}")))?;
        let body = Self::read_success(&op, response).await?;
        serde_json::from_str(&body).map_err(|e| Error::serialization(format!("{op}: {e}")))
    }

    async fn delete_client(&self, cluster_id: &str, client_id: &str) -> Result<(), Error> {
        let op = format!("DELETE /clusters/{cluster_id}/clients/{client_id}");
        let response = self
            .http
            .delete(self.url(&format!("/clusters/{cluster_id}/clients/{client_id}")))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Error::api(format!("{op}: {e}")))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::read_success(&op, response).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_normalized() {
        let console = Console::with_base_url("https://api.example.test/", "tok");
        assert_eq!(
            console.url("/clusters/abc123"),
            "https://api.example.test/clusters/abc123"
        );
    }

    #[test]
    fn test_new_binds_https_scheme_to_the_api_host() {
        let console = Console::new("api.cloud.camunda.io", "tok");
        assert_eq!(console.url("/clusters"), "https://api.cloud.camunda.io/clusters");
    }
}
